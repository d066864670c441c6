//! bdg-client
//!
//! REST collaborator for the inventory backend plus the on-disk snapshot
//! loader used for offline runs. Auth state lives in an explicit
//! [`Session`] owned by the client, never in process globals.

mod client;
mod error;
mod files;
mod session;

pub use client::ApiClient;
pub use error::{flatten_error_body, ClientError};
pub use files::{load_snapshot_dir, ARTICLES_FILE, MOTIVES_FILE, MOVEMENTS_FILE, PERSONNEL_FILE};
pub use session::{Session, SessionState};

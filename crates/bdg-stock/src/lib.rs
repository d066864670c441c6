//! bdg-stock
//!
//! Stock effects of inventory movements.
//! - One rule per movement kind, checked before anything changes
//! - A rejected movement leaves the book untouched
//! - Every applied movement appends a history entry
//! - History replay from a snapshot's current balances
//! - Pure deterministic logic (no IO, no clock)

mod book;
mod replay;

pub use book::{StockBook, StockChange, StockError, StockHistoryEntry};
pub use replay::{replay_history, SkippedMovement, StockReplay};

//! bdg-loans
//!
//! Loan/return reconciliation for the bodega inventory.
//! - Typed movements, validated once at the ingest boundary
//! - Canonical event ordering (timestamp, loans before returns, id)
//! - First-fit matching of returns against open loans per (article, person)
//! - Outstanding quantities derived from the ledger, never stored
//! - Pure deterministic logic (no IO, no clock, no HTTP)

mod duration;
mod ordering;
mod types;

pub mod checks;
pub mod display;
pub mod ingest;
pub mod ledger;
pub mod outstanding;
pub mod reference;

pub use checks::{
    check_loan_request, check_return_request, LoanRequest, RequestError, ReturnRequest,
};
pub use display::{
    display_rows, filter_rows, DisplayFormat, DisplayFormatError, DisplayRow, KindFilter,
    RowFilter, DEFAULT_DATETIME_FORMAT, MISSING_DATE,
};
pub use duration::Elapsed;
pub use ingest::{ingest_movements, movement_from_record, IngestError, IngestOutcome, RejectedRecord};
pub use ledger::{
    build_loan_ledger, Duracion, LedgerRow, LedgerStats, LoanLedger, RowKind,
    LOAN_NOT_FOUND_TEXT, NOT_RETURNED_TEXT,
};
pub use ordering::{loan_events, sort_loan_events_canonical, LoanEvent, LoanSide};
pub use outstanding::{
    outstanding_by_article, outstanding_by_key, outstanding_for_person, OutstandingItem,
};
pub use reference::{article_label, ReferenceTables};
pub use types::{
    ArticleId, LoanKey, MotiveId, Movement, MovementId, MovementKind, MovementTag, OpenLoan,
    PersonId, StateId, UnknownMovementTag,
};

/// Ingest wire records and rebuild the ledger in one call.
///
/// Rejected records are dropped from the ledger and returned alongside it.
pub fn reconcile_records(
    records: &[bdg_schemas::MovementRecord],
) -> (LoanLedger, Vec<RejectedRecord>) {
    let IngestOutcome { movements, rejected } = ingest_movements(records);
    (build_loan_ledger(&movements), rejected)
}

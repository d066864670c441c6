//! Per-movement stock history rebuilt from a snapshot.
//!
//! The backend serves current balances only. Opening balances come from
//! undoing every movement newest first; the movements are then applied oldest
//! first through [`StockBook::apply`], one history entry each.

use bdg_loans::{Movement, MovementId};
use bdg_schemas::ArticleRecord;
use tracing::warn;

use crate::book::{StockBook, StockError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedMovement {
    pub movement_id: MovementId,
    pub error: StockError,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StockReplay {
    /// Ends at the snapshot balances when nothing was skipped; `history()`
    /// holds the replayed entries.
    pub book: StockBook,
    /// Movements the balances cannot account for, ordered by id.
    pub skipped: Vec<SkippedMovement>,
}

/// Replay `movements` against `current`. Input order does not matter;
/// movements are taken by (fecha, id).
pub fn replay_history(current: &[ArticleRecord], movements: &[Movement]) -> StockReplay {
    let mut ordered: Vec<&Movement> = movements.iter().collect();
    ordered.sort_by(|a, b| a.fecha.cmp(&b.fecha).then_with(|| a.id.cmp(&b.id)));

    let mut book = StockBook::from_records(current);
    let mut skipped = Vec::new();
    let mut replayable = Vec::with_capacity(ordered.len());

    for m in ordered.into_iter().rev() {
        match book.undo(m) {
            Ok(()) => replayable.push(m),
            Err(error) => skipped.push(skip(m, error)),
        }
    }
    replayable.reverse();

    for m in replayable {
        if let Err(error) = book.apply(m) {
            skipped.push(skip(m, error));
        }
    }

    skipped.sort_by_key(|s| s.movement_id);
    StockReplay { book, skipped }
}

fn skip(m: &Movement, error: StockError) -> SkippedMovement {
    warn!(movement_id = m.id.0, %error, "movement skipped in stock replay");
    SkippedMovement {
        movement_id: m.id,
        error,
    }
}

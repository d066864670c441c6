//! Outstanding-quantity views derived from a [`LoanLedger`].
//!
//! Recomputed on every call; nothing is cached between calls.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::ledger::LoanLedger;
use crate::types::{ArticleId, LoanKey, PersonId};

/// Units of one article still held by a person.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutstandingItem {
    pub articulo: ArticleId,
    pub cantidad: u64,
}

/// Remaining quantity per key. Keys with nothing outstanding are omitted.
pub fn outstanding_by_key(ledger: &LoanLedger) -> BTreeMap<LoanKey, u64> {
    ledger
        .open_loans
        .keys()
        .filter_map(|key| {
            let qty = ledger.outstanding(key);
            (qty > 0).then_some((*key, qty))
        })
        .collect()
}

/// Articles `person` can still return, ordered by article id.
pub fn outstanding_for_person(ledger: &LoanLedger, person: PersonId) -> Vec<OutstandingItem> {
    ledger
        .open_loans
        .keys()
        .filter(|key| key.personal == person)
        .filter_map(|key| {
            let qty = ledger.outstanding(key);
            (qty > 0).then_some(OutstandingItem {
                articulo: key.articulo,
                cantidad: qty,
            })
        })
        .collect()
}

/// Total units lent out per article, across all people.
pub fn outstanding_by_article(ledger: &LoanLedger) -> BTreeMap<ArticleId, u64> {
    let mut out: BTreeMap<ArticleId, u64> = BTreeMap::new();
    for (key, qty) in outstanding_by_key(ledger) {
        *out.entry(key.articulo).or_insert(0) += qty;
    }
    out
}

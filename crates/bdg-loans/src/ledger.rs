//! Loan ledger: pairs loans with the returns that closed them.
//!
//! # Matching rule
//! Events are walked in canonical order (see [`crate::ordering`]). Each key
//! `(articulo, personal)` keeps its open loans in the order they were opened.
//! A return closes units on the **first** open loan whose remaining quantity
//! can absorb the whole return (first-fit). That loan is not necessarily the
//! oldest: an older loan with too few units left is skipped. A return is
//! never split across loans.
//!
//! A return that no open loan can absorb becomes an orphan row. It does not
//! touch any balance and does not stop the walk.
//!
//! # Determinism
//! [`build_loan_ledger`] is pure: no IO, no clock, inputs are not mutated,
//! and the same movements (in any order) always produce the same ledger.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::duration::Elapsed;
use crate::ordering::{loan_events, sort_loan_events_canonical, LoanEvent, LoanSide};
use crate::types::{ArticleId, LoanKey, Movement, MovementId, OpenLoan, PersonId};

pub const NOT_RETURNED_TEXT: &str = "Aún no se ha regresado";
pub const LOAN_NOT_FOUND_TEXT: &str = "No se encontró el Prestamo";

/// Row type as shown in the loan history.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RowKind {
    Prestamo,
    Regresado,
}

impl RowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowKind::Prestamo => "Prestamo",
            RowKind::Regresado => "Regresado",
        }
    }
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Duration column of a ledger row.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Duracion {
    /// Loan row with no matched return yet.
    Pendiente,
    Transcurrido(Elapsed),
    /// Orphan return: no open loan could absorb it.
    PrestamoNoEncontrado,
}

impl fmt::Display for Duracion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Duracion::Pendiente => f.write_str(NOT_RETURNED_TEXT),
            Duracion::Transcurrido(e) => write!(f, "{e}"),
            Duracion::PrestamoNoEncontrado => f.write_str(LOAN_NOT_FOUND_TEXT),
        }
    }
}

/// One derived history row. Not persisted; rebuilt on every pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerRow {
    /// Movement that produced this row (the loan for `Prestamo` rows, the
    /// return for `Regresado` rows).
    pub movement_id: MovementId,
    pub articulo_id: ArticleId,
    pub personal_id: PersonId,
    pub kind: RowKind,
    pub cantidad: u32,
    /// `None` only on orphan returns.
    pub fecha_prestamo: Option<DateTime<Utc>>,
    /// `None` while a loan row has no matched return.
    pub fecha_regreso: Option<DateTime<Utc>>,
    pub duracion: Duracion,
}

impl LedgerRow {
    pub fn key(&self) -> LoanKey {
        LoanKey::new(self.articulo_id, self.personal_id)
    }

    pub fn is_orphan(&self) -> bool {
        self.duracion == Duracion::PrestamoNoEncontrado
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerStats {
    pub loans: usize,
    pub returns_matched: usize,
    pub orphans: usize,
}

/// Result of one reconciliation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoanLedger {
    /// Rows in walk order: loan rows appear when opened, return rows when
    /// matched (or orphaned).
    pub rows: Vec<LedgerRow>,
    /// Every loan instance per key, in opening order, with its remaining
    /// balance. Fully returned loans stay with `cantidad_restante == 0`.
    pub open_loans: BTreeMap<LoanKey, Vec<OpenLoan>>,
    pub stats: LedgerStats,
}

impl LoanLedger {
    pub fn loans_for(&self, key: &LoanKey) -> &[OpenLoan] {
        self.open_loans.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remaining units lent under `key` (0 if none).
    pub fn outstanding(&self, key: &LoanKey) -> u64 {
        self.loans_for(key)
            .iter()
            .filter(|l| l.is_open())
            .map(|l| u64::from(l.cantidad_restante))
            .sum()
    }

    pub fn row(&self, movement_id: MovementId, kind: RowKind) -> Option<&LedgerRow> {
        self.rows
            .iter()
            .find(|r| r.movement_id == movement_id && r.kind == kind)
    }
}

/// Build the loan ledger from a full movement snapshot.
///
/// Movements other than loans and returns are ignored.
pub fn build_loan_ledger(movements: &[Movement]) -> LoanLedger {
    let mut events = loan_events(movements);
    sort_loan_events_canonical(&mut events);

    let mut ledger = LoanLedger::default();
    // movement id of a loan -> index of its row in `ledger.rows`
    let mut loan_row_index: BTreeMap<MovementId, usize> = BTreeMap::new();

    for ev in &events {
        match ev.side {
            LoanSide::Prestamo => open_loan(&mut ledger, &mut loan_row_index, ev),
            LoanSide::Regresado => apply_return(&mut ledger, &loan_row_index, ev),
        }
    }

    debug!(
        loans = ledger.stats.loans,
        returns_matched = ledger.stats.returns_matched,
        orphans = ledger.stats.orphans,
        keys = ledger.open_loans.len(),
        "loan ledger rebuilt"
    );

    ledger
}

fn open_loan(ledger: &mut LoanLedger, index: &mut BTreeMap<MovementId, usize>, ev: &LoanEvent) {
    ledger.open_loans.entry(ev.key).or_default().push(OpenLoan {
        movement_id: ev.movement_id,
        cantidad: ev.cantidad,
        cantidad_restante: ev.cantidad,
        fecha_prestamo: ev.fecha,
    });

    index.insert(ev.movement_id, ledger.rows.len());
    ledger.rows.push(LedgerRow {
        movement_id: ev.movement_id,
        articulo_id: ev.key.articulo,
        personal_id: ev.key.personal,
        kind: RowKind::Prestamo,
        cantidad: ev.cantidad,
        fecha_prestamo: Some(ev.fecha),
        fecha_regreso: None,
        duracion: Duracion::Pendiente,
    });
    ledger.stats.loans += 1;
}

fn apply_return(ledger: &mut LoanLedger, index: &BTreeMap<MovementId, usize>, ev: &LoanEvent) {
    let matched = ledger
        .open_loans
        .get_mut(&ev.key)
        .and_then(|loans| loans.iter_mut().find(|l| l.cantidad_restante >= ev.cantidad));

    let Some(loan) = matched else {
        debug!(
            movement_id = ev.movement_id.0,
            articulo = ev.key.articulo.0,
            personal = ev.key.personal.0,
            cantidad = ev.cantidad,
            "return has no open loan to absorb it"
        );
        ledger.rows.push(LedgerRow {
            movement_id: ev.movement_id,
            articulo_id: ev.key.articulo,
            personal_id: ev.key.personal,
            kind: RowKind::Regresado,
            cantidad: ev.cantidad,
            fecha_prestamo: None,
            fecha_regreso: Some(ev.fecha),
            duracion: Duracion::PrestamoNoEncontrado,
        });
        ledger.stats.orphans += 1;
        return;
    };

    loan.cantidad_restante -= ev.cantidad;
    let fecha_prestamo = loan.fecha_prestamo;
    let loan_id = loan.movement_id;
    let duracion = Duracion::Transcurrido(Elapsed::between(fecha_prestamo, ev.fecha));

    if let Some(row) = index.get(&loan_id).and_then(|&i| ledger.rows.get_mut(i)) {
        row.fecha_regreso = Some(ev.fecha);
        row.duracion = duracion;
    }

    ledger.rows.push(LedgerRow {
        movement_id: ev.movement_id,
        articulo_id: ev.key.articulo,
        personal_id: ev.key.personal,
        kind: RowKind::Regresado,
        cantidad: ev.cantidad,
        fecha_prestamo: Some(fecha_prestamo),
        fecha_regreso: Some(ev.fecha),
        duracion,
    });
    ledger.stats.returns_matched += 1;
}

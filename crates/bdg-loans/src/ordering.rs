//! Loan event ordering policy.
//!
//! Returns are matched against whatever loans are open at the moment the
//! return is walked, so the walk order decides which loan a return closes.
//!
//! # Canonical sort key
//!
//! `(fecha, side_ord, movement_id)` ascending, with `Prestamo = 0` and
//! `Regresado = 1`: on a tied timestamp the loan is opened before anything
//! can return it. The trailing `movement_id` makes the order independent of
//! the order the backend listed the rows in.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::types::{LoanKey, Movement, MovementId, MovementKind};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoanSide {
    Prestamo,
    Regresado,
}

impl LoanSide {
    fn ord(self) -> u8 {
        match self {
            LoanSide::Prestamo => 0,
            LoanSide::Regresado => 1,
        }
    }
}

/// The loan-relevant projection of a [`Movement`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoanEvent {
    pub movement_id: MovementId,
    pub key: LoanKey,
    pub side: LoanSide,
    pub cantidad: u32,
    pub fecha: DateTime<Utc>,
}

impl LoanEvent {
    /// `None` for every kind other than loan and return.
    pub fn from_movement(m: &Movement) -> Option<Self> {
        let (side, personal) = match m.kind {
            MovementKind::Prestamo { personal } => (LoanSide::Prestamo, personal),
            MovementKind::Regresado { personal } => (LoanSide::Regresado, personal),
            _ => return None,
        };
        Some(Self {
            movement_id: m.id,
            key: LoanKey::new(m.articulo, personal),
            side,
            cantidad: m.cantidad,
            fecha: m.fecha,
        })
    }
}

/// Keep loans and returns only, in input order.
pub fn loan_events(movements: &[Movement]) -> Vec<LoanEvent> {
    movements.iter().filter_map(LoanEvent::from_movement).collect()
}

fn canonical_cmp(a: &LoanEvent, b: &LoanEvent) -> Ordering {
    a.fecha
        .cmp(&b.fecha)
        .then_with(|| a.side.ord().cmp(&b.side.ord()))
        .then_with(|| a.movement_id.cmp(&b.movement_id))
}

/// Sort `events` into canonical order in place. Idempotent.
pub fn sort_loan_events_canonical(events: &mut [LoanEvent]) {
    events.sort_by(canonical_cmp);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, min, 0).unwrap()
    }

    #[test]
    fn non_loan_movements_are_dropped() {
        let ms = vec![
            Movement::new(1, 1, 3, t(0), MovementKind::Entrada),
            Movement::loan(2, 1, 7, 1, t(1)),
            Movement::new(3, 1, 1, t(2), MovementKind::Salida),
            Movement::ret(4, 1, 7, 1, t(3)),
        ];
        let ids: Vec<u64> = loan_events(&ms).iter().map(|e| e.movement_id.0).collect();
        assert_eq!(ids, vec![2, 4]);
    }

    #[test]
    fn tie_on_fecha_puts_loan_first_then_id() {
        let ms = vec![
            Movement::ret(9, 1, 7, 1, t(5)),
            Movement::loan(11, 1, 7, 1, t(5)),
            Movement::loan(10, 1, 7, 1, t(5)),
            Movement::loan(1, 1, 7, 1, t(6)),
        ];
        let mut evs = loan_events(&ms);
        sort_loan_events_canonical(&mut evs);
        let ids: Vec<u64> = evs.iter().map(|e| e.movement_id.0).collect();
        assert_eq!(ids, vec![10, 11, 9, 1]);
    }
}

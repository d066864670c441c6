use bdg_loans::{
    build_loan_ledger, outstanding_for_person, ArticleId, LoanKey, Movement, MovementId,
    OutstandingItem, PersonId, RowKind,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

const ART: u64 = 12;
const PER: u64 = 3;

fn t(hours: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap() + Duration::hours(hours)
}

fn key() -> LoanKey {
    LoanKey::new(ArticleId(ART), PersonId(PER))
}

#[test]
fn scenario_two_loans_one_partial_return_leaves_four_outstanding() {
    let ledger = build_loan_ledger(&[
        Movement::loan(1, ART, PER, 5, t(0)),
        Movement::loan(2, ART, PER, 3, t(1)),
        Movement::ret(3, ART, PER, 4, t(2)),
    ]);

    assert_eq!(ledger.outstanding(&key()), 4);

    // the 4-unit return fits the first loan (5), not the second (3)
    let loans = ledger.loans_for(&key());
    assert_eq!(loans[0].cantidad_restante, 1);
    assert_eq!(loans[1].cantidad_restante, 3);

    assert_eq!(
        outstanding_for_person(&ledger, PersonId(PER)),
        vec![OutstandingItem {
            articulo: ArticleId(ART),
            cantidad: 4
        }]
    );
}

#[test]
fn scenario_return_skips_older_loan_that_cannot_absorb_it() {
    let ledger = build_loan_ledger(&[
        Movement::loan(10, ART, PER, 2, t(1)),
        Movement::loan(11, ART, PER, 5, t(2)),
        Movement::ret(12, ART, PER, 5, t(3)),
    ]);

    let older = ledger.row(MovementId(10), RowKind::Prestamo).unwrap();
    assert_eq!(older.fecha_regreso, None);

    let newer = ledger.row(MovementId(11), RowKind::Prestamo).unwrap();
    assert_eq!(newer.fecha_regreso, Some(t(3)));
    assert_eq!(newer.duracion.to_string(), "1 hora(s)");

    let ret = ledger.row(MovementId(12), RowKind::Regresado).unwrap();
    assert_eq!(ret.fecha_prestamo, Some(t(2)));

    assert_eq!(ledger.outstanding(&key()), 2);
}

#[test]
fn scenario_return_is_never_split_across_loans() {
    // 3 + 3 open, return of 4: no single loan can absorb it
    let ledger = build_loan_ledger(&[
        Movement::loan(1, ART, PER, 3, t(0)),
        Movement::loan(2, ART, PER, 3, t(1)),
        Movement::ret(3, ART, PER, 4, t(2)),
    ]);

    assert!(ledger.row(MovementId(3), RowKind::Regresado).unwrap().is_orphan());
    assert_eq!(ledger.outstanding(&key()), 6);
    assert_eq!(ledger.stats.orphans, 1);
    assert_eq!(ledger.stats.returns_matched, 0);
}

#[test]
fn scenario_tied_timestamp_opens_loan_before_return() {
    let ledger = build_loan_ledger(&[
        Movement::ret(2, ART, PER, 1, t(0)),
        Movement::loan(1, ART, PER, 1, t(0)),
    ]);
    assert_eq!(ledger.stats.orphans, 0);
    assert_eq!(ledger.outstanding(&key()), 0);
    let row = ledger.row(MovementId(1), RowKind::Prestamo).unwrap();
    assert_eq!(row.duracion.to_string(), "0 minuto(s)");
}

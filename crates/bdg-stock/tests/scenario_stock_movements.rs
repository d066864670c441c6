use bdg_loans::{ArticleId, Movement, MovementKind, MovementTag, StateId};
use bdg_schemas::ArticleRecord;
use bdg_stock::{StockBook, StockError};
use chrono::{DateTime, TimeZone, Utc};

fn t() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 4, 15, 0, 0).unwrap()
}

fn notebook(id: u64, estado: u64, stock_actual: i64) -> ArticleRecord {
    ArticleRecord {
        id,
        nombre: Some("Notebook".to_string()),
        stock_actual,
        stock_minimo: 3,
        stock_prestado: 0,
        prestado: false,
        categoria: Some(2),
        marca: Some(8),
        modelo: Some(11),
        ubicacion: Some(1),
        estado: Some(estado),
        codigo_interno: Some("NB-01".to_string()),
        codigo_minvu: None,
        numero_serie: None,
        mac: None,
        descripcion: Some("14 pulgadas".to_string()),
        marca_nombre: Some("Lenovo".to_string()),
        modelo_nombre: Some("T14".to_string()),
    }
}

#[test]
fn scenario_loan_and_return_move_units_between_balances() {
    let mut book = StockBook::from_records(&[notebook(1, 1, 5)]);

    book.apply(&Movement::loan(1, 1, 9, 3, t())).unwrap();
    let a = book.article(ArticleId(1)).unwrap();
    assert_eq!((a.stock_actual, a.stock_prestado, a.prestado), (2, 3, true));

    book.apply(&Movement::ret(2, 1, 9, 2, t())).unwrap();
    assert!(book.article(ArticleId(1)).unwrap().prestado);

    assert_eq!(
        book.apply(&Movement::ret(3, 1, 9, 2, t())),
        Err(StockError::InsufficientLoaned {
            requested: 2,
            loaned: 1
        })
    );

    book.apply(&Movement::ret(4, 1, 9, 1, t())).unwrap();
    let a = book.article(ArticleId(1)).unwrap();
    assert_eq!((a.stock_actual, a.stock_prestado, a.prestado), (5, 0, false));

    let tags: Vec<MovementTag> = book.history().iter().map(|h| h.tag).collect();
    assert_eq!(
        tags,
        vec![MovementTag::Prestamo, MovementTag::Regresado, MovementTag::Regresado]
    );
    assert_eq!(book.history()[0].stock_anterior, 5);
    assert_eq!(book.history()[0].stock_actual, 2);
}

#[test]
fn scenario_per_unit_state_change_creates_then_credits_twin() {
    let mut book = StockBook::from_records(&[notebook(1, 1, 5), notebook(4, 1, 0)]);
    let to_malo = |id, n| {
        Movement::new(
            id,
            1,
            n,
            t(),
            MovementKind::CambioEstadoPorUnidad {
                estado_nuevo: StateId(2),
            },
        )
    };

    let first = book.apply(&to_malo(1, 2)).unwrap();
    assert!(first.created);
    assert_eq!(first.credited, Some(ArticleId(5)));

    let twin = book.article(ArticleId(5)).unwrap();
    assert_eq!(twin.stock_actual, 2);
    assert_eq!(twin.stock_minimo, 3);
    assert_eq!(twin.estado, Some(2));
    assert_eq!(twin.codigo_interno.as_deref(), Some("NB-01"));

    let second = book.apply(&to_malo(2, 1)).unwrap();
    assert!(!second.created);
    assert_eq!(second.credited, Some(ArticleId(5)));
    assert_eq!(book.article(ArticleId(5)).unwrap().stock_actual, 3);
    assert_eq!(book.article(ArticleId(1)).unwrap().stock_actual, 2);
}

#[test]
fn scenario_low_stock_lists_articles_below_minimum() {
    let mut book = StockBook::from_records(&[notebook(1, 1, 3), notebook(2, 2, 1)]);
    let ids = |b: &StockBook| b.low_stock().iter().map(|a| a.id).collect::<Vec<_>>();
    assert_eq!(ids(&book), vec![2]);

    book.apply(&Movement::new(1, 1, 1, t(), MovementKind::Salida))
        .unwrap();
    assert_eq!(ids(&book), vec![1, 2]);

    assert_eq!(
        book.apply(&Movement::new(2, 9, 1, t(), MovementKind::Entrada)),
        Err(StockError::UnknownArticle {
            articulo: ArticleId(9)
        })
    );
}

//! Pre-submit checks for new loans and returns.
//!
//! These mirror the rules the loan form enforces before posting a movement.
//! The backend re-validates stock on its side; passing here is necessary,
//! not sufficient.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::ledger::{LoanLedger, RowKind};
use crate::reference::ReferenceTables;
use crate::types::{ArticleId, LoanKey, PersonId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoanRequest {
    pub articulo: ArticleId,
    pub personal: PersonId,
    pub cantidad: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReturnRequest {
    pub articulo: ArticleId,
    pub personal: PersonId,
    pub cantidad: i64,
    pub fecha: DateTime<Utc>,
}

impl ReturnRequest {
    pub fn key(&self) -> LoanKey {
        LoanKey::new(self.articulo, self.personal)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestError {
    NonPositiveQuantity { cantidad: i64 },
    UnknownArticle { articulo: ArticleId },
    /// Not in the personnel list, or collapsed into a later duplicate.
    UnknownPerson { personal: PersonId },
    InsufficientStock { requested: i64, available: i64 },
    ExceedsOutstanding { requested: i64, outstanding: u64 },
    ReturnBeforeLoan { returned_at: DateTime<Utc>, loaned_at: DateTime<Utc> },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::NonPositiveQuantity { cantidad } => {
                write!(f, "cantidad must be greater than 0 (got {cantidad})")
            }
            RequestError::UnknownArticle { articulo } => {
                write!(f, "article {articulo} does not exist")
            }
            RequestError::UnknownPerson { personal } => {
                write!(f, "person {personal} does not exist")
            }
            RequestError::InsufficientStock {
                requested,
                available,
            } => write!(
                f,
                "requested {requested} exceeds available stock {available}"
            ),
            RequestError::ExceedsOutstanding {
                requested,
                outstanding,
            } => write!(
                f,
                "return of {requested} exceeds outstanding loaned quantity {outstanding}"
            ),
            RequestError::ReturnBeforeLoan {
                returned_at,
                loaned_at,
            } => write!(
                f,
                "return date {} is earlier than loan date {}",
                returned_at.to_rfc3339(),
                loaned_at.to_rfc3339()
            ),
        }
    }
}

impl std::error::Error for RequestError {}

pub fn check_loan_request(refs: &ReferenceTables, req: &LoanRequest) -> Result<(), RequestError> {
    if req.cantidad <= 0 {
        return Err(RequestError::NonPositiveQuantity {
            cantidad: req.cantidad,
        });
    }
    let article = refs
        .article(req.articulo)
        .ok_or(RequestError::UnknownArticle {
            articulo: req.articulo,
        })?;
    if refs.person(req.personal).is_none() {
        return Err(RequestError::UnknownPerson {
            personal: req.personal,
        });
    }
    if req.cantidad > article.stock_actual {
        return Err(RequestError::InsufficientStock {
            requested: req.cantidad,
            available: article.stock_actual,
        });
    }
    Ok(())
}

/// The date guard uses the oldest loan row of the key that has not seen any
/// return yet. Keys whose loans are all partially returned skip that guard.
pub fn check_return_request(ledger: &LoanLedger, req: &ReturnRequest) -> Result<(), RequestError> {
    if req.cantidad <= 0 {
        return Err(RequestError::NonPositiveQuantity {
            cantidad: req.cantidad,
        });
    }

    let key = req.key();
    let outstanding = ledger.outstanding(&key);
    // cantidad > 0 here, so the cast is lossless
    if req.cantidad as u64 > outstanding {
        return Err(RequestError::ExceedsOutstanding {
            requested: req.cantidad,
            outstanding,
        });
    }

    let oldest_unreturned = ledger
        .rows
        .iter()
        .filter(|r| r.kind == RowKind::Prestamo && r.key() == key && r.fecha_regreso.is_none())
        .filter_map(|r| r.fecha_prestamo)
        .min();

    if let Some(loaned_at) = oldest_unreturned {
        if req.fecha < loaned_at {
            return Err(RequestError::ReturnBeforeLoan {
                returned_at: req.fecha,
                loaned_at,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::build_loan_ledger;
    use crate::types::Movement;
    use bdg_schemas::{ArticleRecord, PersonnelRecord};
    use chrono::TimeZone;

    fn t(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, h, 0, 0).unwrap()
    }

    fn refs_with_stock(stock_actual: i64) -> ReferenceTables {
        let a = ArticleRecord {
            id: 5,
            nombre: Some("Cable HDMI".to_string()),
            stock_actual,
            stock_minimo: 1,
            stock_prestado: 0,
            prestado: false,
            categoria: None,
            marca: None,
            modelo: None,
            ubicacion: None,
            estado: None,
            codigo_interno: None,
            codigo_minvu: None,
            numero_serie: None,
            mac: None,
            descripcion: None,
            marca_nombre: None,
            modelo_nombre: None,
        };
        let p = PersonnelRecord {
            id: 1,
            nombre: Some("Marta Rojas".to_string()),
            correo_institucional: Some("mrojas@minvu.cl".to_string()),
            seccion: None,
        };
        ReferenceTables::from_records(&[a], &[p])
    }

    fn loan_req(articulo: u64, cantidad: i64) -> LoanRequest {
        LoanRequest {
            articulo: ArticleId(articulo),
            personal: PersonId(1),
            cantidad,
        }
    }

    #[test]
    fn loan_request_rules() {
        let refs = refs_with_stock(3);
        assert_eq!(check_loan_request(&refs, &loan_req(5, 3)), Ok(()));
        assert_eq!(
            check_loan_request(&refs, &loan_req(5, 0)),
            Err(RequestError::NonPositiveQuantity { cantidad: 0 })
        );
        assert_eq!(
            check_loan_request(&refs, &loan_req(6, 1)),
            Err(RequestError::UnknownArticle {
                articulo: ArticleId(6)
            })
        );
        assert_eq!(
            check_loan_request(&refs, &loan_req(5, 4)),
            Err(RequestError::InsufficientStock {
                requested: 4,
                available: 3
            })
        );
    }

    #[test]
    fn loan_to_unknown_person_is_refused() {
        let refs = refs_with_stock(3);
        let req = LoanRequest {
            personal: PersonId(77),
            ..loan_req(5, 1)
        };
        assert_eq!(
            check_loan_request(&refs, &req),
            Err(RequestError::UnknownPerson {
                personal: PersonId(77)
            })
        );
        assert_eq!(
            check_loan_request(&refs, &req).unwrap_err().to_string(),
            "person 77 does not exist"
        );
    }

    #[test]
    fn return_request_rules() {
        let ledger = build_loan_ledger(&[
            Movement::loan(1, 5, 1, 2, t(9)),
            Movement::loan(2, 5, 1, 1, t(11)),
        ]);
        let req = |cantidad, h| ReturnRequest {
            articulo: ArticleId(5),
            personal: PersonId(1),
            cantidad,
            fecha: t(h),
        };

        assert_eq!(check_return_request(&ledger, &req(3, 12)), Ok(()));
        assert_eq!(
            check_return_request(&ledger, &req(4, 12)),
            Err(RequestError::ExceedsOutstanding {
                requested: 4,
                outstanding: 3
            })
        );
        assert_eq!(
            check_return_request(&ledger, &req(1, 8)),
            Err(RequestError::ReturnBeforeLoan {
                returned_at: t(8),
                loaned_at: t(9)
            })
        );
        assert!(matches!(
            check_return_request(&ledger, &req(-1, 12)),
            Err(RequestError::NonPositiveQuantity { .. })
        ));
    }

    #[test]
    fn nothing_outstanding_rejects_any_return() {
        let ledger = build_loan_ledger(&[]);
        let req = ReturnRequest {
            articulo: ArticleId(5),
            personal: PersonId(1),
            cantidad: 1,
            fecha: t(10),
        };
        assert_eq!(
            check_return_request(&ledger, &req),
            Err(RequestError::ExceedsOutstanding {
                requested: 1,
                outstanding: 0
            })
        );
    }
}

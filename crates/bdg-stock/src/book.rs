//! Stock book: article balances plus the history of applied movements.
//!
//! # Rules
//! | kind                          | check                                    | effect |
//! |-------------------------------|------------------------------------------|--------|
//! | Entrada                       | cantidad > 0                             | stock_actual += n |
//! | Salida                        | cantidad > 0, stock_actual >= n          | stock_actual -= n |
//! | Nuevo Articulo                | cantidad > 0                             | none (row created with its stock) |
//! | Prestamo                      | cantidad > 0, stock_actual >= n          | n units to stock_prestado, prestado = true |
//! | Regresado                     | cantidad > 0, stock_prestado >= n        | n units back, prestado = false at 0 |
//! | Cambio de Estado              | comentario present, cantidad == 0        | estado = estado_nuevo |
//! | Cambio de Estado por Unidad   | cantidad > 0, stock_actual >= n          | n units to the twin article in the new state |

use std::collections::BTreeMap;
use std::fmt;

use bdg_loans::{ArticleId, Movement, MovementId, MovementKind, MovementTag, StateId};
use bdg_schemas::ArticleRecord;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StockError {
    UnknownArticle { articulo: ArticleId },
    NonPositiveQuantity { tag: MovementTag },
    InsufficientStock {
        tag: MovementTag,
        requested: u32,
        available: i64,
    },
    /// Return larger than what the article has out on loan.
    InsufficientLoaned { requested: u32, loaned: i64 },
    MissingComentario,
    /// Whole-article state changes may not alter quantities.
    QuantityNotAllowed { cantidad: u32 },
    /// Per-unit transfer into the state the article already has.
    SameState { estado: StateId },
    Overflow { articulo: ArticleId },
}

impl fmt::Display for StockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownArticle { articulo } => write!(f, "article {articulo} does not exist"),
            Self::NonPositiveQuantity { tag } => write!(f, "{tag}: cantidad must be > 0"),
            Self::InsufficientStock {
                tag,
                requested,
                available,
            } => write!(
                f,
                "{tag}: not enough stock (requested {requested}, available {available})"
            ),
            Self::InsufficientLoaned { requested, loaned } => write!(
                f,
                "{}: return of {requested} exceeds loaned stock {loaned}",
                MovementTag::Regresado
            ),
            Self::MissingComentario => {
                write!(f, "{}: comentario is required", MovementTag::CambioEstado)
            }
            Self::QuantityNotAllowed { cantidad } => write!(
                f,
                "{}: cantidad must be 0, got {cantidad}",
                MovementTag::CambioEstado
            ),
            Self::SameState { estado } => write!(
                f,
                "{}: article is already in state {estado}",
                MovementTag::CambioEstadoPorUnidad
            ),
            Self::Overflow { articulo } => {
                write!(f, "stock of article {articulo} is out of range")
            }
        }
    }
}

impl std::error::Error for StockError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StockHistoryEntry {
    pub movement_id: MovementId,
    pub articulo: ArticleId,
    pub tag: MovementTag,
    pub cantidad: u32,
    pub fecha: DateTime<Utc>,
    pub stock_anterior: i64,
    pub stock_actual: i64,
}

/// What one applied movement did to the book.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StockChange {
    pub articulo: ArticleId,
    pub stock_anterior: i64,
    pub stock_actual: i64,
    /// Article credited by a per-unit state change.
    pub credited: Option<ArticleId>,
    /// Set when the credited article did not exist and was created.
    pub created: bool,
}

/// Twin article after a per-unit credit, not yet stored.
struct Credit {
    record: ArticleRecord,
    created: bool,
}

fn add(v: i64, n: i64, articulo: ArticleId) -> Result<i64, StockError> {
    v.checked_add(n).ok_or(StockError::Overflow { articulo })
}

fn sub(v: i64, n: i64, articulo: ArticleId) -> Result<i64, StockError> {
    v.checked_sub(n).ok_or(StockError::Overflow { articulo })
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StockBook {
    articles: BTreeMap<ArticleId, ArticleRecord>,
    history: Vec<StockHistoryEntry>,
}

impl StockBook {
    pub fn from_records(records: &[ArticleRecord]) -> Self {
        Self {
            articles: records
                .iter()
                .map(|a| (ArticleId(a.id), a.clone()))
                .collect(),
            history: Vec::new(),
        }
    }

    pub fn article(&self, id: ArticleId) -> Option<&ArticleRecord> {
        self.articles.get(&id)
    }

    pub fn articles(&self) -> impl Iterator<Item = &ArticleRecord> {
        self.articles.values()
    }

    pub fn history(&self) -> &[StockHistoryEntry] {
        &self.history
    }

    /// Articles below their configured minimum, ordered by id.
    pub fn low_stock(&self) -> Vec<&ArticleRecord> {
        self.articles
            .values()
            .filter(|a| a.stock_actual < a.stock_minimo)
            .collect()
    }

    /// Apply one movement. On error nothing changes.
    pub fn apply(&mut self, m: &Movement) -> Result<StockChange, StockError> {
        self.validate(m)?;

        let tag = m.tag();
        let n = i64::from(m.cantidad);
        let id = m.articulo;
        let src = self
            .article(id)
            .ok_or(StockError::UnknownArticle { articulo: id })?;
        let stock_anterior = src.stock_actual;
        let mut next = src.clone();
        let mut credit = None;

        match &m.kind {
            MovementKind::Entrada => next.stock_actual = add(next.stock_actual, n, id)?,
            MovementKind::Salida => next.stock_actual = sub(next.stock_actual, n, id)?,
            MovementKind::NuevoArticulo => {}
            MovementKind::Prestamo { .. } => {
                next.stock_actual = sub(next.stock_actual, n, id)?;
                next.stock_prestado = add(next.stock_prestado, n, id)?;
                next.prestado = true;
            }
            MovementKind::Regresado { .. } => {
                next.stock_actual = add(next.stock_actual, n, id)?;
                next.stock_prestado = sub(next.stock_prestado, n, id)?;
                if next.stock_prestado == 0 {
                    next.prestado = false;
                }
            }
            MovementKind::CambioEstado { estado_nuevo } => {
                next.estado = estado_nuevo.map(|s| s.0);
            }
            MovementKind::CambioEstadoPorUnidad { estado_nuevo } => {
                next.stock_actual = sub(next.stock_actual, n, id)?;
                credit = Some(self.credit_for(src, *estado_nuevo, n)?);
            }
        }

        let stock_actual = next.stock_actual;
        self.articles.insert(id, next);

        let (credited, created) = match credit {
            Some(Credit { record, created }) => {
                let twin = ArticleId(record.id);
                if created {
                    info!(
                        source = id.0,
                        articulo = twin.0,
                        estado = ?record.estado,
                        "article created for state change"
                    );
                }
                self.articles.insert(twin, record);
                (Some(twin), created)
            }
            None => (None, false),
        };

        self.history.push(StockHistoryEntry {
            movement_id: m.id,
            articulo: id,
            tag,
            cantidad: m.cantidad,
            fecha: m.fecha,
            stock_anterior,
            stock_actual,
        });

        debug!(
            movement_id = m.id.0,
            articulo = id.0,
            tag = tag.as_str(),
            stock_anterior,
            stock_actual,
            "stock movement applied"
        );

        Ok(StockChange {
            articulo: id,
            stock_anterior,
            stock_actual,
            credited,
            created,
        })
    }

    /// Reverse the balance effect of `m`. Whole-article state changes are
    /// left alone since the previous state is not recorded.
    pub(crate) fn undo(&mut self, m: &Movement) -> Result<(), StockError> {
        let n = i64::from(m.cantidad);
        let id = m.articulo;
        let src = self
            .article(id)
            .ok_or(StockError::UnknownArticle { articulo: id })?;
        let mut prev = src.clone();
        let mut twin = None;

        match &m.kind {
            MovementKind::Entrada => prev.stock_actual = sub(prev.stock_actual, n, id)?,
            MovementKind::Salida => prev.stock_actual = add(prev.stock_actual, n, id)?,
            MovementKind::NuevoArticulo | MovementKind::CambioEstado { .. } => {}
            MovementKind::Prestamo { .. } => {
                prev.stock_actual = add(prev.stock_actual, n, id)?;
                prev.stock_prestado = sub(prev.stock_prestado, n, id)?;
                prev.prestado = prev.stock_prestado > 0;
            }
            MovementKind::Regresado { .. } => {
                prev.stock_actual = sub(prev.stock_actual, n, id)?;
                prev.stock_prestado = add(prev.stock_prestado, n, id)?;
                prev.prestado = prev.stock_prestado > 0;
            }
            MovementKind::CambioEstadoPorUnidad { estado_nuevo } => {
                prev.stock_actual = add(prev.stock_actual, n, id)?;
                if let Some(t) = self.find_twin(src, *estado_nuevo) {
                    let mut t = t.clone();
                    t.stock_actual = sub(t.stock_actual, n, ArticleId(t.id))?;
                    twin = Some(t);
                }
            }
        }

        self.articles.insert(id, prev);
        if let Some(t) = twin {
            self.articles.insert(ArticleId(t.id), t);
        }
        Ok(())
    }

    fn validate(&self, m: &Movement) -> Result<(), StockError> {
        let tag = m.tag();
        let a = self.article(m.articulo).ok_or(StockError::UnknownArticle {
            articulo: m.articulo,
        })?;

        if let MovementKind::CambioEstado { .. } = m.kind {
            if m.comentario.as_deref().map_or(true, str::is_empty) {
                return Err(StockError::MissingComentario);
            }
            if m.cantidad != 0 {
                return Err(StockError::QuantityNotAllowed {
                    cantidad: m.cantidad,
                });
            }
            return Ok(());
        }

        if m.cantidad == 0 {
            return Err(StockError::NonPositiveQuantity { tag });
        }

        if let MovementKind::CambioEstadoPorUnidad { estado_nuevo } = &m.kind {
            if a.estado == Some(estado_nuevo.0) {
                return Err(StockError::SameState {
                    estado: *estado_nuevo,
                });
            }
        }

        match &m.kind {
            MovementKind::Salida
            | MovementKind::Prestamo { .. }
            | MovementKind::CambioEstadoPorUnidad { .. } => {
                if a.stock_actual < i64::from(m.cantidad) {
                    return Err(StockError::InsufficientStock {
                        tag,
                        requested: m.cantidad,
                        available: a.stock_actual,
                    });
                }
            }
            MovementKind::Regresado { .. } => {
                if a.stock_prestado < i64::from(m.cantidad) {
                    return Err(StockError::InsufficientLoaned {
                        requested: m.cantidad,
                        loaned: a.stock_prestado,
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Another article with the source's identity, already in `estado`.
    fn find_twin(&self, src: &ArticleRecord, estado: StateId) -> Option<&ArticleRecord> {
        self.articles
            .values()
            .find(|a| a.id != src.id && same_identity(a, src) && a.estado == Some(estado.0))
    }

    /// `n` units credited to the twin in `estado`, or a new article with the
    /// next free id when there is none.
    fn credit_for(
        &self,
        src: &ArticleRecord,
        estado: StateId,
        n: i64,
    ) -> Result<Credit, StockError> {
        if let Some(twin) = self.find_twin(src, estado) {
            let mut record = twin.clone();
            record.stock_actual = add(record.stock_actual, n, ArticleId(twin.id))?;
            return Ok(Credit {
                record,
                created: false,
            });
        }

        let id = match self.articles.keys().next_back() {
            Some(last) => last
                .0
                .checked_add(1)
                .ok_or(StockError::Overflow { articulo: *last })?,
            None => 1,
        };
        Ok(Credit {
            record: ArticleRecord {
                id,
                stock_actual: n,
                stock_prestado: 0,
                prestado: false,
                estado: Some(estado.0),
                ..src.clone()
            },
            created: true,
        })
    }
}

fn same_identity(a: &ArticleRecord, b: &ArticleRecord) -> bool {
    a.nombre == b.nombre
        && a.categoria == b.categoria
        && a.marca == b.marca
        && a.modelo == b.modelo
        && a.ubicacion == b.ubicacion
}

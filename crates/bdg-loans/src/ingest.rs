//! Boundary validation: wire [`MovementRecord`]s in, typed [`Movement`]s out.
//!
//! A bad record never aborts the batch. It is reported in
//! [`IngestOutcome::rejected`] and logged at `warn`, and the remaining
//! records are still converted.

use std::fmt;

use bdg_schemas::MovementRecord;
use tracing::warn;

use crate::types::{
    ArticleId, MotiveId, Movement, MovementId, MovementKind, MovementTag, PersonId, StateId,
    UnknownMovementTag,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IngestError {
    UnknownTag(UnknownMovementTag),
    /// `cantidad` is negative or does not fit in `u32`.
    QuantityOutOfRange { cantidad: i64 },
    /// Loans and returns must move at least one unit.
    ZeroQuantity { tag: MovementTag },
    /// Loans and returns must name the person.
    MissingPersonal { tag: MovementTag },
    /// Per-unit state changes must name the target state.
    MissingEstadoNuevo,
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTag(e) => write!(f, "{e}"),
            Self::QuantityOutOfRange { cantidad } => {
                write!(f, "cantidad out of range: {cantidad}")
            }
            Self::ZeroQuantity { tag } => write!(f, "{tag}: cantidad must be > 0"),
            Self::MissingPersonal { tag } => write!(f, "{tag}: personal is required"),
            Self::MissingEstadoNuevo => {
                write!(f, "{}: estado_nuevo is required", MovementTag::CambioEstadoPorUnidad)
            }
        }
    }
}

impl std::error::Error for IngestError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedRecord {
    pub id: MovementId,
    pub error: IngestError,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Accepted movements, in input order.
    pub movements: Vec<Movement>,
    pub rejected: Vec<RejectedRecord>,
}

impl IngestOutcome {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Convert one record. Used by [`ingest_movements`] and by callers that
/// need the typed form of a freshly created backend row.
pub fn movement_from_record(rec: &MovementRecord) -> Result<Movement, IngestError> {
    let tag: MovementTag = rec.tipo_movimiento.parse().map_err(IngestError::UnknownTag)?;

    let cantidad = u32::try_from(rec.cantidad).map_err(|_| IngestError::QuantityOutOfRange {
        cantidad: rec.cantidad,
    })?;

    let kind = match tag {
        MovementTag::Entrada => MovementKind::Entrada,
        MovementTag::Salida => MovementKind::Salida,
        MovementTag::NuevoArticulo => MovementKind::NuevoArticulo,
        MovementTag::CambioEstado => MovementKind::CambioEstado {
            estado_nuevo: rec.estado_nuevo.map(StateId),
        },
        MovementTag::CambioEstadoPorUnidad => MovementKind::CambioEstadoPorUnidad {
            estado_nuevo: rec
                .estado_nuevo
                .map(StateId)
                .ok_or(IngestError::MissingEstadoNuevo)?,
        },
        MovementTag::Prestamo | MovementTag::Regresado => {
            if cantidad == 0 {
                return Err(IngestError::ZeroQuantity { tag });
            }
            let personal = rec
                .personal
                .map(PersonId)
                .ok_or(IngestError::MissingPersonal { tag })?;
            if tag == MovementTag::Prestamo {
                MovementKind::Prestamo { personal }
            } else {
                MovementKind::Regresado { personal }
            }
        }
    };

    Ok(Movement {
        id: MovementId(rec.id),
        articulo: ArticleId(rec.articulo),
        cantidad,
        fecha: rec.fecha,
        kind,
        motivo: rec.motivo.map(MotiveId),
        comentario: rec.comentario.clone(),
    })
}

pub fn ingest_movements(records: &[MovementRecord]) -> IngestOutcome {
    let mut out = IngestOutcome::default();
    for rec in records {
        match movement_from_record(rec) {
            Ok(m) => out.movements.push(m),
            Err(error) => {
                warn!(movement_id = rec.id, %error, "movement rejected at ingest");
                out.rejected.push(RejectedRecord {
                    id: MovementId(rec.id),
                    error,
                });
            }
        }
    }
    out
}

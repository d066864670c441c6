use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(
    /// Backend primary key of a movement row.
    MovementId
);
id_newtype!(ArticleId);
id_newtype!(PersonId);
id_newtype!(
    /// `EstadoArticulo` primary key (Bueno, Malo, Baja, ...).
    StateId
);
id_newtype!(MotiveId);

/// Wire tag of a movement, one per backend `TIPO_MOVIMIENTO` choice.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MovementTag {
    Entrada,
    Salida,
    NuevoArticulo,
    CambioEstado,
    CambioEstadoPorUnidad,
    Prestamo,
    Regresado,
}

impl MovementTag {
    pub const ALL: [MovementTag; 7] = [
        MovementTag::Entrada,
        MovementTag::Salida,
        MovementTag::NuevoArticulo,
        MovementTag::CambioEstado,
        MovementTag::CambioEstadoPorUnidad,
        MovementTag::Prestamo,
        MovementTag::Regresado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementTag::Entrada => "Entrada",
            MovementTag::Salida => "Salida",
            MovementTag::NuevoArticulo => "Nuevo Articulo",
            MovementTag::CambioEstado => "Cambio de Estado",
            MovementTag::CambioEstadoPorUnidad => "Cambio de Estado por Unidad",
            MovementTag::Prestamo => "Prestamo",
            MovementTag::Regresado => "Regresado",
        }
    }
}

impl fmt::Display for MovementTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a wire tag is outside the closed set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownMovementTag(pub String);

impl fmt::Display for UnknownMovementTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown tipo_movimiento '{}'", self.0)
    }
}

impl std::error::Error for UnknownMovementTag {}

impl FromStr for MovementTag {
    type Err = UnknownMovementTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MovementTag::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownMovementTag(s.to_string()))
    }
}

/// Closed set of movement kinds. Loan and return always carry the person.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MovementKind {
    Entrada,
    Salida,
    NuevoArticulo,
    CambioEstado { estado_nuevo: Option<StateId> },
    CambioEstadoPorUnidad { estado_nuevo: StateId },
    Prestamo { personal: PersonId },
    Regresado { personal: PersonId },
}

impl MovementKind {
    pub fn tag(&self) -> MovementTag {
        match self {
            MovementKind::Entrada => MovementTag::Entrada,
            MovementKind::Salida => MovementTag::Salida,
            MovementKind::NuevoArticulo => MovementTag::NuevoArticulo,
            MovementKind::CambioEstado { .. } => MovementTag::CambioEstado,
            MovementKind::CambioEstadoPorUnidad { .. } => MovementTag::CambioEstadoPorUnidad,
            MovementKind::Prestamo { .. } => MovementTag::Prestamo,
            MovementKind::Regresado { .. } => MovementTag::Regresado,
        }
    }
}

/// A validated movement. Built only through [`crate::ingest`] or [`Movement::new`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Movement {
    pub id: MovementId,
    pub articulo: ArticleId,
    pub cantidad: u32,
    pub fecha: DateTime<Utc>,
    pub kind: MovementKind,
    pub motivo: Option<MotiveId>,
    pub comentario: Option<String>,
}

impl Movement {
    pub fn new(
        id: u64,
        articulo: u64,
        cantidad: u32,
        fecha: DateTime<Utc>,
        kind: MovementKind,
    ) -> Self {
        Self {
            id: MovementId(id),
            articulo: ArticleId(articulo),
            cantidad,
            fecha,
            kind,
            motivo: None,
            comentario: None,
        }
    }

    pub fn loan(id: u64, articulo: u64, personal: u64, cantidad: u32, fecha: DateTime<Utc>) -> Self {
        debug_assert!(cantidad > 0, "loan cantidad must be > 0");
        Self::new(
            id,
            articulo,
            cantidad,
            fecha,
            MovementKind::Prestamo {
                personal: PersonId(personal),
            },
        )
    }

    pub fn ret(id: u64, articulo: u64, personal: u64, cantidad: u32, fecha: DateTime<Utc>) -> Self {
        debug_assert!(cantidad > 0, "return cantidad must be > 0");
        Self::new(
            id,
            articulo,
            cantidad,
            fecha,
            MovementKind::Regresado {
                personal: PersonId(personal),
            },
        )
    }

    pub fn with_comentario(mut self, comentario: impl Into<String>) -> Self {
        self.comentario = Some(comentario.into());
        self
    }

    pub fn tag(&self) -> MovementTag {
        self.kind.tag()
    }
}

/// Composite key of a loan instance: one article lent to one person.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LoanKey {
    pub articulo: ArticleId,
    pub personal: PersonId,
}

impl LoanKey {
    pub fn new(articulo: ArticleId, personal: PersonId) -> Self {
        Self { articulo, personal }
    }
}

/// A loan that may still have units out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenLoan {
    pub movement_id: MovementId,
    pub cantidad: u32,
    pub cantidad_restante: u32,
    pub fecha_prestamo: DateTime<Utc>,
}

impl OpenLoan {
    pub fn is_open(&self) -> bool {
        self.cantidad_restante > 0
    }
}

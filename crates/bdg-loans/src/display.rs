//! Flattened, human-readable ledger rows for tables and exports.

use std::fmt;
use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::ledger::{LedgerRow, LoanLedger, RowKind, LOAN_NOT_FOUND_TEXT};
use crate::reference::ReferenceTables;

pub const MISSING_DATE: &str = "-";
pub const DEFAULT_DATETIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplayFormatError {
    UnknownTimezone(String),
    InvalidPattern(String),
}

impl fmt::Display for DisplayFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayFormatError::UnknownTimezone(tz) => write!(f, "unknown timezone '{tz}'"),
            DisplayFormatError::InvalidPattern(p) => write!(f, "invalid datetime pattern '{p}'"),
        }
    }
}

impl std::error::Error for DisplayFormatError {}

/// Zone and strftime pattern used to render timestamps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayFormat {
    pub tz: Tz,
    pattern: String,
}

impl Default for DisplayFormat {
    fn default() -> Self {
        Self {
            tz: chrono_tz::America::Santiago,
            pattern: DEFAULT_DATETIME_FORMAT.to_string(),
        }
    }
}

impl DisplayFormat {
    pub fn new(timezone: &str, pattern: &str) -> Result<Self, DisplayFormatError> {
        let tz = Tz::from_str(timezone)
            .map_err(|_| DisplayFormatError::UnknownTimezone(timezone.to_string()))?;
        // chrono panics when rendering a pattern with a bad specifier
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(DisplayFormatError::InvalidPattern(pattern.to_string()));
        }
        Ok(Self {
            tz,
            pattern: pattern.to_string(),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn render(&self, ts: DateTime<Utc>) -> String {
        ts.with_timezone(&self.tz).format(&self.pattern).to_string()
    }

    fn render_opt(&self, ts: Option<DateTime<Utc>>) -> String {
        ts.map(|t| self.render(t))
            .unwrap_or_else(|| MISSING_DATE.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DisplayRow {
    pub id: u64,
    pub articulo_id: u64,
    pub articulo: String,
    pub personal_id: u64,
    pub correo_institucional: String,
    pub nombre: String,
    pub seccion: String,
    pub tipo_movimiento: String,
    pub cantidad: u32,
    pub fecha_prestamo: String,
    pub fecha_regreso: String,
    pub duracion: String,
}

impl DisplayRow {
    pub fn from_row(row: &LedgerRow, refs: &ReferenceTables, fmt: &DisplayFormat) -> Self {
        Self {
            id: row.movement_id.0,
            articulo_id: row.articulo_id.0,
            articulo: refs.article_label(row.articulo_id),
            personal_id: row.personal_id.0,
            correo_institucional: refs.person_email(row.personal_id).to_string(),
            nombre: refs.person_name(row.personal_id).to_string(),
            seccion: refs.person_section(row.personal_id).to_string(),
            tipo_movimiento: row.kind.as_str().to_string(),
            cantidad: row.cantidad,
            fecha_prestamo: fmt.render_opt(row.fecha_prestamo),
            fecha_regreso: fmt.render_opt(row.fecha_regreso),
            duracion: row.duracion.to_string(),
        }
    }

    /// Return row that matched no open loan.
    pub fn is_orphan(&self) -> bool {
        self.duracion == LOAN_NOT_FOUND_TEXT
    }

    fn searchable_fields(&self) -> [String; 9] {
        [
            self.articulo.clone(),
            self.correo_institucional.clone(),
            self.nombre.clone(),
            self.seccion.clone(),
            self.tipo_movimiento.clone(),
            self.cantidad.to_string(),
            self.fecha_prestamo.clone(),
            self.fecha_regreso.clone(),
            self.duracion.clone(),
        ]
    }
}

/// Ledger rows in walk order, resolved against the reference tables.
pub fn display_rows(
    ledger: &LoanLedger,
    refs: &ReferenceTables,
    fmt: &DisplayFormat,
) -> Vec<DisplayRow> {
    ledger
        .rows
        .iter()
        .map(|r| DisplayRow::from_row(r, refs, fmt))
        .collect()
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum KindFilter {
    #[default]
    Todos,
    Only(RowKind),
}

impl FromStr for KindFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "todos" | "all" => Ok(KindFilter::Todos),
            "prestamo" | "préstamo" => Ok(KindFilter::Only(RowKind::Prestamo)),
            "regresado" => Ok(KindFilter::Only(RowKind::Regresado)),
            other => Err(format!(
                "unknown movement filter '{other}' (expected todos, prestamo or regresado)"
            )),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowFilter {
    pub kind: KindFilter,
    pub search: Option<String>,
}

impl RowFilter {
    pub fn matches(&self, row: &DisplayRow) -> bool {
        if let KindFilter::Only(kind) = self.kind {
            if row.tipo_movimiento != kind.as_str() {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                row.searchable_fields()
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }
}

pub fn filter_rows(rows: Vec<DisplayRow>, filter: &RowFilter) -> Vec<DisplayRow> {
    rows.into_iter().filter(|r| filter.matches(r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::build_loan_ledger;
    use crate::reference::{ARTICLE_NOT_FOUND, NO_EMAIL};
    use crate::types::Movement;
    use bdg_schemas::PersonnelRecord;
    use chrono::TimeZone;

    fn refs() -> ReferenceTables {
        ReferenceTables::from_records(
            &[],
            &[PersonnelRecord {
                id: 9,
                nombre: Some("Camila Rojas".to_string()),
                correo_institucional: Some("crojas@minvu.cl".to_string()),
                seccion: Some("Informática".to_string()),
            }],
        )
    }

    #[test]
    fn rejects_bad_timezone_and_pattern() {
        assert!(matches!(
            DisplayFormat::new("Mars/Olympus", DEFAULT_DATETIME_FORMAT),
            Err(DisplayFormatError::UnknownTimezone(_))
        ));
        assert!(matches!(
            DisplayFormat::new("UTC", "%Q"),
            Err(DisplayFormatError::InvalidPattern(_))
        ));
    }

    #[test]
    fn rows_render_in_configured_zone_with_fallbacks() {
        let loan_at = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let ledger = build_loan_ledger(&[
            Movement::loan(1, 77, 9, 1, loan_at),
            Movement::ret(2, 77, 4, 1, loan_at),
        ]);
        let fmt = DisplayFormat::new("UTC", "%Y-%m-%d %H:%M").unwrap();
        let rows = display_rows(&ledger, &refs(), &fmt);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].articulo, ARTICLE_NOT_FOUND);
        assert_eq!(rows[0].nombre, "Camila Rojas");
        assert_eq!(rows[0].fecha_prestamo, "2024-01-15 12:00");
        assert_eq!(rows[0].fecha_regreso, MISSING_DATE);

        assert_eq!(rows[1].correo_institucional, NO_EMAIL);
        assert_eq!(rows[1].fecha_prestamo, MISSING_DATE);
        assert_eq!(rows[1].duracion, "No se encontró el Prestamo");
        assert!(rows[1].is_orphan());
        assert!(!rows[0].is_orphan());
    }

    #[test]
    fn santiago_default_shifts_from_utc() {
        // January is daylight time in Santiago (UTC-3).
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(DisplayFormat::default().render(ts), "15-01-2024 09:00:00");
    }

    #[test]
    fn filter_by_kind_and_case_insensitive_search() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let ledger = build_loan_ledger(&[
            Movement::loan(1, 77, 9, 1, t),
            Movement::loan(2, 78, 4, 1, t),
        ]);
        let rows = display_rows(&ledger, &refs(), &DisplayFormat::default());

        let by_name = RowFilter {
            kind: KindFilter::Todos,
            search: Some("CAMILA".to_string()),
        };
        assert_eq!(filter_rows(rows.clone(), &by_name).len(), 1);

        let only_returns = RowFilter {
            kind: "Regresado".parse().unwrap(),
            search: None,
        };
        assert!(filter_rows(rows.clone(), &only_returns).is_empty());

        let blank = RowFilter {
            kind: KindFilter::Todos,
            search: Some("   ".to_string()),
        };
        assert_eq!(filter_rows(rows, &blank).len(), 2);
        assert!("otro".parse::<KindFilter>().is_err());
    }
}

//! Wire records exactly as the inventory REST backend serves them.
//!
//! Nothing here is validated beyond what serde enforces. Typed domain values
//! are built from these records in `bdg-loans::ingest`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of `GET /movimientos/`.
///
/// `tipo_movimiento` stays a plain string so that a single unknown tag does
/// not fail the whole array; the ingest boundary rejects it per record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub id: u64,
    pub articulo: u64,
    #[serde(default)]
    pub personal: Option<u64>,
    pub tipo_movimiento: String,
    #[serde(default)]
    pub cantidad: i64,
    pub fecha: DateTime<Utc>,
    #[serde(default)]
    pub motivo: Option<u64>,
    #[serde(default)]
    pub comentario: Option<String>,
    #[serde(default)]
    pub estado_nuevo: Option<u64>,
    #[serde(default)]
    pub ubicacion: Option<u64>,
}

/// One row of `GET /articulos/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub id: u64,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub stock_actual: i64,
    #[serde(default)]
    pub stock_minimo: i64,
    #[serde(default)]
    pub stock_prestado: i64,
    #[serde(default)]
    pub prestado: bool,
    #[serde(default)]
    pub categoria: Option<u64>,
    #[serde(default)]
    pub marca: Option<u64>,
    #[serde(default)]
    pub modelo: Option<u64>,
    #[serde(default)]
    pub ubicacion: Option<u64>,
    #[serde(default)]
    pub estado: Option<u64>,
    #[serde(default)]
    pub codigo_interno: Option<String>,
    #[serde(default)]
    pub codigo_minvu: Option<String>,
    #[serde(default)]
    pub numero_serie: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub marca_nombre: Option<String>,
    #[serde(default)]
    pub modelo_nombre: Option<String>,
}

/// One row of `GET /personal/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonnelRecord {
    pub id: u64,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub correo_institucional: Option<String>,
    #[serde(default)]
    pub seccion: Option<String>,
}

/// One row of `GET /motivos/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotiveRecord {
    pub id: u64,
    pub nombre: String,
    #[serde(default)]
    pub descripcion: Option<String>,
}

/// Body of `POST /movimientos/`.
///
/// The backend stamps `fecha` and `usuario` itself. Fields a movement kind
/// does not use are left out of the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovementPayload {
    pub articulo: u64,
    pub tipo_movimiento: String,
    pub cantidad: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motivo: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comentario: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estado_nuevo: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRefreshResponse {
    #[serde(default)]
    pub access: Option<String>,
}

/// Everything the loan screens load in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub movimientos: Vec<MovementRecord>,
    pub articulos: Vec<ArticleRecord>,
    pub personal: Vec<PersonnelRecord>,
    #[serde(default)]
    pub motivos: Vec<MotiveRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_with_offset_is_normalised_to_utc() {
        let raw = r#"{
            "id": 7,
            "articulo": 3,
            "personal": null,
            "tipo_movimiento": "Entrada",
            "cantidad": 4,
            "fecha": "2024-10-01T09:30:00-03:00",
            "usuario": 1
        }"#;
        let m: MovementRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(m.personal, None);
        assert_eq!(m.fecha.to_rfc3339(), "2024-10-01T12:30:00+00:00");
    }

    #[test]
    fn article_tolerates_missing_optional_fields() {
        let a: ArticleRecord = serde_json::from_str(r#"{"id": 1, "nombre": "Notebook"}"#).unwrap();
        assert_eq!(a.stock_actual, 0);
        assert!(a.marca_nombre.is_none());
    }

    #[test]
    fn new_movement_omits_missing_motive() {
        let p = NewMovementPayload {
            articulo: 1,
            tipo_movimiento: "Prestamo".to_string(),
            cantidad: 2,
            personal: Some(9),
            motivo: None,
            comentario: None,
            estado_nuevo: None,
        };
        let v = serde_json::to_value(&p).unwrap();
        assert!(v.get("motivo").is_none());
        assert!(v.get("comentario").is_none());
        assert_eq!(v["personal"], 9);
    }
}

//! Ledger export artifacts.
//!
//! `exports/<export_id>/` holds `ledger.csv`, `ledger.json` and a
//! `manifest.json` stamped with the config hash that rendered the rows.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bdg_loans::DisplayRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

pub const EXPORT_SCHEMA_VERSION: i32 = 1;
pub const LEDGER_CSV: &str = "ledger.csv";
pub const LEDGER_JSON: &str = "ledger.json";
pub const MANIFEST_JSON: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportManifest {
    pub schema_version: i32,
    pub export_id: Uuid,
    pub created_at_utc: DateTime<Utc>,
    pub config_hash: String,
    pub row_count: usize,
    pub orphan_count: usize,
    pub files: ExportFiles,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFiles {
    pub ledger_csv: String,
    pub ledger_json: String,
    pub manifest_json: String,
}

pub struct ExportLedgerArgs<'a> {
    pub exports_root: &'a Path,
    pub export_id: Uuid,
    pub config_hash: &'a str,
    pub rows: &'a [DisplayRow],
}

#[derive(Debug)]
pub struct ExportLedgerResult {
    pub export_dir: PathBuf,
    pub manifest: ExportManifest,
}

/// Header row followed by one record per row, UTF-8.
pub fn write_rows_csv<W: Write>(rows: &[DisplayRow], writer: W) -> Result<()> {
    let mut w = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        // serde-driven headers are only written with the first record
        w.write_record(CSV_HEADER).context("write csv header failed")?;
    }
    for row in rows {
        w.serialize(row).context("write csv row failed")?;
    }
    w.flush().context("flush csv failed")?;
    Ok(())
}

const CSV_HEADER: [&str; 12] = [
    "id",
    "articulo_id",
    "articulo",
    "personal_id",
    "correo_institucional",
    "nombre",
    "seccion",
    "tipo_movimiento",
    "cantidad",
    "fecha_prestamo",
    "fecha_regreso",
    "duracion",
];

/// Pretty JSON array with a trailing newline.
pub fn write_rows_json<W: Write>(rows: &[DisplayRow], mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, rows).context("write json rows failed")?;
    writer.write_all(b"\n").context("write json rows failed")?;
    writer.flush().context("flush json rows failed")?;
    Ok(())
}

pub fn export_ledger(args: ExportLedgerArgs<'_>) -> Result<ExportLedgerResult> {
    let export_dir = args.exports_root.join(args.export_id.to_string());
    fs::create_dir_all(&export_dir)
        .with_context(|| format!("create export dir failed: {}", export_dir.display()))?;

    let csv_path = export_dir.join(LEDGER_CSV);
    let csv_file = fs::File::create(&csv_path)
        .with_context(|| format!("create {} failed", csv_path.display()))?;
    write_rows_csv(args.rows, csv_file)?;

    let json_path = export_dir.join(LEDGER_JSON);
    let json_file = fs::File::create(&json_path)
        .with_context(|| format!("create {} failed", json_path.display()))?;
    write_rows_json(args.rows, std::io::BufWriter::new(json_file))?;

    let manifest = ExportManifest {
        schema_version: EXPORT_SCHEMA_VERSION,
        export_id: args.export_id,
        created_at_utc: Utc::now(),
        config_hash: args.config_hash.to_string(),
        row_count: args.rows.len(),
        orphan_count: args.rows.iter().filter(|r| r.is_orphan()).count(),
        files: ExportFiles {
            ledger_csv: LEDGER_CSV.to_string(),
            ledger_json: LEDGER_JSON.to_string(),
            manifest_json: MANIFEST_JSON.to_string(),
        },
    };

    let manifest_path = export_dir.join(MANIFEST_JSON);
    let json = serde_json::to_string_pretty(&manifest).context("serialize manifest failed")?;
    fs::write(&manifest_path, format!("{json}\n"))
        .with_context(|| format!("write manifest failed: {}", manifest_path.display()))?;

    info!(
        export_id = %manifest.export_id,
        rows = manifest.row_count,
        orphans = manifest.orphan_count,
        dir = %export_dir.display(),
        "ledger exported"
    );

    Ok(ExportLedgerResult {
        export_dir,
        manifest,
    })
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    /// Accepts writes, fails the final flush.
    struct FailingFlush(Vec<u8>);

    impl Write for FailingFlush {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
    }

    #[test]
    fn json_flush_failure_is_reported() {
        let err = write_rows_json(&[], FailingFlush(Vec::new())).unwrap_err();
        assert_eq!(err.to_string(), "flush json rows failed");
        assert!(format!("{err:#}").contains("disk full"));
    }

    #[test]
    fn json_flush_failure_through_buffer_is_reported() {
        let err = write_rows_json(&[], io::BufWriter::new(FailingFlush(Vec::new()))).unwrap_err();
        assert!(format!("{err:#}").contains("disk full"));
    }
}

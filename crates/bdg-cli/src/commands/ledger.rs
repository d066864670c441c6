//! Read-only commands: ledger, outstanding, low-stock, stock-history, export.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bdg_export::{export_ledger, write_rows_csv, write_rows_json, ExportLedgerArgs};
use bdg_loans::{
    display_rows, filter_rows, outstanding_for_person, ArticleId, DisplayRow, KindFilter,
    PersonId, RowFilter,
};
use bdg_stock::{replay_history, StockBook};
use uuid::Uuid;

use super::{reconcile, AppContext};
use crate::OutputFormat;

pub async fn run_ledger(
    ctx: &AppContext,
    source: Option<&Path>,
    kind: &str,
    search: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let kind: KindFilter = kind.parse().map_err(anyhow::Error::msg)?;
    let r = reconcile(ctx, source).await?;

    let rows = display_rows(&r.ledger, &r.refs, &ctx.display);
    let rows = filter_rows(rows, &RowFilter { kind, search });

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Table => write_table(&rows, &mut out)?,
        OutputFormat::Csv => write_rows_csv(&rows, &mut out)?,
        OutputFormat::Json => write_rows_json(&rows, &mut out)?,
    }
    Ok(())
}

const TABLE_HEADER: [&str; 9] = [
    "ID", "TIPO", "ARTICULO", "NOMBRE", "CORREO", "CANT", "PRESTAMO", "REGRESO", "DURACION",
];

fn table_cells(r: &DisplayRow) -> [String; 9] {
    [
        r.id.to_string(),
        r.tipo_movimiento.clone(),
        r.articulo.clone(),
        r.nombre.clone(),
        r.correo_institucional.clone(),
        r.cantidad.to_string(),
        r.fecha_prestamo.clone(),
        r.fecha_regreso.clone(),
        r.duracion.clone(),
    ]
}

fn write_table<W: Write>(rows: &[DisplayRow], out: &mut W) -> Result<()> {
    let cells: Vec<[String; 9]> = rows.iter().map(table_cells).collect();
    let mut widths = TABLE_HEADER.map(|h| h.chars().count());
    for row in &cells {
        for (w, c) in widths.iter_mut().zip(row) {
            *w = (*w).max(c.chars().count());
        }
    }

    let header = TABLE_HEADER.map(str::to_string);
    for row in std::iter::once(&header).chain(cells.iter()) {
        let line: Vec<String> = row
            .iter()
            .zip(widths)
            .map(|(c, w)| format!("{c:<w$}"))
            .collect();
        writeln!(out, "{}", line.join("  ").trim_end())?;
    }
    writeln!(out, "rows={}", rows.len())?;
    Ok(())
}

pub async fn run_outstanding(ctx: &AppContext, source: Option<&Path>, person: u64) -> Result<()> {
    let r = reconcile(ctx, source).await?;
    let items = outstanding_for_person(&r.ledger, PersonId(person));

    let mut total = 0u64;
    for item in &items {
        total += item.cantidad;
        println!(
            "articulo_id={} cantidad={} articulo=\"{}\"",
            item.articulo,
            item.cantidad,
            r.refs.article_label(item.articulo)
        );
    }
    println!(
        "personal_id={} nombre=\"{}\" articles={} total={}",
        person,
        r.refs.person_name(PersonId(person)),
        items.len(),
        total
    );
    Ok(())
}

pub async fn run_low_stock(ctx: &AppContext, source: Option<&Path>) -> Result<()> {
    let r = reconcile(ctx, source).await?;
    let book = StockBook::from_records(&r.snapshot.articulos);
    let low = book.low_stock();

    for a in &low {
        println!(
            "articulo_id={} stock_actual={} stock_minimo={} articulo=\"{}\"",
            a.id,
            a.stock_actual,
            a.stock_minimo,
            bdg_loans::article_label(a)
        );
    }
    println!("low_stock_count={}", low.len());
    Ok(())
}

/// One line per replayed movement, oldest first, then any movement the
/// current balances cannot account for.
pub async fn run_stock_history(
    ctx: &AppContext,
    source: Option<&Path>,
    article: Option<u64>,
) -> Result<()> {
    let r = reconcile(ctx, source).await?;
    let replay = replay_history(&r.snapshot.articulos, &r.movements);
    let wanted = |id: ArticleId| article.map_or(true, |a| a == id.0);

    let mut shown = 0usize;
    for h in replay.book.history().iter().filter(|h| wanted(h.articulo)) {
        println!(
            "movement_id={} fecha=\"{}\" articulo_id={} tipo_movimiento=\"{}\" cantidad={} stock_anterior={} stock_actual={}",
            h.movement_id,
            ctx.display.render(h.fecha),
            h.articulo,
            h.tag,
            h.cantidad,
            h.stock_anterior,
            h.stock_actual
        );
        shown += 1;
    }
    for s in &replay.skipped {
        println!("skipped movement_id={} reason=\"{}\"", s.movement_id, s.error);
    }
    println!("history_rows={shown} skipped={}", replay.skipped.len());
    Ok(())
}

pub async fn run_export(ctx: &AppContext, source: Option<&Path>, out: Option<PathBuf>) -> Result<()> {
    let r = reconcile(ctx, source).await?;
    let rows = display_rows(&r.ledger, &r.refs, &ctx.display);

    let root = out.unwrap_or_else(|| PathBuf::from(&ctx.cfg.export_root));
    let result = export_ledger(ExportLedgerArgs {
        exports_root: &root,
        export_id: Uuid::new_v4(),
        config_hash: &ctx.config_hash,
        rows: &rows,
    })
    .with_context(|| format!("export under {} failed", root.display()))?;

    println!("export_id={}", result.manifest.export_id);
    println!("export_dir={}", result.export_dir.display());
    println!(
        "rows={} orphans={} rejected={}",
        result.manifest.row_count,
        result.manifest.orphan_count,
        r.rejected.len()
    );
    Ok(())
}

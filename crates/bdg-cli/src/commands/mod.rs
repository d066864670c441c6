//! Command handlers for the `bodega` binary.
//!
//! Shared loading lives here: config layering, the snapshot source (API or
//! directory) and the reconciled view every read command starts from.

pub mod checks;
pub mod ledger;
pub mod submit;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bdg_client::{load_snapshot_dir, ApiClient, Session};
use bdg_config::{report_unused_keys, resolve_secrets, AppConfig, UnusedKeyPolicy};
use bdg_loans::{
    build_loan_ledger, ingest_movements, DisplayFormat, IngestOutcome, LoanLedger, Movement,
    ReferenceTables, RejectedRecord,
};
use bdg_schemas::InventorySnapshot;
use tracing::{info, warn};

pub struct AppContext {
    pub cfg: AppConfig,
    pub config_hash: String,
    pub display: DisplayFormat,
}

impl AppContext {
    /// No paths means built-in defaults; the hash is then that of `{}`.
    pub fn load(config_paths: &[PathBuf]) -> Result<Self> {
        let loaded = bdg_config::load_layered_yaml(config_paths)?;

        let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
        for p in &report.unused_leaf_pointers {
            warn!(pointer = %p, "CONFIG_UNUSED_KEY");
        }

        let cfg = AppConfig::from_config_json(&loaded.config_json)?
            .with_env_overrides(|name| std::env::var(name).ok());
        let display = DisplayFormat::new(&cfg.timezone, &cfg.datetime_format)
            .context("invalid display settings")?;

        Ok(Self {
            cfg,
            config_hash: loaded.config_hash,
            display,
        })
    }

    pub fn api_client(&self) -> Result<ApiClient> {
        let secrets = resolve_secrets(&self.cfg);
        if secrets.access_token.is_none() && secrets.refresh_token.is_none() {
            warn!(
                access_env = %self.cfg.access_token_env,
                refresh_env = %self.cfg.refresh_token_env,
                "no tokens in environment; requests will be unauthenticated"
            );
        }
        ApiClient::from_config(&self.cfg, Session::from_secrets(&secrets))
            .context("failed to build api client")
    }
}

pub async fn load_snapshot(ctx: &AppContext, source: Option<&Path>) -> Result<InventorySnapshot> {
    match source {
        Some(dir) => load_snapshot_dir(dir),
        None => {
            let client = ctx.api_client()?;
            client
                .fetch_snapshot()
                .await
                .with_context(|| format!("fetch snapshot from {} failed", client.base_url()))
        }
    }
}

/// Snapshot plus everything derived from it.
pub struct Reconciled {
    pub snapshot: InventorySnapshot,
    /// Movements that passed ingest, in snapshot order.
    pub movements: Vec<Movement>,
    pub refs: ReferenceTables,
    pub ledger: LoanLedger,
    pub rejected: Vec<RejectedRecord>,
}

impl Reconciled {
    pub fn from_snapshot(snapshot: InventorySnapshot) -> Self {
        let IngestOutcome { movements, rejected } = ingest_movements(&snapshot.movimientos);
        let ledger = build_loan_ledger(&movements);
        let refs = ReferenceTables::from_records(&snapshot.articulos, &snapshot.personal);
        info!(
            movements = snapshot.movimientos.len(),
            rejected = rejected.len(),
            rows = ledger.rows.len(),
            orphans = ledger.stats.orphans,
            "ledger reconciled"
        );
        Self {
            snapshot,
            movements,
            refs,
            ledger,
            rejected,
        }
    }
}

pub async fn reconcile(ctx: &AppContext, source: Option<&Path>) -> Result<Reconciled> {
    Ok(Reconciled::from_snapshot(load_snapshot(ctx, source).await?))
}

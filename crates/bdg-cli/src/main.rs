use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser)]
#[command(name = "bodega")]
#[command(about = "Bodega inventory loan ledger", long_about = None)]
struct Cli {
    /// Layered config paths in merge order (base -> local ...)
    #[arg(long = "config", global = true)]
    config_paths: Vec<PathBuf>,

    /// Read the snapshot from a directory of JSON files instead of the API
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the reconciled loan history
    Ledger {
        /// todos | prestamo | regresado
        #[arg(long, default_value = "todos")]
        kind: String,

        /// Case-insensitive text search over the displayed columns
        #[arg(long)]
        search: Option<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Articles a person still has on loan
    Outstanding {
        #[arg(long)]
        person: u64,
    },

    /// Check whether a loan could be registered
    CheckLoan {
        #[arg(long)]
        person: u64,
        #[arg(long)]
        article: u64,
        #[arg(long)]
        qty: i64,
    },

    /// Check whether a return could be registered
    CheckReturn {
        #[arg(long)]
        person: u64,
        #[arg(long)]
        article: u64,
        #[arg(long)]
        qty: i64,
        /// Return timestamp (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Register a movement through the API
    Submit {
        #[arg(value_enum)]
        kind: SubmitKind,
        #[arg(long)]
        article: u64,
        /// Required for loan and return
        #[arg(long)]
        person: Option<u64>,
        /// Units moved; whole-article state changes take none
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        qty: i64,
        #[arg(long)]
        motive: Option<u64>,
        /// Target estado for cambio-estado and cambio-estado-unidad
        #[arg(long)]
        state: Option<u64>,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Articles below their minimum stock
    LowStock,

    /// Stock before and after every movement, replayed from the snapshot
    StockHistory {
        #[arg(long)]
        article: Option<u64>,
    },

    /// Write ledger.csv, ledger.json and manifest.json under a new export id
    Export {
        /// Exports root (defaults to export.root from config)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SubmitKind {
    Loan,
    Return,
    Entrada,
    Salida,
    CambioEstado,
    CambioEstadoUnidad,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    if let Commands::ConfigHash { paths } = &cli.cmd {
        let loaded = bdg_config::load_layered_yaml(paths)?;
        println!("config_hash={}", loaded.config_hash);
        println!("{}", loaded.canonical_json);
        return Ok(());
    }

    let ctx = commands::AppContext::load(&cli.config_paths)?;
    let source = cli.snapshot.as_deref();

    match cli.cmd {
        Commands::Ledger {
            kind,
            search,
            format,
        } => commands::ledger::run_ledger(&ctx, source, &kind, search, format).await,
        Commands::Outstanding { person } => {
            commands::ledger::run_outstanding(&ctx, source, person).await
        }
        Commands::CheckLoan {
            person,
            article,
            qty,
        } => commands::checks::run_check_loan(&ctx, source, person, article, qty).await,
        Commands::CheckReturn {
            person,
            article,
            qty,
            at,
        } => {
            let at = at.unwrap_or_else(Utc::now);
            commands::checks::run_check_return(&ctx, source, person, article, qty, at).await
        }
        Commands::Submit {
            kind,
            article,
            person,
            qty,
            motive,
            state,
            comment,
        } => {
            let args = commands::submit::SubmitArgs {
                kind,
                article,
                person,
                qty,
                motive,
                state,
                comment,
            };
            commands::submit::run_submit(&ctx, source, args).await
        }
        Commands::LowStock => commands::ledger::run_low_stock(&ctx, source).await,
        Commands::StockHistory { article } => {
            commands::ledger::run_stock_history(&ctx, source, article).await
        }
        Commands::Export { out } => commands::ledger::run_export(&ctx, source, out).await,
        Commands::ConfigHash { .. } => Ok(()),
    }
}

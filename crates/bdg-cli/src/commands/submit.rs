//! `bodega submit <kind>`: checks locally, then posts to the backend.

use std::path::Path;

use anyhow::{bail, Context, Result};
use bdg_loans::{
    check_loan_request, check_return_request, ArticleId, LoanRequest, Movement, MovementKind,
    PersonId, ReturnRequest, StateId,
};
use bdg_schemas::{MotiveRecord, NewMovementPayload};
use bdg_stock::StockBook;
use chrono::{DateTime, Utc};
use tracing::info;

use super::{AppContext, Reconciled};
use crate::SubmitKind;

/// Motive used for loans and returns when none is given, matched
/// case-insensitively.
pub const DEFAULT_MOTIVE_NAME: &str = "solicitud de personal";
pub const ENTRADA_MOTIVE_NAME: &str = "entrada de stock";
pub const SALIDA_MOTIVE_NAME: &str = "salida de stock";

pub struct SubmitArgs {
    pub kind: SubmitKind,
    pub article: u64,
    pub person: Option<u64>,
    pub qty: i64,
    pub motive: Option<u64>,
    pub state: Option<u64>,
    pub comment: Option<String>,
}

fn motive_named<'a>(motives: &'a [MotiveRecord], name: &str) -> Option<&'a MotiveRecord> {
    motives
        .iter()
        .find(|m| m.nombre.trim().to_lowercase() == name)
}

fn default_motive(kind: SubmitKind, motives: &[MotiveRecord]) -> Option<u64> {
    let name = match kind {
        SubmitKind::Loan | SubmitKind::Return => DEFAULT_MOTIVE_NAME,
        SubmitKind::Entrada => ENTRADA_MOTIVE_NAME,
        SubmitKind::Salida => SALIDA_MOTIVE_NAME,
        SubmitKind::CambioEstado | SubmitKind::CambioEstadoUnidad => return None,
    };
    motive_named(motives, name).map(|m| m.id)
}

fn default_comment(kind: SubmitKind, state: Option<u64>, motive: Option<&MotiveRecord>) -> Option<String> {
    let by_motive = motive.map_or_else(String::new, |m| format!(" por motivo \"{}\"", m.nombre));
    match (kind, state) {
        (SubmitKind::Entrada, _) => Some("Entrada de stock".to_string()),
        (SubmitKind::Salida, _) => Some("Salida de stock".to_string()),
        (SubmitKind::CambioEstado, Some(s)) => Some(format!("Cambio de estado a estado {s}{by_motive}")),
        (SubmitKind::CambioEstadoUnidad, Some(s)) => {
            Some(format!("Cambio de estado por unidad a estado {s}{by_motive}"))
        }
        _ => None,
    }
}

fn require_person(args: &SubmitArgs) -> Result<PersonId> {
    match args.person {
        Some(p) => Ok(PersonId(p)),
        None => bail!("submit {:?} requires --person", args.kind),
    }
}

fn require_state(args: &SubmitArgs) -> Result<StateId> {
    match args.state {
        Some(s) => Ok(StateId(s)),
        None => bail!("submit {:?} requires --state", args.kind),
    }
}

/// Typed movement for `args`, after the loan form's own checks.
fn local_movement(r: &Reconciled, args: &SubmitArgs, now: DateTime<Utc>) -> Result<Movement> {
    let articulo = ArticleId(args.article);
    let kind = match args.kind {
        SubmitKind::Loan => {
            let personal = require_person(args)?;
            let req = LoanRequest {
                articulo,
                personal,
                cantidad: args.qty,
            };
            if let Err(e) = check_loan_request(&r.refs, &req) {
                bail!("LOAN_REFUSED articulo_id={articulo} personal_id={personal}: {e}");
            }
            MovementKind::Prestamo { personal }
        }
        SubmitKind::Return => {
            let personal = require_person(args)?;
            let req = ReturnRequest {
                articulo,
                personal,
                cantidad: args.qty,
                fecha: now,
            };
            if let Err(e) = check_return_request(&r.ledger, &req) {
                bail!("RETURN_REFUSED articulo_id={articulo} personal_id={personal}: {e}");
            }
            MovementKind::Regresado { personal }
        }
        SubmitKind::Entrada => MovementKind::Entrada,
        SubmitKind::Salida => MovementKind::Salida,
        SubmitKind::CambioEstado => MovementKind::CambioEstado {
            estado_nuevo: Some(require_state(args)?),
        },
        SubmitKind::CambioEstadoUnidad => MovementKind::CambioEstadoPorUnidad {
            estado_nuevo: require_state(args)?,
        },
    };

    let cantidad =
        u32::try_from(args.qty).with_context(|| format!("cantidad {} out of range", args.qty))?;
    Ok(Movement::new(0, args.article, cantidad, now, kind))
}

fn payload(m: &Movement, motivo: Option<u64>) -> NewMovementPayload {
    let (personal, estado_nuevo) = match &m.kind {
        MovementKind::Prestamo { personal } | MovementKind::Regresado { personal } => {
            (Some(personal.0), None)
        }
        MovementKind::CambioEstado { estado_nuevo } => (None, estado_nuevo.map(|s| s.0)),
        MovementKind::CambioEstadoPorUnidad { estado_nuevo } => (None, Some(estado_nuevo.0)),
        _ => (None, None),
    };
    NewMovementPayload {
        articulo: m.articulo.0,
        tipo_movimiento: m.tag().as_str().to_string(),
        cantidad: m.cantidad,
        personal,
        motivo,
        comentario: m.comentario.clone(),
        estado_nuevo,
    }
}

pub async fn run_submit(ctx: &AppContext, source: Option<&Path>, args: SubmitArgs) -> Result<()> {
    if source.is_some() {
        bail!("submit requires the REST API; drop --snapshot");
    }
    if matches!(args.kind, SubmitKind::CambioEstado | SubmitKind::CambioEstadoUnidad)
        && args.motive.is_none()
    {
        bail!("submit {:?} requires --motive", args.kind);
    }

    let client = ctx.api_client()?;
    let snapshot = client
        .fetch_snapshot()
        .await
        .with_context(|| format!("fetch snapshot from {} failed", client.base_url()))?;
    let r = Reconciled::from_snapshot(snapshot);

    let motivo = args
        .motive
        .or_else(|| default_motive(args.kind, &r.snapshot.motivos));
    let motive = motivo.and_then(|id| r.snapshot.motivos.iter().find(|m| m.id == id));

    let mut movement = local_movement(&r, &args, Utc::now())?;
    movement.comentario = args
        .comment
        .clone()
        .or_else(|| default_comment(args.kind, args.state, motive));
    let tag = movement.tag();

    // the backend applies the same stock rules; refuse early if it would
    let change = StockBook::from_records(&r.snapshot.articulos)
        .apply(&movement)
        .with_context(|| format!("{tag} refused by stock rules"))?;

    let created = client
        .submit_movement(&payload(&movement, motivo))
        .await
        .with_context(|| format!("submit {tag} failed"))?;

    info!(movement_id = created.id, tag = %tag, "movement created");
    println!(
        "movement_id={} tipo_movimiento=\"{}\" articulo_id={} cantidad={} stock_anterior={} stock_actual={}",
        created.id,
        created.tipo_movimiento,
        created.articulo,
        movement.cantidad,
        change.stock_anterior,
        change.stock_actual
    );
    Ok(())
}

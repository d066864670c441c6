use std::path::Path;

use anyhow::{bail, Result};
use bdg_loans::{
    check_loan_request, check_return_request, ArticleId, LoanKey, LoanRequest, PersonId,
    ReturnRequest,
};
use chrono::{DateTime, Utc};

use super::{reconcile, AppContext};

pub async fn run_check_loan(
    ctx: &AppContext,
    source: Option<&Path>,
    person: u64,
    article: u64,
    qty: i64,
) -> Result<()> {
    let r = reconcile(ctx, source).await?;
    let req = LoanRequest {
        articulo: ArticleId(article),
        personal: PersonId(person),
        cantidad: qty,
    };
    if let Err(e) = check_loan_request(&r.refs, &req) {
        bail!("LOAN_REFUSED articulo_id={article} personal_id={person}: {e}");
    }

    let available = r
        .refs
        .article(ArticleId(article))
        .map_or(0, |a| a.stock_actual);
    println!(
        "loan_ok=true articulo_id={article} personal_id={person} cantidad={qty} available={available}"
    );
    Ok(())
}

pub async fn run_check_return(
    ctx: &AppContext,
    source: Option<&Path>,
    person: u64,
    article: u64,
    qty: i64,
    at: DateTime<Utc>,
) -> Result<()> {
    let r = reconcile(ctx, source).await?;
    let req = ReturnRequest {
        articulo: ArticleId(article),
        personal: PersonId(person),
        cantidad: qty,
        fecha: at,
    };
    if let Err(e) = check_return_request(&r.ledger, &req) {
        bail!("RETURN_REFUSED articulo_id={article} personal_id={person}: {e}");
    }

    let outstanding = r
        .ledger
        .outstanding(&LoanKey::new(ArticleId(article), PersonId(person)));
    println!(
        "return_ok=true articulo_id={article} personal_id={person} cantidad={qty} outstanding={outstanding}"
    );
    Ok(())
}

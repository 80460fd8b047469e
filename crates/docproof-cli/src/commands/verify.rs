//! `docproof verify`

use super::{operator_error, Handlers};
use anyhow::Result;
use clap::Args;
use docproof_ledger::VerifyWorkflow;
use serde_json::json;

/// Check whether a document's digest is anchored
#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Document identifier
    pub document_id: String,
}

pub async fn run(args: VerifyArgs, handlers: Handlers) -> Result<()> {
    let state = VerifyWorkflow::new(handlers.target)
        .run(&handlers.connection, &handlers.digests, &args.document_id)
        .await;
    let (digest, anchored) = state.into_result().map_err(|e| operator_error(&e))?;

    let report = json!({
        "document_id": args.document_id,
        "digest": digest,
        "chain_id": handlers.target.chain_id,
        "contract": handlers.target.contract,
        "anchored": anchored,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

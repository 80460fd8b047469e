//! `docproof anchor`

use super::{operator_error, Handlers};
use anyhow::{bail, Result};
use clap::Args;
use docproof_ledger::{AnchorState, AnchorWorkflow};
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

/// Anchor a document's digest on the ledger
#[derive(Debug, Args)]
pub struct AnchorArgs {
    /// Document identifier, written alongside the digest
    pub document_id: String,

    /// Stop waiting for confirmation after this many seconds
    #[arg(long)]
    pub confirm_timeout_secs: Option<u64>,
}

pub async fn run(args: AnchorArgs, handlers: Handlers) -> Result<()> {
    let (sender, receiver) = watch::channel(AnchorState::Idle);
    let workflow = AnchorWorkflow::new(handlers.target).with_progress(sender);
    let reporter = tokio::spawn(report_progress(receiver.clone()));

    let run = workflow.run(&handlers.connection, &handlers.digests, &args.document_id);
    let state = match args.confirm_timeout_secs {
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), run).await {
            Ok(state) => state,
            Err(_) => {
                let last = receiver.borrow().clone();
                reporter.abort();
                match last.transaction() {
                    Some(tx) => bail!(
                        "no confirmation within {secs}s; transaction {} is still pending \
                         and may be included later",
                        tx.handle.tx_hash
                    ),
                    None => bail!("anchor did not complete within {secs}s"),
                }
            }
        },
        None => run.await,
    };
    drop(workflow);
    // the reporter exits once the workflow's sender is gone
    let _ = reporter.await;

    match state.into_result() {
        Ok(receipt) => {
            println!("{}", serde_json::to_string_pretty(&receipt)?);
            Ok(())
        }
        Err(error) => Err(operator_error(&error)),
    }
}

async fn report_progress(mut receiver: watch::Receiver<AnchorState>) {
    while receiver.changed().await.is_ok() {
        let state = receiver.borrow_and_update().clone();
        if let Some(phase) = state.phase() {
            info!(phase = %phase, "anchor progress");
        }
        if let AnchorState::AwaitingConfirmation { transaction, .. } = &state {
            info!(tx_hash = %transaction.handle.tx_hash, "waiting for confirmation");
        }
    }
}

//! `docproof diagnose`
//!
//! Runs the passive probe and prints its JSON result. Exits successfully
//! whatever the outcome; the result itself says what is wrong.

use anyhow::Result;
use docproof_core::ProofConfig;
use docproof_effects::JsonRpcConnection;
use docproof_ledger::DiagnosticsProbe;
use tracing::warn;

pub async fn run(config: &ProofConfig) -> Result<()> {
    let probe = DiagnosticsProbe::from_config(config)?;
    let connection = match JsonRpcConnection::from_config(config) {
        Ok(connection) => Some(connection),
        Err(e) => {
            warn!(error = %e, "no ledger connection for diagnostics");
            None
        }
    };

    let result = probe.run(connection.as_ref()).await;
    eprintln!("{}", result.summary());
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

//! Configuration loading for the CLI
//!
//! Defaults, then the TOML file when it exists, then `DOCPROOF_*`
//! environment variables, then command-line overrides.

use anyhow::{Context, Result};
use clap::Args;
use docproof_core::ProofConfig;
use std::path::Path;

/// Command-line overrides, highest precedence
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigOverrides {
    /// Target chain id (decimal or 0x hex)
    #[arg(long, global = true)]
    pub chain_id: Option<String>,

    /// Anchor contract address
    #[arg(long = "contract", global = true)]
    pub contract_address: Option<String>,

    /// JSON-RPC endpoint
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,

    /// Document service base URL
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Bearer token for the document service
    #[arg(long, global = true)]
    pub auth_token: Option<String>,
}

impl ConfigOverrides {
    fn pairs(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("chain_id", &self.chain_id),
            ("contract_address", &self.contract_address),
            ("rpc_url", &self.rpc_url),
            ("api_base", &self.api_base),
            ("auth_token", &self.auth_token),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
    }
}

/// Resolve the effective configuration
///
/// A missing file at `path` is not an error; an unreadable or invalid one is.
pub fn load_config(path: &Path, overrides: &ConfigOverrides) -> Result<ProofConfig> {
    let mut config = if path.exists() {
        ProofConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        ProofConfig::default()
    };
    config
        .merge_with_env()
        .context("applying DOCPROOF_* environment")?;
    apply_overrides(&mut config, overrides)?;
    Ok(config)
}

fn apply_overrides(config: &mut ProofConfig, overrides: &ConfigOverrides) -> Result<()> {
    for (key, value) in overrides.pairs() {
        config
            .set_from_string(key, value)
            .with_context(|| format!("applying --{}", key.replace('_', "-")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_overrides_win_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "chain_id = \"1\"\ncontract_address = \"0x5fbdb2315678afecb367f032d93f642f64180aa3\""
        )
        .unwrap();

        let mut config = ProofConfig::load_from_file(file.path()).unwrap();
        apply_overrides(
            &mut config,
            &ConfigOverrides {
                chain_id: Some("11155111".to_string()),
                ..ConfigOverrides::default()
            },
        )
        .unwrap();

        assert_eq!(config.chain_id.as_deref(), Some("11155111"));
        assert!(config.ledger_target().is_ok());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = load_config(&path, &ConfigOverrides::default()).unwrap();
        assert_eq!(config.rpc_url, ProofConfig::default().rpc_url);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "chain_id = [").unwrap();
        let result = load_config(file.path(), &ConfigOverrides::default());
        assert!(result.is_err());
    }
}

//! `docproof networks`

use anyhow::Result;
use docproof_core::KNOWN_NETWORKS;

pub fn run(json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(KNOWN_NETWORKS)?);
        return Ok(());
    }
    for network in KNOWN_NETWORKS {
        println!(
            "{:>10}  {:<18} {}",
            network.chain_id.value(),
            network.name,
            network.rpc_urls.join(", ")
        );
    }
    Ok(())
}

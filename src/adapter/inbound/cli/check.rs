//! Handler for the `check` command.

use std::path::Path;

use crate::error::Result;
use crate::infrastructure::bootstrap::build_groups;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::exchange::ExchangeFactory;

/// Validate the configuration, resolve every group and print them.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or a group cannot be
/// resolved.
pub async fn execute<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    let config = Config::load(path)?;

    println!("Configuration: {}", path.display());
    println!("  dry run:     {}", config.dry_run);
    println!("  strategies:  {}", config.strategies.enabled().join(", "));
    println!("  max spend:   {}", config.max_spend);
    println!(
        "  wallet:      {}",
        if config.wallet.private_key.is_some() {
            "WALLET_PRIVATE_KEY set"
        } else {
            "WALLET_PRIVATE_KEY not set"
        }
    );

    let client = ExchangeFactory::create_client(&config);
    let groups = build_groups(&config, client.as_ref()).await?;

    for group in &groups {
        println!();
        println!(
            "{} ({} outcomes, budget {})",
            group.name(),
            group.len(),
            group.effective_budget(config.max_spend)
        );
        for token in group.outcomes() {
            println!("  {:<24} {}", group.display_name(token), token);
        }
    }

    println!();
    println!("Configuration is valid");
    Ok(())
}

//! Handler for the `run` command.

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

use crate::adapter::inbound::cli::command::RunArgs;
use crate::error::{Error, Result};
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::orchestration::Engine;

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the engine cannot be
/// built (group resolution, order service authentication).
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;
    if args.dry_run {
        config.dry_run = true;
    }
    config.init_logging();

    info!(
        config = %args.config.display(),
        dry_run = config.dry_run,
        markets = config.markets.len(),
        "negrisk starting"
    );

    let engine = Engine::from_config(config).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut handle = tokio::spawn(engine.run_with_shutdown(shutdown_rx));

    tokio::select! {
        result = &mut handle => return map_engine_result(result),
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received (Ctrl+C)");
            let _ = shutdown_tx.send(true);
        }
    }

    map_engine_result(handle.await)
}

fn map_engine_result(result: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => {
            error!(error = %error, "Engine exited with error");
            Err(error)
        }
        Err(error) => {
            error!(error = %error, "Engine task join failed");
            Err(Error::Connection(error.to_string()))
        }
    }
}

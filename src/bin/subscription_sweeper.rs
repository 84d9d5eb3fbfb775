use anyhow::{Result, bail};
use matchmaking_core::{AppConfig, AppState, init_logging};
use std::env;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Once,
    Daemon,
}

fn usage() -> &'static str {
    "Usage: subscription-sweeper [--once]"
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<Mode> {
    let mut mode = Mode::Daemon;
    for arg in args {
        match arg.as_str() {
            "--once" => mode = Mode::Once,
            "-h" | "--help" => {
                println!("{}", usage());
                std::process::exit(0);
            }
            other => bail!("Unknown argument: {other}\n{}", usage()),
        }
    }
    Ok(mode)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let mode = parse_args(env::args().skip(1))?;

    let config = AppConfig::from_env();
    info!(
        database_url = %config.database.url,
        sweep_interval_secs = config.subscription.sweep_interval_secs,
        "subscription sweeper starting"
    );
    let state = AppState::new(config).await?;

    match mode {
        Mode::Once => {
            let report = state.expiry_sweep_job.run_once().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Mode::Daemon => {
            let handle = state.expiry_sweep_job.clone().spawn();
            tokio::signal::ctrl_c().await?;
            info!("shutdown requested");
            handle.abort();
        }
    }

    state.repository.close().await;
    Ok(())
}

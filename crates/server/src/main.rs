//! Simple test harness for the recommendation orchestrator.
//!
//! Usage: `server <seed1> <seed2> [config.toml]`
//!
//! Prints the match as JSON. The access token is read from the variable
//! named in the config (`SPOTIFY_ACCESS_TOKEN` by default).

use std::path::PathBuf;

use anyhow::{bail, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use server::{Engine, EngineConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,server=debug,similarity=debug")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (seed1, seed2) = match args.as_slice() {
        [seed1, seed2, ..] => (seed1.clone(), seed2.clone()),
        _ => bail!("usage: server <seed1> <seed2> [config.toml]"),
    };
    let config_path = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config/song-match.toml"));

    info!("Loading configuration from {}", config_path.display());
    let config = EngineConfig::load(&config_path)?;
    let engine = Engine::start(config).await?;

    let outcome = engine.orchestrator().recommend(&seed1, &seed2).await;
    engine.shutdown().await;

    match outcome {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(err) => {
            error!("Recommendation failed ({:?}): {}", err.kind(), err);
            Err(err.into())
        }
    }
}

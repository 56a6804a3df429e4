//! eiendom - a local map server for GPX tracks and Kartverket property
//! polygons.
//!
//! `eiendom serve` (the default) serves the static frontend, lists GPX
//! tracks, proxies point lookups and answers `/api/owner_properties` from a
//! geometry cache. `eiendom prefetch` writes every owner's polygons to a
//! static GeoJSON file instead.

mod cli;
mod logging;
mod prefetch;
mod server;
mod tracks;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Command};
use eiendom_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(owners) = cli.owners {
        config.owners_path = owners;
    }

    let _log_guard = logging::init_tracing(config.log_dir.as_deref())?;

    match cli.command.unwrap_or(Command::Serve {
        port: None,
        bind: None,
    }) {
        Command::Serve { port, bind } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(bind) = bind {
                config.bind = bind;
            }
            info!(addr = %config.addr(), "eiendom starting");
            server::start_server(config).await
        }
        Command::Prefetch { output, first_only } => {
            let output = output.unwrap_or_else(|| config.prefetch_output.clone());
            prefetch::run(&config, &output, !first_only).await?;
            Ok(())
        }
    }
}

//! tutorgate-server - HTTP front end for the tutor router
//!
//! Serves the router entry point and per-session chat endpoints.
//! See `tutorgate_core::api` for the route table.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tutorgate_core::api::{self, AppState};
use tutorgate_core::{Config, Mode, TutorRouter};

#[derive(Parser)]
#[command(name = "tutorgate-server")]
#[command(about = "Serve the tutor router over HTTP")]
#[command(version)]
struct Args {
    /// Address to listen on (overrides [server] bind)
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    let config = Config::load().context("failed to load configuration")?;

    let _log_guard =
        tutorgate_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let router = TutorRouter::from_config(&config).context("failed to build backends")?;
    tracing::info!(
        socratic = ?router.backend_names(Mode::Socratic),
        direct = ?router.backend_names(Mode::Direct),
        "tutorgate-server starting"
    );

    let bind = args.bind.unwrap_or(config.server.bind);
    println!("tutorgate-server listening on http://{}", bind);

    let session_ttl = Duration::from_secs(config.server.session_ttl_secs);
    api::serve(&bind, AppState::new(router, session_ttl))
        .await
        .with_context(|| format!("server on {} failed", bind))?;

    Ok(())
}

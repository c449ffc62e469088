// Arithmetic quiz daemon: transport, round scheduler, export on shutdown.

mod config;
mod transport;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use arith_core::{Session, SvgDataUri};
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// arith-server - timed arithmetic quiz
#[derive(Parser, Debug)]
#[command(name = "arith-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the config file
    #[arg(short, long)]
    listen: Option<String>,

    /// CSV export path, overrides the config file
    #[arg(short, long)]
    export: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut cfg = config::load(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        cfg.listen_addr = listen;
    }
    if let Some(export) = args.export {
        cfg.export_path = Some(export);
    }

    let session = Session::new(
        Session::generate_code(),
        cfg.round.clone(),
        Box::new(SvgDataUri),
    )?;
    tracing::info!(
        session = session.code(),
        testing = cfg.round.testing,
        trial_delay = cfg.round.trial_delay,
        round_seconds = cfg.round.round_seconds,
        "session created"
    );
    let session = Arc::new(tokio::sync::Mutex::new(session));

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let listener = tokio::net::TcpListener::bind(&cfg.listen_addr)
            .await
            .with_context(|| format!("binding {}", cfg.listen_addr))?;
        tracing::info!(addr = %cfg.listen_addr, "listening");
        let transport = tokio::spawn(transport::run_transport(listener, session.clone()));

        tokio::select! {
            res = shutdown_signal() => res?,
            res = transport => {
                res.context("transport task failed")?
                    .context("transport stopped")?;
            }
        }
        tracing::info!("shutting down");

        let mut s = session.lock().await;
        let closed = s.end_all_rounds();
        tracing::info!(closed, "open rounds ended");
        if let Some(path) = &cfg.export_path {
            export(&s, path)?;
        }
        anyhow::Ok(())
    })?;
    Ok(())
}

fn export(session: &Session, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating export {}", path.display()))?;
    session
        .write_csv(std::io::BufWriter::new(file))
        .with_context(|| format!("writing export {}", path.display()))?;
    tracing::info!(path = %path.display(), "trials exported");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM (Unix).
async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }
    Ok(())
}

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use jsonlink_core::BraceMatching;
use jsonlink_serial::{FrameExtractor, SerialConfig, SerialTransport};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod menu;

use menu::{Menu, Session};

/// JSON commands dispatcher for a serial-attached controller.
///
/// Flags override the JSONLINK_* environment (and `.env`).
#[derive(Debug, Parser)]
#[command(name = "jsonlink", version)]
struct Cli {
    /// Serial device node
    #[arg(short, long)]
    device: Option<String>,

    /// Speed of serial communication in baud
    #[arg(short, long)]
    speed: Option<u32>,

    /// Write/read attempts per command before giving up
    #[arg(long)]
    retries: Option<u32>,

    /// Maximum bytes read per attempt
    #[arg(long)]
    chunk_bytes: Option<usize>,

    #[arg(long)]
    read_timeout_ms: Option<u64>,

    /// Pair braces by depth instead of first closing brace
    #[arg(long)]
    balanced_braces: bool,
}

impl Cli {
    fn apply(self, mut cfg: SerialConfig) -> SerialConfig {
        if let Some(device) = self.device {
            cfg.device = device;
        }
        if let Some(speed) = self.speed {
            cfg.baud_rate = speed;
        }
        if let Some(retries) = self.retries {
            cfg.max_retries = retries;
        }
        if let Some(bytes) = self.chunk_bytes {
            cfg.max_chunk_bytes = bytes;
        }
        if let Some(ms) = self.read_timeout_ms {
            cfg.read_timeout_ms = ms;
        }
        if self.balanced_braces {
            cfg.brace_matching = BraceMatching::Balanced;
        }
        cfg
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let config = Cli::parse().apply(SerialConfig::from_env());
    info!(
        device = %config.device,
        baud = config.baud_rate,
        retries = config.max_retries,
        brace_matching = %config.brace_matching,
        "Starting JSON command session"
    );

    let transport = SerialTransport::open(&config)
        .with_context(|| format!("failed to open serial device {}", config.device))?;
    let running = Arc::new(AtomicBool::new(true));
    let extractor =
        FrameExtractor::new(config.extractor_config()).with_running_flag(running.clone());
    let title = format!("[JSON commands dispatcher on {}]", transport.device());
    info!(device = transport.device(), "Serial session ready");
    // Long enough for an in-flight extraction to see the cleared flag.
    let grace = config.read_timeout() * config.max_retries.max(1);

    let session_running = running.clone();
    let mut session = tokio::task::spawn_blocking(move || {
        let menu = Menu::new(title);
        let mut session = Session::new(transport, extractor, session_running);
        let mut stdout = io::stdout();
        session.run(&menu, io::stdin().lock(), &mut stdout)
    });

    tokio::select! {
        res = &mut session => {
            res.context("session task failed")??;
        }
        _ = shutdown_signal() => {
            running.store(false, Ordering::Relaxed);
            info!("Interrupt received; closing serial session");
            // The session thread may be parked on stdin, so don't wait on it forever.
            let outcome = tokio::time::timeout(grace, &mut session)
                .await
                .ok()
                .map(|res| res.context("session task failed").and_then(|r| r));
            report_shutdown(outcome, &mut io::stdout())?;
            std::process::exit(0);
        }
    }

    Ok(())
}

/// `None` means the session did not finish within the grace period and so
/// never printed its own closing line.
fn report_shutdown<W: io::Write>(outcome: Option<anyhow::Result<()>>, out: &mut W) -> io::Result<()> {
    match outcome {
        Some(Ok(())) => Ok(()),
        Some(Err(e)) => {
            warn!(error = %format!("{e:#}"), "Session ended with an error during shutdown");
            Ok(())
        }
        None => writeln!(out, "Cleaning and closing"),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,jsonlink_serial=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install signal handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

//! Tilawa Sync - Main entry point
//!
//! Headless synchronization service: a simulated output device stands in
//! for real audio, and the HTTP/SSE API stands in for the rendering surface.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tilawa_common::config::SyncConfig;
use tilawa_common::events::EventBus;
use tilawa_sync::api::{self, AppContext};
use tilawa_sync::content::memory::{DEMO_CONTINUOUS_PREFIX, DEMO_SEGMENTED_VOICE};
use tilawa_sync::content::{AlQuranCloud, ContentProvider, InMemoryContent};
use tilawa_sync::engine::SyncEngine;
use tilawa_sync::media::simulated::SimulatedDevice;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for tilawa-sync
#[derive(Parser, Debug)]
#[command(name = "tilawa-sync")]
#[command(about = "Playback synchronization engine for recited text")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long, env = "TILAWA_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "TILAWA_PORT")]
    port: Option<u16>,

    /// Section opened at startup (overrides config)
    #[arg(short, long, env = "TILAWA_SECTION")]
    section: Option<u32>,

    /// Voice used at startup (overrides config)
    #[arg(short, long, env = "TILAWA_VOICE")]
    voice: Option<String>,

    /// Serve the built-in demo library instead of the network provider
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, config_path) = SyncConfig::load_resolved(args.config.as_deref())
        .context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    let default_filter = format!(
        "tilawa_sync={level},tilawa_common={level},tower_http=info",
        level = config.logging.level
    );
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tilawa Sync v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: built-in defaults"),
    }

    let content: Arc<dyn ContentProvider> = if args.offline {
        info!("Offline mode: serving the demo library");
        Arc::new(InMemoryContent::demo().context("Failed to build demo library")?)
    } else {
        Arc::new(
            AlQuranCloud::new(&config.content).context("Failed to create content provider")?,
        )
    };

    // Whole-section recordings last much longer than single units
    let mut continuous_prefixes: Vec<String> = config
        .content
        .continuous_voices
        .iter()
        .map(|v| v.url_prefix.clone())
        .collect();
    continuous_prefixes.push(DEMO_CONTINUOUS_PREFIX.to_string());
    let unit_secs = config.simulation.unit_duration_secs;
    let section_secs = config.simulation.section_duration_secs;

    let (media_tx, media_rx) = mpsc::unbounded_channel();
    let device = SimulatedDevice::new(config.simulation.clone(), media_tx).with_durations(
        move |locator| {
            if continuous_prefixes.iter().any(|p| locator.starts_with(p.as_str())) {
                Some(section_secs)
            } else {
                Some(unit_secs)
            }
        },
    );

    let events = EventBus::new(config.events.capacity);
    let engine = SyncEngine::new(&config, device.slot_pair(), events);
    let (handle, engine_task) = engine.spawn(media_rx);

    let section = args.section.unwrap_or(config.content.default_section);
    let voice = match (args.voice, args.offline) {
        (Some(voice), _) => voice,
        (None, true) => DEMO_SEGMENTED_VOICE.to_string(),
        (None, false) => config.content.default_voice.clone(),
    };
    // The service stays up without an initial section; POST /section retries
    if let Err(e) = handle.open_section(content.as_ref(), section, &voice).await {
        warn!("Initial section {} in voice {} not loaded: {}", section, voice, e);
    }

    let addr: SocketAddr = format!(
        "{}:{}",
        config.server.host,
        args.port.unwrap_or(config.server.port)
    )
    .parse()
    .context("Invalid server address")?;

    let ctx = AppContext {
        engine: handle.clone(),
        content,
        config: Arc::new(config),
    };
    api::run(ctx, addr, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    if let Err(e) = handle.teardown().await {
        warn!("Engine teardown: {}", e);
    }
    drop(handle);
    engine_task.await.context("Engine task panicked")?;

    info!("Tilawa Sync stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

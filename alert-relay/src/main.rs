//! Alert relay - Main entry point
//!
//! Serves image uploads, the stop-alarm command and the alert event
//! channel, and drives the local alarm sound.

use std::sync::Arc;

use alert_relay::api::{self, AppContext};
use alert_relay::audio::output::AudioOutput;
use alert_relay::audio::{AudioSink, CpalSink};
use alert_relay::config::{Args, Config};
use alert_relay::images::ImageStore;
use alert_relay::logging;
use alert_relay::{AlarmPlayer, SharedState};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    if args.list_devices {
        for name in AudioOutput::list_devices().context("Failed to list audio devices")? {
            println!("{}", name);
        }
        return Ok(());
    }

    // Logging first so configuration loading is visible
    let logs = logging::init();

    let config = Config::load(&args).context("Failed to load configuration")?;
    if let Err(e) = logs.apply_level(&config.log_level) {
        warn!("Keeping default log level: {}", e);
    }

    info!(
        "Starting alert-relay v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    // Image directory must exist before the first upload
    let images = ImageStore::new(&config.image_dir);
    images
        .ensure_dir()
        .await
        .with_context(|| format!("Failed to create image directory {}", config.image_dir.display()))?;
    info!("Images saved to {}", config.image_dir.display());

    // Audio failure is not fatal: the relay runs without an alarm
    let device = config.audio_device.clone();
    let volume = config.volume;
    let output = match tokio::task::spawn_blocking(move || CpalSink::open(device, volume))
        .await
        .context("Audio initialization task failed")?
    {
        Ok(sink) => {
            info!("Audio output ready: {}", sink.describe());
            Some(Arc::new(sink) as Arc<dyn AudioSink>)
        }
        Err(e) => {
            warn!("Audio subsystem unavailable, alarm disabled: {}", e);
            None
        }
    };

    let state = Arc::new(SharedState::new());
    let alarm = Arc::new(AlarmPlayer::new(
        &config.alarm_sound,
        output,
        Arc::clone(&state),
    ));
    if !config.alarm_sound.exists() {
        warn!(
            "Alarm sound {} not found; alerts will not be audible",
            config.alarm_sound.display()
        );
    }

    let ctx = AppContext::new(state, Arc::clone(&alarm), images);
    let app = api::create_router(ctx, config.max_upload_bytes);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    api::run(listener, app, shutdown_signal())
        .await
        .context("Server error")?;

    if alarm.is_initialized() {
        if let Err(e) = alarm.stop() {
            error!("Failed to halt alarm on shutdown: {}", e);
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

//! Timebell server binary.
//!
//! Starts the hourly announcement scheduler and an axum HTTP server with
//! structured logging, and shuts both down on SIGTERM/SIGINT.

use std::net::SocketAddr;
use std::sync::Arc;
use timebell_server::config::{self, AppConfig};
use timebell_server::{app, AppState, Scheduler, SystemClock, TICK_PERIOD};
use timebell_store::ConfigStore;
use timebell_voice::{AnnouncementPipeline, PlaybackEngine, TtsClient};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Opens the announcement config, falling back to an empty one when the
/// stored file is unusable. The bad file is left alone until the next save.
fn open_store(config: &AppConfig) -> ConfigStore {
    let path = &config.storage.config_path;
    match ConfigStore::open(path) {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "could not load announcement config, starting empty"
            );
            ConfigStore::empty(path)
        }
    }
}

#[tokio::main]
async fn main() {
    let (settings_path, settings_source) = config::settings_path(
        std::env::args().nth(1),
        std::env::var("TIMEBELL_SETTINGS_PATH").ok(),
    );

    let config = match config::load_config(Some(settings_path.as_str())) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("timebell-server: cannot start without valid settings: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config);

    tracing::info!(
        source = settings_source,
        path = %settings_path,
        "loaded settings"
    );

    let store = open_store(&config);
    let announcements = store.get();
    tracing::info!(
        path = %store.path().display(),
        hours = ?announcements.times,
        speaker = %announcements.speaker,
        "announcement schedule ready"
    );
    let tts = TtsClient::new(&config.tts);
    let playback = PlaybackEngine::from_config(&config.playback);
    tracing::info!(
        tts = tts.base_url(),
        artifact_dir = %playback.artifact_dir().display(),
        alsa_device = config.playback.alsa_device.as_deref().unwrap_or("<default>"),
        "voice pipeline configured"
    );
    let pipeline = Arc::new(AnnouncementPipeline::new(tts.clone(), playback));
    let clock = Arc::new(SystemClock);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tracing::info!(period_seconds = TICK_PERIOD.as_secs(), "spawning scheduler");
    let scheduler = Scheduler::new(store.clone(), pipeline.clone(), clock.clone(), TICK_PERIOD)
        .spawn(shutdown_rx);

    let state = AppState {
        store,
        announcer: pipeline,
        tts,
        clock,
        frontend_dir: Some(config.frontend.dir.clone()),
    };
    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting timebell server");

    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "failed to bind, is another process using this port?");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!("stopping scheduler");
    let _ = shutdown_tx.send(true);
    if let Err(e) = scheduler.await {
        tracing::error!(error = %e, "scheduler task panicked or was cancelled");
    }

    tracing::info!("timebell server shut down");
}

/// Resolves once SIGINT or SIGTERM arrives. A handler that cannot be
/// installed is logged and never fires; the other one still can.
async fn shutdown_signal() {
    let interrupt = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGINT");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    let received = tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    };
    tracing::info!(signal = received, "shutting down timebell server");
}

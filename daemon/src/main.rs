use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use pure_seeder::config::{self, Config};
use pure_seeder::coordinator::{GameAccessor, JoinCoordinator, WindowMinimizer};
use pure_seeder::event::{ContextEvent, SeederEvent};
use pure_seeder::page_source::{self, PageSource};
use pure_seeder::pipeline::UpdatePipeline;
use pure_seeder::process_watcher::{self, ProcessWatcher};
use pure_seeder::profile::ProfileClient;
use pure_seeder::seeder::Seeder;
use pure_seeder::session::SessionState;
use pure_seeder::{paths, status};

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(e) = run().await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pure_seeder=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run() -> Result<()> {
    // ── App data directory ────────────────────────────────────────────────────
    let app_dir = paths::app_data_dir();
    std::fs::create_dir_all(&app_dir)
        .with_context(|| format!("Failed to create app data directory {}", app_dir.display()))?;

    // ── Configuration ─────────────────────────────────────────────────────────
    let config_path = paths::config_file_path();
    let initial_config = config::load_or_default(&config_path).unwrap_or_else(|e| {
        warn!("config error (using defaults): {e:#}");
        Config::default()
    });
    initial_config.validate().context("Invalid configuration")?;

    // ── Components ────────────────────────────────────────────────────────────
    let client = page_source::build_client().context("Failed to build HTTP client")?;
    let watcher = Arc::new(ProcessWatcher::new(&initial_config.global.process_name));
    let current_game: GameAccessor = {
        let watcher = Arc::clone(&watcher);
        Arc::new(move || watcher.current_game())
    };

    let mut seeder = Seeder::new(
        SessionState::from_config(&initial_config),
        UpdatePipeline::with_default_updaters(),
        Arc::clone(&watcher) as _,
        JoinCoordinator::new(
            Arc::new(WindowMinimizer),
            current_game,
            initial_config.global.auto_minimize,
        ),
    );
    let pages = PageSource::new(client.clone());
    let mut profile = ProfileClient::new(client.clone(), initial_config.global.profile_url.clone());
    let status_path = paths::status_file_path();

    let (event_tx, mut event_rx) = mpsc::channel::<SeederEvent>(32);

    // ── Background tasks ──────────────────────────────────────────────────────
    tokio::spawn(config::watch_config(config_path, event_tx.clone()));
    tokio::spawn(process_watcher::run(Arc::clone(&watcher), event_tx.clone()));
    tokio::spawn(log_context_events(seeder.session().notifier().subscribe()));
    let mut refresh_ticker = spawn_refresh_ticker(
        initial_config.global.effective_refresh_interval(),
        event_tx.clone(),
    );

    // Graceful shutdown on Ctrl+C.
    {
        let tx = event_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(SeederEvent::Shutdown).await;
            }
        });
    }

    info!(
        servers = seeder.session().servers().len(),
        "pure-seeder v{} started",
        env!("CARGO_PKG_VERSION")
    );

    // ── Event loop ────────────────────────────────────────────────────────────
    while let Some(evt) = event_rx.recv().await {
        match evt {
            SeederEvent::GameStarted => info!("game started"),
            SeederEvent::GameStopped => info!("game exited"),

            SeederEvent::ConfigReloaded(new_config) => {
                seeder.apply_config(&new_config);
                watcher.set_process_name(&new_config.global.process_name);
                profile = ProfileClient::new(client.clone(), new_config.global.profile_url.clone());
                refresh_ticker.abort();
                refresh_ticker = spawn_refresh_ticker(
                    new_config.global.effective_refresh_interval(),
                    event_tx.clone(),
                );
            }

            SeederEvent::RefreshRequested => {
                let snapshot = seeder.refresh(&pages, &profile).await;
                status::write_status(&status_path, &snapshot);
            }

            SeederEvent::Shutdown => {
                info!("shutting down");
                seeder.coordinator().cancel();
                break;
            }
        }
    }

    refresh_ticker.abort();
    Ok(())
}

/// Requests a refresh immediately and then every `secs` seconds.
fn spawn_refresh_ticker(secs: u64, tx: mpsc::Sender<SeederEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(secs));
        loop {
            ticker.tick().await;
            if tx.send(SeederEvent::RefreshRequested).await.is_err() {
                break;
            }
        }
    })
}

/// Stand-in subscriber for the presentation layer: traces every session change.
async fn log_context_events(mut rx: broadcast::Receiver<ContextEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => debug!(?event, "context changed"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "context subscriber lagged")
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

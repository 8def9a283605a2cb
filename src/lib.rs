pub mod airports;
pub mod api;
pub mod auth;
pub mod commands;
pub mod config;
pub mod cooldown;
pub mod db;
pub mod device;
pub mod error;
pub mod events;
pub mod feedback;
pub mod geofence;
pub mod models;
pub mod navigation;
pub mod session;
pub mod settings;
pub mod sync;
pub mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, info, warn};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use api::ApiClient;
use auth::{AuthBackend, AuthService};
use config::AppConfig;
use cooldown::CooldownGate;
use db::Database;
use events::EventBus;
use geofence::{FixedLocation, GeofenceController, LocationProvider};
use session::SessionStore;
use settings::SettingsStore;
use sync::{
    connectivity::{probe_loop, probe_target},
    ConnectivityMonitor, ConnectivityOracle, SubmissionQueue, SubmissionTransport, SyncController,
};
use utils::clock::{Clock, SystemClock};

/// Platform capabilities the core talks to.
pub struct Ports {
    pub transport: Arc<dyn SubmissionTransport>,
    pub auth_backend: Arc<dyn AuthBackend>,
    pub connectivity: Arc<dyn ConnectivityOracle>,
    pub location: Arc<dyn LocationProvider>,
    pub clock: Arc<dyn Clock>,
}

pub struct AppState {
    pub(crate) db: Database,
    pub(crate) session: SessionStore,
    pub(crate) cooldown: CooldownGate,
    pub(crate) queue: SubmissionQueue,
    pub(crate) geofence: GeofenceController,
    pub(crate) auth: AuthService,
    pub(crate) events: EventBus,
    pub(crate) connectivity: Arc<dyn ConnectivityOracle>,
    sync: Mutex<SyncController>,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        db: Database,
        settings: Arc<SettingsStore>,
        ports: Ports,
    ) -> Self {
        let events = EventBus::new();
        let session = SessionStore::new(settings.clone());
        let cooldown = CooldownGate::new(settings.clone(), ports.clock, config.cooldown);
        let queue = SubmissionQueue::new(
            db.clone(),
            ports.transport,
            ports.connectivity.clone(),
            config.delivery_mode,
            events.clone(),
        );
        let geofence = GeofenceController::new(
            session.clone(),
            ports.location.clone(),
            config.geofence,
            events.clone(),
        );
        let auth = AuthService::new(
            ports.auth_backend,
            settings,
            session.clone(),
            ports.location,
            geofence.clone(),
        );

        Self {
            db,
            session,
            cooldown,
            queue,
            geofence,
            auth,
            events,
            connectivity: ports.connectivity,
            sync: Mutex::new(SyncController::new()),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Starts the reconnect-driven drain loop.
    pub async fn start_sync(&self) -> Result<()> {
        self.sync
            .lock()
            .await
            .start(self.queue.clone(), self.connectivity.clone())
    }

    /// Stops background work and closes the store.
    pub async fn shutdown(&self) -> Result<()> {
        self.geofence.exit_dashboard().await;
        self.sync.lock().await.stop().await?;
        self.db.close()
    }
}

pub fn run() {
    let config = AppConfig::from_env();

    // RUST_LOG still wins when set
    env_logger::Builder::new()
        .filter_level(config.log_level())
        .parse_default_env()
        .init();

    info!("AAI survey client starting up...");

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("Failed to start async runtime: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(serve(config)) {
        error!("Fatal: {err:#}");
        std::process::exit(1);
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!(
            "failed to create data directory {}",
            config.data_dir.display()
        )
    })?;

    let database = Database::open(config.database_path())?;
    let settings = Arc::new(SettingsStore::open(config.settings_path())?);
    device::device_id(&settings)?;

    match database.submission_counts().await {
        Ok(counts) if counts.unsynced > 0 => {
            info!("{} submission(s) waiting for sync", counts.unsynced)
        }
        Ok(_) => {}
        Err(err) => warn!("Could not read queue status: {err:#}"),
    }

    let client = Arc::new(ApiClient::new(
        config.api_url.clone(),
        config.http_timeout,
        config.http_connect_timeout,
    )?);
    let monitor = Arc::new(ConnectivityMonitor::new(false));
    let location: Arc<dyn LocationProvider> = Arc::new(FixedLocation::new(config.fixed_location));

    let state = AppState::new(
        &config,
        database,
        settings,
        Ports {
            transport: client.clone(),
            auth_backend: client,
            connectivity: monitor.clone(),
            location,
            clock: Arc::new(SystemClock),
        },
    );

    let probe_token = CancellationToken::new();
    let probe = tokio::spawn(probe_loop(
        monitor,
        probe_target(&config.api_url)?,
        config.probe_interval,
        config.http_connect_timeout,
        probe_token.clone(),
    ));

    state.start_sync().await?;
    info!(
        "Ready (backend {}, {:?} delivery)",
        config.api_url, config.delivery_mode
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutting down...");

    probe_token.cancel();
    if let Err(err) = probe.await {
        warn!("Connectivity probe ended abnormally: {err}");
    }
    state.shutdown().await
}

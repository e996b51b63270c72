//! device-dashboard server binary.
//!
//! Wires configuration, the broker connection, the state store and the HTTP
//! surface together and runs until Ctrl-C.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use device_dashboard::adapters::http::{app_router, AppState};
use device_dashboard::adapters::postgres::{connect_pool, run_migrations, PostgresDeviceStore};
use device_dashboard::adapters::{BroadcastHub, LoggingListener, MqttMessageBus};
use device_dashboard::application::{
    CommandDispatcher, CommandTopics, DeviceLoginHandler, GetDeviceStateHandler, StateIngestor,
};
use device_dashboard::config::{AppConfig, ConfigError, ServerConfig, ValidationError};
use device_dashboard::domain::device::MessageNormalizer;
use device_dashboard::ports::{BusError, MessageBus, QoS};

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] ValidationError),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("message broker: {0}")]
    Broker(#[from] BusError),

    #[error("http server: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        tracing::error!(error = %e, "device-dashboard failed");
        eprintln!("device-dashboard: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config.server);

    let pool = connect_pool(&config.database).await?;
    if config.database.run_migrations {
        run_migrations(&pool).await?;
        tracing::info!("Database migrations applied");
    }
    let store = Arc::new(PostgresDeviceStore::new(pool));

    let listener = Arc::new(LoggingListener::new(&config.mqtt.host, config.mqtt.port));
    let mqtt = MqttMessageBus::connect(&config.mqtt, listener).await?;
    let bus: Arc<dyn MessageBus> = mqtt.clone();

    let hub = Arc::new(BroadcastHub::new(
        config.hub.mailbox_capacity,
        config.hub.overflow_policy,
    ));

    let topics = &config.topics;
    let state_ingestor = Arc::new(StateIngestor::new(
        MessageNormalizer::new(&topics.state_namespace),
        store.clone(),
        hub.clone(),
    ));
    let value_ingestor = Arc::new(StateIngestor::new(
        MessageNormalizer::new(&topics.provide_value_namespace),
        store.clone(),
        hub.clone(),
    ));
    let login = Arc::new(DeviceLoginHandler::new(
        store.clone(),
        bus.clone(),
        &topics.login_request_namespace,
        topics.login_response_namespace.clone(),
    ));

    bus.subscribe(&topics.state_filter(), QoS::AtLeastOnce, state_ingestor)
        .await?;
    bus.subscribe(&topics.provide_value_filter(), QoS::AtLeastOnce, value_ingestor)
        .await?;
    bus.subscribe(&topics.login_request_filter(), QoS::AtMostOnce, login)
        .await?;

    let dispatcher = Arc::new(CommandDispatcher::new(
        store.clone(),
        bus.clone(),
        CommandTopics {
            command: topics.command_template()?,
            toggle: topics.toggle_template()?,
            number_input: topics.number_input_template()?,
        },
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let state = AppState {
        dispatcher,
        device_state: Arc::new(GetDeviceStateHandler::new(store)),
        hub,
        bus,
        shutdown: shutdown_rx,
        keep_alive: config.hub.keep_alive(),
    };
    let app = app_router(state, &config.server);

    let addr = config.server.socket_addr()?;
    let tcp = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "HTTP server listening");

    axum::serve(tcp, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown requested");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    mqtt.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_new(&server.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if server.is_production() {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
    }
}

//! SSO service entry point.
//!
//! Starts the gRPC server with:
//! - SQLite storage pool (+ migrations)
//! - Kafka producer and fan-out workers
//! - graceful shutdown on SIGINT/SIGTERM: the server drains in-flight RPCs,
//!   then the fan-out drains and the producer flushes

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tonic::transport::Server;
use tracing::{error, info};

use sso_service::config::{AppEnv, Settings};
use sso_service::db::{SqliteStorage, Storage};
use sso_service::grpc::{SsoProfileService, SsoService};
use sso_service::kafka::{EventFanOut, KafkaProducer, RegistrationEvents};
use sso_service::proto::sso_profile_server::SsoProfileServer;
use sso_service::proto::sso_server::SsoServer;
use sso_service::repo::{AuthRepository, ProfileRepository};
use sso_service::usecase;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load().context("Failed to load configuration")?;

    init_tracing(settings.env);
    info!("starting sso service");

    let storage = SqliteStorage::connect(&settings.storage.path)
        .await
        .context("Failed to initialize storage")?;
    let storage: Arc<dyn Storage> = Arc::new(storage);
    info!(path = %settings.storage.path, "storage initialized");

    let producer = Arc::new(
        KafkaProducer::new(&settings.kafka.address)
            .context("Failed to create kafka producer")?,
    );
    let (fanout, mut notify) =
        EventFanOut::start(producer.clone(), settings.kafka.number_of_topics);

    // Delivery is best-effort: producer errors are logged and dropped.
    tokio::spawn(async move {
        while let Some(err) = notify.recv().await {
            error!(error = %err, "kafka producer error");
        }
    });

    let auth_repo = AuthRepository::new(storage.clone());
    let profile_repo = ProfileRepository::new(storage);
    let registration_events = RegistrationEvents::new(fanout.input());

    let sso_service = SsoService::new(
        usecase::Login::new(settings.tokens.clone(), auth_repo.clone()),
        usecase::Register::new(settings.tokens.clone(), auth_repo.clone(), registration_events),
        usecase::RefreshTokens::new(settings.tokens.clone(), auth_repo.clone()),
        usecase::Logout::new(settings.tokens.clone(), auth_repo),
    );
    let profile_service = SsoProfileService::new(usecase::Profile::new(profile_repo));

    let addr = format!("{}:{}", settings.grpc.host, settings.grpc.port)
        .parse()
        .context("Invalid server address")?;
    info!(%addr, "starting gRPC server");

    Server::builder()
        .add_service(SsoServer::new(sso_service))
        .add_service(SsoProfileServer::new(profile_service))
        .serve_with_shutdown(addr, shutdown_signal())
        .await
        .context("gRPC server error")?;

    // The server (and with it every event sender) is gone; drain the fan-out
    // and flush whatever the producer still holds.
    fanout.stop().await;
    if let Err(err) = producer.flush() {
        error!(error = %err, "failed to flush kafka producer");
    }

    info!("sso service shutdown complete");

    Ok(())
}

fn init_tracing(env: AppEnv) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(match env {
            AppEnv::Prod => "info",
            _ => "debug",
        })
    });

    match env {
        AppEnv::Local => tracing_subscriber::fmt().with_env_filter(filter).init(),
        AppEnv::Dev | AppEnv::Prod => {
            tracing_subscriber::fmt().with_env_filter(filter).json().init()
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C signal");
        },
        _ = terminate => {
            info!("received SIGTERM signal");
        },
    }

    info!("shutting down gracefully...");
}

mod backend;
mod cli;

use crate::cli::CLI;
use anyhow::Context;
use burrow_gateway::{App, AppState};
use burrow_limiter::{TokenBucket, TokenBucketSettings};
use burrow_resolver::{Admission, ResolverService, ResolverSettings, Sweeper};
use burrow_telemetry::TelemetryConfig;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();

    let _telemetry = burrow_telemetry::init(
        &TelemetryConfig::builder()
            .service_name("burrow")
            .log_format(config.log_format.into())
            .otlp_endpoint(config.otlp_endpoint.clone())
            .build(),
    )?;

    info!(
        listen_addr = %config.listen_addr,
        public_base_url = %config.public_base_url(),
        storage_backend = %config.storage,
        cache_backend = %config.cache,
        generator = %config.generator,
        limit_rate = config.limit_rate,
        burst_size = config.burst_size,
        "starting burrow gateway"
    );

    let repository = backend::repository(&config).await?;
    let cache = backend::cache(&config).await?;
    let generator = Arc::new(backend::generator(&config)?);

    let settings = ResolverSettings::builder()
        .max_attempts(config.max_attempts)
        .cache_ttl_ceiling(config.cache_ttl_ceiling())
        .cache_timeout(config.cache_timeout())
        .build();
    let service = ResolverService::new(
        Arc::clone(&repository),
        cache,
        Arc::clone(&generator),
        settings,
    );

    let bucket = TokenBucket::new(
        TokenBucketSettings::builder()
            .rate(config.limit_rate)
            .burst(config.burst_size)
            .build(),
    )
    .context("invalid rate limiter settings")?;
    let mut admission = Admission::new(Arc::new(bucket));
    if let Some(timeout) = config.admission_timeout() {
        admission = admission.with_timeout(timeout);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = config.sweep_interval().map(|interval| {
        let mut shutdown_rx = shutdown_rx.clone();
        Sweeper::new(repository, interval).spawn(async move {
            let _ = shutdown_rx.changed().await;
        })
    });

    let state =
        AppState::new(Arc::new(service), config.public_base_url()).with_admission(admission);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .await?;

    if let Some(sweeper) = sweeper {
        if let Err(e) = sweeper.await {
            warn!(error = %e, "sweeper task failed");
        }
    }

    if let Some(position) = generator.seq_position() {
        info!(
            seq_offset = position,
            "pass this as --seq-offset to resume the sequence"
        );
    }

    info!("burrow gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

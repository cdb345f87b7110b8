//! Skysync service - publishes per-store weather forecasts into a NATS
//! JetStream KV bucket.
//!
//! One invocation is one reconciliation pass: fetch store locations from
//! PostgreSQL, fetch a forecast per store from OpenWeatherMap, then make
//! the bucket contain exactly those forecasts keyed by store id.
//! Scheduling is external (cron or a systemd timer).

mod config;
mod db;
mod error;
mod kv;
mod weather;

use skysync_engine::{DesiredEntry, DesiredSet, KvStore, ReconcileReport, Reconciler};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::error::AppError;
use crate::kv::NatsKv;
use crate::weather::WeatherClient;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skysync_service=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run().await {
        tracing::error!("pass failed: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    // Build the desired state: one forecast payload per store
    let pool = db::create_pool(&config.database_url).await?;
    let stores = db::fetch_stores(&pool).await?;
    tracing::info!(count = stores.len(), "fetched store locations");

    let client = WeatherClient::new(&config.api_key);
    let desired = build_desired_set(&client, &stores).await;
    if desired.is_empty() && !stores.is_empty() {
        return Err(AppError::NoForecasts);
    }

    // Reconcile the bucket against it
    let nats = NatsKv::connect(&config.nats_url, config.nats_creds.as_deref()).await?;
    let bucket = nats.ensure_bucket(&config.bucket, config.history).await?;

    let report = Reconciler::new().reconcile(&desired, bucket.as_ref()).await?;
    log_report(&report);

    Ok(())
}

/// Fetch a forecast per store. A store whose coordinates are broken or whose
/// fetch fails is skipped with a warning; the pass still runs for the rest,
/// and the skipped store's previous payload is removed as an orphan.
async fn build_desired_set(client: &WeatherClient, stores: &[db::StoreRow]) -> DesiredSet {
    let mut entries = Vec::with_capacity(stores.len());

    for store in stores {
        let Some((lat, lon)) = store.coordinates() else {
            tracing::warn!(store = store.id, "skipping store with unparseable coordinates");
            continue;
        };

        match client.forecast_payload(lat, lon).await {
            Ok(payload) => entries.push(DesiredEntry::new(store.id, payload)),
            Err(err) => {
                tracing::warn!(store = store.id, "skipping store, forecast fetch failed: {err}");
            }
        }
    }

    entries.into_iter().collect()
}

fn log_report(report: &ReconcileReport) {
    tracing::info!(
        updated = report.updated.len(),
        added = report.added.len(),
        removed = report.removed.len(),
        unchanged = report.unchanged.len(),
        "reconciliation pass complete"
    );

    for id in &report.conflicts {
        tracing::warn!(store = *id, "update skipped: concurrent writer won the revision race");
    }
    for id in &report.skipped_adds {
        tracing::info!(store = *id, "add skipped: key appeared after the snapshot");
    }
    for failure in &report.failures {
        tracing::warn!(
            key = %failure.key,
            action = ?failure.action,
            "operation failed: {}",
            failure.error
        );
    }
}

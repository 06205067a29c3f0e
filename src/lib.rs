pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod settings;
pub mod sync;

#[cfg(test)]
mod test_support;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use api::{ApiClient, FlightApi};
use db::Database;
use repository::{AccountRepository, OfferRepository, PartnerRepository, ReservationRepository};
use settings::Settings;
use sync::{first_settled, Resource};

/// Composition root: owns the cache handle and hands it, together with the
/// backend client, to every repository.
pub struct App<A = ApiClient> {
    pub db: Arc<Database>,
    pub accounts: AccountRepository<A>,
    pub offers: OfferRepository<A>,
    pub partners: PartnerRepository<A>,
    pub reservations: ReservationRepository<A>,
}

impl App<ApiClient> {
    /// Open the cache under `data_dir` and connect to the configured backend.
    pub fn open(settings: &Settings, data_dir: &Path) -> error::Result<Self> {
        let db_path = data_dir.join(&settings.database_file);
        tracing::info!("Database path: {}", db_path.display());
        let db = Database::open(&db_path)?;

        let api = ApiClient::new(&settings.api_base_url, settings.request_timeout())?;
        tracing::info!("Backend: {}", api.base_url());

        Ok(Self::with_parts(Arc::new(db), Arc::new(api)))
    }
}

impl<A: FlightApi> App<A> {
    pub fn with_parts(db: Arc<Database>, api: Arc<A>) -> Self {
        Self {
            accounts: AccountRepository::new(Arc::clone(&db), Arc::clone(&api)),
            offers: OfferRepository::new(Arc::clone(&db), Arc::clone(&api)),
            partners: PartnerRepository::new(Arc::clone(&db), Arc::clone(&api)),
            reservations: ReservationRepository::new(Arc::clone(&db), api),
            db,
        }
    }

    /// Refresh every cached resource once and report how each one settled.
    pub async fn refresh_all(&self) -> error::Result<RefreshReport> {
        let account = first_settled(self.accounts.account(true)).await?;
        let offers = first_settled(self.offers.offers()).await?;
        let partners = first_settled(self.partners.partners()).await?;
        let reservations = first_settled(self.reservations.reservations()).await?;

        Ok(RefreshReport {
            account: summarize(account),
            offers: summarize(offers),
            partners: summarize(partners),
            reservations: summarize(reservations),
        })
    }
}

/// How one resource settled after a refresh.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshOutcome {
    Fresh,
    Stale { error: String },
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RefreshReport {
    pub account: RefreshOutcome,
    pub offers: RefreshOutcome,
    pub partners: RefreshOutcome,
    pub reservations: RefreshOutcome,
}

fn summarize<T>(state: Option<Resource<T>>) -> RefreshOutcome {
    match state {
        Some(Resource::Success { .. }) => RefreshOutcome::Fresh,
        Some(Resource::Error { message, .. }) => RefreshOutcome::Stale { error: message },
        Some(Resource::Loading { .. }) | None => RefreshOutcome::Unavailable,
    }
}

/// Get the app data directory.
fn get_app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("com.skyway.app")
}

/// Bootstrap logging, settings and the cache, then sync once.
pub fn run() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("skyway=info")),
        )
        .init();

    tracing::info!("Starting Skyway v{}", env!("CARGO_PKG_VERSION"));

    let data_dir = get_app_data_dir();
    let settings = Settings::load(&data_dir.join("settings.json"));

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(async {
        let app = App::open(&settings, &data_dir).context("Failed to open Skyway cache")?;
        let report = app.refresh_all().await.context("Cache refresh failed")?;

        tracing::info!("Refresh finished: {}", serde_json::to_string(&report)?);
        let stats = app.db.get_stats()?;
        tracing::info!(
            "Cached: {} offers, {} partners, {} reservations",
            stats.offer_count,
            stats.partner_count,
            stats.reservation_count
        );
        Ok::<(), anyhow::Error>(())
    })
}

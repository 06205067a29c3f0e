use std::sync::Arc;

use futures::Stream;

use super::log_fetch_failure;
use crate::api::FlightApi;
use crate::db::{offers, Database, Table};
use crate::error::Result;
use crate::models::{FlightSearch, Offer};
use crate::sync::{NetworkBoundResource, Resource};

pub struct OfferRepository<A> {
    db: Arc<Database>,
    api: Arc<A>,
}

impl<A: FlightApi> OfferRepository<A> {
    pub fn new(db: Arc<Database>, api: Arc<A>) -> Self {
        Self { db, api }
    }

    /// Featured offers. Fetched only while the cache is empty; a fetch
    /// replaces the whole table.
    pub fn offers(&self) -> impl Stream<Item = Result<Resource<Vec<Offer>>>> + Send + 'static {
        let db = Arc::clone(&self.db);
        let save_db = Arc::clone(&self.db);
        let api = Arc::clone(&self.api);

        NetworkBoundResource::new(
            move || db.observe(Table::Offers, offers::get_offers),
            |cached: Option<&Vec<Offer>>| cached.map_or(true, |offers| offers.is_empty()),
            move || async move { api.fetch_offers().await },
            move |fresh: Vec<Offer>| async move { offers::replace_offers(&save_db, &fresh) },
        )
        .on_fetch_failed(log_fetch_failure("offers"))
        .into_stream()
    }

    /// Search flights on a route and date. Always asks the backend; results
    /// are merged into the cache so earlier searches stay available offline.
    pub fn search(
        &self,
        search: FlightSearch,
    ) -> impl Stream<Item = Result<Resource<Vec<Offer>>>> + Send + 'static {
        let db = Arc::clone(&self.db);
        let save_db = Arc::clone(&self.db);
        let api = Arc::clone(&self.api);
        let origin = search.origin.clone();
        let destination = search.destination.clone();
        let date = search.date_param();

        tracing::info!("Searching flights {} -> {} on {}", origin, destination, date);

        NetworkBoundResource::new(
            move || {
                let (origin, destination, date) =
                    (origin.clone(), destination.clone(), date.clone());
                db.observe(Table::Offers, move |db: &Database| {
                    offers::search_offers(db, &origin, &destination, Some(&date))
                })
            },
            |_: Option<&Vec<Offer>>| true,
            move || async move { api.search_flights(&search).await },
            move |found: Vec<Offer>| async move { offers::upsert_offers(&save_db, &found) },
        )
        .on_fetch_failed(log_fetch_failure("flight search"))
        .into_stream()
    }

    /// A single cached offer, e.g. for a booking screen.
    pub fn cached_offer(&self, id: &str) -> Result<Option<Offer>> {
        offers::get_offer_by_id(&self.db, id)
    }
}

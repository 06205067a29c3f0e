use std::sync::Arc;

use futures::Stream;

use super::log_fetch_failure;
use crate::api::FlightApi;
use crate::db::{partners, Database, Table};
use crate::error::Result;
use crate::models::Partner;
use crate::sync::{NetworkBoundResource, Resource};

/// Partner discounts for loyalty members.
pub struct PartnerRepository<A> {
    db: Arc<Database>,
    api: Arc<A>,
}

impl<A: FlightApi> PartnerRepository<A> {
    pub fn new(db: Arc<Database>, api: Arc<A>) -> Self {
        Self { db, api }
    }

    /// Active partners by name. Always refreshed; the fetched list replaces
    /// the cached one.
    pub fn partners(&self) -> impl Stream<Item = Result<Resource<Vec<Partner>>>> + Send + 'static {
        let db = Arc::clone(&self.db);
        let save_db = Arc::clone(&self.db);
        let api = Arc::clone(&self.api);

        NetworkBoundResource::new(
            move || db.observe(Table::Partners, partners::get_partners),
            |_: Option<&Vec<Partner>>| true,
            move || async move { api.fetch_partners().await },
            move |fresh: Vec<Partner>| async move { partners::replace_partners(&save_db, &fresh) },
        )
        .on_fetch_failed(log_fetch_failure("partners"))
        .into_stream()
    }
}

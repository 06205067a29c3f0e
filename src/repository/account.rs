use std::sync::Arc;

use futures::Stream;

use super::log_fetch_failure;
use crate::api::FlightApi;
use crate::db::{account, Database, Table};
use crate::error::Result;
use crate::models::Account;
use crate::sync::{NetworkBoundResource, Resource};

/// The signed-in member's loyalty account and miles balance.
pub struct AccountRepository<A> {
    db: Arc<Database>,
    api: Arc<A>,
}

impl<A: FlightApi> AccountRepository<A> {
    pub fn new(db: Arc<Database>, api: Arc<A>) -> Self {
        Self { db, api }
    }

    /// Observe the account. Refreshes when forced or when nothing is cached.
    pub fn account(
        &self,
        force_refresh: bool,
    ) -> impl Stream<Item = Result<Resource<Option<Account>>>> + Send + 'static {
        let db = Arc::clone(&self.db);
        let save_db = Arc::clone(&self.db);
        let api = Arc::clone(&self.api);

        NetworkBoundResource::new(
            move || db.observe(Table::Account, account::get_account),
            move |cached: Option<&Option<Account>>| {
                force_refresh || cached.map_or(true, |account| account.is_none())
            },
            move || async move { api.fetch_account().await },
            move |fresh: Account| async move {
                tracing::debug!("Caching account {} ({} miles)", fresh.id, fresh.miles_points);
                account::upsert_account(&save_db, &fresh)
            },
        )
        .on_fetch_failed(log_fetch_failure("account"))
        .into_stream()
    }

    /// Cached miles balance, without touching the network.
    pub fn cached_miles(&self) -> Result<Option<i64>> {
        Ok(account::get_account(&self.db)?.map(|a| a.miles_points))
    }

    /// Forget everything cached for this user.
    pub fn logout(&self) -> Result<()> {
        tracing::info!("Logging out, clearing cache");
        self.db.clear_all()
    }
}

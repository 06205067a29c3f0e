use std::sync::Arc;

use futures::Stream;

use super::log_fetch_failure;
use crate::api::FlightApi;
use crate::db::{reservations, Database, Table};
use crate::error::Result;
use crate::models::{NewReservation, Reservation};
use crate::sync::{NetworkBoundResource, Resource};

pub struct ReservationRepository<A> {
    db: Arc<Database>,
    api: Arc<A>,
}

impl<A: FlightApi> ReservationRepository<A> {
    pub fn new(db: Arc<Database>, api: Arc<A>) -> Self {
        Self { db, api }
    }

    /// The member's reservations. Always refreshed; the fetched list replaces
    /// the cached one.
    pub fn reservations(
        &self,
    ) -> impl Stream<Item = Result<Resource<Vec<Reservation>>>> + Send + 'static {
        let db = Arc::clone(&self.db);
        let save_db = Arc::clone(&self.db);
        let api = Arc::clone(&self.api);

        NetworkBoundResource::new(
            move || db.observe(Table::Reservations, reservations::get_reservations),
            |_: Option<&Vec<Reservation>>| true,
            move || async move { api.fetch_reservations().await },
            move |fresh: Vec<Reservation>| async move {
                reservations::replace_reservations(&save_db, &fresh)
            },
        )
        .on_fetch_failed(log_fetch_failure("reservations"))
        .into_stream()
    }

    /// Book a flight. The confirmed reservation is cached so open
    /// `reservations()` streams pick it up.
    pub async fn create_reservation(&self, request: NewReservation) -> Result<Reservation> {
        request.validate()?;
        let reservation = self.api.create_reservation(&request).await?;
        reservations::upsert_reservation(&self.db, &reservation)?;
        tracing::info!(
            "Reservation {} created for offer {} ({})",
            reservation.id,
            reservation.offer_id,
            reservation.status
        );
        Ok(reservation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::offers::tests::sample_offer;
    use crate::db::reservations::tests::sample_reservation;
    use crate::db::tests::setup_test_db;
    use crate::error::AppError;
    use crate::test_support::FakeApi;
    use futures::StreamExt;

    fn booking(offer_id: &str) -> NewReservation {
        NewReservation {
            offer_id: offer_id.into(),
            passenger_name: "Jane Roe".into(),
            passport_number: Some("XY7654321".into()),
            seat: Some("2A".into()),
            miles_to_redeem: 0,
        }
    }

    #[tokio::test]
    async fn test_new_booking_reaches_open_stream() {
        let db = setup_test_db();
        let api = Arc::new(FakeApi::default());
        *api.offers.lock().unwrap() =
            vec![sample_offer("of-1", ("WAW", "JFK"), "2026-12-01", 999.0)];
        let repo = ReservationRepository::new(Arc::clone(&db), Arc::clone(&api));

        let mut stream = Box::pin(repo.reservations());
        stream.next().await.unwrap().unwrap();
        stream.next().await.unwrap().unwrap();
        assert_eq!(
            stream.next().await.unwrap().unwrap(),
            Resource::success(vec![])
        );

        let created = repo.create_reservation(booking("of-1")).await.unwrap();
        assert_eq!(created.total_price, 999.0);
        assert_eq!(
            stream.next().await.unwrap().unwrap(),
            Resource::success(vec![created])
        );
    }

    #[tokio::test]
    async fn test_invalid_booking_never_hits_backend() {
        let db = setup_test_db();
        let api = Arc::new(FakeApi::default());
        let repo = ReservationRepository::new(Arc::clone(&db), Arc::clone(&api));

        let mut request = booking("of-1");
        request.passenger_name = String::new();
        assert!(matches!(
            repo.create_reservation(request).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_booking_leaves_cache_untouched() {
        let db = setup_test_db();
        let api = Arc::new(FakeApi::default());
        api.set_offline(true);
        let repo = ReservationRepository::new(Arc::clone(&db), Arc::clone(&api));

        assert!(repo.create_reservation(booking("of-1")).await.is_err());
        assert!(reservations::get_reservations(&db).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_offline_refresh_keeps_cached_reservations() {
        let db = setup_test_db();
        let cached = sample_reservation("r1", "2026-12-01");
        reservations::upsert_reservation(&db, &cached).unwrap();
        let api = Arc::new(FakeApi::default());
        api.set_offline(true);
        let repo = ReservationRepository::new(Arc::clone(&db), Arc::clone(&api));

        let states: Vec<_> = repo.reservations().take(3).collect().await;
        let last = states.into_iter().last().unwrap().unwrap();
        assert_eq!(last.error_message(), Some("API returned 503: offline"));
        assert_eq!(last.into_data(), Some(vec![cached]));
    }
}

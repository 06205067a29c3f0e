//! In-memory [`FlightApi`] for repository tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::api::FlightApi;
use crate::error::{AppError, Result};
use crate::models::{Account, FlightSearch, NewReservation, Offer, Partner, Reservation};

#[derive(Default)]
pub(crate) struct FakeApi {
    pub account: Mutex<Option<Account>>,
    pub offers: Mutex<Vec<Offer>>,
    pub partners: Mutex<Vec<Partner>>,
    pub reservations: Mutex<Vec<Reservation>>,
    /// When set, every call fails with a 503.
    pub offline: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeApi {
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin_call(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Api {
                status: 503,
                body: "offline".into(),
            });
        }
        Ok(())
    }
}

impl FlightApi for FakeApi {
    async fn fetch_account(&self) -> Result<Account> {
        self.begin_call()?;
        let account = self.account.lock().unwrap().clone();
        account.ok_or_else(|| AppError::NotFound("account".into()))
    }

    async fn fetch_offers(&self) -> Result<Vec<Offer>> {
        self.begin_call()?;
        Ok(self.offers.lock().unwrap().clone())
    }

    async fn search_flights(&self, search: &FlightSearch) -> Result<Vec<Offer>> {
        self.begin_call()?;
        let date = search.date_param();
        let offers = self.offers.lock().unwrap();
        Ok(offers
            .iter()
            .filter(|o| {
                o.origin == search.origin
                    && o.destination == search.destination
                    && o.departure_date == date
            })
            .cloned()
            .collect())
    }

    async fn fetch_partners(&self) -> Result<Vec<Partner>> {
        self.begin_call()?;
        Ok(self.partners.lock().unwrap().clone())
    }

    async fn fetch_reservations(&self) -> Result<Vec<Reservation>> {
        self.begin_call()?;
        Ok(self.reservations.lock().unwrap().clone())
    }

    async fn create_reservation(&self, request: &NewReservation) -> Result<Reservation> {
        self.begin_call()?;
        let offer = self
            .offers
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id == request.offer_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("offer {}", request.offer_id)))?;

        let mut reservations = self.reservations.lock().unwrap();
        let reservation = Reservation {
            id: format!("r-{}", reservations.len() + 1),
            offer_id: offer.id,
            flight_number: offer.flight_number,
            origin: offer.origin,
            destination: offer.destination,
            departure_date: offer.departure_date,
            passenger_name: request.passenger_name.clone(),
            seat: request.seat.clone(),
            status: "confirmed".into(),
            total_price: offer.price,
            created_at: "2026-10-19T12:00:00Z".into(),
        };
        reservations.push(reservation.clone());
        Ok(reservation)
    }
}

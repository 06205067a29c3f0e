//! Backend REST client.
//!
//! [`FlightApi`] is the seam repositories depend on; [`ApiClient`] is the
//! HTTP implementation used by the app.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{Account, FlightSearch, NewReservation, Offer, Partner, Reservation};

/// Remote operations the repositories need.
pub trait FlightApi: Send + Sync + 'static {
    fn fetch_account(&self) -> impl Future<Output = Result<Account>> + Send;

    fn fetch_offers(&self) -> impl Future<Output = Result<Vec<Offer>>> + Send;

    fn search_flights(
        &self,
        search: &FlightSearch,
    ) -> impl Future<Output = Result<Vec<Offer>>> + Send;

    fn fetch_partners(&self) -> impl Future<Output = Result<Vec<Partner>>> + Send;

    fn fetch_reservations(&self) -> impl Future<Output = Result<Vec<Reservation>>> + Send;

    fn create_reservation(
        &self,
        request: &NewReservation,
    ) -> impl Future<Output = Result<Reservation>> + Send;
}

#[derive(Deserialize)]
struct OffersResponse {
    offers: Vec<Offer>,
}

#[derive(Deserialize)]
struct PartnersResponse {
    partners: Vec<Partner>,
}

#[derive(Deserialize)]
struct ReservationsResponse {
    reservations: Vec<Reservation>,
}

/// HTTP client for the booking backend.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        // reqwest is built without a bundled crypto provider; ring is the
        // process default. Already-installed is fine.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| AppError::Validation(format!("bad API URL: {}", e)))
    }

    /// Check if the backend is reachable.
    pub async fn health_check(&self) -> Result<bool> {
        let resp = self
            .client
            .get(self.url("/health")?)
            .timeout(Duration::from_secs(3))
            .send()
            .await;

        match resp {
            Ok(r) => Ok(r.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).timeout(self.timeout).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl FlightApi for ApiClient {
    async fn fetch_account(&self) -> Result<Account> {
        self.get_json(self.url("/account")?).await
    }

    async fn fetch_offers(&self) -> Result<Vec<Offer>> {
        let response: OffersResponse = self.get_json(self.url("/offers")?).await?;
        Ok(response.offers)
    }

    async fn search_flights(&self, search: &FlightSearch) -> Result<Vec<Offer>> {
        let url = Url::parse_with_params(
            self.url("/offers/search")?.as_str(),
            &[
                ("origin", search.origin.clone()),
                ("destination", search.destination.clone()),
                ("date", search.date_param()),
            ],
        )
        .map_err(|e| AppError::Validation(format!("bad search URL: {}", e)))?;

        let response: OffersResponse = self.get_json(url).await?;
        Ok(response.offers)
    }

    async fn fetch_partners(&self) -> Result<Vec<Partner>> {
        let response: PartnersResponse = self.get_json(self.url("/partners")?).await?;
        Ok(response.partners)
    }

    async fn fetch_reservations(&self) -> Result<Vec<Reservation>> {
        let response: ReservationsResponse = self.get_json(self.url("/reservations")?).await?;
        Ok(response.reservations)
    }

    async fn create_reservation(&self, request: &NewReservation) -> Result<Reservation> {
        let url = self.url("/reservations")?;
        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(request)
            .timeout(self.timeout)
            .send()
            .await?;
        Self::decode(response).await
    }
}

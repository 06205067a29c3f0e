//! Domain records shared by the cache and the backend API.
//!
//! Records are flat values: the backend sends them as camelCase JSON and the
//! cache stores them column-for-column.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// The signed-in loyalty member. The cache keeps a single row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub passport_number: Option<String>,
    /// Loyalty tier, e.g. "silver" or "gold".
    pub tier: String,
    pub miles_points: i64,
}

/// A bookable flight offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: String,
    pub origin: String,
    pub destination: String,
    /// ISO date (YYYY-MM-DD).
    pub departure_date: String,
    pub airline: String,
    pub flight_number: String,
    pub price: f64,
    pub currency: String,
    pub image_url: Option<String>,
}

/// A partner business offering discounts to loyalty members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub discount_percentage: Option<i64>,
    pub logo_url: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: String,
    pub offer_id: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_date: String,
    pub passenger_name: String,
    pub seat: Option<String>,
    /// Backend booking status, e.g. "confirmed" or "cancelled".
    pub status: String,
    pub total_price: f64,
    pub created_at: String,
}

/// Body of a booking request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReservation {
    pub offer_id: String,
    pub passenger_name: String,
    pub passport_number: Option<String>,
    pub seat: Option<String>,
    /// Miles applied towards the fare; 0 pays in full.
    #[serde(default)]
    pub miles_to_redeem: i64,
}

impl NewReservation {
    pub fn validate(&self) -> Result<()> {
        if self.offer_id.trim().is_empty() {
            return Err(AppError::Validation("offer id is required".into()));
        }
        if self.passenger_name.trim().is_empty() {
            return Err(AppError::Validation("passenger name is required".into()));
        }
        if self.miles_to_redeem < 0 {
            return Err(AppError::Validation(format!(
                "cannot redeem {} miles",
                self.miles_to_redeem
            )));
        }
        Ok(())
    }
}

/// A one-way flight search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightSearch {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
}

impl FlightSearch {
    /// Build a search, normalising airport codes to upper case.
    pub fn new(origin: &str, destination: &str, departure_date: NaiveDate) -> Result<Self> {
        let origin = normalize_airport(origin)?;
        let destination = normalize_airport(destination)?;
        if origin == destination {
            return Err(AppError::Validation(format!(
                "origin and destination are both {}",
                origin
            )));
        }
        Ok(Self {
            origin,
            destination,
            departure_date,
        })
    }

    /// Departure date in the format the backend and the cache use.
    pub fn date_param(&self) -> String {
        self.departure_date.format("%Y-%m-%d").to_string()
    }
}

fn normalize_airport(code: &str) -> Result<String> {
    let code = code.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::Validation(format!(
            "'{}' is not an IATA airport code",
            code
        )));
    }
    Ok(code.to_ascii_uppercase())
}

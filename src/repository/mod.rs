//! Repositories: one per cached entity.
//!
//! Each read is a [`NetworkBoundResource`](crate::sync::NetworkBoundResource)
//! wired to a live cache query, a [`FlightApi`](crate::api::FlightApi) call
//! and a cache write. Streams returned here are `'static` and observe the
//! cache until dropped.

pub mod account;
pub mod offers;
pub mod partners;
pub mod reservations;

pub use account::AccountRepository;
pub use offers::OfferRepository;
pub use partners::PartnerRepository;
pub use reservations::ReservationRepository;

use crate::error::AppError;

/// Shared `on_fetch_failed` hook: the synchronizer already downgrades the
/// failure to an `Error` state, this records which resource it hit.
fn log_fetch_failure(resource: &'static str) -> impl FnOnce(&AppError) + Send + 'static {
    move |e: &AppError| tracing::warn!("Refreshing {} failed: {}", resource, e)
}

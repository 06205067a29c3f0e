//! Offline-first synchronizer.
//!
//! A [`NetworkBoundResource`] serves a read from the local cache and,
//! when its `should_fetch` predicate asks for it, refreshes the cache from
//! the backend first. Progress is reported as a stream of [`Resource`]
//! states:
//!
//! 1. `Loading(None)`
//! 2. `Loading(cached)` if a fetch is attempted
//! 3. `Success(value)` for every cache emission, or `Error(message, value)`
//!    if the fetch failed
//!
//! The tail follows the cache producer: it is infinite against a live
//! [`Database::observe`](crate::db::Database::observe) stream and ends when
//! the consumer drops it. Dropping the stream also drops an in-flight fetch.

mod resource;

pub use resource::Resource;

use std::future::Future;
use std::pin::pin;

use futures::{Stream, StreamExt};

use crate::error::{AppError, Result};

fn ignore_fetch_failure(_: &AppError) {}

/// Collaborators for one synchronized read.
///
/// - `load_from_db`: restartable cache producer; "no data" is a value.
/// - `should_fetch`: decides from the first cached value whether to refresh.
/// - `create_call`: the remote fetch.
/// - `save_call_result`: persists the fetched data into the cache.
/// - `on_fetch_failed`: notified when `create_call` fails (no-op by default).
pub struct NetworkBoundResource<L, S, C, P, F = fn(&AppError)> {
    load_from_db: L,
    should_fetch: S,
    create_call: C,
    save_call_result: P,
    on_fetch_failed: F,
}

impl<L, S, C, P> NetworkBoundResource<L, S, C, P> {
    pub fn new(load_from_db: L, should_fetch: S, create_call: C, save_call_result: P) -> Self {
        Self {
            load_from_db,
            should_fetch,
            create_call,
            save_call_result,
            on_fetch_failed: ignore_fetch_failure,
        }
    }
}

impl<L, S, C, P, F> NetworkBoundResource<L, S, C, P, F> {
    /// Replace the fetch-failure hook.
    pub fn on_fetch_failed<G>(self, hook: G) -> NetworkBoundResource<L, S, C, P, G>
    where
        G: FnOnce(&AppError),
    {
        NetworkBoundResource {
            load_from_db: self.load_from_db,
            should_fetch: self.should_fetch,
            create_call: self.create_call,
            save_call_result: self.save_call_result,
            on_fetch_failed: hook,
        }
    }

    /// Run the synchronization and report its progress.
    ///
    /// Only a failing `create_call` is recovered (as `Error` states). A
    /// failing cache read or write is yielded as `Err` and ends the stream.
    pub fn into_stream<T, R, LS, CF, PF>(self) -> impl Stream<Item = Result<Resource<T>>>
    where
        L: Fn() -> LS,
        LS: Stream<Item = Result<T>>,
        S: FnOnce(Option<&T>) -> bool,
        C: FnOnce() -> CF,
        CF: Future<Output = Result<R>>,
        P: FnOnce(R) -> PF,
        PF: Future<Output = Result<()>>,
        F: FnOnce(&AppError),
    {
        let Self {
            load_from_db,
            should_fetch,
            create_call,
            save_call_result,
            on_fetch_failed,
        } = self;

        async_stream::stream! {
            yield Ok(Resource::loading(None));

            let cached = {
                let mut first_read = pin!(load_from_db());
                match first_read.next().await {
                    Some(Ok(value)) => Some(value),
                    Some(Err(e)) => {
                        yield Err(e);
                        return;
                    }
                    None => None,
                }
            };

            let failure = if should_fetch(cached.as_ref()) {
                yield Ok(Resource::loading(cached));

                match create_call().await {
                    Ok(response) => {
                        if let Err(e) = save_call_result(response).await {
                            yield Err(e);
                            return;
                        }
                        None
                    }
                    Err(e) => {
                        tracing::warn!("Remote fetch failed, serving cache: {}", e);
                        on_fetch_failed(&e);
                        Some(e.to_string())
                    }
                }
            } else {
                tracing::trace!("Cache is fresh, skipping remote fetch");
                None
            };

            let mut cache = pin!(load_from_db());
            while let Some(next) = cache.next().await {
                match next {
                    Ok(value) => match &failure {
                        None => yield Ok(Resource::success(value)),
                        Some(message) => yield Ok(Resource::error(message.clone(), Some(value))),
                    },
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }
    }
}

/// Drive a resource stream until it leaves the loading state.
///
/// Returns `None` if the stream ends first. Useful for one-shot callers that
/// do not keep observing the cache.
pub async fn first_settled<T, St>(stream: St) -> Result<Option<Resource<T>>>
where
    St: Stream<Item = Result<Resource<T>>>,
{
    let mut stream = pin!(stream);
    while let Some(state) = stream.next().await {
        let state = state?;
        if !state.is_loading() {
            return Ok(Some(state));
        }
    }
    Ok(None)
}

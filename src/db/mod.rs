pub mod account;
pub mod offers;
pub mod partners;
pub mod reservations;
pub mod schema;

use std::path::Path;
use std::sync::{Arc, Mutex};

use futures::Stream;
use rusqlite::Connection;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::error::{AppError, Result};

/// Capacity of the change-notification channel. Observers that fall further
/// behind than this re-query once instead of replaying every change.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Cache tables, used to route change notifications to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Account,
    Offers,
    Partners,
    Reservations,
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::Account,
        Table::Offers,
        Table::Partners,
        Table::Reservations,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Account => "account",
            Table::Offers => "offers",
            Table::Partners => "partners",
            Table::Reservations => "reservations",
        }
    }
}

/// Thread-safe cache database wrapper.
///
/// Every write publishes the table it touched, so [`Database::observe`] can
/// turn any read into a live stream.
pub struct Database {
    conn: Mutex<Connection>,
    changes: broadcast::Sender<Table>,
}

impl Database {
    /// Open or create the cache database.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        schema::initialize_schema(&conn)?;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            conn: Mutex::new(conn),
            changes,
        })
    }

    /// Execute a closure with access to the database connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| {
            AppError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(format!("Lock poisoned: {}", e)),
            ))
        })?;
        f(&conn)
    }

    /// Publish a change to `table` to every observer.
    pub fn notify(&self, table: Table) {
        match self.changes.send(table) {
            Ok(n) => tracing::trace!("Cache change: {} ({} observers)", table.name(), n),
            Err(_) => tracing::trace!("Cache change: {} (no observers)", table.name()),
        }
    }

    /// Subscribe to raw change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<Table> {
        self.changes.subscribe()
    }

    /// Turn a read into a live stream.
    ///
    /// Yields `query`'s result immediately, then again after every change to
    /// `table`. A failed read is yielded once and ends the stream. The
    /// stream never ends on its own otherwise; drop it to stop observing.
    pub fn observe<T, F>(
        self: &Arc<Self>,
        table: Table,
        query: F,
    ) -> impl Stream<Item = Result<T>> + Send + 'static
    where
        T: Send + 'static,
        F: Fn(&Database) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(self);
        // Subscribe before the first read so no write slips between them.
        let mut rx = self.subscribe();

        async_stream::stream! {
            let first = query(&db);
            let failed = first.is_err();
            yield first;
            if failed {
                return;
            }

            loop {
                match rx.recv().await {
                    Ok(changed) if changed != table => continue,
                    Ok(_) => {}
                    Err(RecvError::Lagged(n)) => {
                        tracing::debug!("Observer of {} lagged by {} changes", table.name(), n);
                    }
                    Err(RecvError::Closed) => break,
                }

                let next = query(&db);
                let failed = next.is_err();
                yield next;
                if failed {
                    return;
                }
            }
        }
    }

    /// Delete every cached row, e.g. on logout.
    pub fn clear_all(&self) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            for table in Table::ALL {
                tx.execute(&format!("DELETE FROM {}", table.name()), [])?;
            }
            tx.commit()?;
            Ok(())
        })?;

        for table in Table::ALL {
            self.notify(table);
        }
        tracing::info!("Cache cleared");
        Ok(())
    }

    /// Row counts per table.
    pub fn get_stats(&self) -> Result<CacheStats> {
        self.with_conn(|conn| {
            let count = |table: Table| -> Result<i64> {
                Ok(conn.query_row(
                    &format!("SELECT COUNT(*) FROM {}", table.name()),
                    [],
                    |row| row.get(0),
                )?)
            };
            Ok(CacheStats {
                account_count: count(Table::Account)?,
                offer_count: count(Table::Offers)?,
                partner_count: count(Table::Partners)?,
                reservation_count: count(Table::Reservations)?,
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CacheStats {
    pub account_count: i64,
    pub offer_count: i64,
    pub partner_count: i64,
    pub reservation_count: i64,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Account, Partner};
    use futures::StreamExt;

    pub(crate) fn setup_test_db() -> Arc<Database> {
        Arc::new(Database::open_in_memory().unwrap())
    }

    pub(crate) fn sample_account() -> Account {
        Account {
            id: "1".into(),
            first_name: "John".into(),
            last_name: "Doe".into(),
            email: "john.doe@example.com".into(),
            passport_number: Some("AB1234567".into()),
            tier: "gold".into(),
            miles_points: 5000,
        }
    }

    pub(crate) fn sample_partner(id: &str, name: &str, is_active: bool) -> Partner {
        Partner {
            id: id.into(),
            name: name.into(),
            category: "hotel".into(),
            description: format!("{} rewards", name),
            discount_percentage: Some(10),
            logo_url: None,
            is_active,
        }
    }

    #[test]
    fn test_stats_empty() {
        let db = setup_test_db();
        let stats = db.get_stats().unwrap();
        assert_eq!(stats.account_count, 0);
        assert_eq!(stats.reservation_count, 0);
    }

    #[test]
    fn test_clear_all() {
        let db = setup_test_db();
        account::upsert_account(&db, &sample_account()).unwrap();
        partners::upsert_partner(&db, &sample_partner("p1", "Hilton", true)).unwrap();

        db.clear_all().unwrap();

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.account_count, 0);
        assert_eq!(stats.partner_count, 0);
    }

    #[test]
    fn test_open_on_disk() {
        let path = std::env::temp_dir()
            .join("skyway_db_test")
            .join("cache.db");
        let _ = std::fs::remove_file(&path);

        {
            let db = Database::open(&path).unwrap();
            account::upsert_account(&db, &sample_account()).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(account::get_account(&db).unwrap(), Some(sample_account()));

        drop(db);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_observe_emits_current_then_changes() {
        let db = setup_test_db();
        let mut stream = Box::pin(db.observe(Table::Account, account::get_account));

        assert_eq!(stream.next().await.unwrap().unwrap(), None);

        account::upsert_account(&db, &sample_account()).unwrap();
        assert_eq!(
            stream.next().await.unwrap().unwrap(),
            Some(sample_account())
        );

        account::clear_account(&db).unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), None);
    }

    #[tokio::test]
    async fn test_observe_recovers_from_lag() {
        let db = setup_test_db();
        let mut stream = Box::pin(db.observe(Table::Account, account::get_account));
        assert_eq!(stream.next().await.unwrap().unwrap(), None);

        let mut latest = sample_account();
        for miles in 0..(CHANGE_CHANNEL_CAPACITY as i64 + 6) {
            latest.miles_points = miles;
            account::upsert_account(&db, &latest).unwrap();
        }

        // Overflowed notifications collapse into one fresh read.
        assert_eq!(stream.next().await.unwrap().unwrap(), Some(latest.clone()));
        assert_eq!(stream.next().await.unwrap().unwrap(), Some(latest));
    }

    #[tokio::test]
    async fn test_observe_ignores_other_tables() {
        let db = setup_test_db();
        let mut stream = Box::pin(db.observe(Table::Account, account::get_account));
        assert_eq!(stream.next().await.unwrap().unwrap(), None);

        partners::upsert_partner(&db, &sample_partner("p1", "Hilton", true)).unwrap();
        account::upsert_account(&db, &sample_account()).unwrap();

        // The partner write must not produce an emission of its own.
        assert_eq!(
            stream.next().await.unwrap().unwrap(),
            Some(sample_account())
        );
    }
}

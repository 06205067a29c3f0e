use rusqlite::Connection;

use crate::error::Result;

/// Initialize the cache schema with all required tables.
///
/// Tables are independent: no foreign keys, and no indices beyond the
/// primary key.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Signed-in loyalty account (single row)
        CREATE TABLE IF NOT EXISTS account (
            id TEXT PRIMARY KEY NOT NULL,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL,
            passport_number TEXT,
            tier TEXT NOT NULL,
            miles_points INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS offers (
            id TEXT PRIMARY KEY NOT NULL,
            origin TEXT NOT NULL,
            destination TEXT NOT NULL,
            departure_date TEXT NOT NULL,
            airline TEXT NOT NULL,
            flight_number TEXT NOT NULL,
            price REAL NOT NULL,
            currency TEXT NOT NULL,
            image_url TEXT
        );

        CREATE TABLE IF NOT EXISTS partners (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            discount_percentage INTEGER,
            logo_url TEXT,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS reservations (
            id TEXT PRIMARY KEY NOT NULL,
            offer_id TEXT NOT NULL,
            flight_number TEXT NOT NULL,
            origin TEXT NOT NULL,
            destination TEXT NOT NULL,
            departure_date TEXT NOT NULL,
            passenger_name TEXT NOT NULL,
            seat TEXT,
            status TEXT NOT NULL,
            total_price REAL NOT NULL,
            created_at TEXT NOT NULL
        );

        PRAGMA journal_mode=WAL;
        ",
    )?;

    Ok(())
}

//! Cached flight offers.

use rusqlite::{Connection, OptionalExtension, Row};

use super::{Database, Table};
use crate::error::Result;
use crate::models::Offer;

const SELECT_OFFER: &str = "SELECT id, origin, destination, departure_date, airline, \
                            flight_number, price, currency, image_url FROM offers";

fn offer_from_row(row: &Row<'_>) -> rusqlite::Result<Offer> {
    Ok(Offer {
        id: row.get(0)?,
        origin: row.get(1)?,
        destination: row.get(2)?,
        departure_date: row.get(3)?,
        airline: row.get(4)?,
        flight_number: row.get(5)?,
        price: row.get(6)?,
        currency: row.get(7)?,
        image_url: row.get(8)?,
    })
}

fn upsert_with(conn: &Connection, offer: &Offer) -> Result<()> {
    conn.execute(
        "INSERT INTO offers (id, origin, destination, departure_date, airline, flight_number,
                             price, currency, image_url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO UPDATE SET
            origin = excluded.origin,
            destination = excluded.destination,
            departure_date = excluded.departure_date,
            airline = excluded.airline,
            flight_number = excluded.flight_number,
            price = excluded.price,
            currency = excluded.currency,
            image_url = excluded.image_url",
        rusqlite::params![
            offer.id,
            offer.origin,
            offer.destination,
            offer.departure_date,
            offer.airline,
            offer.flight_number,
            offer.price,
            offer.currency,
            offer.image_url,
        ],
    )?;
    Ok(())
}

/// Upsert a batch of offers in one transaction.
pub fn upsert_offers(db: &Database, offers: &[Offer]) -> Result<()> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        for offer in offers {
            upsert_with(&tx, offer)?;
        }
        tx.commit()?;
        Ok(())
    })?;
    db.notify(Table::Offers);
    Ok(())
}

/// Replace the whole table with `offers`.
pub fn replace_offers(db: &Database, offers: &[Offer]) -> Result<()> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM offers", [])?;
        for offer in offers {
            upsert_with(&tx, offer)?;
        }
        tx.commit()?;
        Ok(())
    })?;
    tracing::debug!("Offer cache replaced with {} rows", offers.len());
    db.notify(Table::Offers);
    Ok(())
}

/// All cached offers, soonest departure first, cheapest first within a day.
pub fn get_offers(db: &Database) -> Result<Vec<Offer>> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY departure_date ASC, price ASC",
            SELECT_OFFER
        ))?;
        let rows = stmt.query_map([], offer_from_row)?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    })
}

/// Cached offers for a route, optionally on a given departure date.
pub fn search_offers(
    db: &Database,
    origin: &str,
    destination: &str,
    departure_date: Option<&str>,
) -> Result<Vec<Offer>> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "{} WHERE origin = ?1 AND destination = ?2
                AND (?3 IS NULL OR departure_date = ?3)
             ORDER BY departure_date ASC, price ASC",
            SELECT_OFFER
        ))?;
        let rows = stmt.query_map(
            rusqlite::params![origin, destination, departure_date],
            offer_from_row,
        )?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    })
}

pub fn get_offer_by_id(db: &Database, id: &str) -> Result<Option<Offer>> {
    db.with_conn(|conn| {
        let offer = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_OFFER),
                rusqlite::params![id],
                offer_from_row,
            )
            .optional()?;
        Ok(offer)
    })
}

pub fn clear_offers(db: &Database) -> Result<()> {
    db.with_conn(|conn| {
        conn.execute("DELETE FROM offers", [])?;
        Ok(())
    })?;
    db.notify(Table::Offers);
    Ok(())
}

//! Cached reservations.

use rusqlite::{Connection, OptionalExtension, Row};

use super::{Database, Table};
use crate::error::Result;
use crate::models::Reservation;

const SELECT_RESERVATION: &str = "SELECT id, offer_id, flight_number, origin, destination, \
                                  departure_date, passenger_name, seat, status, total_price, \
                                  created_at FROM reservations";

fn reservation_from_row(row: &Row<'_>) -> rusqlite::Result<Reservation> {
    Ok(Reservation {
        id: row.get(0)?,
        offer_id: row.get(1)?,
        flight_number: row.get(2)?,
        origin: row.get(3)?,
        destination: row.get(4)?,
        departure_date: row.get(5)?,
        passenger_name: row.get(6)?,
        seat: row.get(7)?,
        status: row.get(8)?,
        total_price: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn upsert_with(conn: &Connection, reservation: &Reservation) -> Result<()> {
    conn.execute(
        "INSERT INTO reservations (id, offer_id, flight_number, origin, destination,
                                   departure_date, passenger_name, seat, status,
                                   total_price, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT(id) DO UPDATE SET
            offer_id = excluded.offer_id,
            flight_number = excluded.flight_number,
            origin = excluded.origin,
            destination = excluded.destination,
            departure_date = excluded.departure_date,
            passenger_name = excluded.passenger_name,
            seat = excluded.seat,
            status = excluded.status,
            total_price = excluded.total_price,
            created_at = excluded.created_at",
        rusqlite::params![
            reservation.id,
            reservation.offer_id,
            reservation.flight_number,
            reservation.origin,
            reservation.destination,
            reservation.departure_date,
            reservation.passenger_name,
            reservation.seat,
            reservation.status,
            reservation.total_price,
            reservation.created_at,
        ],
    )?;
    Ok(())
}

pub fn upsert_reservation(db: &Database, reservation: &Reservation) -> Result<()> {
    db.with_conn(|conn| upsert_with(conn, reservation))?;
    db.notify(Table::Reservations);
    Ok(())
}

/// Replace the whole table with `reservations`.
pub fn replace_reservations(db: &Database, reservations: &[Reservation]) -> Result<()> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM reservations", [])?;
        for reservation in reservations {
            upsert_with(&tx, reservation)?;
        }
        tx.commit()?;
        Ok(())
    })?;
    tracing::debug!(
        "Reservation cache replaced with {} rows",
        reservations.len()
    );
    db.notify(Table::Reservations);
    Ok(())
}

/// Cached reservations, latest departure first.
pub fn get_reservations(db: &Database) -> Result<Vec<Reservation>> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY departure_date DESC, created_at DESC",
            SELECT_RESERVATION
        ))?;
        let rows = stmt.query_map([], reservation_from_row)?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    })
}

pub fn get_reservation_by_id(db: &Database, id: &str) -> Result<Option<Reservation>> {
    db.with_conn(|conn| {
        let reservation = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_RESERVATION),
                rusqlite::params![id],
                reservation_from_row,
            )
            .optional()?;
        Ok(reservation)
    })
}

pub fn clear_reservations(db: &Database) -> Result<()> {
    db.with_conn(|conn| {
        conn.execute("DELETE FROM reservations", [])?;
        Ok(())
    })?;
    db.notify(Table::Reservations);
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::tests::setup_test_db;

    pub(crate) fn sample_reservation(id: &str, departure_date: &str) -> Reservation {
        Reservation {
            id: id.into(),
            offer_id: "of-1".into(),
            flight_number: "SW101".into(),
            origin: "WAW".into(),
            destination: "JFK".into(),
            departure_date: departure_date.into(),
            passenger_name: "John Doe".into(),
            seat: None,
            status: "confirmed".into(),
            total_price: 1299.5,
            created_at: "2026-10-01T09:30:00Z".into(),
        }
    }

    #[test]
    fn test_upsert_round_trip() {
        let db = setup_test_db();
        let mut reservation = sample_reservation("r1", "2026-12-01");
        reservation.seat = Some("14C".into());
        upsert_reservation(&db, &reservation).unwrap();

        assert_eq!(get_reservation_by_id(&db, "r1").unwrap(), Some(reservation));
    }

    #[test]
    fn test_status_update_keeps_single_row() {
        let db = setup_test_db();
        let mut reservation = sample_reservation("r1", "2026-12-01");
        upsert_reservation(&db, &reservation).unwrap();

        reservation.status = "cancelled".into();
        upsert_reservation(&db, &reservation).unwrap();

        let all = get_reservations(&db).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, "cancelled");
    }

    #[test]
    fn test_latest_departure_first() {
        let db = setup_test_db();
        replace_reservations(
            &db,
            &[
                sample_reservation("r1", "2026-11-01"),
                sample_reservation("r2", "2027-01-15"),
            ],
        )
        .unwrap();

        let ids: Vec<String> = get_reservations(&db)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["r2", "r1"]);
    }

    #[test]
    fn test_clear_reservations() {
        let db = setup_test_db();
        upsert_reservation(&db, &sample_reservation("r1", "2026-12-01")).unwrap();
        clear_reservations(&db).unwrap();
        assert!(get_reservations(&db).unwrap().is_empty());
    }
}

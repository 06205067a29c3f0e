//! Cached partner discounts.

use rusqlite::{Connection, OptionalExtension, Row};

use super::{Database, Table};
use crate::error::Result;
use crate::models::Partner;

const SELECT_PARTNER: &str = "SELECT id, name, category, description, discount_percentage, \
                              logo_url, is_active FROM partners";

fn partner_from_row(row: &Row<'_>) -> rusqlite::Result<Partner> {
    Ok(Partner {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        description: row.get(3)?,
        discount_percentage: row.get(4)?,
        logo_url: row.get(5)?,
        is_active: row.get(6)?,
    })
}

fn upsert_with(conn: &Connection, partner: &Partner) -> Result<()> {
    conn.execute(
        "INSERT INTO partners (id, name, category, description, discount_percentage,
                               logo_url, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            category = excluded.category,
            description = excluded.description,
            discount_percentage = excluded.discount_percentage,
            logo_url = excluded.logo_url,
            is_active = excluded.is_active",
        rusqlite::params![
            partner.id,
            partner.name,
            partner.category,
            partner.description,
            partner.discount_percentage,
            partner.logo_url,
            partner.is_active,
        ],
    )?;
    Ok(())
}

fn query_partners(db: &Database, sql: &str) -> Result<Vec<Partner>> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], partner_from_row)?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    })
}

pub fn upsert_partner(db: &Database, partner: &Partner) -> Result<()> {
    db.with_conn(|conn| upsert_with(conn, partner))?;
    db.notify(Table::Partners);
    Ok(())
}

/// Replace the whole table with `partners`.
pub fn replace_partners(db: &Database, partners: &[Partner]) -> Result<()> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM partners", [])?;
        for partner in partners {
            upsert_with(&tx, partner)?;
        }
        tx.commit()?;
        Ok(())
    })?;
    tracing::debug!("Partner cache replaced with {} rows", partners.len());
    db.notify(Table::Partners);
    Ok(())
}

/// Active partners, ordered by name.
pub fn get_partners(db: &Database) -> Result<Vec<Partner>> {
    query_partners(
        db,
        &format!("{} WHERE is_active = 1 ORDER BY name ASC", SELECT_PARTNER),
    )
}

/// Every cached partner, including inactive ones.
pub fn get_all_partners(db: &Database) -> Result<Vec<Partner>> {
    query_partners(db, &format!("{} ORDER BY name ASC", SELECT_PARTNER))
}

pub fn get_partner_by_id(db: &Database, id: &str) -> Result<Option<Partner>> {
    db.with_conn(|conn| {
        let partner = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_PARTNER),
                rusqlite::params![id],
                partner_from_row,
            )
            .optional()?;
        Ok(partner)
    })
}

pub fn clear_partners(db: &Database) -> Result<()> {
    db.with_conn(|conn| {
        conn.execute("DELETE FROM partners", [])?;
        Ok(())
    })?;
    db.notify(Table::Partners);
    Ok(())
}

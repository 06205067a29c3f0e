//! Cached loyalty account (single row).

use rusqlite::{OptionalExtension, Row};

use super::{Database, Table};
use crate::error::Result;
use crate::models::Account;

const SELECT_ACCOUNT: &str = "SELECT id, first_name, last_name, email, passport_number, tier, \
                              miles_points FROM account";

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        passport_number: row.get(4)?,
        tier: row.get(5)?,
        miles_points: row.get(6)?,
    })
}

/// Store `account` as the only cached account, replacing any other member.
pub fn upsert_account(db: &Database, account: &Account) -> Result<()> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM account WHERE id <> ?1",
            rusqlite::params![account.id],
        )?;
        tx.execute(
            "INSERT INTO account (id, first_name, last_name, email, passport_number, tier, miles_points)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                email = excluded.email,
                passport_number = excluded.passport_number,
                tier = excluded.tier,
                miles_points = excluded.miles_points",
            rusqlite::params![
                account.id,
                account.first_name,
                account.last_name,
                account.email,
                account.passport_number,
                account.tier,
                account.miles_points,
            ],
        )?;
        tx.commit()?;
        Ok(())
    })?;
    db.notify(Table::Account);
    Ok(())
}

/// Read the cached account, if any.
pub fn get_account(db: &Database) -> Result<Option<Account>> {
    db.with_conn(|conn| {
        let account = conn
            .query_row(&format!("{} LIMIT 1", SELECT_ACCOUNT), [], account_from_row)
            .optional()?;
        Ok(account)
    })
}

pub fn get_account_by_id(db: &Database, id: &str) -> Result<Option<Account>> {
    db.with_conn(|conn| {
        let account = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_ACCOUNT),
                rusqlite::params![id],
                account_from_row,
            )
            .optional()?;
        Ok(account)
    })
}

pub fn clear_account(db: &Database) -> Result<()> {
    db.with_conn(|conn| {
        conn.execute("DELETE FROM account", [])?;
        Ok(())
    })?;
    db.notify(Table::Account);
    Ok(())
}

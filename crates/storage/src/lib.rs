//! SQLite persistence for the itinerary: days keyed by their 1-based
//! number, attractions hanging off a day. Deleting a day shifts every
//! higher number down by one so the persisted sequence stays dense,
//! mirroring the renumbering the client performs.

use std::{fs, path::Path, str::FromStr};

use anyhow::{anyhow, Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};

use shared::{
    domain::{AttractionId, AttractionKind, DayNumber},
    protocol::{AttractionRecord, DayRecord},
};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// All persisted days in ascending number order, each carrying its
    /// hotel (at most one; the oldest row wins) and its restaurant and
    /// activity lists in insertion order.
    pub async fn list_days(&self) -> Result<Vec<DayRecord>> {
        let day_rows = sqlx::query("SELECT number FROM days ORDER BY number ASC")
            .fetch_all(&self.pool)
            .await?;
        let mut days = Vec::with_capacity(day_rows.len());
        for row in day_rows {
            let number: i64 = row.try_get("number")?;
            days.push(DayRecord::empty(DayNumber(number as u32)));
        }

        let attraction_rows = sqlx::query(
            "SELECT id, day_number, kind, name FROM attractions ORDER BY day_number ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        for row in attraction_rows {
            let day_number: i64 = row.try_get("day_number")?;
            let kind: AttractionKind = row
                .try_get::<String, _>("kind")?
                .parse()
                .map_err(|err: String| anyhow!(err))?;
            let record = AttractionRecord {
                id: AttractionId(row.try_get("id")?),
                kind,
                name: row.try_get("name")?,
            };
            let Some(day) = days
                .iter_mut()
                .find(|day| i64::from(day.number.0) == day_number)
            else {
                continue;
            };
            match kind {
                AttractionKind::Hotel => {
                    if day.hotel.is_none() {
                        day.hotel = Some(record);
                    }
                }
                AttractionKind::Restaurant => day.restaurant.push(record),
                AttractionKind::Activity => day.activity.push(record),
            }
        }
        Ok(days)
    }

    pub async fn day_count(&self) -> Result<u32> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM days")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u32)
    }

    pub async fn create_day(&self, number: DayNumber) -> Result<DayRecord> {
        sqlx::query("INSERT INTO days (number) VALUES (?1)")
            .bind(i64::from(number.0))
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to insert day {number}"))?;
        Ok(DayRecord::empty(number))
    }

    /// Deletes a day and closes the numbering gap it leaves. Returns
    /// whether the day existed. Attractions follow their day via the
    /// cascading foreign key, both on delete and on renumber.
    pub async fn delete_day(&self, number: DayNumber) -> Result<bool> {
        let number = i64::from(number.0);
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM days WHERE number = ?1")
            .bind(number)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }
        // Shift in two passes through negative numbers; a single
        // decrementing UPDATE can collide with a not-yet-shifted row
        // under the primary key constraint.
        sqlx::query("UPDATE days SET number = -(number - 1) WHERE number > ?1")
            .bind(number)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE days SET number = -number WHERE number < 0")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }

    pub async fn add_attraction(
        &self,
        day: DayNumber,
        kind: AttractionKind,
        name: &str,
    ) -> Result<AttractionId> {
        let result = sqlx::query("INSERT INTO attractions (day_number, kind, name) VALUES (?1, ?2, ?3)")
            .bind(i64::from(day.0))
            .bind(kind.as_str())
            .bind(name)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to attach {} to day {day}", kind.as_str()))?;
        Ok(AttractionId(result.last_insert_rowid()))
    }

    pub async fn remove_attraction(&self, id: AttractionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM attractions WHERE id = ?1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    if path.is_empty() || path.starts_with(':') {
        // in-memory databases have no backing file
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create database dir {}", parent.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

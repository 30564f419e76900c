//! Postgres-backed scan history.
//!
//! ## Schema
//!
//! One `scan_history` row per recorded action. `source_event_id` is unique so
//! a redelivered reward event maps onto the row it already produced.
//!
//! ## Error Mapping
//!
//! Every SQLx error becomes `StoreError::Database` tagged with the operation
//! name. Rows that cannot be decoded into a `ScanRecord` (unknown action,
//! blank product id, negative points) become `StoreError::Corrupt`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use ecosmart_catalog::ProductId;
use ecosmart_core::{ScanId, UserId};

use super::{NewScanRecord, ScanAction, ScanHistoryStore, ScanRecord, StoreError};

const SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS scan_history (
        id UUID PRIMARY KEY,
        source_event_id UUID NOT NULL UNIQUE,
        user_id UUID NOT NULL,
        product_id TEXT NULL,
        scanned_at TIMESTAMPTZ NOT NULL,
        action_taken TEXT NOT NULL,
        eco_points_earned BIGINT NOT NULL CHECK (eco_points_earned >= 0),
        co2_saved DOUBLE PRECISION NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS scan_history_user_recent
        ON scan_history (user_id, scanned_at DESC)
    "#,
];

pub struct PostgresScanHistory {
    pool: Arc<PgPool>,
}

impl PostgresScanHistory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Create the `scan_history` table and index if they do not exist.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ScanHistoryStore for PostgresScanHistory {
    #[instrument(skip(self, record), fields(user_id = %record.user_id, action = record.action.as_str()))]
    async fn record_scan(&self, record: NewScanRecord) -> Result<ScanRecord, StoreError> {
        let points = i64::try_from(record.points_earned)
            .map_err(|_| StoreError::Corrupt(format!("points out of range: {}", record.points_earned)))?;

        let row = sqlx::query(
            r#"
            INSERT INTO scan_history (
                id,
                source_event_id,
                user_id,
                product_id,
                scanned_at,
                action_taken,
                eco_points_earned,
                co2_saved
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (source_event_id)
            DO UPDATE SET source_event_id = EXCLUDED.source_event_id
            RETURNING id, user_id, product_id, scanned_at, action_taken, eco_points_earned, co2_saved
            "#,
        )
        .bind(*ScanId::new().as_uuid())
        .bind(record.source_event_id)
        .bind(*record.user_id.as_uuid())
        .bind(record.product_id.as_ref().map(|p| p.as_str()))
        .bind(record.scanned_at)
        .bind(record.action.as_str())
        .bind(points)
        .bind(record.co2_saved_kg)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("record_scan", e))?;

        ScanRecordRow::from_row(&row)
            .map_err(|e| map_sqlx_error("record_scan", e))?
            .try_into()
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn recent_for_user(&self, user_id: UserId, limit: usize) -> Result<Vec<ScanRecord>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = sqlx::query(
            r#"
            SELECT id, user_id, product_id, scanned_at, action_taken, eco_points_earned, co2_saved
            FROM scan_history
            WHERE user_id = $1
            ORDER BY scanned_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(*user_id.as_uuid())
        .bind(limit)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("recent_for_user", e))?;

        rows.iter()
            .map(|row| {
                ScanRecordRow::from_row(row)
                    .map_err(|e| map_sqlx_error("recent_for_user", e))?
                    .try_into()
            })
            .collect()
    }
}

pub(crate) fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    let message = match err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            Some(code) => format!("{} (code {})", db_err.message(), code),
            None => db_err.message().to_string(),
        },
        sqlx::Error::PoolClosed => "connection pool closed".to_string(),
        other => other.to_string(),
    };
    StoreError::Database { operation, message }
}

#[derive(Debug)]
struct ScanRecordRow {
    id: uuid::Uuid,
    user_id: uuid::Uuid,
    product_id: Option<String>,
    scanned_at: DateTime<Utc>,
    action_taken: String,
    eco_points_earned: i64,
    co2_saved: f64,
}

impl ScanRecordRow {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            product_id: row.try_get("product_id")?,
            scanned_at: row.try_get("scanned_at")?,
            action_taken: row.try_get("action_taken")?,
            eco_points_earned: row.try_get("eco_points_earned")?,
            co2_saved: row.try_get("co2_saved")?,
        })
    }
}

impl TryFrom<ScanRecordRow> for ScanRecord {
    type Error = StoreError;

    fn try_from(row: ScanRecordRow) -> Result<Self, Self::Error> {
        let action = ScanAction::parse(&row.action_taken)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown action_taken {:?}", row.action_taken)))?;
        let product_id = row
            .product_id
            .map(ProductId::new)
            .transpose()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let points_earned = u64::try_from(row.eco_points_earned)
            .map_err(|_| StoreError::Corrupt(format!("negative points {}", row.eco_points_earned)))?;

        Ok(ScanRecord {
            id: ScanId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            product_id,
            scanned_at: row.scanned_at,
            action,
            points_earned,
            co2_saved_kg: row.co2_saved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(action: &str, product_id: Option<&str>, points: i64) -> ScanRecordRow {
        ScanRecordRow {
            id: uuid::Uuid::now_v7(),
            user_id: uuid::Uuid::now_v7(),
            product_id: product_id.map(str::to_string),
            scanned_at: Utc::now(),
            action_taken: action.to_string(),
            eco_points_earned: points,
            co2_saved: 0.5,
        }
    }

    #[test]
    fn well_formed_rows_decode() {
        let record = ScanRecord::try_from(row("swapped", Some("1a"), 50)).unwrap();
        assert_eq!(record.action, ScanAction::Swapped);
        assert_eq!(record.product_id.unwrap().as_str(), "1a");
        assert_eq!(record.points_earned, 50);
    }

    #[test]
    fn corrupt_rows_are_reported() {
        assert!(matches!(ScanRecord::try_from(row("deleted", None, 0)), Err(StoreError::Corrupt(_))));
        assert!(matches!(ScanRecord::try_from(row("scanned", None, -5)), Err(StoreError::Corrupt(_))));
        assert!(matches!(ScanRecord::try_from(row("scanned", Some(" "), 10)), Err(StoreError::Corrupt(_))));
    }
}

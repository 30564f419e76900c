//! Scan-history persistence sink.
//!
//! Records are written by the scan recorder worker from reward events, never on
//! the request path. Writes are keyed by the source event id so redelivery of
//! the same event does not create a second row.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use ecosmart_catalog::ProductId;
use ecosmart_core::{ScanId, UserId};
use ecosmart_rewards::RewardEvent;

pub use in_memory::InMemoryScanHistory;
pub use postgres::PostgresScanHistory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("scan history lock poisoned")]
    Poisoned,

    #[error("database error in {operation}: {message}")]
    Database { operation: &'static str, message: String },

    #[error("corrupt scan history row: {0}")]
    Corrupt(String),
}

/// What the shopper did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanAction {
    Scanned,
    Swapped,
    Optimized,
}

impl ScanAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanAction::Scanned => "scanned",
            ScanAction::Swapped => "swapped",
            ScanAction::Optimized => "optimized",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "scanned" => Some(ScanAction::Scanned),
            "swapped" => Some(ScanAction::Swapped),
            "optimized" => Some(ScanAction::Optimized),
            _ => None,
        }
    }
}

/// A record to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct NewScanRecord {
    /// Id of the reward event this record was derived from.
    pub source_event_id: Uuid,
    pub user_id: UserId,
    /// `None` for whole-cart actions.
    pub product_id: Option<ProductId>,
    pub scanned_at: DateTime<Utc>,
    pub action: ScanAction,
    pub points_earned: u64,
    pub co2_saved_kg: f64,
}

impl NewScanRecord {
    /// Derive a record from a reward event. Redemptions and badges are not scans.
    pub fn from_event(source_event_id: Uuid, event: &RewardEvent) -> Option<Self> {
        let (product_id, action, co2_saved_kg, scanned_at) = match event {
            RewardEvent::ScanRewarded(e) => (Some(e.product_id.clone()), ScanAction::Scanned, e.co2_saved_kg, e.occurred_at),
            RewardEvent::SwapRewarded(e) => {
                (Some(e.chosen_product_id.clone()), ScanAction::Swapped, e.co2_saved_kg, e.occurred_at)
            }
            RewardEvent::OptimizationRewarded(e) => (None, ScanAction::Optimized, e.co2_reduction_kg, e.occurred_at),
            RewardEvent::RewardRedeemed(_) | RewardEvent::BadgeAwarded(_) => return None,
        };

        Some(Self {
            source_event_id,
            user_id: event.user_id(),
            product_id,
            scanned_at,
            action,
            points_earned: event.points_earned(),
            co2_saved_kg,
        })
    }
}

/// A persisted record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanRecord {
    pub id: ScanId,
    pub user_id: UserId,
    pub product_id: Option<ProductId>,
    pub scanned_at: DateTime<Utc>,
    pub action: ScanAction,
    pub points_earned: u64,
    pub co2_saved_kg: f64,
}

/// Running totals over a set of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScanTotals {
    pub total_scans: usize,
    pub total_points: u64,
    pub total_co2_saved_kg: f64,
}

impl ScanTotals {
    pub fn from_records(records: &[ScanRecord]) -> Self {
        records.iter().fold(Self::default(), |acc, r| Self {
            total_scans: acc.total_scans + 1,
            total_points: acc.total_points + r.points_earned,
            total_co2_saved_kg: acc.total_co2_saved_kg + r.co2_saved_kg,
        })
    }
}

#[async_trait::async_trait]
pub trait ScanHistoryStore: Send + Sync {
    /// Persist a record. Writing the same `source_event_id` twice returns the
    /// first record.
    async fn record_scan(&self, record: NewScanRecord) -> Result<ScanRecord, StoreError>;

    /// The user's most recent records, newest first.
    async fn recent_for_user(&self, user_id: UserId, limit: usize) -> Result<Vec<ScanRecord>, StoreError>;
}

#[async_trait::async_trait]
impl<S> ScanHistoryStore for Arc<S>
where
    S: ScanHistoryStore + ?Sized,
{
    async fn record_scan(&self, record: NewScanRecord) -> Result<ScanRecord, StoreError> {
        (**self).record_scan(record).await
    }

    async fn recent_for_user(&self, user_id: UserId, limit: usize) -> Result<Vec<ScanRecord>, StoreError> {
        (**self).recent_for_user(user_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecosmart_rewards::{RewardRedeemed, ScanRewarded, SwapRewarded};

    fn pid(id: &str) -> ProductId {
        ProductId::new(id).unwrap()
    }

    #[test]
    fn scan_and_swap_events_become_records() {
        let user = UserId::new();
        let scan = RewardEvent::ScanRewarded(ScanRewarded {
            user_id: user,
            product_id: pid("2"),
            points: 20,
            co2_saved_kg: 0.5,
            occurred_at: Utc::now(),
        });
        let record = NewScanRecord::from_event(Uuid::now_v7(), &scan).unwrap();
        assert_eq!(record.action, ScanAction::Scanned);
        assert_eq!(record.points_earned, 20);
        assert_eq!(record.product_id, Some(pid("2")));

        let swap = RewardEvent::SwapRewarded(SwapRewarded {
            user_id: user,
            original_product_id: pid("1"),
            chosen_product_id: pid("1a"),
            points: 50,
            co2_saved_kg: 13.7,
            occurred_at: Utc::now(),
        });
        let record = NewScanRecord::from_event(Uuid::now_v7(), &swap).unwrap();
        assert_eq!(record.action, ScanAction::Swapped);
        assert_eq!(record.product_id, Some(pid("1a")));
        assert_eq!(record.co2_saved_kg, 13.7);
    }

    #[test]
    fn redemptions_are_not_recorded() {
        let event = RewardEvent::RewardRedeemed(RewardRedeemed {
            user_id: UserId::new(),
            reward_id: "1".to_string(),
            points_spent: 200,
            cash_cents: 500,
            occurred_at: Utc::now(),
        });
        assert!(NewScanRecord::from_event(Uuid::now_v7(), &event).is_none());
    }

    #[test]
    fn action_names_round_trip_through_text() {
        for action in [ScanAction::Scanned, ScanAction::Swapped, ScanAction::Optimized] {
            assert_eq!(ScanAction::parse(action.as_str()), Some(action));
        }
        assert_eq!(ScanAction::parse("deleted"), None);
    }

    #[test]
    fn totals_sum_points_and_co2() {
        let user = UserId::new();
        let record = |points, co2| ScanRecord {
            id: ScanId::new(),
            user_id: user,
            product_id: None,
            scanned_at: Utc::now(),
            action: ScanAction::Scanned,
            points_earned: points,
            co2_saved_kg: co2,
        };
        let totals = ScanTotals::from_records(&[record(20, 0.5), record(50, 13.7), record(10, 0.0)]);

        assert_eq!(totals.total_scans, 3);
        assert_eq!(totals.total_points, 80);
        assert!((totals.total_co2_saved_kg - 14.2).abs() < 1e-9);
        assert_eq!(ScanTotals::from_records(&[]), ScanTotals::default());
    }
}

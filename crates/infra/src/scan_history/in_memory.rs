use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use ecosmart_core::{ScanId, UserId};

use super::{NewScanRecord, ScanHistoryStore, ScanRecord, StoreError};

#[derive(Debug, Default)]
struct Inner {
    /// Append order.
    records: Vec<ScanRecord>,
    by_source_event: HashMap<Uuid, usize>,
}

/// In-memory scan history for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryScanHistory {
    inner: RwLock<Inner>,
}

impl InMemoryScanHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl ScanHistoryStore for InMemoryScanHistory {
    async fn record_scan(&self, record: NewScanRecord) -> Result<ScanRecord, StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;

        if let Some(&idx) = inner.by_source_event.get(&record.source_event_id) {
            return Ok(inner.records[idx].clone());
        }

        let stored = ScanRecord {
            id: ScanId::new(),
            user_id: record.user_id,
            product_id: record.product_id,
            scanned_at: record.scanned_at,
            action: record.action,
            points_earned: record.points_earned,
            co2_saved_kg: record.co2_saved_kg,
        };
        let idx = inner.records.len();
        inner.records.push(stored.clone());
        inner.by_source_event.insert(record.source_event_id, idx);
        Ok(stored)
    }

    async fn recent_for_user(&self, user_id: UserId, limit: usize) -> Result<Vec<ScanRecord>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;

        let mut records: Vec<ScanRecord> = inner.records.iter().filter(|r| r.user_id == user_id).cloned().collect();
        // Newest first; ties keep the later append first.
        records.reverse();
        records.sort_by(|a, b| b.scanned_at.cmp(&a.scanned_at));
        records.truncate(limit);
        Ok(records)
    }
}

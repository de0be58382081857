/// Sync service - whole-row overwrite of a client's items
use crate::error::{AppError, Result};
use crate::services::clock::StampClock;
use crate::store::columns::{item_to_row, FIRST_DATA_ROW, MAX_ROW};
use crate::store::StoreAdapter;
use chrono::{DateTime, Utc};
use content_model::api::SyncItem;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub count: usize,
    /// Shared `lastSync` stamp; `None` when the batch was empty.
    pub synced_at: Option<DateTime<Utc>>,
}

pub struct SyncService {
    store: Arc<StoreAdapter>,
    clock: Arc<StampClock>,
}

impl SyncService {
    pub fn new(store: Arc<StoreAdapter>, clock: Arc<StampClock>) -> Self {
        Self { store, clock }
    }

    /// Overwrite each item's row with its full contents in one batched
    /// request. Row positions come from the caller; no id lookup happens here.
    pub async fn sync_content(&self, items: Vec<SyncItem>) -> Result<SyncOutcome> {
        if items.is_empty() {
            return Ok(SyncOutcome {
                count: 0,
                synced_at: None,
            });
        }

        validate_rows(&items)?;

        let count = items.len();
        let synced_at = self.clock.now();
        let rows = items
            .iter()
            .map(|entry| (entry.row_index, item_to_row(&entry.item, synced_at)))
            .collect();

        self.store
            .overwrite_rows(rows)
            .await
            .map_err(|source| AppError::SyncFailed { count, source })?;

        info!(count, "Synced content items");
        Ok(SyncOutcome {
            count,
            synced_at: Some(synced_at),
        })
    }
}

fn validate_rows(items: &[SyncItem]) -> Result<()> {
    let mut seen = HashSet::with_capacity(items.len());
    for entry in items {
        if !(FIRST_DATA_ROW..=MAX_ROW).contains(&entry.row_index) {
            return Err(AppError::ValidationError(format!(
                "Invalid rowIndex {} for item {}",
                entry.row_index, entry.item.id
            )));
        }
        if !seen.insert(entry.row_index) {
            return Err(AppError::ValidationError(format!(
                "Duplicate rowIndex {} in sync batch",
                entry.row_index
            )));
        }
    }
    Ok(())
}

/// Status service - lookup-then-patch of one item's status field group
use crate::error::{AppError, Result};
use crate::services::clock::StampClock;
use crate::store::columns::status_patch_cells;
use crate::store::{StoreAdapter, StoreError};
use chrono::{DateTime, Utc};
use content_model::{ContentItem, Status, StatusPatch};
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of a successful status update.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub id: String,
    pub status: Status,
    pub row_index: u32,
    pub stamped_at: DateTime<Utc>,
    /// Record as read back after the write; `None` if that read failed.
    pub item: Option<ContentItem>,
}

pub struct StatusService {
    store: Arc<StoreAdapter>,
    clock: Arc<StampClock>,
    default_approver: String,
}

impl StatusService {
    pub fn new(store: Arc<StoreAdapter>, clock: Arc<StampClock>, default_approver: impl Into<String>) -> Self {
        Self {
            store,
            clock,
            default_approver: default_approver.into(),
        }
    }

    /// Move `id` to `status`.
    ///
    /// Any status may follow any other. All stamped cells share one timestamp
    /// and go to the store in one batched request. A missing id performs no
    /// writes.
    pub async fn update_status(
        &self,
        id: &str,
        status: Status,
        feedback: Option<&str>,
    ) -> Result<StatusUpdate> {
        let id = id.trim();
        if id.is_empty() {
            return Err(AppError::ValidationError("Missing required fields".to_string()));
        }

        let update_failed = |source: StoreError| AppError::UpdateFailed {
            id: id.to_string(),
            status: status.to_string(),
            source,
        };

        let row_index = self
            .store
            .find_row_index_by_id(id)
            .await
            .map_err(&update_failed)?
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;

        let patch = StatusPatch::new(status, feedback, self.clock.now(), &self.default_approver);

        if let Err(source) = self.store.patch_row(row_index, status_patch_cells(&patch)).await {
            self.log_observed_state(id, row_index).await;
            return Err(update_failed(source));
        }

        info!(
            id,
            row = row_index,
            status = %status,
            approval = patch.is_approval(),
            feedback = patch.feedback.is_some(),
            "Status updated"
        );

        let item = match self.store.fetch_row(row_index).await {
            Ok(item) => item,
            Err(e) => {
                warn!(id, row = row_index, error = %e, "Confirmation read after status update failed");
                None
            }
        };

        Ok(StatusUpdate {
            id: id.to_string(),
            status,
            row_index,
            stamped_at: patch.stamped_at,
            item,
        })
    }

    /// Reconciliation read after a failed write, so the log shows what the
    /// row holds now.
    async fn log_observed_state(&self, id: &str, row_index: u32) {
        match self.store.fetch_row(row_index).await {
            Ok(Some(item)) => warn!(
                id,
                row = row_index,
                observed_status = %item.status,
                last_sync = ?item.last_sync,
                "Status update failed; row state after failure"
            ),
            Ok(None) => warn!(id, row = row_index, "Status update failed; row no longer readable"),
            Err(e) => warn!(
                id,
                row = row_index,
                error = %e,
                "Status update failed; reconciliation read failed too"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemorySheetStore, MockSheetStore, SheetRange};
    use chrono::TimeZone;
    use content_model::Platform;
    use std::time::Duration;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn service_over(memory: Arc<MemorySheetStore>) -> StatusService {
        let adapter = Arc::new(StoreAdapter::new(memory, Duration::from_secs(1)));
        StatusService::new(adapter, Arc::new(StampClock::new()), "Hamza")
    }

    fn seeded() -> (Arc<MemorySheetStore>, StatusService) {
        let memory = Arc::new(MemorySheetStore::seeded(&[
            ContentItem::draft("41", Platform::Twitter, "first", created()),
            ContentItem::draft("42", Platform::LinkedIn, "second", created()),
        ]));
        (memory.clone(), service_over(memory))
    }

    #[tokio::test]
    async fn approval_stamps_date_and_approver() {
        let (_, service) = seeded();

        let update = service.update_status("42", Status::Approved, None).await.unwrap();
        assert_eq!(update.row_index, 3);

        let item = update.item.expect("confirmed item");
        assert_eq!(item.status, Status::Approved);
        assert_eq!(item.date_approved, Some(update.stamped_at));
        assert_eq!(item.approved_by.as_deref(), Some("Hamza"));
        assert_eq!(item.last_sync, Some(update.stamped_at));
    }

    #[tokio::test]
    async fn approval_stamps_survive_later_updates() {
        let (_, service) = seeded();

        let approved = service.update_status("42", Status::Approved, None).await.unwrap();
        let published = service.update_status("42", Status::Published, None).await.unwrap();

        let item = published.item.unwrap();
        assert_eq!(item.status, Status::Published);
        assert_eq!(item.date_approved, Some(approved.stamped_at));
        assert_eq!(item.approved_by.as_deref(), Some("Hamza"));
    }

    #[tokio::test]
    async fn feedback_is_stamped_then_cleared_by_plain_update() {
        let (_, service) = seeded();

        let requested = service
            .update_status("41", Status::ChangesRequested, Some("Add a hook"))
            .await
            .unwrap();
        let item = requested.item.unwrap();
        assert_eq!(item.last_feedback.as_deref(), Some("Add a hook"));
        assert_eq!(item.last_feedback_date, Some(requested.stamped_at));

        let resubmitted = service.update_status("41", Status::InReview, None).await.unwrap();
        let item = resubmitted.item.unwrap();
        assert_eq!(item.last_feedback, None);
        assert_eq!(item.last_feedback_date, None);
    }

    #[tokio::test]
    async fn last_sync_strictly_increases() {
        let (_, service) = seeded();
        let mut previous = None;
        for status in [Status::InReview, Status::InReview, Status::Approved, Status::Published] {
            let update = service.update_status("41", status, None).await.unwrap();
            let last_sync = update.item.unwrap().last_sync.unwrap();
            if let Some(previous) = previous {
                assert!(last_sync > previous);
            }
            previous = Some(last_sync);
        }
    }

    #[tokio::test]
    async fn unknown_id_writes_nothing() {
        let (memory, service) = seeded();
        let before = memory.write_requests();

        let err = service.update_status("999", Status::Approved, None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref id) if id == "999"));
        assert_eq!(memory.write_requests(), before);
    }

    #[tokio::test]
    async fn blank_id_is_a_validation_error() {
        let (_, service) = seeded();
        let err = service.update_status("  ", Status::Draft, None).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn update_uses_a_single_store_request() {
        let (memory, service) = seeded();
        let before = memory.write_requests();
        service.update_status("41", Status::Approved, Some("ship it")).await.unwrap();
        assert_eq!(memory.write_requests(), before + 1);
    }

    #[tokio::test]
    async fn write_failure_carries_id_and_status() {
        let mut mock = MockSheetStore::new();
        mock.expect_read().returning(|range: &SheetRange| {
            if range.last_col == 0 {
                Ok(vec![vec!["42".to_string()]])
            } else {
                Err(StoreError::Unavailable("reconciliation read failed".to_string()))
            }
        });
        mock.expect_write_batch()
            .times(1)
            .returning(|_| Err(StoreError::Rejected { status: 503, message: "backend error".into() }));

        let adapter = Arc::new(StoreAdapter::new(Arc::new(mock), Duration::from_secs(1)));
        let service = StatusService::new(adapter, Arc::new(StampClock::new()), "System");

        let err = service.update_status("42", Status::Approved, None).await.unwrap_err();
        match err {
            AppError::UpdateFailed { id, status, source } => {
                assert_eq!(id, "42");
                assert_eq!(status, "Approved");
                assert!(matches!(source, StoreError::Rejected { status: 503, .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_confirmation_read_still_succeeds() {
        let mut mock = MockSheetStore::new();
        mock.expect_read().returning(|range: &SheetRange| {
            if range.last_col == 0 {
                Ok(vec![vec!["42".to_string()]])
            } else {
                Err(StoreError::Timeout(Duration::from_secs(5)))
            }
        });
        mock.expect_write_batch().times(1).returning(|writes| {
            assert_eq!(writes.len(), 2);
            Ok(())
        });

        let adapter = Arc::new(StoreAdapter::new(Arc::new(mock), Duration::from_secs(1)));
        let service = StatusService::new(adapter, Arc::new(StampClock::new()), "System");

        let update = service.update_status("42", Status::InReview, None).await.unwrap();
        assert_eq!(update.row_index, 2);
        assert!(update.item.is_none());
    }

    #[tokio::test]
    async fn whitespace_feedback_is_stored_and_stamped() {
        let (memory, service) = seeded();

        let update = service
            .update_status("41", Status::ChangesRequested, Some("   "))
            .await
            .unwrap();
        let row = memory.row(2);
        assert_eq!(row[5], "   ");
        assert_eq!(row[6], content_model::timestamp::format(&update.stamped_at));

        service
            .update_status("41", Status::ChangesRequested, Some("  Fix intro  "))
            .await
            .unwrap();
        assert_eq!(memory.row(2)[5], "  Fix intro  ");
    }

    #[tokio::test]
    async fn hand_entered_created_at_row_is_listed_and_confirmed() {
        let (memory, service) = seeded();
        memory.set_row(
            4,
            ["77", "Instagram", "", "Reel", "Draft", "", "", "2024-11-03 09:00:00"]
                .iter()
                .map(|cell| cell.to_string())
                .collect(),
        );

        let listed = service.store.fetch_all().await.unwrap();
        assert!(listed.iter().any(|item| item.id == "77"));

        let update = service.update_status("77", Status::Approved, None).await.unwrap();
        let item = update.item.expect("confirmed item");
        assert_eq!(item.status, Status::Approved);
        assert_eq!(content_model::timestamp::format(&item.created_at), "2024-11-03T09:00:00.000Z");
    }
}

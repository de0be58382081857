//! Content board
//!
//! Holds the dashboard's cache of content items. Status actions go to the
//! server first; the cache changes only after the server accepts the update.
//! When the server returns the confirmed record the cache takes it verbatim,
//! otherwise the server's stamping rules are mirrored locally. A failed
//! action leaves the cache untouched.
//!
//! Outcomes are published as [`Notice`]s for transient display.

use crate::api::{ApiClient, ClientError, Result};
use content_model::{fixtures, timestamp, ContentItem, Status, StatusPatch};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

const NOTICE_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Name mirrored into `approvedBy` when the server does not return the
    /// confirmed record.
    pub approver_name: String,
    /// Serve the fixture dataset when the initial load fails.
    /// Development only.
    pub fallback_to_fixtures: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            approver_name: "System".to_string(),
            fallback_to_fixtures: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

pub struct ContentBoard {
    api: ApiClient,
    config: BoardConfig,
    items: RwLock<Vec<ContentItem>>,
    notices: broadcast::Sender<Notice>,
}

impl ContentBoard {
    pub fn new(api: ApiClient, config: BoardConfig) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            api,
            config,
            items: RwLock::new(Vec::new()),
            notices,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    fn notify(&self, notice: Notice) {
        // No receivers is fine.
        let _ = self.notices.send(notice);
    }

    /// Snapshot of the cache.
    pub fn items(&self) -> Vec<ContentItem> {
        self.items.read().clone()
    }

    pub fn item(&self, id: &str) -> Option<ContentItem> {
        self.items.read().iter().find(|item| item.id == id).cloned()
    }

    /// Initial load. When fixture fallback is enabled, a server that fails
    /// its health check or the content fetch leaves the board serving the
    /// fixture dataset instead of an error.
    pub async fn load(&self) -> Result<usize> {
        let fetched = if self.api.health_check().await {
            self.api.get_content().await
        } else {
            Err(ClientError::Transport(format!(
                "approval service at {} is not healthy",
                self.api.base_url()
            )))
        };

        match fetched {
            Ok(items) => Ok(self.replace_items(items)),
            Err(e) if self.config.fallback_to_fixtures => {
                warn!(base_url = %self.api.base_url(), error = %e, "Loading content failed, using fixture data");
                Ok(self.replace_items(fixtures::sample_items()))
            }
            Err(e) => {
                self.notify(Notice::error(format!("Failed to load content: {}", e)));
                Err(e)
            }
        }
    }

    fn replace_items(&self, items: Vec<ContentItem>) -> usize {
        let count = items.len();
        *self.items.write() = items;
        count
    }

    /// Replace the cache with the server's current items.
    pub async fn reconcile(&self) -> Result<usize> {
        match self.api.get_content().await {
            Ok(items) => {
                let count = self.replace_items(items);
                info!(count, "Content board refreshed");
                Ok(count)
            }
            Err(e) => {
                self.notify(Notice::error(format!("Failed to load content: {}", e)));
                Err(e)
            }
        }
    }

    /// Run [`reconcile`](Self::reconcile) every `interval` until the task is
    /// aborted. Failures are reported as notices and retried next tick.
    pub fn spawn_reconciliation(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let board = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = board.reconcile().await {
                    warn!(error = %e, "Background reconciliation failed");
                }
            }
        })
    }

    pub async fn approve(&self, id: &str) -> Result<ContentItem> {
        self.set_status_with_feedback(id, Status::Approved, None, "Content approved successfully")
            .await
    }

    pub async fn request_changes(&self, id: &str, feedback: &str) -> Result<ContentItem> {
        self.set_status_with_feedback(
            id,
            Status::ChangesRequested,
            Some(feedback),
            "Changes requested successfully",
        )
        .await
    }

    pub async fn set_status(&self, id: &str, status: Status) -> Result<ContentItem> {
        self.set_status_with_feedback(id, status, None, "Status updated successfully")
            .await
    }

    async fn set_status_with_feedback(
        &self,
        id: &str,
        status: Status,
        feedback: Option<&str>,
        success_message: &str,
    ) -> Result<ContentItem> {
        if self.item(id).is_none() {
            let err = ClientError::UnknownItem(id.to_string());
            self.notify(Notice::error(err.to_string()));
            return Err(err);
        }

        let response = match self.api.update_status(id, status, feedback).await {
            Ok(response) => response,
            Err(e) => {
                warn!(id, status = %status, error = %e, "Status update failed");
                self.notify(Notice::error(format!("Failed to update status: {}", e)));
                return Err(e);
            }
        };

        let updated = {
            let mut items = self.items.write();
            let Some(slot) = items.iter_mut().find(|item| item.id == id) else {
                // Removed by a concurrent reconcile; keep whatever the server says.
                drop(items);
                return match response.item {
                    Some(item) => {
                        self.notify(Notice::success(success_message));
                        Ok(item)
                    }
                    None => Err(ClientError::UnknownItem(id.to_string())),
                };
            };

            match response.item {
                Some(confirmed) => *slot = confirmed,
                None => StatusPatch::new(status, feedback, timestamp::now(), &self.config.approver_name)
                    .apply(slot),
            }
            slot.clone()
        };

        self.notify(Notice::success(success_message));
        Ok(updated)
    }
}

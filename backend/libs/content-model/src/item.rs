/// The reviewable content record
use crate::status::{Platform, Status};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single social post moving through review.
///
/// `id` and `created_at` are assigned by the external process that creates
/// the row. Optional fields are `None` when the underlying cell is blank and
/// serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub platform: Platform,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub content: String,
    pub status: Status,
    #[serde(default)]
    pub last_feedback: Option<String>,
    #[serde(default, with = "crate::timestamp::optional")]
    pub last_feedback_date: Option<DateTime<Utc>>,
    #[serde(with = "crate::timestamp::required")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "crate::timestamp::optional")]
    pub date_approved: Option<DateTime<Utc>>,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default, with = "crate::timestamp::optional")]
    pub final_approval_date: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::timestamp::optional")]
    pub post_scheduled_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub posted_by: Option<String>,
    #[serde(default)]
    pub post_link: Option<String>,
    #[serde(default, with = "crate::timestamp::optional")]
    pub last_sync: Option<DateTime<Utc>>,
}

impl ContentItem {
    /// New draft item, as the external creation process would write it.
    pub fn draft(
        id: impl Into<String>,
        platform: Platform,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            platform,
            topic: None,
            content: content.into(),
            status: Status::Draft,
            last_feedback: None,
            last_feedback_date: None,
            created_at,
            date_approved: None,
            approved_by: None,
            final_approval_date: None,
            post_scheduled_date: None,
            posted_by: None,
            post_link: None,
            last_sync: None,
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }
}

/// The field group one status update writes.
///
/// Built once per update and applied both to the store (as cell ranges) and
/// to client caches, so the two sides stamp identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPatch {
    pub status: Status,
    /// Feedback exactly as supplied; `None` when absent or empty.
    pub feedback: Option<String>,
    pub stamped_at: DateTime<Utc>,
    /// Set only when `status` is `Approved`.
    pub approver: Option<String>,
}

impl StatusPatch {
    pub fn new(
        status: Status,
        feedback: Option<&str>,
        stamped_at: DateTime<Utc>,
        default_approver: &str,
    ) -> Self {
        let feedback = feedback
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        let approver = (status == Status::Approved).then(|| default_approver.to_string());

        Self {
            status,
            feedback,
            stamped_at,
            approver,
        }
    }

    pub fn is_approval(&self) -> bool {
        self.approver.is_some()
    }

    /// Feedback and its date are replaced together; an update without
    /// feedback clears both. Approval stamps are only ever set, never cleared.
    pub fn apply(&self, item: &mut ContentItem) {
        item.status = self.status;
        item.last_feedback = self.feedback.clone();
        item.last_feedback_date = self.feedback.as_ref().map(|_| self.stamped_at);
        if let Some(approver) = &self.approver {
            item.date_approved = Some(self.stamped_at);
            item.approved_by = Some(approver.clone());
        }
        item.last_sync = Some(self.stamped_at);
    }
}

//! Fixed column layout of the content sheet and row mapping.
//!
//! Row 1 holds the header; content rows start at row 2. Positions are
//! 0-based and must match `HEADERS`.

use content_model::{timestamp, ContentItem, StatusPatch};
use chrono::{DateTime, Utc};

pub const ID: usize = 0;
pub const PLATFORM: usize = 1;
pub const TOPIC: usize = 2;
pub const CONTENT: usize = 3;
pub const STATUS: usize = 4;
pub const LAST_FEEDBACK: usize = 5;
pub const LAST_FEEDBACK_DATE: usize = 6;
pub const CREATED_AT: usize = 7;
pub const DATE_APPROVED: usize = 8;
pub const APPROVED_BY: usize = 9;
pub const FINAL_APPROVAL_DATE: usize = 10;
pub const POST_SCHEDULED_DATE: usize = 11;
pub const POSTED_BY: usize = 12;
pub const POST_LINK: usize = 13;
pub const LAST_SYNC: usize = 14;

pub const COLUMN_COUNT: usize = 15;
pub const LAST_COLUMN: usize = COLUMN_COUNT - 1;

pub const HEADER_ROW: u32 = 1;
pub const FIRST_DATA_ROW: u32 = 2;
/// Highest addressable row. Sheets caps a spreadsheet at ten million cells.
pub const MAX_ROW: u32 = (10_000_000 / COLUMN_COUNT) as u32;

pub const HEADERS: [&str; COLUMN_COUNT] = [
    "ID",
    "Platform",
    "Topic",
    "Content",
    "Status",
    "Last Feedback",
    "Last Feedback Date",
    "Created At",
    "Date Approved",
    "Approved By",
    "Final Approval Date",
    "Post Scheduled Date",
    "Posted By",
    "Post Link",
    "Last Sync",
];

/// Spreadsheet column letter for a 0-based index (0 -> A, 26 -> AA).
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("row {row}: missing id")]
    MissingId { row: u32 },
    #[error("row {row}: {reason}")]
    Malformed { row: u32, reason: String },
}

fn cell(cells: &[String], index: usize) -> Option<&str> {
    cells
        .get(index)
        .map(|value| value.as_str())
        .filter(|value| !value.trim().is_empty())
}

fn text(cells: &[String], index: usize) -> Option<String> {
    cell(cells, index).map(str::to_string)
}

/// Non-empty cell text exactly as stored, surrounding whitespace included.
fn verbatim(cells: &[String], index: usize) -> Option<String> {
    cells
        .get(index)
        .filter(|value| !value.is_empty())
        .cloned()
}

fn optional_ts(cells: &[String], index: usize, row: u32) -> Option<DateTime<Utc>> {
    let raw = cell(cells, index)?;
    let parsed = timestamp::parse(raw);
    if parsed.is_none() {
        tracing::warn!(
            row,
            column = HEADERS[index],
            value = raw,
            "Unparseable timestamp cell treated as empty"
        );
    }
    parsed
}

/// Map one sheet row onto a `ContentItem`. Blank optional cells become `None`.
pub fn item_from_row(row: u32, cells: &[String]) -> Result<ContentItem, RowError> {
    let id = cell(cells, ID)
        .map(|id| id.trim().to_string())
        .ok_or(RowError::MissingId { row })?;

    let malformed = |reason: String| RowError::Malformed { row, reason };

    let platform = cell(cells, PLATFORM)
        .ok_or_else(|| malformed("missing platform".to_string()))?
        .parse()
        .map_err(|e: content_model::ParseEnumError| malformed(e.to_string()))?;
    let status = cell(cells, STATUS)
        .ok_or_else(|| malformed("missing status".to_string()))?
        .parse()
        .map_err(|e: content_model::ParseEnumError| malformed(e.to_string()))?;
    let created_at = cell(cells, CREATED_AT)
        .and_then(timestamp::parse)
        .ok_or_else(|| malformed("missing or invalid created at".to_string()))?;

    Ok(ContentItem {
        id,
        platform,
        topic: text(cells, TOPIC),
        content: cells.get(CONTENT).cloned().unwrap_or_default(),
        status,
        last_feedback: verbatim(cells, LAST_FEEDBACK),
        last_feedback_date: optional_ts(cells, LAST_FEEDBACK_DATE, row),
        created_at,
        date_approved: optional_ts(cells, DATE_APPROVED, row),
        approved_by: text(cells, APPROVED_BY),
        final_approval_date: optional_ts(cells, FINAL_APPROVAL_DATE, row),
        post_scheduled_date: optional_ts(cells, POST_SCHEDULED_DATE, row),
        posted_by: text(cells, POSTED_BY),
        post_link: text(cells, POST_LINK),
        last_sync: optional_ts(cells, LAST_SYNC, row),
    })
}

fn ts_cell(ts: &Option<DateTime<Utc>>) -> String {
    ts.as_ref().map(timestamp::format).unwrap_or_default()
}

/// Full 15-cell row for `item`, with `last_sync` replacing the item's own value.
pub fn item_to_row(item: &ContentItem, last_sync: DateTime<Utc>) -> Vec<String> {
    vec![
        item.id.clone(),
        item.platform.to_string(),
        item.topic.clone().unwrap_or_default(),
        item.content.clone(),
        item.status.to_string(),
        item.last_feedback.clone().unwrap_or_default(),
        ts_cell(&item.last_feedback_date),
        timestamp::format(&item.created_at),
        ts_cell(&item.date_approved),
        item.approved_by.clone().unwrap_or_default(),
        ts_cell(&item.final_approval_date),
        ts_cell(&item.post_scheduled_date),
        item.posted_by.clone().unwrap_or_default(),
        item.post_link.clone().unwrap_or_default(),
        timestamp::format(&last_sync),
    ]
}

/// A contiguous run of cells within one row, starting at `first_col`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellPatch {
    pub first_col: usize,
    pub values: Vec<String>,
}

/// Cells written by a status update: `E:G` and `O` always, `I:J` on approval.
pub fn status_patch_cells(patch: &StatusPatch) -> Vec<CellPatch> {
    let stamp = timestamp::format(&patch.stamped_at);
    let mut cells = vec![
        CellPatch {
            first_col: STATUS,
            values: vec![
                patch.status.to_string(),
                patch.feedback.clone().unwrap_or_default(),
                patch.feedback.as_ref().map(|_| stamp.clone()).unwrap_or_default(),
            ],
        },
        CellPatch {
            first_col: LAST_SYNC,
            values: vec![stamp.clone()],
        },
    ];

    if let Some(approver) = &patch.approver {
        cells.push(CellPatch {
            first_col: DATE_APPROVED,
            values: vec![stamp, approver.clone()],
        });
    }

    cells
}

//! Store adapter
//!
//! Translates between the spreadsheet's fixed 15-column rows and
//! `ContentItem`. The physical store sits behind the `SheetStore` trait so
//! the Google Sheets backend and the in-memory backend are interchangeable.
//!
//! Every call through `StoreAdapter` is bounded by the configured timeout.

pub mod columns;
pub mod google;
pub mod memory;
pub mod range;

use async_trait::async_trait;
use columns::{
    CellPatch, RowError, COLUMN_COUNT, FIRST_DATA_ROW, HEADERS, HEADER_ROW, LAST_COLUMN, MAX_ROW,
};
use content_model::ContentItem;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub use google::GoogleSheetsStore;
pub use memory::MemorySheetStore;
pub use range::{RangeWrite, SheetRange};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("store authentication failed: {0}")]
    Auth(String),

    #[error("invalid write: {0}")]
    InvalidWrite(String),

    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
}

impl StoreError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, StoreError::Timeout(_))
    }
}

/// Physical tabular store addressed by typed ranges.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Number of tabs in the spreadsheet. Zero means the store is unusable.
    async fn sheet_count(&self) -> Result<usize, StoreError>;

    /// Cell values in `range`, one `Vec` per row. Trailing blank cells and
    /// rows may be omitted.
    async fn read(&self, range: &SheetRange) -> Result<Vec<Vec<String>>, StoreError>;

    /// Apply all writes as one request.
    async fn write_batch(&self, writes: Vec<RangeWrite>) -> Result<(), StoreError>;

    /// Cosmetic styling of the header row.
    async fn format_header(&self) -> Result<(), StoreError>;
}

pub struct StoreAdapter {
    store: Arc<dyn SheetStore>,
    timeout: Duration,
}

impl StoreAdapter {
    pub fn new(store: Arc<dyn SheetStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(op, timeout_ms = self.timeout.as_millis() as u64, "Store call timed out");
                Err(StoreError::Timeout(self.timeout))
            }
        }
    }

    /// Tab count, used by the readiness check.
    pub async fn ping(&self) -> Result<usize, StoreError> {
        self.bounded("sheet_count", self.store.sheet_count()).await
    }

    /// Validate the store and write the canonical header row. Safe to run on
    /// every startup.
    pub async fn initialize_schema(&self) -> Result<(), StoreError> {
        let sheets = self
            .ping()
            .await
            .map_err(|e| StoreError::Schema(format!("store validation failed: {e}")))?;
        if sheets == 0 {
            return Err(StoreError::Schema("no sheets found in the spreadsheet".to_string()));
        }

        let header = RangeWrite {
            range: SheetRange::row(HEADER_ROW, 0, LAST_COLUMN),
            values: HEADERS.iter().map(|h| h.to_string()).collect(),
        };
        self.bounded("write_header", self.store.write_batch(vec![header]))
            .await
            .map_err(|e| StoreError::Schema(format!("failed to write header row: {e}")))?;

        if let Err(e) = self.bounded("format_header", self.store.format_header()).await {
            warn!(error = %e, "Header formatting failed; continuing");
        }

        info!(sheets, "Sheet schema initialized");
        Ok(())
    }

    /// Every content row, in sheet order. Rows that cannot be mapped are
    /// skipped and logged.
    pub async fn fetch_all(&self) -> Result<Vec<ContentItem>, StoreError> {
        let range = SheetRange::rows_from(FIRST_DATA_ROW, 0, LAST_COLUMN);
        let rows = self.bounded("read_rows", self.store.read(&range)).await?;

        let mut items = Vec::with_capacity(rows.len());
        for (offset, cells) in rows.iter().enumerate() {
            let row = FIRST_DATA_ROW + offset as u32;
            match columns::item_from_row(row, cells) {
                Ok(item) => items.push(item),
                Err(RowError::MissingId { .. }) => {}
                Err(e) => warn!(error = %e, "Skipping malformed content row"),
            }
        }

        debug!(rows = rows.len(), items = items.len(), "Fetched content rows");
        Ok(items)
    }

    /// The item stored at `row_index`, if that row holds one.
    pub async fn fetch_row(&self, row_index: u32) -> Result<Option<ContentItem>, StoreError> {
        let range = SheetRange::row(row_index, 0, LAST_COLUMN);
        let rows = self.bounded("read_row", self.store.read(&range)).await?;

        Ok(rows
            .first()
            .and_then(|cells| match columns::item_from_row(row_index, cells) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(error = %e, "Row does not hold a readable item");
                    None
                }
            }))
    }

    /// Sheet row number holding `id`. Linear scan of the ID column; with
    /// duplicate ids the first row wins.
    pub async fn find_row_index_by_id(&self, id: &str) -> Result<Option<u32>, StoreError> {
        let range = SheetRange::rows_from(FIRST_DATA_ROW, columns::ID, columns::ID);
        let rows = self.bounded("read_ids", self.store.read(&range)).await?;

        let mut matches = rows
            .iter()
            .enumerate()
            .filter(|(_, cells)| cells.first().map(|cell| cell.trim()) == Some(id))
            .map(|(offset, _)| FIRST_DATA_ROW + offset as u32);

        let first = matches.next();
        let duplicates: Vec<u32> = matches.collect();
        if let Some(first) = first {
            if !duplicates.is_empty() {
                warn!(
                    id,
                    row = first,
                    duplicate_rows = ?duplicates,
                    "Duplicate content id; using first matching row"
                );
            }
        }

        Ok(first)
    }

    /// Write several cell runs of one row in a single store request.
    pub async fn patch_row(&self, row_index: u32, patches: Vec<CellPatch>) -> Result<(), StoreError> {
        ensure_data_row(row_index)?;

        let writes = patches
            .into_iter()
            .map(|patch| {
                let last_col = patch.first_col + patch.values.len().saturating_sub(1);
                if patch.values.is_empty() || last_col > LAST_COLUMN {
                    return Err(StoreError::InvalidWrite(format!(
                        "cell run at column {} does not fit the row",
                        patch.first_col
                    )));
                }
                Ok(RangeWrite {
                    range: SheetRange::row(row_index, patch.first_col, last_col),
                    values: patch.values,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.bounded("patch_row", self.store.write_batch(writes)).await
    }

    /// Replace one full row.
    pub async fn overwrite_row(&self, row_index: u32, values: Vec<String>) -> Result<(), StoreError> {
        self.overwrite_rows(vec![(row_index, values)]).await
    }

    /// Replace several full rows in a single store request.
    pub async fn overwrite_rows(&self, rows: Vec<(u32, Vec<String>)>) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }

        let writes = rows
            .into_iter()
            .map(|(row_index, values)| {
                ensure_data_row(row_index)?;
                if values.len() != COLUMN_COUNT {
                    return Err(StoreError::InvalidWrite(format!(
                        "row {} has {} cells, expected {}",
                        row_index,
                        values.len(),
                        COLUMN_COUNT
                    )));
                }
                Ok(RangeWrite {
                    range: SheetRange::row(row_index, 0, LAST_COLUMN),
                    values,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.bounded("overwrite_rows", self.store.write_batch(writes)).await
    }
}

fn ensure_data_row(row_index: u32) -> Result<(), StoreError> {
    if !(FIRST_DATA_ROW..=MAX_ROW).contains(&row_index) {
        return Err(StoreError::InvalidWrite(format!(
            "row {} is not a content row",
            row_index
        )));
    }
    Ok(())
}

/// In-process sheet backend
///
/// Grid of strings behind a lock. A batch is validated in full before any
/// cell changes, so a rejected batch leaves the grid untouched.
use super::columns::{self, COLUMN_COUNT};
use super::range::{RangeWrite, SheetRange};
use super::{SheetStore, StoreError};
use async_trait::async_trait;
use content_model::ContentItem;
use parking_lot::RwLock;

pub struct MemorySheetStore {
    rows: RwLock<Vec<Vec<String>>>,
    sheet_count: usize,
    header_formatted: RwLock<bool>,
    write_requests: RwLock<usize>,
}

impl Default for MemorySheetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySheetStore {
    pub fn new() -> Self {
        Self::with_sheet_count(1)
    }

    pub fn with_sheet_count(sheet_count: usize) -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            sheet_count,
            header_formatted: RwLock::new(false),
            write_requests: RwLock::new(0),
        }
    }

    /// Store pre-populated with `items` from row 2 onward.
    pub fn seeded(items: &[ContentItem]) -> Self {
        let store = Self::new();
        for (offset, item) in items.iter().enumerate() {
            store.insert_item(columns::FIRST_DATA_ROW + offset as u32, item);
        }
        store
    }

    /// Write `item` at `row` exactly as the creation process would, keeping
    /// its own `last_sync`.
    pub fn insert_item(&self, row: u32, item: &ContentItem) {
        let mut cells = columns::item_to_row(item, chrono::Utc::now());
        cells[columns::LAST_SYNC] = item
            .last_sync
            .as_ref()
            .map(content_model::timestamp::format)
            .unwrap_or_default();
        self.set_row(row, cells);
    }

    pub fn set_row(&self, row: u32, cells: Vec<String>) {
        let mut rows = self.rows.write();
        let index = (row - 1) as usize;
        if rows.len() <= index {
            rows.resize(index + 1, Vec::new());
        }
        rows[index] = cells;
    }

    /// Raw cells of `row`, padded to the full column width.
    pub fn row(&self, row: u32) -> Vec<String> {
        let rows = self.rows.read();
        let mut cells = rows.get((row - 1) as usize).cloned().unwrap_or_default();
        if cells.len() < COLUMN_COUNT {
            cells.resize(COLUMN_COUNT, String::new());
        }
        cells
    }

    pub fn header_formatted(&self) -> bool {
        *self.header_formatted.read()
    }

    /// Number of `write_batch` calls that reached the grid.
    pub fn write_requests(&self) -> usize {
        *self.write_requests.read()
    }
}

fn trim_trailing_blanks(mut cells: Vec<String>) -> Vec<String> {
    while cells.last().is_some_and(|cell| cell.is_empty()) {
        cells.pop();
    }
    cells
}

#[async_trait]
impl SheetStore for MemorySheetStore {
    async fn sheet_count(&self) -> Result<usize, StoreError> {
        Ok(self.sheet_count)
    }

    async fn read(&self, range: &SheetRange) -> Result<Vec<Vec<String>>, StoreError> {
        if range.first_row == 0 {
            return Err(StoreError::Rejected {
                status: 400,
                message: format!("invalid range {}", range),
            });
        }

        let rows = self.rows.read();
        let start = (range.first_row - 1) as usize;
        let end = range
            .last_row
            .map(|last| (last as usize).min(rows.len()))
            .unwrap_or(rows.len());

        let mut out: Vec<Vec<String>> = rows
            .get(start..end.max(start))
            .unwrap_or_default()
            .iter()
            .map(|cells| {
                let slice = (range.first_col..=range.last_col)
                    .map(|col| cells.get(col).cloned().unwrap_or_default())
                    .collect();
                trim_trailing_blanks(slice)
            })
            .collect();

        while out.last().is_some_and(|cells| cells.is_empty()) {
            out.pop();
        }
        Ok(out)
    }

    async fn write_batch(&self, writes: Vec<RangeWrite>) -> Result<(), StoreError> {
        for write in &writes {
            let range = write.range;
            if range.first_row > columns::MAX_ROW {
                return Err(StoreError::Rejected {
                    status: 400,
                    message: format!("range {} exceeds grid limits", range),
                });
            }
            if range.first_row == 0 || range.last_row != Some(range.first_row) {
                return Err(StoreError::Rejected {
                    status: 400,
                    message: format!("range {} is not a single row", range),
                });
            }
            if write.values.len() != range.width() {
                return Err(StoreError::Rejected {
                    status: 400,
                    message: format!(
                        "range {} expects {} values, got {}",
                        range,
                        range.width(),
                        write.values.len()
                    ),
                });
            }
        }

        let mut rows = self.rows.write();
        for write in writes {
            let index = (write.range.first_row - 1) as usize;
            if rows.len() <= index {
                rows.resize(index + 1, Vec::new());
            }
            let cells = &mut rows[index];
            if cells.len() <= write.range.last_col {
                cells.resize(write.range.last_col + 1, String::new());
            }
            for (offset, value) in write.values.into_iter().enumerate() {
                cells[write.range.first_col + offset] = value;
            }
        }
        drop(rows);

        *self.write_requests.write() += 1;
        Ok(())
    }

    async fn format_header(&self) -> Result<(), StoreError> {
        *self.header_formatted.write() = true;
        Ok(())
    }
}

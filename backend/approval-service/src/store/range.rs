/// Typed A1 ranges and single-row writes
use super::columns::column_letter;
use std::fmt;

/// A rectangular block of cells: an inclusive column span starting at
/// `first_row` and running to `last_row`, or to the end of the sheet when
/// `last_row` is `None`. Rows are 1-based, columns 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetRange {
    pub first_col: usize,
    pub last_col: usize,
    pub first_row: u32,
    pub last_row: Option<u32>,
}

impl SheetRange {
    /// One row, `first_col..=last_col`.
    pub fn row(row: u32, first_col: usize, last_col: usize) -> Self {
        Self {
            first_col,
            last_col,
            first_row: row,
            last_row: Some(row),
        }
    }

    /// Every row from `first_row` down, `first_col..=last_col`.
    pub fn rows_from(first_row: u32, first_col: usize, last_col: usize) -> Self {
        Self {
            first_col,
            last_col,
            first_row,
            last_row: None,
        }
    }

    pub fn width(&self) -> usize {
        self.last_col + 1 - self.first_col
    }
}

impl fmt::Display for SheetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}",
            column_letter(self.first_col),
            self.first_row,
            column_letter(self.last_col)
        )?;
        if let Some(last_row) = self.last_row {
            write!(f, "{}", last_row)?;
        }
        Ok(())
    }
}

/// Values for one row-shaped range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeWrite {
    pub range: SheetRange,
    pub values: Vec<String>,
}

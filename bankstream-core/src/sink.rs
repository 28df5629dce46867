//! Destination-store capabilities and the sink writer.
//!
//! The writer never retries: a failed write is surfaced to the caller with
//! everything before it left in place.

use std::fmt;
use std::str::FromStr;

use anyhow::Context;
use tracing::{debug, info};

use crate::accumulator::Batch;
use crate::error::InvalidCellRef;
use crate::record::{COLUMN_COUNT, COLUMNS};

/// Rows given to a freshly created worksheet.
pub const DEFAULT_SHEET_ROWS: usize = 1000;
/// Spare columns beyond the canonical ones on a fresh worksheet.
pub const EXTRA_SHEET_COLUMNS: usize = 5;

/// An A1-style cell reference. `column` is 0-based, `row` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub column: usize,
    pub row: usize,
}

impl CellRef {
    pub fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }

    /// Column A of the given row.
    pub fn row_start(row: usize) -> Self {
        Self { column: 0, row }
    }
}

/// Bijective base-26: 0 -> A, 25 -> Z, 26 -> AA.
fn column_letters(mut column: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (column % 26) as u8);
        if column < 26 {
            break;
        }
        column = column / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.column), self.row)
    }
}

impl FromStr for CellRef {
    type Err = InvalidCellRef;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidCellRef(s.to_string());
        let s = s.trim();
        let split = s.find(|c: char| c.is_ascii_digit()).ok_or_else(invalid)?;
        let (letters, digits) = s.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }

        let mut column = 0usize;
        for c in letters.chars() {
            let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
            column = column
                .checked_mul(26)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(invalid)?;
        }

        let row: usize = digits.parse().map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid());
        }
        Ok(CellRef { column: column - 1, row })
    }
}

/// Next unused destination row. Row 1 holds the header; data starts at 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WritePosition(usize);

impl WritePosition {
    pub const FIRST_DATA_ROW: WritePosition = WritePosition(2);

    pub fn row(self) -> usize {
        self.0
    }

    /// Data rows before this position.
    pub fn rows_written(self) -> usize {
        self.0.saturating_sub(Self::FIRST_DATA_ROW.0)
    }

    fn advance(self, rows: usize) -> Self {
        WritePosition(self.0 + rows)
    }
}

impl fmt::Display for WritePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}", self.0)
    }
}

/// A destination table.
pub trait Worksheet {
    fn title(&self) -> &str;

    /// Remove every value in the sheet.
    fn clear(&mut self) -> anyhow::Result<()>;

    /// Write `values` as consecutive rows with `top_left` as the first cell.
    fn update(&mut self, top_left: CellRef, values: Vec<Vec<String>>) -> anyhow::Result<()>;
}

/// A destination document holding named worksheets.
pub trait Spreadsheet {
    type Worksheet: Worksheet;

    /// Look up a worksheet by title. `Ok(None)` when it does not exist.
    fn worksheet(&self, name: &str) -> anyhow::Result<Option<Self::Worksheet>>;

    fn add_worksheet(&self, name: &str, rows: usize, cols: usize) -> anyhow::Result<Self::Worksheet>;
}

/// Open the named worksheet, creating it when absent.
pub fn ensure_worksheet<S: Spreadsheet>(store: &S, name: &str) -> anyhow::Result<S::Worksheet> {
    if let Some(ws) = store
        .worksheet(name)
        .with_context(|| format!("looking up worksheet '{name}'"))?
    {
        debug!(worksheet = name, "using existing worksheet");
        return Ok(ws);
    }

    info!(worksheet = name, "creating worksheet");
    store
        .add_worksheet(name, DEFAULT_SHEET_ROWS, COLUMN_COUNT + EXTRA_SHEET_COLUMNS)
        .with_context(|| format!("creating worksheet '{name}'"))
}

/// Wipe the sheet and write the canonical header as row 1.
pub fn init_header<W: Worksheet>(ws: &mut W) -> anyhow::Result<WritePosition> {
    ws.clear()
        .with_context(|| format!("clearing worksheet '{}'", ws.title()))?;

    let header = COLUMNS.iter().map(|c| c.to_string()).collect();
    ws.update(CellRef::row_start(1), vec![header])
        .with_context(|| format!("writing header to '{}'", ws.title()))?;

    Ok(WritePosition::FIRST_DATA_ROW)
}

/// Write `batch` starting at `position` and return the next free row.
///
/// An empty batch touches nothing.
pub fn append_batch<W: Worksheet>(
    ws: &mut W,
    batch: Batch,
    position: WritePosition,
) -> anyhow::Result<WritePosition> {
    if batch.is_empty() {
        return Ok(position);
    }

    let rows = batch.len();
    let values: Vec<Vec<String>> = batch.into_iter().map(|r| r.into_row()).collect();
    let top_left = CellRef::row_start(position.row());

    ws.update(top_left, values)
        .with_context(|| format!("writing {rows} rows at {top_left} of '{}'", ws.title()))?;

    let next = position.advance(rows);
    info!(worksheet = ws.title(), rows, start = %top_left, next = next.row(), "batch written");
    Ok(next)
}

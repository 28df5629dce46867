//! In-memory destination store.
//!
//! Backs `bankstream inspect` and the tests. Handles to the same worksheet
//! share one grid, like handles to a remote sheet share one document.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::bail;

use crate::sink::{CellRef, Spreadsheet, Worksheet};

/// One recorded `update` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteCall {
    pub top_left: CellRef,
    pub rows: usize,
}

#[derive(Debug, Default)]
struct Grid {
    rows: Vec<Vec<String>>,
    writes: Vec<WriteCall>,
    size: (usize, usize),
}

#[derive(Debug, Default)]
pub struct MemorySpreadsheet {
    sheets: RefCell<BTreeMap<String, Rc<RefCell<Grid>>>>,
    created: Cell<usize>,
    updates_left: Rc<Cell<Option<usize>>>,
}

impl MemorySpreadsheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `n` more successful `update` calls across all sheets, then fail.
    pub fn fail_updates_after(&self, n: usize) {
        self.updates_left.set(Some(n));
    }

    /// Number of worksheets created through `add_worksheet`.
    pub fn worksheets_created(&self) -> usize {
        self.created.get()
    }

    /// Current contents of a worksheet, row 1 first.
    pub fn rows(&self, name: &str) -> Option<Vec<Vec<String>>> {
        let sheets = self.sheets.borrow();
        let grid = sheets.get(name)?.borrow();
        Some(grid.rows.clone())
    }

    /// Every `update` call made against a worksheet, in order.
    pub fn writes(&self, name: &str) -> Vec<WriteCall> {
        self.sheets
            .borrow()
            .get(name)
            .map(|g| g.borrow().writes.clone())
            .unwrap_or_default()
    }

    /// `(rows, cols)` the worksheet was created with.
    pub fn size(&self, name: &str) -> Option<(usize, usize)> {
        self.sheets.borrow().get(name).map(|g| g.borrow().size)
    }

    fn handle(&self, name: &str, grid: Rc<RefCell<Grid>>) -> MemoryWorksheet {
        MemoryWorksheet {
            title: name.to_string(),
            grid,
            updates_left: Rc::clone(&self.updates_left),
        }
    }
}

impl Spreadsheet for MemorySpreadsheet {
    type Worksheet = MemoryWorksheet;

    fn worksheet(&self, name: &str) -> anyhow::Result<Option<MemoryWorksheet>> {
        let grid = self.sheets.borrow().get(name).cloned();
        Ok(grid.map(|g| self.handle(name, g)))
    }

    fn add_worksheet(&self, name: &str, rows: usize, cols: usize) -> anyhow::Result<MemoryWorksheet> {
        if self.sheets.borrow().contains_key(name) {
            bail!("a sheet with the name \"{name}\" already exists");
        }
        let grid = Rc::new(RefCell::new(Grid {
            size: (rows, cols),
            ..Grid::default()
        }));
        self.sheets.borrow_mut().insert(name.to_string(), Rc::clone(&grid));
        self.created.set(self.created.get() + 1);
        Ok(self.handle(name, grid))
    }
}

#[derive(Debug, Clone)]
pub struct MemoryWorksheet {
    title: String,
    grid: Rc<RefCell<Grid>>,
    updates_left: Rc<Cell<Option<usize>>>,
}

impl Worksheet for MemoryWorksheet {
    fn title(&self) -> &str {
        &self.title
    }

    fn clear(&mut self) -> anyhow::Result<()> {
        self.grid.borrow_mut().rows.clear();
        Ok(())
    }

    fn update(&mut self, top_left: CellRef, values: Vec<Vec<String>>) -> anyhow::Result<()> {
        let Some(first) = top_left.row.checked_sub(1) else {
            bail!("row 0 is not a cell in '{}'", self.title);
        };

        match self.updates_left.get() {
            Some(0) => bail!("quota exceeded for '{}'", self.title),
            Some(n) => self.updates_left.set(Some(n - 1)),
            None => {}
        }

        let mut grid = self.grid.borrow_mut();
        grid.writes.push(WriteCall {
            top_left,
            rows: values.len(),
        });

        if grid.rows.len() < first + values.len() {
            grid.rows.resize_with(first + values.len(), Vec::new);
        }
        for (offset, row) in values.into_iter().enumerate() {
            let target = &mut grid.rows[first + offset];
            if target.len() < top_left.column + row.len() {
                target.resize(top_left.column + row.len(), String::new());
            }
            for (c, value) in row.into_iter().enumerate() {
                target[top_left.column + c] = value;
            }
        }
        Ok(())
    }
}

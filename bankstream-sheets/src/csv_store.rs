//! Local CSV destination: a directory is the spreadsheet, `<name>.csv` is
//! a worksheet.
//!
//! Writes must land on the next free row. That is all the pipeline ever
//! does, and it lets each batch be appended without reading the file back.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use bankstream_core::{CellRef, Spreadsheet, Worksheet};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CsvWorkbook {
    dir: PathBuf,
}

impl CsvWorkbook {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn sheet_path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            bail!("'{name}' cannot be used as a worksheet file name");
        }
        Ok(self.dir.join(format!("{name}.csv")))
    }
}

impl Spreadsheet for CsvWorkbook {
    type Worksheet = CsvWorksheet;

    fn worksheet(&self, name: &str) -> Result<Option<CsvWorksheet>> {
        let path = self.sheet_path(name)?;
        if !path.exists() {
            return Ok(None);
        }
        CsvWorksheet::open(name, path).map(Some)
    }

    fn add_worksheet(&self, name: &str, _rows: usize, _cols: usize) -> Result<CsvWorksheet> {
        let path = self.sheet_path(name)?;
        if path.exists() {
            bail!("worksheet '{name}' already exists at {}", path.display());
        }
        File::create(&path).with_context(|| format!("create {}", path.display()))?;
        Ok(CsvWorksheet {
            title: name.to_string(),
            path,
            next_row: 1,
        })
    }
}

#[derive(Debug)]
pub struct CsvWorksheet {
    title: String,
    path: PathBuf,
    /// 1-based row the next append must start at.
    next_row: usize,
}

impl CsvWorksheet {
    fn open(name: &str, path: PathBuf) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)
            .with_context(|| format!("opening {}", path.display()))?;

        let mut rows = 0;
        for record in rdr.records() {
            record.with_context(|| format!("reading {}", path.display()))?;
            rows += 1;
        }

        Ok(Self {
            title: name.to_string(),
            path,
            next_row: rows + 1,
        })
    }
}

impl Worksheet for CsvWorksheet {
    fn title(&self) -> &str {
        &self.title
    }

    fn clear(&mut self) -> Result<()> {
        File::create(&self.path).with_context(|| format!("truncate {}", self.path.display()))?;
        self.next_row = 1;
        Ok(())
    }

    fn update(&mut self, top_left: CellRef, values: Vec<Vec<String>>) -> Result<()> {
        if top_left.column != 0 || top_left.row != self.next_row {
            bail!(
                "csv worksheet '{}' can only append at A{}, got {}",
                self.title,
                self.next_row,
                top_left
            );
        }

        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(file);

        let rows = values.len();
        for row in values {
            wtr.write_record(&row)?;
        }
        wtr.flush().with_context(|| format!("write {}", self.path.display()))?;

        self.next_row += rows;
        debug!(path = %self.path.display(), rows, next_row = self.next_row, "csv rows appended");
        Ok(())
    }
}

//! Pipeline driver: document -> pages -> records -> batches -> destination.
//!
//! One document per run, one page at a time, one write in flight. The
//! document is opened before the destination is touched, so a document
//! that cannot be parsed leaves the destination exactly as it was.

use std::io::Read;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::accumulator::{ChunkAccumulator, FlushPolicy};
use crate::error::PipelineError;
use crate::scanner::{Document, DocumentFormat, HeaderPolicy, scan_page};
use crate::sink::{
    Spreadsheet, Worksheet, WritePosition, append_batch, ensure_worksheet, init_header,
};

/// Worksheet written when nothing else is configured.
pub const DEFAULT_WORKSHEET: &str = "Raw_Data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub worksheet_name: String,
    pub flush: FlushPolicy,
    pub header_policy: HeaderPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worksheet_name: DEFAULT_WORKSHEET.to_string(),
            flush: FlushPolicy::default(),
            header_policy: HeaderPolicy::default(),
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Records extracted across all pages.
    pub total_records: usize,
    pub pages: usize,
    /// Non-empty batches handed to the destination.
    pub batches_written: usize,
    /// Data rows written below the header.
    pub rows_written: usize,
}

impl RunReport {
    /// Nothing was extracted. Not a failure, but worth telling the user.
    pub fn is_empty(&self) -> bool {
        self.total_records == 0
    }
}

pub struct Pipeline<'s, F, S> {
    format: F,
    store: &'s S,
    config: PipelineConfig,
}

impl<'s, F, S> Pipeline<'s, F, S>
where
    F: DocumentFormat,
    S: Spreadsheet,
{
    pub fn new(format: F, store: &'s S, config: PipelineConfig) -> Self {
        Self {
            format,
            store,
            config,
        }
    }

    /// Extract every transaction from `input` and replace the destination
    /// worksheet's contents with them.
    ///
    /// `progress` is called with `(page, total_pages)` after each page.
    pub fn run<R: Read>(
        &self,
        mut input: R,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<RunReport, PipelineError> {
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes).map_err(PipelineError::Input)?;
        drop(input);

        let size = bytes.len();
        let document = self.format.open(bytes).map_err(PipelineError::Parse)?;
        let total_pages = document.page_count();
        info!(bytes = size, pages = total_pages, "document opened");

        let name = self.config.worksheet_name.as_str();
        let mut ws = ensure_worksheet(self.store, name).map_err(transfer(0))?;
        let mut position = init_header(&mut ws).map_err(transfer(0))?;

        let mut acc = ChunkAccumulator::new(self.config.flush);
        let mut report = RunReport {
            pages: total_pages,
            ..RunReport::default()
        };
        let mut pages_since_flush = 0;

        for number in 1..=total_pages {
            let before = report.total_records;
            match document.page(number) {
                Some(page) => {
                    for record in scan_page(page, self.config.header_policy) {
                        acc.add(record);
                        report.total_records += 1;
                    }
                }
                None => warn!(page = number, "page missing from document"),
            }
            debug!(page = number, records = report.total_records - before, "page scanned");

            pages_since_flush += 1;
            let is_final = number == total_pages;
            // The last batch goes out after the document is released.
            if !is_final && acc.should_flush(pages_since_flush, is_final) {
                position = flush(&mut ws, &mut acc, position, &mut report)?;
                pages_since_flush = 0;
            }

            progress(number, total_pages);
        }
        drop(document);

        if !acc.is_empty() {
            position = flush(&mut ws, &mut acc, position, &mut report)?;
        }

        info!(
            records = report.total_records,
            batches = report.batches_written,
            next_row = position.row(),
            "run complete"
        );
        Ok(report)
    }
}

fn transfer(rows_written: usize) -> impl FnOnce(anyhow::Error) -> PipelineError {
    move |source| PipelineError::Transfer {
        rows_written,
        source,
    }
}

fn flush<W: Worksheet>(
    ws: &mut W,
    acc: &mut ChunkAccumulator,
    position: WritePosition,
    report: &mut RunReport,
) -> Result<WritePosition, PipelineError> {
    let batch = acc.take_and_clear();
    if batch.is_empty() {
        return Ok(position);
    }

    let next = append_batch(ws, batch, position).map_err(transfer(position.rows_written()))?;
    report.batches_written += 1;
    report.rows_written = next.rows_written();
    Ok(next)
}

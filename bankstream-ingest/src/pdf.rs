//! PDF statements via `pdfplumber`.
//!
//! The whole file is parsed from memory once; each page is interpreted on
//! demand and its table found from page geometry, so cells keep their
//! column even when a value is missing. The input buffer is not kept after
//! parsing.

use std::fmt::Display;
use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use bankstream_core::{Document, DocumentFormat, Page, Table};
use pdfplumber::{Pdf, Strategy, TableSettings};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How a page's table is located.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TableStrategy {
    /// Cell borders come from ruled lines drawn on the page.
    #[default]
    Lines,
    /// Columns are inferred from text alignment, for statements without rules.
    Text,
}

impl TableStrategy {
    fn settings(self) -> TableSettings {
        match self {
            TableStrategy::Lines => TableSettings::default(),
            TableStrategy::Text => TableSettings {
                strategy: Strategy::Stream,
                ..TableSettings::default()
            },
        }
    }
}

impl FromStr for TableStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lines" => Ok(TableStrategy::Lines),
            "text" => Ok(TableStrategy::Text),
            other => Err(format!(
                "unknown table strategy '{other}' (expected lines or text)"
            )),
        }
    }
}

fn pdf_error<E: Display>(what: &'static str) -> impl FnOnce(E) -> anyhow::Error {
    move |e| anyhow!("{what}: {e}")
}

/// Opens PDF bytes and finds one table per page.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfFormat {
    strategy: TableStrategy,
}

impl PdfFormat {
    pub fn new(strategy: TableStrategy) -> Self {
        Self { strategy }
    }
}

impl DocumentFormat for PdfFormat {
    type Document = PdfDocument;

    fn open(&self, bytes: Vec<u8>) -> Result<PdfDocument> {
        if !bytes.starts_with(b"%PDF") {
            bail!("missing %PDF header");
        }
        let pdf = Pdf::open(&bytes, None).map_err(pdf_error("parsing PDF"))?;
        drop(bytes);

        let pages = pdf.page_count();
        debug!(pages, strategy = ?self.strategy, "pdf loaded");
        Ok(PdfDocument {
            pdf,
            pages,
            settings: self.strategy.settings(),
        })
    }
}

pub struct PdfDocument {
    pdf: Pdf,
    pages: usize,
    settings: TableSettings,
}

impl Document for PdfDocument {
    type Page<'a> = PdfPage<'a>;

    fn page_count(&self) -> usize {
        self.pages
    }

    fn page(&self, number: usize) -> Option<PdfPage<'_>> {
        let index = number.checked_sub(1).filter(|i| *i < self.pages)?;
        Some(PdfPage { doc: self, index })
    }
}

pub struct PdfPage<'a> {
    doc: &'a PdfDocument,
    /// 0-based page index.
    index: usize,
}

impl Page for PdfPage<'_> {
    fn extract_table(&self) -> Option<Table> {
        let page = match self.doc.pdf.page(self.index) {
            Ok(page) => page,
            Err(e) => {
                // Unreadable page content counts as a page without a table.
                warn!(page = self.index + 1, error = %e, "skipping page");
                return None;
            }
        };
        page.extract_table(&self.doc.settings)
    }
}

//! bankstream-ingest: opens statement PDFs and finds each page's table.

pub mod pdf;

pub use pdf::{PdfDocument, PdfFormat, PdfPage, TableStrategy};

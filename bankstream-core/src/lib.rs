//! bankstream-core: statement table extraction and batched streaming to a
//! spreadsheet destination.

pub mod accumulator;
pub mod error;
pub mod memory;
pub mod pipeline;
pub mod record;
pub mod scanner;
pub mod sink;

pub use accumulator::{Batch, ChunkAccumulator, DEFAULT_CHUNK_PAGES, FlushPolicy};
pub use error::{InvalidCellRef, PipelineError};
pub use memory::{MemorySpreadsheet, MemoryWorksheet};
pub use pipeline::{DEFAULT_WORKSHEET, Pipeline, PipelineConfig, RunReport};
pub use record::{COLUMN_COUNT, COLUMNS, RawRow, TransactionRecord, normalize};
pub use scanner::{Document, DocumentFormat, HeaderPolicy, Page, Table, scan_page};
pub use sink::{
    CellRef, Spreadsheet, Worksheet, WritePosition, append_batch, ensure_worksheet, init_header,
};

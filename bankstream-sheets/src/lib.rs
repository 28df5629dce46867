//! bankstream-sheets: destination stores for extracted statement rows.

pub mod csv_store;
#[cfg(feature = "gsheets")]
pub mod google;
pub mod spreadsheet_id;

pub use csv_store::{CsvWorkbook, CsvWorksheet};
#[cfg(feature = "gsheets")]
pub use google::{GoogleSheets, GoogleWorksheet};
pub use spreadsheet_id::parse_spreadsheet_id;

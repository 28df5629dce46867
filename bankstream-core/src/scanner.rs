//! Source-document capabilities and the per-page table scanner.

use serde::{Deserialize, Serialize};

use crate::record::{COLUMNS, RawRow, TransactionRecord, normalize};

/// A table matrix as detected on one page, row 0 first.
pub type Table = Vec<RawRow>;

/// One page of an opened source document.
pub trait Page {
    /// The rows of the page's detected tabular region, or `None` when the
    /// page has no table.
    fn extract_table(&self) -> Option<Table>;
}

/// An opened source document with random access to its pages.
pub trait Document {
    type Page<'a>: Page
    where
        Self: 'a;

    fn page_count(&self) -> usize;

    /// Page by 1-based index, in document order.
    fn page(&self, number: usize) -> Option<Self::Page<'_>>;
}

/// Opens raw document bytes. Failure here is a parse failure.
pub trait DocumentFormat {
    type Document: Document;

    fn open(&self, bytes: Vec<u8>) -> anyhow::Result<Self::Document>;
}

/// What to do with row 0 of each page's table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeaderPolicy {
    /// Every page repeats the column header; drop row 0 unconditionally.
    #[default]
    AlwaysSkipFirst,
    /// Drop row 0 only if it reads like the canonical column header.
    SkipIfHeader,
}

impl HeaderPolicy {
    fn skips(self, first: &RawRow) -> bool {
        match self {
            HeaderPolicy::AlwaysSkipFirst => true,
            HeaderPolicy::SkipIfHeader => looks_like_header(first),
        }
    }
}

impl std::str::FromStr for HeaderPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always-skip-first" => Ok(HeaderPolicy::AlwaysSkipFirst),
            "skip-if-header" => Ok(HeaderPolicy::SkipIfHeader),
            other => Err(format!(
                "unknown header policy '{other}' (expected always-skip-first or skip-if-header)"
            )),
        }
    }
}

fn squash(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// A row is a header when its leading non-empty cells spell the first
/// canonical column names. Two matching cells are enough; statement
/// layouts often wrap or abbreviate the trailing headings.
fn looks_like_header(row: &RawRow) -> bool {
    let cells: Vec<String> = row
        .iter()
        .filter_map(|c| c.as_deref())
        .map(squash)
        .filter(|c| !c.is_empty())
        .collect();

    if cells.len() < 2 {
        return false;
    }

    cells
        .iter()
        .zip(COLUMNS.iter())
        .take(2)
        .all(|(cell, name)| *cell == name.to_lowercase())
}

/// Records on one page, in row order, with the page-local header dropped.
///
/// The page is consumed; only the extracted rows outlive this call.
pub fn scan_page<P: Page>(page: P, policy: HeaderPolicy) -> impl Iterator<Item = TransactionRecord> {
    let table = page.extract_table().unwrap_or_default();
    drop(page);

    let skip = match table.first() {
        Some(first) if policy.skips(first) => 1,
        _ => 0,
    };

    // A lone header row (or a lone row under AlwaysSkipFirst) yields nothing.
    table.into_iter().skip(skip).map(normalize)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakePage(Option<Table>);

    impl Page for FakePage {
        fn extract_table(&self) -> Option<Table> {
            self.0.clone()
        }
    }

    fn row(values: &[&str]) -> RawRow {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    fn header() -> RawRow {
        COLUMNS.iter().map(|c| Some(c.to_string())).collect()
    }

    #[test]
    fn test_header_is_skipped() {
        let page = FakePage(Some(vec![
            header(),
            row(&["01/03", "01/03", "HQ", "R1", "Coffee", "3.50", "", "96.50"]),
            row(&["02/03", "02/03", "HQ", "R2", "Salary", "", "1000", "1096.50"]),
        ]));
        let records: Vec<_> = scan_page(page, HeaderPolicy::AlwaysSkipFirst).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].description, "Coffee");
        assert_eq!(records[1].credit, "1000");
        assert!(records.iter().all(|r| r.posting_date != "Posting Date"));
    }

    #[test]
    fn test_no_table_yields_nothing() {
        assert_eq!(scan_page(FakePage(None), HeaderPolicy::AlwaysSkipFirst).count(), 0);
        assert_eq!(scan_page(FakePage(Some(vec![])), HeaderPolicy::AlwaysSkipFirst).count(), 0);
    }

    #[test]
    fn test_header_only_table_yields_nothing() {
        let page = FakePage(Some(vec![header()]));
        assert_eq!(scan_page(page, HeaderPolicy::AlwaysSkipFirst).count(), 0);
    }

    #[test]
    fn test_always_skip_drops_first_data_row_on_continuation_page() {
        let page = FakePage(Some(vec![row(&["05/03", "05/03"]), row(&["06/03", "06/03"])]));
        let records: Vec<_> = scan_page(page, HeaderPolicy::AlwaysSkipFirst).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].posting_date, "06/03");
    }

    #[test]
    fn test_skip_if_header_keeps_continuation_rows() {
        let page = FakePage(Some(vec![row(&["05/03", "05/03"]), row(&["06/03", "06/03"])]));
        let records: Vec<_> = scan_page(page, HeaderPolicy::SkipIfHeader).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].posting_date, "05/03");
    }

    #[test]
    fn test_skip_if_header_still_drops_real_header() {
        let page = FakePage(Some(vec![
            row(&["POSTING  DATE", "Value\nDate", "Branch"]),
            row(&["06/03", "06/03"]),
        ]));
        let records: Vec<_> = scan_page(page, HeaderPolicy::SkipIfHeader).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].posting_date, "06/03");
    }

    #[test]
    fn test_header_policy_from_str() {
        assert_eq!("skip-if-header".parse::<HeaderPolicy>(), Ok(HeaderPolicy::SkipIfHeader));
        assert_eq!(
            "always-skip-first".parse::<HeaderPolicy>(),
            Ok(HeaderPolicy::AlwaysSkipFirst)
        );
        assert!("sometimes".parse::<HeaderPolicy>().is_err());
    }
}

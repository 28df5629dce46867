//! Canonical transaction record and the row normalizer.
//!
//! Statement tables come out of the parser with whatever width the page
//! layout produced. Every row is forced into the same 8 columns:
//!   Posting Date | Value Date | Transaction Branch | Reference Number |
//!   Description | Debit | Credit | Balance

use serde::{Deserialize, Serialize};

/// Number of canonical columns.
pub const COLUMN_COUNT: usize = 8;

/// Canonical column names, in output order. Row 1 of the destination.
pub const COLUMNS: [&str; COLUMN_COUNT] = [
    "Posting Date",
    "Value Date",
    "Transaction Branch",
    "Reference Number",
    "Description",
    "Debit",
    "Credit",
    "Balance",
];

/// One table row as extracted from a page. Cells may be missing (`None`).
pub type RawRow = Vec<Option<String>>;

/// A statement line mapped onto the canonical columns.
///
/// All values are strings; an absent cell is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(rename = "Posting Date")]
    pub posting_date: String,
    #[serde(rename = "Value Date")]
    pub value_date: String,
    #[serde(rename = "Transaction Branch")]
    pub transaction_branch: String,
    #[serde(rename = "Reference Number")]
    pub reference_number: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Debit")]
    pub debit: String,
    #[serde(rename = "Credit")]
    pub credit: String,
    #[serde(rename = "Balance")]
    pub balance: String,
}

impl TransactionRecord {
    /// Values in canonical column order.
    pub fn values(&self) -> [&str; COLUMN_COUNT] {
        [
            &self.posting_date,
            &self.value_date,
            &self.transaction_branch,
            &self.reference_number,
            &self.description,
            &self.debit,
            &self.credit,
            &self.balance,
        ]
    }

    /// Consume the record into one destination row.
    pub fn into_row(self) -> Vec<String> {
        vec![
            self.posting_date,
            self.value_date,
            self.transaction_branch,
            self.reference_number,
            self.description,
            self.debit,
            self.credit,
            self.balance,
        ]
    }
}

/// Map a raw row of any width onto the canonical columns.
///
/// Short rows are padded on the right with empty strings, long rows are
/// truncated to the first 8 cells. Never fails.
pub fn normalize(row: RawRow) -> TransactionRecord {
    let mut cells = row
        .into_iter()
        .map(Option::unwrap_or_default)
        .chain(std::iter::repeat_with(String::new))
        .take(COLUMN_COUNT);

    // `take(8)` over an infinite chain always yields exactly 8 items.
    let mut next = || cells.next().unwrap_or_default();
    TransactionRecord {
        posting_date: next(),
        value_date: next(),
        transaction_branch: next(),
        reference_number: next(),
        description: next(),
        debit: next(),
        credit: next(),
        balance: next(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> RawRow {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn test_pads_short_row() {
        let rec = normalize(cells(&["a", "b"]));
        assert_eq!(rec.posting_date, "a");
        assert_eq!(rec.value_date, "b");
        assert_eq!(&rec.values()[2..], &["", "", "", "", "", ""]);
    }

    #[test]
    fn test_truncates_long_row() {
        let row: RawRow = (0..10).map(|i| Some(format!("c{i}"))).collect();
        let rec = normalize(row);
        assert_eq!(
            rec.values(),
            ["c0", "c1", "c2", "c3", "c4", "c5", "c6", "c7"]
        );
    }

    #[test]
    fn test_empty_row_is_all_blank() {
        let rec = normalize(Vec::new());
        assert_eq!(rec, TransactionRecord::default());
    }

    #[test]
    fn test_null_cells_become_empty() {
        let rec = normalize(vec![Some("01/02/2024".into()), None, None, Some("REF9".into())]);
        assert_eq!(rec.value_date, "");
        assert_eq!(rec.transaction_branch, "");
        assert_eq!(rec.reference_number, "REF9");
    }

    #[test]
    fn test_totality_over_widths() {
        for width in 0..=20 {
            let row: RawRow = (0..width)
                .map(|i| if i % 3 == 0 { None } else { Some(i.to_string()) })
                .collect();
            let rec = normalize(row);
            assert_eq!(rec.values().len(), COLUMNS.len());
            for (i, value) in rec.values().iter().enumerate() {
                let expected = if i < width && i % 3 != 0 { i.to_string() } else { String::new() };
                assert_eq!(*value, expected, "width {width}, column {i}");
            }
        }
    }

    #[test]
    fn test_serializes_with_canonical_names_in_order() {
        let rec = normalize(cells(&["1", "2", "3", "4", "5", "6", "7", "8"]));
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(
            json,
            r#"{"Posting Date":"1","Value Date":"2","Transaction Branch":"3","Reference Number":"4","Description":"5","Debit":"6","Credit":"7","Balance":"8"}"#
        );
    }
}

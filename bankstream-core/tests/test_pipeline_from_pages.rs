use bankstream_core::{
    COLUMNS, Document, DocumentFormat, FlushPolicy, HeaderPolicy, MemorySpreadsheet, Page,
    Pipeline, PipelineConfig, PipelineError, RawRow, Table,
};

const SHEET: &str = "Raw_Data";

/// A document whose pages are given up front. `None` = no table detected.
#[derive(Clone)]
struct Statement(Vec<Option<Table>>);

struct StatementPage(Option<Table>);

impl Page for StatementPage {
    fn extract_table(&self) -> Option<Table> {
        self.0.clone()
    }
}

impl Document for Statement {
    type Page<'a> = StatementPage;

    fn page_count(&self) -> usize {
        self.0.len()
    }

    fn page(&self, number: usize) -> Option<StatementPage> {
        let index = number.checked_sub(1)?;
        self.0.get(index).cloned().map(StatementPage)
    }
}

impl DocumentFormat for Statement {
    type Document = Statement;

    fn open(&self, _bytes: Vec<u8>) -> anyhow::Result<Statement> {
        Ok(self.clone())
    }
}

fn header_row() -> RawRow {
    COLUMNS.iter().map(|c| Some(c.to_string())).collect()
}

fn txn(date: &str, desc: &str, debit: &str, balance: &str) -> RawRow {
    [date, date, "MAIN", "REF", desc, debit, "", balance]
        .iter()
        .map(|v| Some(v.to_string()))
        .collect()
}

/// A page with a header and `n` transactions tagged by page number.
fn page(page_no: usize, n: usize) -> Option<Table> {
    let mut rows = vec![header_row()];
    for i in 0..n {
        rows.push(txn(
            &format!("{:02}/01/2024", page_no),
            &format!("p{page_no} t{i}"),
            "10.00",
            "100.00",
        ));
    }
    Some(rows)
}

fn config(chunk_pages: usize) -> PipelineConfig {
    PipelineConfig {
        flush: FlushPolicy::with_chunk_pages(chunk_pages),
        ..PipelineConfig::default()
    }
}

fn run(doc: Statement, store: &MemorySpreadsheet, cfg: PipelineConfig) -> Result<usize, PipelineError> {
    let pipeline = Pipeline::new(doc, store, cfg);
    pipeline.run(&b"%PDF-1.4"[..], |_, _| {}).map(|r| r.total_records)
}

/// Sizes of data writes (the header write is excluded).
fn data_write_sizes(store: &MemorySpreadsheet) -> Vec<usize> {
    store
        .writes(SHEET)
        .iter()
        .filter(|w| w.top_left.row > 1)
        .map(|w| w.rows)
        .collect()
}

#[test]
fn test_flush_every_two_pages() {
    let store = MemorySpreadsheet::new();
    let doc = Statement((1..=5).map(|p| page(p, 1)).collect());

    let total = run(doc, &store, config(2)).unwrap();
    assert_eq!(total, 5);
    assert_eq!(data_write_sizes(&store), [2, 2, 1]);

    let starts: Vec<usize> = store
        .writes(SHEET)
        .iter()
        .filter(|w| w.top_left.row > 1)
        .map(|w| w.top_left.row)
        .collect();
    assert_eq!(starts, [2, 4, 6]);

    // Header plus 5 rows: the next free row is 7.
    assert_eq!(store.rows(SHEET).unwrap().len() + 1, 7);
}

#[test]
fn test_pages_without_tables_are_transparent() {
    let with_gaps = Statement(vec![page(1, 3), None, page(3, 2), None, page(5, 4)]);
    let without = Statement(vec![page(1, 3), page(3, 2), page(5, 4)]);

    let a = run(with_gaps, &MemorySpreadsheet::new(), config(2)).unwrap();
    let b = run(without, &MemorySpreadsheet::new(), config(2)).unwrap();
    assert_eq!(a, 9);
    assert_eq!(a, b);
}

#[test]
fn test_record_count_matches_rows_written() {
    let layouts: Vec<Vec<usize>> = vec![
        vec![],
        vec![0, 0, 0],
        vec![7],
        vec![1, 2, 3, 4, 5, 6, 7],
        vec![0, 12, 0, 1, 0, 0, 30, 2],
    ];

    for counts in layouts {
        for chunk in [1, 2, 3, 50] {
            let store = MemorySpreadsheet::new();
            let doc = Statement(counts.iter().enumerate().map(|(i, &n)| page(i + 1, n)).collect());
            let total = run(doc, &store, config(chunk)).unwrap();

            let written: usize = data_write_sizes(&store).iter().sum();
            assert_eq!(total, counts.iter().sum::<usize>());
            assert_eq!(total, written, "counts {counts:?}, chunk {chunk}");
            assert_eq!(store.rows(SHEET).unwrap().len(), total + 1);
        }
    }
}

#[test]
fn test_second_run_replaces_first() {
    let store = MemorySpreadsheet::new();

    run(Statement(vec![page(1, 6), page(2, 6)]), &store, config(1)).unwrap();
    assert_eq!(store.rows(SHEET).unwrap().len(), 13);

    let second = Statement(vec![Some(vec![
        header_row(),
        txn("09/09/2024", "only row", "1.00", "1.00"),
    ])]);
    run(second, &store, config(1)).unwrap();

    let rows = store.rows(SHEET).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], COLUMNS.map(String::from).to_vec());
    assert_eq!(rows[1][4], "only row");
    assert_eq!(store.worksheets_created(), 1);
}

#[test]
fn test_rows_are_written_in_document_order() {
    let store = MemorySpreadsheet::new();
    run(Statement(vec![page(1, 2), page(2, 2)]), &store, config(1)).unwrap();

    let descriptions: Vec<String> = store.rows(SHEET).unwrap()[1..]
        .iter()
        .map(|r| r[4].clone())
        .collect();
    assert_eq!(descriptions, ["p1 t0", "p1 t1", "p2 t0", "p2 t1"]);
}

#[test]
fn test_transfer_failure_keeps_flushed_prefix() {
    let store = MemorySpreadsheet::new();
    // Header write plus one batch succeed, the second batch fails.
    store.fail_updates_after(2);

    let doc = Statement(vec![page(1, 3), page(2, 2), page(3, 1)]);
    let err = run(doc, &store, config(1)).unwrap_err();

    match &err {
        PipelineError::Transfer { rows_written, .. } => assert_eq!(*rows_written, 3),
        other => panic!("expected transfer failure, got {other:?}"),
    }
    assert_eq!(err.rows_written(), 3);
    assert_eq!(store.rows(SHEET).unwrap().len(), 4);
}

#[test]
fn test_header_write_failure_is_a_transfer_failure() {
    let store = MemorySpreadsheet::new();
    store.fail_updates_after(0);

    let err = run(Statement(vec![page(1, 1)]), &store, config(1)).unwrap_err();
    assert!(matches!(err, PipelineError::Transfer { rows_written: 0, .. }));
}

#[test]
fn test_skip_if_header_keeps_rows_on_headerless_pages() {
    let continuation = Some(vec![
        txn("02/01/2024", "carried", "5.00", "95.00"),
        txn("02/01/2024", "next", "5.00", "90.00"),
    ]);

    let strict = run(
        Statement(vec![page(1, 1), continuation.clone()]),
        &MemorySpreadsheet::new(),
        config(50),
    )
    .unwrap();
    assert_eq!(strict, 2);

    let lenient = run(
        Statement(vec![page(1, 1), continuation]),
        &MemorySpreadsheet::new(),
        PipelineConfig {
            header_policy: HeaderPolicy::SkipIfHeader,
            ..config(50)
        },
    )
    .unwrap();
    assert_eq!(lenient, 3);
}

#[test]
fn test_record_threshold_flushes_at_next_page_boundary() {
    let store = MemorySpreadsheet::new();
    let cfg = PipelineConfig {
        flush: FlushPolicy {
            chunk_pages: 50,
            flush_after_records: Some(4),
        },
        ..PipelineConfig::default()
    };

    // 3 rows after page 1 stay below the threshold; page 2 lifts the batch
    // to 6, past it, and that whole batch goes out at the boundary.
    run(Statement(vec![page(1, 3), page(2, 3), page(3, 1)]), &store, cfg).unwrap();
    assert_eq!(data_write_sizes(&store), [6, 1]);
}

#[test]
fn test_malformed_rows_are_normalized() {
    let store = MemorySpreadsheet::new();
    let ragged = Some(vec![
        header_row(),
        vec![Some("01/01/2024".to_string())],
        (0..12).map(|i| Some(format!("c{i}"))).collect(),
        vec![],
        vec![None, None, None],
    ]);

    let total = run(Statement(vec![ragged]), &store, config(1)).unwrap();
    assert_eq!(total, 4);
    assert_eq!(store.rows(SHEET).unwrap().len(), 5);

    let rows = store.rows(SHEET).unwrap();
    assert!(rows[1..].iter().all(|r| r.len() == COLUMNS.len()));
    assert_eq!(rows[2][7], "c7");
}

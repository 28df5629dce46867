//! Google Sheets destination, authenticated with a service-account key.
//!
//! The pipeline is synchronous; every API call is driven to completion on
//! the surrounding tokio runtime (or a private one when there is none).

use std::fmt::Display;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use bankstream_core::{CellRef, Spreadsheet, Worksheet};
use google_sheets4::Sheets;
use google_sheets4::api::{
    AddSheetRequest, BatchUpdateSpreadsheetRequest, ClearValuesRequest, GridProperties, Request,
    SheetProperties, ValueRange,
};
use hyper::client::HttpConnector;
use hyper_rustls::HttpsConnector;
use tracing::{debug, info};

// IMPORTANT: use the oauth2 version re-exported by google-sheets4 to avoid version mismatches.
use google_sheets4::oauth2;

type Hub = Sheets<HttpsConnector<HttpConnector>>;

enum Executor {
    Current(tokio::runtime::Handle),
    Owned(tokio::runtime::Runtime),
}

impl Executor {
    fn new() -> Result<Self> {
        // Inside #[tokio::main] a nested runtime would panic on block_on.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            return Ok(Executor::Current(handle));
        }
        let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
        Ok(Executor::Owned(rt))
    }

    fn block_on<F: Future>(&self, fut: F) -> F::Output {
        match self {
            Executor::Current(handle) => tokio::task::block_in_place(|| handle.block_on(fut)),
            Executor::Owned(rt) => rt.block_on(fut),
        }
    }
}

struct Client {
    hub: Hub,
    exec: Executor,
    spreadsheet_id: String,
}

fn remote<E: Display>(what: String) -> impl FnOnce(E) -> anyhow::Error {
    move |e| anyhow!("{what}: {e}")
}

/// `'Sheet Name'!A2`, quoting the title the way the Sheets API expects.
fn a1_range(title: &str, cell: Option<CellRef>) -> String {
    let quoted = format!("'{}'", title.replace('\'', "''"));
    match cell {
        Some(cell) => format!("{quoted}!{cell}"),
        None => quoted,
    }
}

async fn hub_from_service_account(key_path: &Path) -> Result<Hub> {
    let key = oauth2::read_service_account_key(key_path)
        .await
        .with_context(|| format!("read service account key {}", key_path.display()))?;

    let auth = oauth2::ServiceAccountAuthenticator::builder(key)
        .build()
        .await
        .context("building service account authenticator")?;

    let connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_native_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Ok(Sheets::new(hyper::Client::builder().build(connector), auth))
}

/// A Google spreadsheet opened by ID.
#[derive(Clone)]
pub struct GoogleSheets {
    client: Arc<Client>,
}

impl GoogleSheets {
    /// Authenticate with the service-account key and check that the
    /// spreadsheet is reachable.
    pub fn open_by_id(key_path: &Path, spreadsheet_id: &str) -> Result<Self> {
        let exec = Executor::new()?;
        let hub = exec.block_on(hub_from_service_account(key_path))?;

        let (_, sheet) = exec
            .block_on(hub.spreadsheets().get(spreadsheet_id).doit())
            .map_err(remote(format!("opening spreadsheet {spreadsheet_id}")))?;
        info!(
            spreadsheet = spreadsheet_id,
            title = %sheet.properties.and_then(|p| p.title).unwrap_or_default(),
            "spreadsheet opened"
        );

        Ok(Self {
            client: Arc::new(Client {
                hub,
                exec,
                spreadsheet_id: spreadsheet_id.to_string(),
            }),
        })
    }

    fn handle(&self, title: &str) -> GoogleWorksheet {
        GoogleWorksheet {
            client: Arc::clone(&self.client),
            title: title.to_string(),
        }
    }
}

impl Spreadsheet for GoogleSheets {
    type Worksheet = GoogleWorksheet;

    fn worksheet(&self, name: &str) -> Result<Option<GoogleWorksheet>> {
        let c = &self.client;
        let (_, sheet) = c
            .exec
            .block_on(c.hub.spreadsheets().get(&c.spreadsheet_id).doit())
            .map_err(remote(format!("listing worksheets of {}", c.spreadsheet_id)))?;

        let found = sheet
            .sheets
            .unwrap_or_default()
            .into_iter()
            .filter_map(|s| s.properties.and_then(|p| p.title))
            .any(|title| title == name);

        Ok(found.then(|| self.handle(name)))
    }

    fn add_worksheet(&self, name: &str, rows: usize, cols: usize) -> Result<GoogleWorksheet> {
        let c = &self.client;

        let mut grid = GridProperties::default();
        grid.row_count = Some(i32::try_from(rows).context("row count")?);
        grid.column_count = Some(i32::try_from(cols).context("column count")?);

        let mut properties = SheetProperties::default();
        properties.title = Some(name.to_string());
        properties.grid_properties = Some(grid);

        let mut add_sheet = AddSheetRequest::default();
        add_sheet.properties = Some(properties);

        let mut request = Request::default();
        request.add_sheet = Some(add_sheet);

        let mut batch = BatchUpdateSpreadsheetRequest::default();
        batch.requests = Some(vec![request]);

        c.exec
            .block_on(c.hub.spreadsheets().batch_update(batch, &c.spreadsheet_id).doit())
            .map_err(remote(format!("adding worksheet '{name}'")))?;

        Ok(self.handle(name))
    }
}

pub struct GoogleWorksheet {
    client: Arc<Client>,
    title: String,
}

impl Worksheet for GoogleWorksheet {
    fn title(&self) -> &str {
        &self.title
    }

    fn clear(&mut self) -> Result<()> {
        let c = &self.client;
        let range = a1_range(&self.title, None);
        c.exec
            .block_on(
                c.hub
                    .spreadsheets()
                    .values_clear(ClearValuesRequest::default(), &c.spreadsheet_id, &range)
                    .doit(),
            )
            .map_err(remote(format!("clearing {range}")))?;
        debug!(range = %range, "worksheet cleared");
        Ok(())
    }

    fn update(&mut self, top_left: CellRef, values: Vec<Vec<String>>) -> Result<()> {
        let c = &self.client;
        let range = a1_range(&self.title, Some(top_left));
        let rows = values.len();

        let mut body = ValueRange::default();
        body.major_dimension = Some("ROWS".to_string());
        body.values = Some(
            values
                .into_iter()
                .map(|row| row.into_iter().map(serde_json::Value::String).collect())
                .collect(),
        );

        c.exec
            .block_on(
                c.hub
                    .spreadsheets()
                    .values_update(body, &c.spreadsheet_id, &range)
                    .value_input_option("RAW")
                    .doit(),
            )
            .map_err(remote(format!("writing {rows} rows to {range}")))?;
        debug!(range = %range, rows, "values updated");
        Ok(())
    }
}

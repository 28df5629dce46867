use anyhow::{Context, Result, bail};
use bankstream_core::{
    HeaderPolicy, MemorySpreadsheet, Pipeline, PipelineError, RunReport, Spreadsheet,
};
use bankstream_ingest::{PdfFormat, TableStrategy};
use bankstream_sheets::CsvWorkbook;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

mod config;
mod logging;
mod progress;
mod state;

use config::Config;
use progress::Progress;
use state::{LastRun, Outcome};

const FAILURE_MESSAGE: &str =
    "Unexpected error while processing the PDF. Please try again or contact the owner.";
const EMPTY_MESSAGE: &str = "No transactions were found in the PDF.";

#[derive(Parser, Debug)]
#[command(
    name = "bankstream",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BANKSTREAM_BUILD_SHA"), ")"),
    about = "Stream bank-statement PDF tables into a spreadsheet"
)]
struct Cli {
    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract every transaction row and replace the destination worksheet
    Sync {
        pdf: PathBuf,

        /// Spreadsheet ID or Google Sheets URL (overrides config)
        #[arg(long)]
        spreadsheet: Option<String>,

        /// Destination worksheet (default: Raw_Data)
        #[arg(long)]
        worksheet: Option<String>,

        /// Service-account key JSON for Google Sheets
        #[arg(long)]
        service_account: Option<PathBuf>,

        /// Write `<worksheet>.csv` into this directory instead of Google Sheets
        #[arg(long)]
        csv_dir: Option<PathBuf>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Dry run: extract rows and print them as CSV on stdout
    Inspect {
        pdf: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Manage ~/.bankstream/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(Args, Debug, Default)]
struct PipelineArgs {
    /// Pages read between writes (default: 50)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    chunk_pages: Option<u32>,

    /// Also write at the first page boundary with this many rows pending
    #[arg(long)]
    flush_after_records: Option<usize>,

    /// always-skip-first | skip-if-header
    #[arg(long)]
    header_policy: Option<HeaderPolicy>,

    /// lines (ruled statements, default) | text (borderless statements)
    #[arg(long)]
    table_strategy: Option<TableStrategy>,
}

impl PipelineArgs {
    fn apply(&self, cfg: &mut Config) {
        if let Some(n) = self.chunk_pages {
            cfg.pipeline.chunk_pages = n as usize;
        }
        if let Some(n) = self.flush_after_records {
            cfg.pipeline.flush_after_records = Some(n);
        }
        if let Some(p) = self.header_policy {
            cfg.pipeline.header_policy = p;
        }
        if let Some(t) = self.table_strategy {
            cfg.pipeline.table_strategy = t;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Config errors surface after logging is up, with the default level.
    let loaded = config::load_config();
    let level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        loaded
            .as_ref()
            .map(|c| c.logging.level.clone())
            .unwrap_or_else(|_| "warn".to_string())
    };
    logging::init(&level);

    let result = loaded.and_then(|cfg| run(cli, cfg));
    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            eprintln!("{FAILURE_MESSAGE}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, mut cfg: Config) -> Result<ExitCode> {
    match cli.command {
        Command::Sync {
            pdf,
            spreadsheet,
            worksheet,
            service_account,
            csv_dir,
            pipeline,
        } => {
            pipeline.apply(&mut cfg);
            if let Some(s) = spreadsheet {
                cfg.destination.spreadsheet_id = Some(s);
            }
            if let Some(w) = worksheet {
                cfg.destination.worksheet_name = w;
            }
            if let Some(p) = service_account {
                cfg.destination.service_account_file = p;
            }
            sync(&pdf, csv_dir.as_deref(), &cfg, cli.quiet)
        }

        Command::Inspect { pdf, pipeline } => {
            pipeline.apply(&mut cfg);
            inspect(&pdf, &cfg)
        }

        Command::Config { command } => {
            match command {
                ConfigCommand::Init => config::init_config()?,
                ConfigCommand::Show => {
                    println!("# {}", config::config_path()?.display());
                    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn open_pdf(pdf: &Path) -> Result<File> {
    File::open(pdf).with_context(|| format!("open {}", pdf.display()))
}

fn sync(pdf: &Path, csv_dir: Option<&Path>, cfg: &Config, quiet: bool) -> Result<ExitCode> {
    let input = open_pdf(pdf)?;

    if let Some(dir) = csv_dir {
        let book = CsvWorkbook::open(dir)?;
        let destination = format!(
            "csv:{}",
            dir.join(format!("{}.csv", cfg.destination.worksheet_name)).display()
        );
        return sync_into(&book, input, pdf, &destination, cfg, quiet);
    }

    let Some(id) = cfg.destination.spreadsheet_id.as_deref() else {
        bail!("no destination: pass --spreadsheet <ID|URL>, --csv-dir <DIR>, or set destination.spreadsheet_id");
    };
    let id = bankstream_sheets::parse_spreadsheet_id(id)?;
    sync_google(&id, input, pdf, cfg, quiet)
}

#[cfg(feature = "gsheets")]
fn sync_google(id: &str, input: File, pdf: &Path, cfg: &Config, quiet: bool) -> Result<ExitCode> {
    let sheets =
        bankstream_sheets::GoogleSheets::open_by_id(&cfg.destination.service_account_file, id)?;
    let destination = format!("gsheets:{id}/{}", cfg.destination.worksheet_name);
    sync_into(&sheets, input, pdf, &destination, cfg, quiet)
}

#[cfg(not(feature = "gsheets"))]
fn sync_google(id: &str, _: File, _: &Path, _: &Config, _: bool) -> Result<ExitCode> {
    bail!("spreadsheet {id}: this build has no Google Sheets support (rebuild with --features gsheets, or use --csv-dir)")
}

fn sync_into<S: Spreadsheet>(
    store: &S,
    input: File,
    pdf: &Path,
    destination: &str,
    cfg: &Config,
    quiet: bool,
) -> Result<ExitCode> {
    let started = Utc::now();
    let format = PdfFormat::new(cfg.pipeline.table_strategy);
    let pipeline = Pipeline::new(format, store, cfg.pipeline_config());

    let mut progress = Progress::new(quiet);
    let result = pipeline.run(input, |page, total| progress.page(page, total));
    progress.finish();

    let (outcome, rows_written, report) = match &result {
        Ok(r) if r.is_empty() => (Outcome::NoTransactions, 0, Some(*r)),
        Ok(r) => (Outcome::Completed, r.rows_written, Some(*r)),
        Err(e) => (Outcome::Failed, e.rows_written(), None),
    };
    let last = LastRun {
        started_at_utc: started.to_rfc3339(),
        finished_at_utc: Utc::now().to_rfc3339(),
        source: pdf.display().to_string(),
        destination: destination.to_string(),
        outcome,
        rows_written,
        report,
    };
    if let Err(e) = state::write_last_run(&last) {
        error!("recording last run: {e:#}");
    }

    match result {
        Ok(report) => Ok(finish(&report)),
        Err(e) => Err(pipeline_failure(e)),
    }
}

fn finish(report: &RunReport) -> ExitCode {
    if report.is_empty() {
        println!("{EMPTY_MESSAGE}");
        return ExitCode::from(2);
    }
    info!(
        pages = report.pages,
        batches = report.batches_written,
        "upload finished"
    );
    println!(
        "Finished extracting and uploading {} rows.",
        report.total_records
    );
    ExitCode::SUCCESS
}

fn pipeline_failure(e: PipelineError) -> anyhow::Error {
    let rows = e.rows_written();
    if rows > 0 {
        eprintln!("{rows} rows were written before the failure.");
    }
    anyhow::Error::new(e)
}

fn inspect(pdf: &Path, cfg: &Config) -> Result<ExitCode> {
    let input = open_pdf(pdf)?;
    let store = MemorySpreadsheet::new();
    let format = PdfFormat::new(cfg.pipeline.table_strategy);
    let pipeline_config = cfg.pipeline_config();
    let name = pipeline_config.worksheet_name.clone();
    let pipeline = Pipeline::new(format, &store, pipeline_config);

    let report = pipeline.run(input, |_, _| {}).map_err(pipeline_failure)?;
    if report.is_empty() {
        eprintln!("{EMPTY_MESSAGE}");
        return Ok(ExitCode::from(2));
    }

    let mut wtr = csv::Writer::from_writer(std::io::stdout().lock());
    for row in store.rows(&name).unwrap_or_default() {
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    eprintln!("{} rows from {} pages", report.total_records, report.pages);
    Ok(ExitCode::SUCCESS)
}

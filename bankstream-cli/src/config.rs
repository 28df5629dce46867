use anyhow::{Context, Result};
use bankstream_core::{
    DEFAULT_CHUNK_PAGES, DEFAULT_WORKSHEET, FlushPolicy, HeaderPolicy, PipelineConfig,
};
use bankstream_ingest::TableStrategy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_bankstream_home;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub destination: DestinationSection,
    pub pipeline: PipelineSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationSection {
    /// Spreadsheet ID, or the full Google Sheets URL
    pub spreadsheet_id: Option<String>,
    pub worksheet_name: String,
    /// Service-account key JSON used for Google Sheets
    pub service_account_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    /// Pages to read before each write to the destination
    pub chunk_pages: usize,
    /// Optional: also write at the first page boundary with this many rows pending
    pub flush_after_records: Option<usize>,
    pub header_policy: HeaderPolicy,
    /// `lines` for ruled statements, `text` for borderless ones
    pub table_strategy: TableStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
}

impl Default for DestinationSection {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            worksheet_name: DEFAULT_WORKSHEET.to_string(),
            service_account_file: PathBuf::from("service_account.json"),
        }
    }
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            chunk_pages: DEFAULT_CHUNK_PAGES,
            flush_after_records: None,
            header_policy: HeaderPolicy::default(),
            table_strategy: TableStrategy::default(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            worksheet_name: self.destination.worksheet_name.clone(),
            flush: FlushPolicy {
                chunk_pages: self.pipeline.chunk_pages.max(1),
                flush_after_records: self.pipeline.flush_after_records,
            },
            header_policy: self.pipeline.header_policy,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_bankstream_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config_to(cfg: &Config, p: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}

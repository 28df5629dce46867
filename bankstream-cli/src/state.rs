use anyhow::{Context, Result};
use bankstream_core::RunReport;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub fn bankstream_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".bankstream"))
}

pub fn ensure_bankstream_home() -> Result<PathBuf> {
    let dir = bankstream_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Completed,
    NoTransactions,
    Failed,
}

/// What the last `sync` did, written to `~/.bankstream/last_run.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastRun {
    pub started_at_utc: String,
    pub finished_at_utc: String,
    pub source: String,
    pub destination: String,
    pub outcome: Outcome,
    /// Data rows left in the destination, including after a failure.
    pub rows_written: usize,
    pub report: Option<RunReport>,
}

pub fn last_run_path() -> Result<PathBuf> {
    Ok(ensure_bankstream_home()?.join("last_run.json"))
}

pub fn write_last_run(run: &LastRun) -> Result<()> {
    write_last_run_to(run, &last_run_path()?)
}

pub fn write_last_run_to(run: &LastRun, p: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(run)?;
    fs::write(p, json).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

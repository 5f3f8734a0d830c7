mod human;
mod json;

pub use human::{format_duration, HumanFormatter};
pub use json::JsonFormatter;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::batch::ScanReport;
use crate::error::{Result, SubliveError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "text" | "pretty" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

pub trait ReportFormatter {
    /// Final summary of a scan whose survivors were written to `output_path`.
    fn format_report(&self, report: &ScanReport, output_path: &Path) -> Result<String>;
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn ReportFormatter> {
    match format {
        OutputFormat::Human => Box::new(HumanFormatter::new()),
        OutputFormat::Json => Box::new(JsonFormatter::new()),
    }
}

/// `result_<YYYY-MM-DD_HH-MM>.txt` for the given run start.
pub fn result_file_name(started_at: DateTime<Local>) -> String {
    format!("result_{}.txt", started_at.format("%Y-%m-%d_%H-%M"))
}

pub fn default_output_path(dir: impl AsRef<Path>, started_at: DateTime<Local>) -> PathBuf {
    dir.as_ref().join(result_file_name(started_at))
}

/// Survivor list file, opened (and truncated) before the scan starts so an
/// unwritable destination fails the run up front.
#[derive(Debug)]
pub struct SurvivorWriter {
    path: PathBuf,
    file: File,
}

impl SurvivorWriter {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path).map_err(|e| SubliveError::io(&path, e))?;
        Ok(Self { path, file })
    }

    /// Writes one hostname per line, no header.
    pub fn write(self, survivors: &[String]) -> Result<PathBuf> {
        let mut writer = BufWriter::new(self.file);
        for hostname in survivors {
            writeln!(writer, "{}", hostname).map_err(|e| SubliveError::io(&self.path, e))?;
        }
        writer.flush().map_err(|e| SubliveError::io(&self.path, e))?;

        debug!(path = %self.path.display(), count = survivors.len(), "Wrote survivors");
        Ok(self.path)
    }
}

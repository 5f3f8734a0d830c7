use std::path::Path;

use serde::Serialize;

use super::ReportFormatter;
use crate::batch::ScanReport;
use crate::error::Result;

#[derive(Serialize)]
struct JsonReport<'a> {
    output: &'a Path,
    #[serde(flatten)]
    report: &'a ScanReport,
}

pub struct JsonFormatter {
    pretty: bool,
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(json)
    }
}

impl ReportFormatter for JsonFormatter {
    fn format_report(&self, report: &ScanReport, output_path: &Path) -> Result<String> {
        self.to_json(&JsonReport {
            output: output_path,
            report,
        })
    }
}

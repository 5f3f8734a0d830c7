use std::path::Path;
use std::time::Duration;

use colored::Colorize;

use super::ReportFormatter;
use crate::batch::ScanReport;
use crate::error::Result;

pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    if total_ms < 1000 {
        return format!("{}ms", total_ms);
    }

    let total_secs = duration.as_secs();
    if total_secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else if total_secs < 3600 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        format!("{}m {}s", mins, secs)
    } else {
        let hours = total_secs / 3600;
        let mins = (total_secs % 3600) / 60;
        format!("{}h {}m", hours, mins)
    }
}

pub struct HumanFormatter {
    use_colors: bool,
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    fn highlight(&self, text: &str) -> String {
        if self.use_colors {
            text.bright_green().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn value(&self, text: &str) -> String {
        if self.use_colors {
            text.bright_white().to_string()
        } else {
            text.to_string()
        }
    }

    fn warning(&self, text: &str) -> String {
        if self.use_colors {
            text.bright_yellow().to_string()
        } else {
            text.to_string()
        }
    }
}

impl ReportFormatter for HumanFormatter {
    fn format_report(&self, report: &ScanReport, output_path: &Path) -> Result<String> {
        let summary = &report.summary;
        let mut output = Vec::new();

        output.push(format!(
            "Alive subdomains have been saved to {}.",
            self.value(&output_path.display().to_string())
        ));
        output.push(format!(
            "Found {} alive subdomains out of {} in {}.",
            self.highlight(&summary.alive.to_string()),
            self.value(&summary.total.to_string()),
            self.value(&format_duration(summary.elapsed()))
        ));

        if summary.unexpected_errors > 0 {
            output.push(self.warning(&format!(
                "{} probes ended on unexpected errors (run with -v for details).",
                summary.unexpected_errors
            )));
        }

        Ok(output.join("\n"))
    }
}

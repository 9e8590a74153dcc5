//! JSON report writer.

use crate::domain::error::ScoutError;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// Writes each report as JSON, either to `<dir>/<name>.json` or to stdout.
pub struct JsonReportAdapter {
    output_dir: Option<PathBuf>,
    pretty: bool,
}

impl JsonReportAdapter {
    pub fn stdout(pretty: bool) -> Self {
        Self {
            output_dir: None,
            pretty,
        }
    }

    pub fn to_dir(output_dir: PathBuf, pretty: bool) -> Self {
        Self {
            output_dir: Some(output_dir),
            pretty,
        }
    }

    fn render(&self, value: &serde_json::Value) -> Result<String, ScoutError> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(text)
    }
}

impl ReportPort for JsonReportAdapter {
    fn write_value(&self, name: &str, value: &serde_json::Value) -> Result<(), ScoutError> {
        let text = self.render(value)?;
        match &self.output_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                let path = dir.join(format!("{}.json", name));
                fs::write(&path, text + "\n")?;
                debug!(path = %path.display(), "report written");
            }
            None => {
                let mut out = std::io::stdout().lock();
                writeln!(out, "{}", text)?;
            }
        }
        Ok(())
    }
}

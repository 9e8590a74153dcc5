//! Report output port trait.

use serde::Serialize;

use crate::domain::error::ScoutError;

/// Port for persisting structured results.
///
/// Records cross the port as `serde_json::Value` so the trait stays object
/// safe; `write` is the typed entry point.
pub trait ReportPort {
    fn write_value(&self, name: &str, value: &serde_json::Value) -> Result<(), ScoutError>;

    fn write<T: Serialize>(&self, name: &str, report: &T) -> Result<(), ScoutError>
    where
        Self: Sized,
    {
        self.write_value(name, &serde_json::to_value(report)?)
    }
}

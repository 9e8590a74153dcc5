//! JSON chip-factor loader.
//!
//! Reads `<dir>/<CODE>_chips.json`, an internally tagged document such as
//! `{"market": "domestic", "foreign_net": 1200, "trust_buy_streak": 4}`.
//! A missing file means no chip data for that instrument.

use crate::domain::chips::ChipFactors;
use crate::domain::error::ScoutError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct JsonChipsAdapter {
    base_path: PathBuf,
}

impl JsonChipsAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn load(&self, code: &str) -> Result<ChipFactors, ScoutError> {
        let path = self.base_path.join(format!("{}_chips.json", code));
        if !path.exists() {
            debug!(code, "no chip data");
            return Ok(ChipFactors::None);
        }
        load_file(&path)
    }
}

/// Parse a single chip-factor file.
pub fn load_file(path: &Path) -> Result<ChipFactors, ScoutError> {
    let content = fs::read_to_string(path).map_err(|e| ScoutError::DataRead {
        path: path.display().to_string(),
        reason: match e.kind() {
            ErrorKind::NotFound => "file not found".to_string(),
            _ => e.to_string(),
        },
    })?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn absent_file_is_none() {
        let dir = TempDir::new().unwrap();
        let chips = JsonChipsAdapter::new(dir.path().to_path_buf()).load("2330").unwrap();
        assert!(chips.is_none());
    }

    #[test]
    fn loads_tagged_document() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("2330_chips.json"),
            r#"{"market": "domestic", "foreign_net": 1200, "trust_net": 300, "trust_buy_streak": 4}"#,
        )
        .unwrap();
        let chips = JsonChipsAdapter::new(dir.path().to_path_buf()).load("2330").unwrap();
        assert!(matches!(chips, ChipFactors::Domestic(_)));
        // net flow +1, trust streak +1, joint buying +0.5
        assert!((chips.score().total - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_market_is_json_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"market": "lunar"}"#).unwrap();
        assert!(matches!(load_file(&path), Err(ScoutError::Json(_))));
        assert!(matches!(
            load_file(&dir.path().join("missing.json")),
            Err(ScoutError::DataRead { .. })
        ));
    }
}

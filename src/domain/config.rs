//! Typed settings read through a `ConfigPort` and validated up front.
//!
//! ```ini
//! [backtest]
//! initial_capital = 100000
//! fee_rate = 0.001425
//! tax_rate = 0.003
//!
//! [optimizer]
//! buy_thresholds = 1,2,3,4,5
//! sell_thresholds = -1,-2,-3,-4
//!
//! [analysis]
//! divergence_lookback = 30
//! scorer = fast
//!
//! [thresholds]
//! buy = 3
//! sell = -2
//!
//! [data]
//! dir = ./data
//!
//! [report]
//! pretty = true
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::action_plan::Thresholds;
use crate::domain::backtest::BacktestConfig;
use crate::domain::divergence;
use crate::domain::error::ScoutError;
use crate::domain::factor::FactorScorer;
use crate::domain::optimizer::{DEFAULT_BUY_CANDIDATES, DEFAULT_SELL_CANDIDATES};
use crate::domain::scorer::{FastTriggerScorer, FullTriggerScorer, TriggerScorer};
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScorerKind {
    #[default]
    Fast,
    Full,
}

impl FromStr for ScorerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(ScorerKind::Fast),
            "full" => Ok(ScorerKind::Full),
            other => Err(format!("unknown scorer '{other}', expected fast or full")),
        }
    }
}

impl fmt::Display for ScorerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScorerKind::Fast => f.write_str("fast"),
            ScorerKind::Full => f.write_str("full"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub backtest: BacktestConfig,
    pub buy_candidates: Vec<f64>,
    pub sell_candidates: Vec<f64>,
    pub divergence_lookback: usize,
    pub scorer: ScorerKind,
    pub thresholds: Option<Thresholds>,
    pub data_dir: Option<PathBuf>,
    pub pretty_json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backtest: BacktestConfig::default(),
            buy_candidates: DEFAULT_BUY_CANDIDATES.to_vec(),
            sell_candidates: DEFAULT_SELL_CANDIDATES.to_vec(),
            divergence_lookback: divergence::DEFAULT_LOOKBACK,
            scorer: ScorerKind::default(),
            thresholds: None,
            data_dir: None,
            pretty_json: true,
        }
    }
}

impl Settings {
    pub fn from_port(config: &dyn ConfigPort) -> Result<Self, ScoutError> {
        let defaults = BacktestConfig::default();
        let backtest = BacktestConfig {
            initial_capital: number(config, "backtest", "initial_capital", defaults.initial_capital)?,
            fee_rate: number(config, "backtest", "fee_rate", defaults.fee_rate)?,
            tax_rate: number(config, "backtest", "tax_rate", defaults.tax_rate)?,
        };
        validate_backtest(&backtest)?;

        let buy_candidates = list(config, "optimizer", "buy_thresholds", &DEFAULT_BUY_CANDIDATES)?;
        let sell_candidates = list(config, "optimizer", "sell_thresholds", &DEFAULT_SELL_CANDIDATES)?;

        let lookback = number(config, "analysis", "divergence_lookback", divergence::DEFAULT_LOOKBACK as f64)?;
        if lookback < 7.0 || lookback.fract() != 0.0 {
            return Err(ScoutError::invalid(
                "analysis",
                "divergence_lookback",
                "must be a whole number of at least 7 bars",
            ));
        }

        let scorer = match config.get_string("analysis", "scorer") {
            Some(s) => s
                .parse::<ScorerKind>()
                .map_err(|reason| ScoutError::invalid("analysis", "scorer", reason))?,
            None => ScorerKind::default(),
        };

        Ok(Self {
            backtest,
            buy_candidates,
            sell_candidates,
            divergence_lookback: lookback as usize,
            scorer,
            thresholds: thresholds(config)?,
            data_dir: config
                .get_string("data", "dir")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            pretty_json: config.get_bool("report", "pretty", true),
        })
    }

    pub fn factor_scorer(&self) -> FactorScorer {
        FactorScorer::new(self.divergence_lookback)
    }

    pub fn trigger_scorer(&self) -> Box<dyn TriggerScorer> {
        match self.scorer {
            ScorerKind::Fast => Box::new(FastTriggerScorer),
            ScorerKind::Full => Box::new(FullTriggerScorer {
                factors: self.factor_scorer(),
            }),
        }
    }
}

/// Numeric key: default when absent, error when present but unparseable.
fn number(config: &dyn ConfigPort, section: &str, key: &str, default: f64) -> Result<f64, ScoutError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ScoutError::invalid(section, key, format!("'{raw}' is not a number"))),
    }
}

fn list(config: &dyn ConfigPort, section: &str, key: &str, default: &[f64]) -> Result<Vec<f64>, ScoutError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(default.to_vec());
    };
    let values = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ScoutError::invalid(section, key, format!("'{s}' is not a number")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if values.is_empty() {
        return Err(ScoutError::invalid(section, key, "candidate list must not be empty"));
    }
    Ok(values)
}

fn validate_backtest(config: &BacktestConfig) -> Result<(), ScoutError> {
    if config.initial_capital <= 0.0 {
        return Err(ScoutError::invalid("backtest", "initial_capital", "initial_capital must be positive"));
    }
    if !(0.0..1.0).contains(&config.fee_rate) {
        return Err(ScoutError::invalid("backtest", "fee_rate", "fee_rate must be in [0, 1)"));
    }
    if !(0.0..1.0).contains(&config.tax_rate) {
        return Err(ScoutError::invalid("backtest", "tax_rate", "tax_rate must be in [0, 1)"));
    }
    Ok(())
}

fn thresholds(config: &dyn ConfigPort) -> Result<Option<Thresholds>, ScoutError> {
    let buy = config.get_string("thresholds", "buy");
    let sell = config.get_string("thresholds", "sell");
    match (buy, sell) {
        (None, None) => Ok(None),
        (Some(_), None) => Err(ScoutError::ConfigMissing {
            section: "thresholds".to_string(),
            key: "sell".to_string(),
        }),
        (None, Some(_)) => Err(ScoutError::ConfigMissing {
            section: "thresholds".to_string(),
            key: "buy".to_string(),
        }),
        (Some(_), Some(_)) => {
            let buy = number(config, "thresholds", "buy", 0.0)?;
            let sell = number(config, "thresholds", "sell", 0.0)?;
            if buy <= sell {
                return Err(ScoutError::invalid("thresholds", "buy", "buy must be greater than sell"));
            }
            Ok(Some(Thresholds { buy, sell }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapConfig(HashMap<(String, String), String>);

    impl MapConfig {
        fn new(entries: &[(&str, &str, &str)]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|(s, k, v)| ((s.to_string(), k.to_string()), v.to_string()))
                    .collect(),
            )
        }
    }

    impl ConfigPort for MapConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.0.get(&(section.to_string(), key.to_string())).cloned()
        }
    }

    #[test]
    fn empty_config_yields_defaults() {
        let settings = Settings::from_port(&MapConfig::new(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.trigger_scorer().name(), "fast");
    }

    #[test]
    fn reads_all_sections() {
        let config = MapConfig::new(&[
            ("backtest", "initial_capital", "50000"),
            ("backtest", "fee_rate", "0.001"),
            ("optimizer", "buy_thresholds", "2, 4"),
            ("optimizer", "sell_thresholds", "-1"),
            ("analysis", "divergence_lookback", "40"),
            ("analysis", "scorer", "Full"),
            ("thresholds", "buy", "3"),
            ("thresholds", "sell", "-2"),
            ("data", "dir", "/tmp/bars"),
            ("report", "pretty", "no"),
        ]);
        let s = Settings::from_port(&config).unwrap();
        assert!((s.backtest.initial_capital - 50_000.0).abs() < f64::EPSILON);
        assert!((s.backtest.tax_rate - 0.003).abs() < f64::EPSILON);
        assert_eq!(s.buy_candidates, vec![2.0, 4.0]);
        assert_eq!(s.sell_candidates, vec![-1.0]);
        assert_eq!(s.divergence_lookback, 40);
        assert_eq!(s.scorer, ScorerKind::Full);
        assert_eq!(s.thresholds, Some(Thresholds { buy: 3.0, sell: -2.0 }));
        assert_eq!(s.data_dir, Some(PathBuf::from("/tmp/bars")));
        assert!(!s.pretty_json);
        assert_eq!(s.trigger_scorer().name(), "full");
    }

    #[test]
    fn rejects_bad_values() {
        let cases = [
            ("backtest", "initial_capital", "0"),
            ("backtest", "fee_rate", "1.5"),
            ("backtest", "tax_rate", "-0.1"),
            ("backtest", "fee_rate", "abc"),
            ("optimizer", "buy_thresholds", "1,x"),
            ("optimizer", "sell_thresholds", " , "),
            ("analysis", "divergence_lookback", "3"),
            ("analysis", "scorer", "turbo"),
        ];
        for (section, key, value) in cases {
            let err = Settings::from_port(&MapConfig::new(&[(section, key, value)])).unwrap_err();
            assert!(
                matches!(err, ScoutError::ConfigInvalid { .. }),
                "[{section}] {key} = {value} gave {err}"
            );
        }
    }

    #[test]
    fn thresholds_need_both_keys_and_order() {
        let err = Settings::from_port(&MapConfig::new(&[("thresholds", "buy", "3")])).unwrap_err();
        assert!(matches!(err, ScoutError::ConfigMissing { ref key, .. } if key == "sell"));

        let err = Settings::from_port(&MapConfig::new(&[
            ("thresholds", "buy", "-3"),
            ("thresholds", "sell", "-2"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ScoutError::ConfigInvalid { .. }));
    }
}

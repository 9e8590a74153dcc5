//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::chips_adapter::{self, JsonChipsAdapter};
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::action_plan::Thresholds;
use crate::domain::analysis::{self, AnalysisInput};
use crate::domain::backtest::{self, DEFAULT_BUY_THRESHOLD, DEFAULT_SELL_THRESHOLD};
use crate::domain::chips::ChipFactors;
use crate::domain::config::{ScorerKind, Settings};
use crate::domain::error::ScoutError;
use crate::domain::factor::TRIGGER_MIN_BARS;
use crate::domain::optimizer;
use crate::domain::scorer::{self, ScoredSeries};
use crate::domain::series::IndicatorSeries;
use crate::ports::report_port::ReportPort;
use crate::ports::series_port::{SeriesPort, Timeframe};

#[derive(Parser, Debug)]
#[command(
    name = "trendscout",
    about = "Technical factor scoring, scenario planning and threshold backtesting"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// INI settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Directory holding <CODE>_daily.csv / <CODE>_weekly.csv
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,
    /// Write <CODE>_<report>.json files here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Instrument codes (comma separated); all daily files when omitted
    #[arg(long, value_delimiter = ',')]
    pub code: Vec<String>,
    /// Single-line JSON
    #[arg(long)]
    pub compact: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score, classify and plan the latest bar
    Analyze {
        #[command(flatten)]
        common: CommonArgs,
        /// Chip-factor JSON file (otherwise <CODE>_chips.json in the data dir)
        #[arg(long)]
        chips: Option<PathBuf>,
    },
    /// Replay the trigger score and simulate trades
    Backtest {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long, allow_hyphen_values = true)]
        buy: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        sell: Option<f64>,
        /// fast or full
        #[arg(long)]
        scorer: Option<ScorerKind>,
    },
    /// Grid-search buy/sell thresholds
    Optimize {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long)]
        scorer: Option<ScorerKind>,
    },
    /// Validate a settings file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Analyze { common, chips } => run_analyze(&common, chips.as_deref()),
        Command::Backtest {
            common,
            buy,
            sell,
            scorer,
        } => run_backtest(&common, buy, sell, scorer),
        Command::Optimize { common, scorer } => run_optimize(&common, scorer),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: ScoutError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_settings(path: Option<&Path>) -> Result<Settings, ScoutError> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading settings");
            Settings::from_port(&FileConfigAdapter::from_file(path)?)
        }
        None => Ok(Settings::default()),
    }
}

/// Settings, adapters and the resolved code list shared by every data command.
struct Session {
    settings: Settings,
    series: CsvAdapter,
    chips: JsonChipsAdapter,
    reports: JsonReportAdapter,
    codes: Vec<String>,
}

impl Session {
    fn open(common: &CommonArgs) -> Result<Self, ScoutError> {
        let settings = load_settings(common.config.as_deref())?;
        let data_dir = common
            .data_dir
            .clone()
            .or_else(|| settings.data_dir.clone())
            .ok_or_else(|| ScoutError::ConfigMissing {
                section: "data".to_string(),
                key: "dir".to_string(),
            })?;

        let pretty = settings.pretty_json && !common.compact;
        let reports = match &common.output {
            Some(dir) => JsonReportAdapter::to_dir(dir.clone(), pretty),
            None => JsonReportAdapter::stdout(pretty),
        };
        let series = CsvAdapter::new(data_dir.clone());
        let codes = resolve_codes(&common.code, &series)?;

        Ok(Self {
            settings,
            series,
            chips: JsonChipsAdapter::new(data_dir),
            reports,
            codes,
        })
    }

    /// Run `f` per code; a failing code is reported and the rest still run.
    fn for_each_code(&self, mut f: impl FnMut(&Self, &str) -> Result<(), ScoutError>) -> ExitCode {
        let mut status = ExitCode::SUCCESS;
        for code in &self.codes {
            if let Err(e) = f(self, code) {
                eprintln!("error: {code}: {e}");
                status = (&e).into();
            }
        }
        status
    }

    fn daily(&self, code: &str) -> Result<IndicatorSeries, ScoutError> {
        self.series.load(code, Timeframe::Daily)
    }
}

pub fn resolve_codes(requested: &[String], series: &dyn SeriesPort) -> Result<Vec<String>, ScoutError> {
    let codes: Vec<String> = requested
        .iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if !codes.is_empty() {
        return Ok(codes);
    }
    let codes = series.list_codes(Timeframe::Daily)?;
    if codes.is_empty() {
        warn!("no daily series found");
    }
    Ok(codes)
}

fn run_analyze(common: &CommonArgs, chips_path: Option<&Path>) -> ExitCode {
    let session = match Session::open(common) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let chips_override = match chips_path.map(chips_adapter::load_file).transpose() {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let factors = session.settings.factor_scorer();

    session.for_each_code(|s, code| {
        let daily = s.daily(code)?;
        let weekly = match s.series.load(code, Timeframe::Weekly) {
            Ok(w) => w,
            Err(ScoutError::NoData { .. }) => {
                warn!(code, "no weekly series, scenario will be neutral");
                IndicatorSeries::empty()
            }
            Err(e) => return Err(e),
        };
        let chips: ChipFactors = match &chips_override {
            Some(c) => c.clone(),
            None => s.chips.load(code)?,
        };

        let input = AnalysisInput::new(code, weekly, daily)
            .with_chips(chips)
            .with_thresholds(s.settings.thresholds);
        let report = analysis::analyze_with(&factors, &input);
        info!(
            code,
            scenario = %report.scenario.code,
            trend = report.trend.total,
            trigger = report.trigger.total,
            "analyzed"
        );
        s.reports.write(&format!("{code}_analysis"), &report)
    })
}

/// Score every bar, refusing series too short to produce a single score.
fn scored_series(session: &Session, code: &str, scorer: Option<ScorerKind>) -> Result<ScoredSeries, ScoutError> {
    let daily = session.daily(code)?;
    if daily.len() < TRIGGER_MIN_BARS {
        return Err(ScoutError::InsufficientData {
            code: code.to_string(),
            bars: daily.len(),
            minimum: TRIGGER_MIN_BARS,
        });
    }
    let mut settings = session.settings.clone();
    if let Some(kind) = scorer {
        settings.scorer = kind;
    }
    let trigger = settings.trigger_scorer();
    info!(code, scorer = trigger.name(), bars = daily.len(), "scoring series");
    Ok(scorer::score_series(&daily, trigger.as_ref()))
}

pub fn resolve_thresholds(
    buy: Option<f64>,
    sell: Option<f64>,
    configured: Option<Thresholds>,
) -> Result<Thresholds, ScoutError> {
    let base = configured.unwrap_or(Thresholds {
        buy: DEFAULT_BUY_THRESHOLD,
        sell: DEFAULT_SELL_THRESHOLD,
    });
    let thresholds = Thresholds {
        buy: buy.unwrap_or(base.buy),
        sell: sell.unwrap_or(base.sell),
    };
    if thresholds.buy <= thresholds.sell {
        return Err(ScoutError::invalid(
            "thresholds",
            "buy",
            format!("buy {} must be greater than sell {}", thresholds.buy, thresholds.sell),
        ));
    }
    Ok(thresholds)
}

fn run_backtest(common: &CommonArgs, buy: Option<f64>, sell: Option<f64>, scorer: Option<ScorerKind>) -> ExitCode {
    let session = match Session::open(common) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let thresholds = match resolve_thresholds(buy, sell, session.settings.thresholds) {
        Ok(t) => t,
        Err(e) => return fail(e),
    };

    session.for_each_code(|s, code| {
        let scored = scored_series(s, code, scorer)?;
        let report = backtest::run(&scored, thresholds.buy, thresholds.sell, &s.settings.backtest);
        info!(
            code,
            total_return_pct = report.total_return_pct,
            trades = report.trades.len(),
            "backtest complete"
        );
        s.reports.write(&format!("{code}_backtest"), &report)
    })
}

fn run_optimize(common: &CommonArgs, scorer: Option<ScorerKind>) -> ExitCode {
    let session = match Session::open(common) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    session.for_each_code(|s, code| {
        let scored = scored_series(s, code, scorer)?;
        let result = optimizer::optimize(
            &scored,
            &s.settings.buy_candidates,
            &s.settings.sell_candidates,
            &s.settings.backtest,
        )
        .ok_or_else(|| ScoutError::invalid("optimizer", "buy_thresholds", "candidate list must not be empty"))?;
        info!(
            code,
            buy = result.best.buy,
            sell = result.best.sell,
            total_return_pct = result.report.total_return_pct,
            "optimization complete"
        );
        s.reports.write(&format!("{code}_optimize"), &result)
    })
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating settings: {}", config_path.display());
    let settings = match load_settings(Some(config_path)) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    let list = |values: &[f64]| {
        values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    eprintln!("  initial_capital:     {}", settings.backtest.initial_capital);
    eprintln!("  fee_rate:            {}", settings.backtest.fee_rate);
    eprintln!("  tax_rate:            {}", settings.backtest.tax_rate);
    eprintln!("  buy candidates:      {}", list(&settings.buy_candidates));
    eprintln!("  sell candidates:     {}", list(&settings.sell_candidates));
    eprintln!("  divergence_lookback: {}", settings.divergence_lookback);
    eprintln!("  scorer:              {}", settings.scorer);
    match settings.thresholds {
        Some(t) => eprintln!("  thresholds:          buy {} / sell {}", t.buy, t.sell),
        None => eprintln!("  thresholds:          scenario driven"),
    }
    match &settings.data_dir {
        Some(dir) => eprintln!("  data dir:            {}", dir.display()),
        None => eprintln!("  data dir:            (pass --data-dir)"),
    }

    eprintln!("\nSettings are valid.");
    ExitCode::SUCCESS
}

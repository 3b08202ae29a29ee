use crate::error::{ReportError, Result};
use crate::scope::ReportScope;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub data: DataConfig,
    pub report: ReportConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    pub tenders: PathBuf,
    pub transactions: PathBuf,
    pub payment_calendar: PathBuf,
    pub finance_extras: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    pub company_id: String,
    // dates are quoted strings: "2024-01-31"
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    /// Reference date for overdue checks; today when absent.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub dir: PathBuf,
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

fn default_preview_rows() -> usize {
    5
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[data]
tenders = "data/tenders.json"
transactions = "data/transactions.csv"
payment_calendar = "data/payment_calendar.csv"
finance_extras = "data/finance_extras.json"

[report]
company_id = "default"

[output]
dir = "reports"
preview_rows = 5
"#;

/// Load `config.toml` from the working directory, falling back to the
/// embedded default.
pub fn load_config() -> Result<Config> {
    load_config_from(Path::new("config.toml"))
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if path.exists() {
        tracing::info!("Loading config from: {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        return parse_config(&contents);
    }
    tracing::info!("Using default embedded configuration");
    parse_config(DEFAULT_CONFIG)
}

pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents)?;
    if let (Some(from), Some(to)) = (config.report.date_from, config.report.date_to) {
        if from > to {
            return Err(ReportError::Parse(format!(
                "report.date_from {} is after report.date_to {}",
                from, to
            )));
        }
    }
    Ok(config)
}

impl Config {
    pub fn scope(&self) -> ReportScope {
        let mut scope = ReportScope::company(self.report.company_id.clone());
        scope.from = self.report.date_from;
        scope.to = self.report.date_to;
        scope
    }
}

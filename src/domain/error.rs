//! Domain error types.

use std::collections::BTreeMap;
use std::fmt;

/// A named indicator column, used when reporting missing dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Ma50,
    Ma200,
    Rsi,
    Volatility,
    MaMid,
    UpperBand,
    LowerBand,
    Signal,
    DailyReturn,
    StrategyReturn,
}

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Column::Ma50 => "ma_50",
            Column::Ma200 => "ma_200",
            Column::Rsi => "rsi",
            Column::Volatility => "volatility",
            Column::MaMid => "ma_mid",
            Column::UpperBand => "upper_band",
            Column::LowerBand => "lower_band",
            Column::Signal => "signal",
            Column::DailyReturn => "daily_return",
            Column::StrategyReturn => "strategy_return",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn join_columns(columns: &[Column]) -> String {
    columns
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Precondition failures raised by the indicator engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("{operation} requires missing columns: {}", join_columns(.missing))]
    MissingColumns {
        operation: &'static str,
        missing: Vec<Column>,
    },

    #[error("price series is empty")]
    EmptySeries,

    #[error("insufficient history for {column}: have {rows} rows, need {window}")]
    InsufficientHistory {
        column: Column,
        rows: usize,
        window: usize,
    },

    #[error("invalid window for {column}: {window}")]
    InvalidWindow { column: Column, window: usize },
}

/// Portfolio construction and aggregation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortfolioError {
    #[error("portfolio has no positions")]
    Empty,

    #[error("weight for {ticker} must be within [0, 1], got {weight}")]
    InvalidWeight { ticker: String, weight: f64 },

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),

    #[error("weights sum to {sum}, expected 1")]
    WeightsNotNormalized { sum: f64 },

    #[error("invalid position '{token}': {reason}")]
    InvalidPosition { token: String, reason: String },

    #[error("only {succeeded} of the positions returned data, need at least {required}")]
    InsufficientAssets {
        succeeded: usize,
        required: usize,
        errors: BTreeMap<String, String>,
    },
}

/// Failures talking to a market data source.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MarketDataError {
    #[error("market data connection failed: {0}")]
    Connection(String),

    #[error("fetch failed for {ticker}: {reason}")]
    Fetch { ticker: String, reason: String },

    #[error("could not parse market data for {ticker}: {reason}")]
    Parse { ticker: String, reason: String },
}

/// Top-level error type for marketlens.
#[derive(Debug, thiserror::Error)]
pub enum MarketlensError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Portfolio(#[from] PortfolioError),

    #[error("unknown category '{name}', available: {available}")]
    UnknownCategory { name: String, available: String },

    #[error("no data for {ticker}")]
    NoData { ticker: String },

    #[error("export failed: {reason}")]
    Export { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MarketlensError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            MarketlensError::Io(_) | MarketlensError::Export { .. } => 1,
            MarketlensError::ConfigParse { .. }
            | MarketlensError::ConfigMissing { .. }
            | MarketlensError::ConfigInvalid { .. }
            | MarketlensError::UnknownCategory { .. } => 2,
            MarketlensError::MarketData(_) | MarketlensError::NoData { .. } => 3,
            MarketlensError::Analysis(_) => 4,
            MarketlensError::Portfolio(_) => 5,
        }
    }
}

impl From<&MarketlensError> for std::process::ExitCode {
    fn from(err: &MarketlensError) -> Self {
        std::process::ExitCode::from(err.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_names_every_column() {
        let err = AnalysisError::MissingColumns {
            operation: "signal",
            missing: vec![Column::Ma50, Column::Ma200],
        };
        assert_eq!(
            err.to_string(),
            "signal requires missing columns: ma_50, ma_200"
        );
    }

    #[test]
    fn insufficient_history_message() {
        let err = AnalysisError::InsufficientHistory {
            column: Column::Ma200,
            rows: 120,
            window: 200,
        };
        assert_eq!(
            err.to_string(),
            "insufficient history for ma_200: have 120 rows, need 200"
        );
    }

    #[test]
    fn exit_codes_by_concern() {
        let config = MarketlensError::ConfigMissing {
            section: "data".into(),
            key: "source".into(),
        };
        assert_eq!(config.exit_code(), 2);
        let category = MarketlensError::UnknownCategory {
            name: "Shipping".into(),
            available: "Energy".into(),
        };
        assert_eq!(category.exit_code(), 2);
        assert_eq!(MarketlensError::NoData { ticker: "X".into() }.exit_code(), 3);
        assert_eq!(MarketlensError::from(AnalysisError::EmptySeries).exit_code(), 4);
        assert_eq!(MarketlensError::from(PortfolioError::Empty).exit_code(), 5);
        assert_eq!(MarketlensError::Export { reason: "disk".into() }.exit_code(), 1);
    }

    #[test]
    fn analysis_error_converts_to_top_level() {
        let err: MarketlensError = AnalysisError::EmptySeries.into();
        assert!(matches!(err, MarketlensError::Analysis(AnalysisError::EmptySeries)));
    }
}

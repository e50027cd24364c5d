//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::cached_adapter::CachedMarketData;
use crate::adapters::csv_adapter::{export_enriched, CsvMarketData};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::aggregator::{aggregate, Aggregation};
use crate::domain::analyzer::{EnrichedSeries, TechnicalAnalyzer};
use crate::domain::catalogue;
use crate::domain::error::{Column, MarketlensError, PortfolioError};
use crate::domain::macro_data::{correlations, fetch_macro, MACRO_INDICATORS};
use crate::domain::metrics::PortfolioMetrics;
use crate::domain::portfolio::Portfolio;
use crate::domain::request::{HistoryRequest, Interval, Period};
use crate::domain::settings::{DataSource, Settings};
use crate::domain::snapshot::Snapshot;
use crate::logging::{init_logging, LogFormat};
use crate::ports::market_data_port::{fetch_latest, fetch_series, MarketDataPort};

#[derive(Parser, Debug)]
#[command(
    name = "marketlens",
    about = "Technical indicators, portfolio returns and macro correlations"
)]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute every indicator for a ticker and print its snapshot
    Analyze {
        ticker: String,
        #[arg(long)]
        period: Option<Period>,
        #[arg(long, requires = "end")]
        start: Option<NaiveDate>,
        #[arg(long, requires = "start")]
        end: Option<NaiveDate>,
        #[arg(long)]
        interval: Option<Interval>,
        /// Write the enriched series to stock_data_<date>.csv
        #[arg(long)]
        export: bool,
    },
    /// Aggregate a weighted portfolio, e.g. AAPL=0.6,MSFT=0.4
    Portfolio {
        positions: String,
        #[arg(long)]
        period: Option<Period>,
    },
    /// Show the latest intraday quote
    Quote { ticker: String },
    /// Fetch macro indicators, optionally correlating a ticker against them
    Macro {
        #[arg(long)]
        period: Option<Period>,
        #[arg(long)]
        ticker: Option<String>,
    },
    /// List asset categories or the tickers of one category
    Categories { name: Option<String> },
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(cli.verbose, cli.log_format);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Runs the selected command without touching logging or the exit status.
pub fn execute(cli: Cli) -> Result<(), MarketlensError> {
    match cli.command {
        Command::Categories { name } => run_categories(name.as_deref()),
        command => load_settings(cli.config.as_deref()).and_then(|settings| match command {
            Command::Analyze {
                ticker,
                period,
                start,
                end,
                interval,
                export,
            } => run_analyze(&settings, &ticker, period, start, end, interval, export),
            Command::Portfolio { positions, period } => {
                run_portfolio(&settings, &positions, period)
            }
            Command::Quote { ticker } => run_quote(&settings, &ticker),
            Command::Macro { period, ticker } => run_macro(&settings, period, ticker.as_deref()),
            Command::Categories { name } => run_categories(name.as_deref()),
        }),
    }
}

pub fn load_settings(path: Option<&Path>) -> Result<Settings, MarketlensError> {
    match path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            Settings::from_config(&FileConfigAdapter::from_file(path)?)
        }
        None => Settings::from_config(&FileConfigAdapter::empty()),
    }
}

/// The configured source behind the TTL cache.
pub fn build_source(settings: &Settings) -> Result<Box<dyn MarketDataPort>, MarketlensError> {
    let ttl = settings.cache_ttl;
    match settings.source {
        DataSource::Csv => Ok(Box::new(CachedMarketData::new(
            CsvMarketData::new(settings.csv_dir.clone()),
            ttl,
        ))),
        #[cfg(feature = "yahoo")]
        DataSource::Yahoo => {
            use crate::adapters::yahoo_adapter::YahooMarketData;
            Ok(Box::new(CachedMarketData::new(YahooMarketData::new()?, ttl)))
        }
        #[cfg(not(feature = "yahoo"))]
        DataSource::Yahoo => Err(MarketlensError::ConfigInvalid {
            section: "data".to_string(),
            key: "source".to_string(),
            reason: "built without the yahoo feature".to_string(),
        }),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime, MarketlensError> {
    Ok(tokio::runtime::Runtime::new()?)
}

fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

fn fmt_opt(value: Option<f64>, decimals: usize, suffix: &str) -> String {
    match value {
        Some(v) => format!("{:.*}{}", decimals, v, suffix),
        None => "n/a".to_string(),
    }
}

fn run_analyze(
    settings: &Settings,
    ticker: &str,
    period: Option<Period>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    interval: Option<Interval>,
    export: bool,
) -> Result<(), MarketlensError> {
    let ticker = normalize_ticker(ticker);
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(MarketlensError::ConfigInvalid {
                section: "analyze".to_string(),
                key: "start".to_string(),
                reason: "start must not be after end".to_string(),
            });
        }
    }
    let request = HistoryRequest::resolve(
        period,
        start,
        end,
        settings.period,
        interval.unwrap_or(settings.interval),
    );

    let source = build_source(settings)?;
    let series = runtime()?.block_on(fetch_series(source.as_ref(), &ticker, &request));
    if series.is_empty() {
        return Err(MarketlensError::NoData { ticker });
    }
    eprintln!(
        "Loaded {} rows for {} ({}, {})",
        series.len(),
        ticker,
        request.range,
        request.interval
    );

    let mut analyzer = TechnicalAnalyzer::new(series)?;
    analyzer.add_all(&settings.indicators)?;
    let enriched = analyzer.finish();

    let snapshot = Snapshot::from_enriched(&enriched).ok_or_else(|| MarketlensError::NoData {
        ticker: ticker.clone(),
    })?;
    print_snapshot(&snapshot, catalogue::category_of(&ticker));
    print_indicators(&enriched);

    if export {
        let path = export_enriched(&enriched, &settings.export_dir, Local::now().date_naive())?;
        eprintln!("\nExported to: {}", path.display());
    }
    Ok(())
}

fn print_snapshot(s: &Snapshot, category: Option<&str>) {
    println!("=== {} ({}) ===", s.ticker, s.date);
    if let Some(category) = category {
        println!("Category:         {}", category);
    }
    println!("Last Close:       {:.2}", s.last_close);
    println!("Day Change:       {}", fmt_opt(s.day_change_pct, 2, "%"));
    println!("5-Day Change:     {}", fmt_opt(s.change_5d_pct, 2, "%"));
    println!("20-Day Change:    {}", fmt_opt(s.change_20d_pct, 2, "%"));
    println!("Volatility:       {}", fmt_opt(s.volatility_pct, 2, "%"));
    println!("Volume:           {:.0}", s.volume);
    match (s.rsi, s.rsi_zone) {
        (Some(rsi), Some(zone)) => println!("RSI:              {:.1} ({})", rsi, zone),
        _ => println!("RSI:              n/a"),
    }
}

fn print_indicators(enriched: &EnrichedSeries) {
    println!("\n=== Latest Indicators ===");
    for column in enriched.indicators.columns() {
        println!(
            "{:<17} {}",
            format!("{}:", column),
            fmt_opt(enriched.latest(column), 4, "")
        );
    }

    if let Some(strategy) = &enriched.indicators.strategy_return {
        let compounded = strategy
            .iter()
            .flatten()
            .fold(1.0, |acc, r| acc * (1.0 + r));
        let buy_hold = PortfolioMetrics::compute(
            enriched.indicators.daily_return.as_deref().unwrap_or_default(),
        );
        println!("\n=== Signal Strategy ===");
        println!(
            "Current Signal:   {}",
            fmt_opt(enriched.latest(Column::Signal), 0, "")
        );
        println!("Strategy Return:  {:.2}%", (compounded - 1.0) * 100.0);
        println!("Buy & Hold:       {:.2}%", buy_hold.total_return);
    }
}

fn run_portfolio(
    settings: &Settings,
    positions: &str,
    period: Option<Period>,
) -> Result<(), MarketlensError> {
    let mut portfolio = Portfolio::parse(positions)?;
    if !portfolio.is_normalized() {
        eprintln!(
            "Weights sum to {:.1}%, renormalizing",
            portfolio.total_weight() * 100.0
        );
        portfolio = portfolio.normalized()?;
    }

    let request = HistoryRequest::period(period.unwrap_or(settings.period), settings.interval);
    let source = build_source(settings)?;
    eprintln!(
        "Fetching {} positions ({} workers)...",
        portfolio.positions().len(),
        settings.max_workers
    );

    let result = runtime()?.block_on(aggregate(
        &portfolio,
        source.as_ref(),
        &request,
        settings.max_workers,
        settings.min_assets,
    ));

    match result {
        Ok(aggregation) => {
            print_aggregation(&portfolio, &aggregation);
            Ok(())
        }
        Err(PortfolioError::InsufficientAssets {
            succeeded,
            required,
            errors,
        }) => {
            print_errors(&errors);
            Err(PortfolioError::InsufficientAssets {
                succeeded,
                required,
                errors,
            }
            .into())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_aggregation(portfolio: &Portfolio, aggregation: &Aggregation) {
    let m = &aggregation.metrics;
    println!("=== Portfolio ===");
    for position in portfolio.positions() {
        let status = if aggregation.errors.contains_key(&position.ticker) {
            "excluded"
        } else {
            "ok"
        };
        println!(
            "  {:<10} {:>6.1}%  {}",
            position.ticker,
            position.weight * 100.0,
            status
        );
    }
    println!("\n=== Metrics ({} days) ===", m.trading_days);
    println!("Annualized Return: {:.2}%", m.annualized_return);
    println!("Volatility:        {:.2}%", m.volatility);
    println!("Sharpe Ratio:      {}", fmt_opt(m.sharpe_ratio, 2, ""));
    println!("Total Return:      {:.2}%", m.total_return);
    println!("Max Drawdown:      -{:.2}%", m.max_drawdown);
    print_errors(&aggregation.errors);
}

fn print_errors(errors: &std::collections::BTreeMap<String, String>) {
    if errors.is_empty() {
        return;
    }
    eprintln!("\n=== Errors ===");
    for (ticker, reason) in errors {
        eprintln!("  {}: {}", ticker, reason);
    }
}

fn run_quote(settings: &Settings, ticker: &str) -> Result<(), MarketlensError> {
    let ticker = normalize_ticker(ticker);
    let source = build_source(settings)?;
    let series = runtime()?.block_on(fetch_latest(source.as_ref(), &ticker));
    let bar = series
        .last()
        .ok_or_else(|| MarketlensError::NoData { ticker: ticker.clone() })?;

    println!("=== {} ({}) ===", ticker, bar.date);
    println!("Open:    {:.2}", bar.open);
    println!("High:    {:.2}", bar.high);
    println!("Low:     {:.2}", bar.low);
    println!("Close:   {:.2}", bar.close);
    println!("Volume:  {:.0}", bar.volume);
    Ok(())
}

fn run_macro(
    settings: &Settings,
    period: Option<Period>,
    ticker: Option<&str>,
) -> Result<(), MarketlensError> {
    let request = HistoryRequest::period(period.unwrap_or(settings.period), settings.interval);
    let source = build_source(settings)?;
    let rt = runtime()?;

    let table = rt.block_on(fetch_macro(
        source.as_ref(),
        MACRO_INDICATORS,
        &request,
        settings.max_workers,
    ));

    println!("=== Macro Indicators ({}) ===", request.range);
    for indicator in MACRO_INDICATORS {
        match table.closes.get(indicator.name).and_then(|c| c.last_key_value()) {
            Some((date, close)) => println!(
                "  {:<14} {:<8} {:>12.2}  ({})",
                indicator.name, indicator.ticker, close, date
            ),
            None => println!("  {:<14} {:<8} {:>12}", indicator.name, indicator.ticker, "n/a"),
        }
    }
    print_errors(&table.errors);

    if let Some(ticker) = ticker {
        let ticker = normalize_ticker(ticker);
        let asset = rt.block_on(fetch_series(source.as_ref(), &ticker, &request));
        if asset.is_empty() {
            return Err(MarketlensError::NoData { ticker });
        }
        println!("\n=== Correlation with {} ===", ticker);
        let corr = correlations(&asset, &table);
        if corr.is_empty() {
            println!("  no overlapping data");
        }
        for (name, r) in corr {
            println!("  {:<14} {:>6.3}", name, r);
        }
    }
    Ok(())
}

fn run_categories(name: Option<&str>) -> Result<(), MarketlensError> {
    match name {
        None => {
            for category in catalogue::CATEGORIES {
                println!("{:<18} {} tickers", category.name, category.tickers.len());
            }
            eprintln!("{} tickers in total", catalogue::all_tickers().len());
        }
        Some(name) => match catalogue::tickers_by_category(name) {
            Some(tickers) => {
                for ticker in tickers {
                    println!("{}", ticker);
                }
            }
            None => {
                return Err(MarketlensError::UnknownCategory {
                    name: name.to_string(),
                    available: catalogue::category_names().join(", "),
                });
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_analyze_with_dates() {
        let cli = Cli::try_parse_from([
            "marketlens",
            "analyze",
            "aapl",
            "--start",
            "2024-01-01",
            "--end",
            "2024-06-30",
            "--interval",
            "1wk",
            "--export",
        ])
        .unwrap();
        match cli.command {
            Command::Analyze {
                ticker,
                start,
                interval,
                export,
                period,
                ..
            } => {
                assert_eq!(ticker, "aapl");
                assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 1));
                assert_eq!(interval, Some(Interval::W1));
                assert_eq!(period, None);
                assert!(export);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn start_without_end_is_rejected() {
        let result = Cli::try_parse_from(["marketlens", "analyze", "AAPL", "--start", "2024-01-01"]);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_period_is_rejected() {
        let result = Cli::try_parse_from(["marketlens", "portfolio", "A=1", "--period", "7w"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "marketlens",
            "macro",
            "--ticker",
            "SPY",
            "-v",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn fmt_opt_handles_missing_values() {
        assert_eq!(fmt_opt(Some(1.23456), 2, "%"), "1.23%");
        assert_eq!(fmt_opt(None, 2, "%"), "n/a");
    }

    #[test]
    fn categories_command_needs_no_config_and_rejects_unknown_names() {
        assert!(run_categories(None).is_ok());
        assert!(run_categories(Some("crypto")).is_ok());
        assert!(matches!(
            run_categories(Some("unknown")),
            Err(MarketlensError::UnknownCategory { .. })
        ));
    }
}

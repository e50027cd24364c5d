//! CSV files: offline history source and enriched-series export.
//!
//! Histories live in `<dir>/<TICKER>.csv` with provider-style headers.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::analyzer::EnrichedSeries;
use crate::domain::error::{MarketDataError, MarketlensError};
use crate::domain::normalizer::{CsvQuoteRow, RawQuote};
use crate::domain::request::{HistoryRange, HistoryRequest};
use crate::ports::market_data_port::MarketDataPort;

pub struct CsvMarketData {
    base_path: PathBuf,
}

impl CsvMarketData {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }

    async fn read_rows(&self, ticker: &str) -> Result<Vec<(NaiveDate, RawQuote)>, MarketDataError> {
        let path = self.csv_path(ticker);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| MarketDataError::Fetch {
                ticker: ticker.to_string(),
                reason: format!("failed to read {}: {}", path.display(), e),
            })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut rows = Vec::new();
        for result in rdr.deserialize::<CsvQuoteRow>() {
            let row = result.map_err(|e| MarketDataError::Parse {
                ticker: ticker.to_string(),
                reason: format!("CSV parse error: {}", e),
            })?;
            let Some(date) = row.parse_date() else {
                debug!(ticker, date = %row.date, "skipping row with unreadable date");
                continue;
            };
            if let Some(raw) = row.into_raw() {
                rows.push((date, raw));
            }
        }

        rows.sort_by_key(|(d, _)| *d);
        Ok(rows)
    }
}

#[async_trait]
impl MarketDataPort for CsvMarketData {
    async fn fetch_history(
        &self,
        ticker: &str,
        request: &HistoryRequest,
    ) -> Result<Vec<RawQuote>, MarketDataError> {
        let rows = self.read_rows(ticker).await?;

        let (start, end) = match request.range {
            HistoryRange::Dates { start, end } => (Some(start), Some(end)),
            HistoryRange::Period(period) => {
                let last = rows.last().map(|(d, _)| *d);
                (last.and_then(|d| period.start_from(d)), last)
            }
        };

        Ok(rows
            .into_iter()
            .filter(|(d, _)| start.is_none_or(|s| *d >= s) && end.is_none_or(|e| *d <= e))
            .map(|(_, raw)| raw)
            .collect())
    }

    async fn latest_quote(&self, ticker: &str) -> Result<Option<RawQuote>, MarketDataError> {
        let rows = self.read_rows(ticker).await?;
        Ok(rows.into_iter().last().map(|(_, raw)| raw))
    }
}

pub fn export_file_name(today: NaiveDate) -> String {
    format!("stock_data_{}.csv", today.format("%Y-%m-%d"))
}

/// Writes date, OHLCV and every computed column to
/// `<dir>/stock_data_<today>.csv`. Undefined values are empty cells.
pub fn export_enriched(
    enriched: &EnrichedSeries,
    dir: &Path,
    today: NaiveDate,
) -> Result<PathBuf, MarketlensError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(today));

    let export_err = |e: csv::Error| MarketlensError::Export {
        reason: format!("{}: {}", path.display(), e),
    };
    let mut wtr = csv::Writer::from_path(&path).map_err(export_err)?;

    let columns = enriched.indicators.columns();
    let mut header: Vec<String> = ["date", "open", "high", "low", "close", "volume"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(columns.iter().map(|c| c.name().to_string()));
    wtr.write_record(&header).map_err(export_err)?;

    for row in enriched.rows() {
        let bar = &row.bar;
        let mut record = vec![
            bar.date.format("%Y-%m-%d").to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ];
        record.extend(
            row.values
                .iter()
                .map(|(_, v)| v.map(|x| x.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&record).map_err(export_err)?;
    }
    wtr.flush()?;

    info!(path = %path.display(), rows = enriched.series.len(), "exported enriched series");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analyzer::TechnicalAnalyzer;
    use crate::domain::normalizer::normalize;
    use crate::domain::request::{Interval, Period};
    use tempfile::TempDir;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "Date,Open,High,Low,Close,Volume\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n\
            2024-03-01,120.0,125.0,118.0,121.0,40000\n";
        fs::write(path.join("BHP.csv"), csv_content).unwrap();
        fs::write(
            path.join("CBA.csv"),
            "date,open,high,low,close,volume\n2024-01-15,1,2,0.5,,10\n",
        )
        .unwrap();
        fs::write(path.join("EMPTY.csv"), "Date,Open,High,Low,Close,Volume\n").unwrap();

        (dir, path)
    }

    #[tokio::test]
    async fn fetch_by_dates_filters_and_sorts() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvMarketData::new(path);

        let request = HistoryRequest::dates(date(1, 15), date(1, 16), Interval::D1);
        let rows = adapter.fetch_history("BHP", &request).await.unwrap();
        let series = normalize("BHP", &rows);

        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[0].date, date(1, 15));
        assert_eq!(series.bars()[0].open, 100.0);
        assert_eq!(series.bars()[1].volume, 60000.0);
    }

    #[tokio::test]
    async fn fetch_by_period_is_relative_to_last_row() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvMarketData::new(path);

        let request = HistoryRequest::period(Period::OneMonth, Interval::D1);
        let rows = adapter.fetch_history("BHP", &request).await.unwrap();
        assert_eq!(rows.len(), 1);

        let request = HistoryRequest::period(Period::Max, Interval::D1);
        assert_eq!(adapter.fetch_history("BHP", &request).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn lowercase_headers_and_blank_fields() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvMarketData::new(path);

        let request = HistoryRequest::period(Period::Max, Interval::D1);
        let rows = adapter.fetch_history("CBA", &request).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].close, None);
        assert!(normalize("CBA", &rows).is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_a_fetch_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvMarketData::new(path);

        let request = HistoryRequest::period(Period::OneYear, Interval::D1);
        let result = adapter.fetch_history("XYZ", &request).await;
        assert!(matches!(result, Err(MarketDataError::Fetch { .. })));
    }

    #[tokio::test]
    async fn latest_quote_is_last_row() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvMarketData::new(path);

        let latest = adapter.latest_quote("BHP").await.unwrap().unwrap();
        assert_eq!(latest.close, Some(121.0));
        assert_eq!(adapter.latest_quote("EMPTY").await.unwrap(), None);
    }

    #[test]
    fn export_file_is_date_stamped() {
        assert_eq!(export_file_name(date(7, 4)), "stock_data_2024-07-04.csv");
    }

    #[test]
    fn export_writes_columns_in_order() {
        let raw: Vec<RawQuote> = [10.0, 11.0, 12.0, 11.5]
            .iter()
            .enumerate()
            .map(|(i, c)| RawQuote::from_date(date(2, 1 + i as u32), *c, *c, *c, *c, 100.0))
            .collect();
        let mut analyzer = TechnicalAnalyzer::new(normalize("TEST", &raw)).unwrap();
        analyzer.add_rsi(2).unwrap().add_daily_return().unwrap();
        let enriched = analyzer.finish();

        let dir = TempDir::new().unwrap();
        let path = export_enriched(&enriched, dir.path(), date(2, 10)).unwrap();
        assert!(path.ends_with("stock_data_2024-02-10.csv"));

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "date,open,high,low,close,volume,rsi,daily_return");
        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with("2024-02-01,10,10,10,10,100,,0"));
        assert!(lines[3].split(',').nth(6).is_some_and(|v| !v.is_empty()));
    }
}

//! Indicator engine over a single [`PriceSeries`].
//!
//! The analyzer owns its series and accumulates typed indicator columns next
//! to it; price fields are never touched. Every `add_*` call recomputes and
//! overwrites its own column. Dependencies are explicit: the signal needs both
//! moving averages and strategy returns need the signal and daily returns,
//! otherwise a [`AnalysisError::MissingColumns`] names what is absent.
//! Bollinger Bands compute the volatility they need when it is missing.

use chrono::NaiveDate;
use tracing::warn;

use crate::domain::error::{AnalysisError, Column};
use crate::domain::indicator::bollinger::{calculate_bollinger, BollingerSeries};
use crate::domain::indicator::moving_average::backfilled_sma;
use crate::domain::indicator::returns::{daily_returns, strategy_returns};
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::signal::{calculate_signal, Signal, DEFAULT_TOLERANCE};
use crate::domain::indicator::volatility::{calculate_volatility, VolatilitySeries};
use crate::domain::price_series::{PriceBar, PriceSeries};

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub ma_short: usize,
    pub ma_long: usize,
    pub rsi_window: usize,
    pub volatility_window: usize,
    pub annualize: bool,
    pub bollinger_window: usize,
    pub bollinger_std: f64,
    pub signal_tolerance: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ma_short: 50,
            ma_long: 200,
            rsi_window: 14,
            volatility_window: 30,
            annualize: true,
            bollinger_window: 30,
            bollinger_std: 2.0,
            signal_tolerance: DEFAULT_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverages {
    pub short_window: usize,
    pub long_window: usize,
    pub short: Vec<f64>,
    pub long: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RsiColumn {
    pub window: usize,
    pub values: Vec<Option<f64>>,
}

/// Indicator columns aligned row-for-row with the source series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndicatorSet {
    pub moving_averages: Option<MovingAverages>,
    pub rsi: Option<RsiColumn>,
    pub volatility: Option<VolatilitySeries>,
    pub bollinger: Option<BollingerSeries>,
    pub signal: Option<Vec<Signal>>,
    pub daily_return: Option<Vec<f64>>,
    pub strategy_return: Option<Vec<Option<f64>>>,
}

impl IndicatorSet {
    /// Present columns, in export order.
    pub fn columns(&self) -> Vec<Column> {
        let mut cols = Vec::new();
        if self.moving_averages.is_some() {
            cols.extend([Column::Ma50, Column::Ma200]);
        }
        if self.rsi.is_some() {
            cols.push(Column::Rsi);
        }
        if self.volatility.is_some() {
            cols.push(Column::Volatility);
        }
        if self.bollinger.is_some() {
            cols.extend([Column::MaMid, Column::UpperBand, Column::LowerBand]);
        }
        if self.signal.is_some() {
            cols.push(Column::Signal);
        }
        if self.daily_return.is_some() {
            cols.push(Column::DailyReturn);
        }
        if self.strategy_return.is_some() {
            cols.push(Column::StrategyReturn);
        }
        cols
    }

    /// Column values as optional numbers; `None` when the column is absent.
    pub fn column(&self, column: Column) -> Option<Vec<Option<f64>>> {
        fn defined(v: &[f64]) -> Vec<Option<f64>> {
            v.iter().copied().map(Some).collect()
        }

        match column {
            Column::Ma50 => self.moving_averages.as_ref().map(|m| defined(&m.short)),
            Column::Ma200 => self.moving_averages.as_ref().map(|m| defined(&m.long)),
            Column::Rsi => self.rsi.as_ref().map(|r| r.values.clone()),
            Column::Volatility => self.volatility.as_ref().map(|v| v.values.clone()),
            Column::MaMid => self.bollinger.as_ref().map(|b| b.middle.clone()),
            Column::UpperBand => self.bollinger.as_ref().map(|b| b.upper.clone()),
            Column::LowerBand => self.bollinger.as_ref().map(|b| b.lower.clone()),
            Column::Signal => self
                .signal
                .as_ref()
                .map(|s| s.iter().map(|v| Some(v.exposure())).collect()),
            Column::DailyReturn => self.daily_return.as_ref().map(|d| defined(d)),
            Column::StrategyReturn => self.strategy_return.clone(),
        }
    }
}

pub struct TechnicalAnalyzer {
    series: PriceSeries,
    indicators: IndicatorSet,
}

impl TechnicalAnalyzer {
    pub fn new(series: PriceSeries) -> Result<Self, AnalysisError> {
        if series.is_empty() {
            return Err(AnalysisError::EmptySeries);
        }
        Ok(Self {
            series,
            indicators: IndicatorSet::default(),
        })
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn indicators(&self) -> &IndicatorSet {
        &self.indicators
    }

    pub fn add_moving_averages(
        &mut self,
        short_window: usize,
        long_window: usize,
    ) -> Result<&mut Self, AnalysisError> {
        let closes = self.series.closes();
        let short = self.sma_column(&closes, short_window, Column::Ma50)?;
        let long = self.sma_column(&closes, long_window, Column::Ma200)?;
        self.indicators.moving_averages = Some(MovingAverages {
            short_window,
            long_window,
            short,
            long,
        });
        Ok(self)
    }

    fn sma_column(
        &self,
        closes: &[f64],
        window: usize,
        column: Column,
    ) -> Result<Vec<f64>, AnalysisError> {
        if window == 0 {
            return Err(AnalysisError::InvalidWindow { column, window });
        }
        backfilled_sma(closes, window).ok_or(AnalysisError::InsufficientHistory {
            column,
            rows: closes.len(),
            window,
        })
    }

    pub fn add_rsi(&mut self, window: usize) -> Result<&mut Self, AnalysisError> {
        if window == 0 {
            return Err(AnalysisError::InvalidWindow {
                column: Column::Rsi,
                window,
            });
        }
        let values = calculate_rsi(&self.series.closes(), window);
        self.indicators.rsi = Some(RsiColumn { window, values });
        Ok(self)
    }

    pub fn add_volatility(
        &mut self,
        window: usize,
        annualized: bool,
    ) -> Result<&mut Self, AnalysisError> {
        if window < 2 {
            return Err(AnalysisError::InvalidWindow {
                column: Column::Volatility,
                window,
            });
        }
        self.indicators.volatility = Some(calculate_volatility(
            &self.series.closes(),
            window,
            annualized,
        ));
        Ok(self)
    }

    /// Uses the volatility column when it was computed with `window`;
    /// otherwise computes one (stored only if no volatility column exists yet).
    pub fn add_bollinger(
        &mut self,
        window: usize,
        num_std: f64,
    ) -> Result<&mut Self, AnalysisError> {
        if window < 2 {
            return Err(AnalysisError::InvalidWindow {
                column: Column::MaMid,
                window,
            });
        }
        let closes = self.series.closes();

        let existing = self
            .indicators
            .volatility
            .as_ref()
            .map(|v| (v.window, v.annualized));

        let volatility = match existing {
            Some((w, _)) if w == window => self
                .indicators
                .volatility
                .as_ref()
                .map(|v| v.values.clone())
                .unwrap_or_default(),
            Some((_, annualized)) => calculate_volatility(&closes, window, annualized).values,
            None => {
                self.add_volatility(window, true)?;
                self.indicators
                    .volatility
                    .as_ref()
                    .map(|v| v.values.clone())
                    .unwrap_or_default()
            }
        };

        self.indicators.bollinger = Some(calculate_bollinger(&closes, window, num_std, &volatility));
        Ok(self)
    }

    pub fn add_signal(&mut self, tolerance: f64) -> Result<&mut Self, AnalysisError> {
        let ma = self
            .indicators
            .moving_averages
            .as_ref()
            .ok_or(AnalysisError::MissingColumns {
                operation: "signal",
                missing: vec![Column::Ma50, Column::Ma200],
            })?;
        self.indicators.signal = Some(calculate_signal(&ma.short, &ma.long, tolerance));
        Ok(self)
    }

    pub fn add_daily_return(&mut self) -> Result<&mut Self, AnalysisError> {
        self.indicators.daily_return = Some(daily_returns(&self.series.closes()));
        Ok(self)
    }

    pub fn add_strategy_return(&mut self) -> Result<&mut Self, AnalysisError> {
        let mut missing = Vec::new();
        if self.indicators.signal.is_none() {
            missing.push(Column::Signal);
        }
        if self.indicators.daily_return.is_none() {
            missing.push(Column::DailyReturn);
        }

        let (Some(signal), Some(daily)) = (&self.indicators.signal, &self.indicators.daily_return)
        else {
            return Err(AnalysisError::MissingColumns {
                operation: "strategy_return",
                missing,
            });
        };
        let values = strategy_returns(signal, daily);
        self.indicators.strategy_return = Some(values);
        Ok(self)
    }

    /// Every indicator, in dependency order. A series shorter than a moving
    /// average window skips the averages and everything built on them; the
    /// independent indicators are still computed.
    pub fn add_all(&mut self, params: &IndicatorParams) -> Result<&mut Self, AnalysisError> {
        let trend = match self.add_moving_averages(params.ma_short, params.ma_long) {
            Ok(_) => true,
            Err(AnalysisError::InsufficientHistory {
                column,
                rows,
                window,
            }) => {
                warn!(
                    ticker = self.series.ticker(),
                    %column,
                    rows,
                    window,
                    "history too short for moving averages, skipping signal"
                );
                false
            }
            Err(e) => return Err(e),
        };

        self.add_rsi(params.rsi_window)?
            .add_volatility(params.volatility_window, params.annualize)?
            .add_bollinger(params.bollinger_window, params.bollinger_std)?
            .add_daily_return()?;

        if trend {
            self.add_signal(params.signal_tolerance)?.add_strategy_return()?;
        }
        Ok(self)
    }

    pub fn finish(self) -> EnrichedSeries {
        EnrichedSeries {
            series: self.series,
            indicators: self.indicators,
        }
    }
}

/// A price series together with its indicator columns.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedSeries {
    pub series: PriceSeries,
    pub indicators: IndicatorSet,
}

/// One date's prices and indicator values, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRow {
    pub bar: PriceBar,
    pub values: Vec<(Column, Option<f64>)>,
}

impl EnrichedRow {
    pub fn date(&self) -> NaiveDate {
        self.bar.date
    }

    pub fn get(&self, column: Column) -> Option<f64> {
        self.values
            .iter()
            .find(|(c, _)| *c == column)
            .and_then(|(_, v)| *v)
    }
}

impl EnrichedSeries {
    pub fn rows(&self) -> Vec<EnrichedRow> {
        let columns: Vec<(Column, Vec<Option<f64>>)> = self
            .indicators
            .columns()
            .into_iter()
            .filter_map(|c| self.indicators.column(c).map(|v| (c, v)))
            .collect();

        self.series
            .bars()
            .iter()
            .enumerate()
            .map(|(i, bar)| EnrichedRow {
                bar: bar.clone(),
                values: columns
                    .iter()
                    .map(|(c, v)| (*c, v.get(i).copied().flatten()))
                    .collect(),
            })
            .collect()
    }

    pub fn latest(&self, column: Column) -> Option<f64> {
        self.indicators
            .column(column)
            .and_then(|v| v.last().copied().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::normalizer::{normalize, RawQuote};
    use approx::assert_relative_eq;

    fn series_from_closes(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let raw: Vec<RawQuote> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                RawQuote::from_date(start + chrono::Duration::days(i as i64), c, c, c, c, 1_000.0)
            })
            .collect();
        normalize("TEST", &raw)
    }

    fn wave(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + (i as f64 * 0.1).sin() * 10.0 + i as f64 * 0.05).collect()
    }

    #[test]
    fn empty_series_rejected() {
        let err = TechnicalAnalyzer::new(PriceSeries::empty("X")).err();
        assert_eq!(err, Some(AnalysisError::EmptySeries));
    }

    #[test]
    fn signal_requires_moving_averages() {
        let mut analyzer = TechnicalAnalyzer::new(series_from_closes(&wave(10))).unwrap();
        let err = analyzer.add_signal(0.001).err().unwrap();
        assert_eq!(
            err,
            AnalysisError::MissingColumns {
                operation: "signal",
                missing: vec![Column::Ma50, Column::Ma200],
            }
        );
    }

    #[test]
    fn strategy_return_names_each_missing_column() {
        let mut analyzer = TechnicalAnalyzer::new(series_from_closes(&wave(10))).unwrap();
        analyzer.add_daily_return().unwrap();
        let err = analyzer.add_strategy_return().err().unwrap();
        assert_eq!(
            err,
            AnalysisError::MissingColumns {
                operation: "strategy_return",
                missing: vec![Column::Signal],
            }
        );
    }

    #[test]
    fn short_series_cannot_fill_long_average() {
        let mut analyzer = TechnicalAnalyzer::new(series_from_closes(&wave(120))).unwrap();
        let err = analyzer.add_moving_averages(50, 200).err().unwrap();
        assert_eq!(
            err,
            AnalysisError::InsufficientHistory {
                column: Column::Ma200,
                rows: 120,
                window: 200,
            }
        );
    }

    #[test]
    fn add_all_on_short_history_skips_trend_columns() {
        let mut analyzer = TechnicalAnalyzer::new(series_from_closes(&wave(126))).unwrap();
        analyzer.add_all(&IndicatorParams::default()).unwrap();
        let ind = analyzer.indicators();

        assert!(ind.moving_averages.is_none());
        assert!(ind.signal.is_none());
        assert!(ind.strategy_return.is_none());
        assert_eq!(
            ind.columns(),
            vec![
                Column::Rsi,
                Column::Volatility,
                Column::MaMid,
                Column::UpperBand,
                Column::LowerBand,
                Column::DailyReturn,
            ]
        );
        assert!(analyzer.finish().latest(Column::Rsi).is_some());
    }

    #[test]
    fn add_all_still_rejects_invalid_windows() {
        let mut analyzer = TechnicalAnalyzer::new(series_from_closes(&wave(126))).unwrap();
        let params = IndicatorParams {
            ma_short: 0,
            ..IndicatorParams::default()
        };
        assert!(matches!(
            analyzer.add_all(&params),
            Err(AnalysisError::InvalidWindow { column: Column::Ma50, .. })
        ));
    }

    #[test]
    fn full_pipeline_columns_are_aligned() {
        let closes = wave(260);
        let mut analyzer = TechnicalAnalyzer::new(series_from_closes(&closes)).unwrap();
        analyzer.add_all(&IndicatorParams::default()).unwrap();
        let enriched = analyzer.finish();

        for column in enriched.indicators.columns() {
            assert_eq!(enriched.indicators.column(column).unwrap().len(), closes.len());
        }

        let ma = enriched.indicators.moving_averages.as_ref().unwrap();
        assert!(ma.short.iter().chain(&ma.long).all(|v| v.is_finite()));
        let expected = closes[260 - 200..].iter().sum::<f64>() / 200.0;
        assert_relative_eq!(ma.long[259], expected, epsilon = 1e-9);

        let rows = enriched.rows();
        assert_eq!(rows.len(), 260);
        assert_eq!(rows[0].get(Column::DailyReturn), Some(0.0));
        assert_eq!(rows[0].get(Column::StrategyReturn), None);
        assert!(rows[259].get(Column::UpperBand).is_some());
    }

    #[test]
    fn recomputation_overwrites_column() {
        let mut analyzer = TechnicalAnalyzer::new(series_from_closes(&wave(40))).unwrap();
        analyzer.add_rsi(14).unwrap();
        analyzer.add_rsi(5).unwrap();
        let rsi = analyzer.indicators().rsi.as_ref().unwrap();
        assert_eq!(rsi.window, 5);
        assert!(rsi.values[5].is_some());
        assert_eq!(analyzer.series().len(), 40);
    }

    #[test]
    fn bollinger_computes_missing_volatility() {
        let mut analyzer = TechnicalAnalyzer::new(series_from_closes(&wave(60))).unwrap();
        analyzer.add_bollinger(30, 2.0).unwrap();
        let vol = analyzer.indicators().volatility.as_ref().unwrap();
        assert_eq!(vol.window, 30);

        let bands = analyzer.indicators().bollinger.as_ref().unwrap();
        let (mid, upper, v) = (bands.middle[45].unwrap(), bands.upper[45].unwrap(), vol.values[45].unwrap());
        assert_relative_eq!(upper, mid + 2.0 * v, epsilon = 1e-12);
    }

    #[test]
    fn bollinger_keeps_volatility_with_other_window() {
        let mut analyzer = TechnicalAnalyzer::new(series_from_closes(&wave(60))).unwrap();
        analyzer.add_volatility(10, true).unwrap();
        analyzer.add_bollinger(30, 2.0).unwrap();
        assert_eq!(analyzer.indicators().volatility.as_ref().unwrap().window, 10);
        assert!(analyzer.indicators().bollinger.as_ref().unwrap().upper[29].is_none());
    }

    #[test]
    fn flat_prices_are_well_defined() {
        let mut analyzer = TechnicalAnalyzer::new(series_from_closes(&[25.0; 220])).unwrap();
        analyzer.add_all(&IndicatorParams::default()).unwrap();
        let ind = analyzer.indicators();

        assert!(ind.daily_return.as_ref().unwrap().iter().all(|r| *r == 0.0));
        assert!(ind.rsi.as_ref().unwrap().values.iter().flatten().all(|v| v.is_finite()));
        assert!(ind.volatility.as_ref().unwrap().values.iter().flatten().all(|v| *v == 0.0));
        assert!(ind.signal.as_ref().unwrap().iter().all(|s| *s == Signal::Flat));
    }

    #[test]
    fn invalid_windows_rejected() {
        let mut analyzer = TechnicalAnalyzer::new(series_from_closes(&wave(10))).unwrap();
        assert!(matches!(
            analyzer.add_rsi(0),
            Err(AnalysisError::InvalidWindow { column: Column::Rsi, .. })
        ));
        assert!(matches!(
            analyzer.add_volatility(1, true),
            Err(AnalysisError::InvalidWindow { column: Column::Volatility, .. })
        ));
    }

    #[test]
    fn latest_reads_last_row() {
        let mut analyzer = TechnicalAnalyzer::new(series_from_closes(&[10.0, 11.0])).unwrap();
        analyzer.add_daily_return().unwrap();
        let enriched = analyzer.finish();
        assert_relative_eq!(enriched.latest(Column::DailyReturn).unwrap(), 0.1, epsilon = 1e-12);
        assert_eq!(enriched.latest(Column::Rsi), None);
    }
}

//! Weighted positions making up a virtual portfolio.

use std::collections::HashSet;

use crate::domain::error::PortfolioError;

/// Sums within this distance of 1 count as normalized.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub ticker: String,
    pub weight: f64,
}

impl Position {
    pub fn new(ticker: &str, weight: f64) -> Result<Self, PortfolioError> {
        if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
            return Err(PortfolioError::InvalidWeight {
                ticker: ticker.to_string(),
                weight,
            });
        }
        Ok(Self {
            ticker: ticker.trim().to_uppercase(),
            weight,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    positions: Vec<Position>,
}

impl Portfolio {
    pub fn new(positions: Vec<Position>) -> Result<Self, PortfolioError> {
        if positions.is_empty() {
            return Err(PortfolioError::Empty);
        }
        let mut seen = HashSet::new();
        for p in &positions {
            if !seen.insert(p.ticker.clone()) {
                return Err(PortfolioError::DuplicateTicker(p.ticker.clone()));
            }
        }
        Ok(Self { positions })
    }

    /// Parses `AAPL=0.6,MSFT=0.4`. Weights may also be given as percentages
    /// (`AAPL=60,MSFT=40`), in which case every weight is divided by 100.
    pub fn parse(input: &str) -> Result<Self, PortfolioError> {
        let mut pairs = Vec::new();
        for token in input.split(',') {
            let token = token.trim();
            let (ticker, weight) = token.split_once('=').ok_or_else(|| PortfolioError::InvalidPosition {
                token: token.to_string(),
                reason: "expected TICKER=WEIGHT".to_string(),
            })?;
            let ticker = ticker.trim();
            if ticker.is_empty() {
                return Err(PortfolioError::InvalidPosition {
                    token: token.to_string(),
                    reason: "empty ticker".to_string(),
                });
            }
            let weight: f64 = weight.trim().parse().map_err(|_| PortfolioError::InvalidPosition {
                token: token.to_string(),
                reason: "weight is not a number".to_string(),
            })?;
            pairs.push((ticker.to_string(), weight));
        }

        let percent = pairs.iter().any(|(_, w)| *w > 1.0);
        let positions = pairs
            .into_iter()
            .map(|(t, w)| Position::new(&t, if percent { w / 100.0 } else { w }))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(positions)
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn tickers(&self) -> Vec<String> {
        self.positions.iter().map(|p| p.ticker.clone()).collect()
    }

    pub fn weight_of(&self, ticker: &str) -> Option<f64> {
        self.positions
            .iter()
            .find(|p| p.ticker == ticker)
            .map(|p| p.weight)
    }

    pub fn total_weight(&self) -> f64 {
        self.positions.iter().map(|p| p.weight).sum()
    }

    pub fn is_normalized(&self) -> bool {
        (self.total_weight() - 1.0).abs() <= WEIGHT_TOLERANCE
    }

    /// Proportionally rescaled copy whose weights sum to 1.
    pub fn normalized(&self) -> Result<Self, PortfolioError> {
        let total = self.total_weight();
        if total <= 0.0 {
            return Err(PortfolioError::WeightsNotNormalized { sum: total });
        }
        let positions = self
            .positions
            .iter()
            .map(|p| Position {
                ticker: p.ticker.clone(),
                weight: p.weight / total,
            })
            .collect();
        Ok(Self { positions })
    }

    pub fn ensure_normalized(&self) -> Result<(), PortfolioError> {
        if self.is_normalized() {
            Ok(())
        } else {
            Err(PortfolioError::WeightsNotNormalized {
                sum: self.total_weight(),
            })
        }
    }
}

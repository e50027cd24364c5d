//! History request parameters: relative period, explicit dates, bar interval.

use chrono::{Datelike, Duration, NaiveDate};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    OneDay,
    FiveDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
    TenYears,
    YearToDate,
    Max,
}

impl Period {
    pub fn token(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
            Period::YearToDate => "ytd",
            Period::Max => "max",
        }
    }

    /// First calendar date covered when the period ends on `end`.
    /// `None` means unbounded.
    pub fn start_from(&self, end: NaiveDate) -> Option<NaiveDate> {
        let days = match self {
            Period::OneDay => 1,
            Period::FiveDays => 5,
            Period::OneMonth => 30,
            Period::ThreeMonths => 91,
            Period::SixMonths => 182,
            Period::OneYear => 365,
            Period::TwoYears => 730,
            Period::FiveYears => 1826,
            Period::TenYears => 3652,
            Period::YearToDate => return NaiveDate::from_ymd_opt(end.year(), 1, 1),
            Period::Max => return None,
        };
        end.checked_sub_signed(Duration::days(days - 1))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1d" => Ok(Period::OneDay),
            "5d" => Ok(Period::FiveDays),
            "1mo" => Ok(Period::OneMonth),
            "3mo" => Ok(Period::ThreeMonths),
            "6mo" => Ok(Period::SixMonths),
            "1y" => Ok(Period::OneYear),
            "2y" => Ok(Period::TwoYears),
            "5y" => Ok(Period::FiveYears),
            "10y" => Ok(Period::TenYears),
            "ytd" => Ok(Period::YearToDate),
            "max" => Ok(Period::Max),
            other => Err(format!("unknown period '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    M1,
    M2,
    M5,
    M15,
    M30,
    M60,
    M90,
    H1,
    D1,
    D5,
    W1,
    Mo1,
    Mo3,
}

impl Interval {
    pub fn token(&self) -> &'static str {
        match self {
            Interval::M1 => "1m",
            Interval::M2 => "2m",
            Interval::M5 => "5m",
            Interval::M15 => "15m",
            Interval::M30 => "30m",
            Interval::M60 => "60m",
            Interval::M90 => "90m",
            Interval::H1 => "1h",
            Interval::D1 => "1d",
            Interval::D5 => "5d",
            Interval::W1 => "1wk",
            Interval::Mo1 => "1mo",
            Interval::Mo3 => "3mo",
        }
    }

    pub fn is_intraday(&self) -> bool {
        matches!(
            self,
            Interval::M1
                | Interval::M2
                | Interval::M5
                | Interval::M15
                | Interval::M30
                | Interval::M60
                | Interval::M90
                | Interval::H1
        )
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1m" => Ok(Interval::M1),
            "2m" => Ok(Interval::M2),
            "5m" => Ok(Interval::M5),
            "15m" => Ok(Interval::M15),
            "30m" => Ok(Interval::M30),
            "60m" => Ok(Interval::M60),
            "90m" => Ok(Interval::M90),
            "1h" => Ok(Interval::H1),
            "1d" => Ok(Interval::D1),
            "5d" => Ok(Interval::D5),
            "1wk" => Ok(Interval::W1),
            "1mo" => Ok(Interval::Mo1),
            "3mo" => Ok(Interval::Mo3),
            other => Err(format!("unknown interval '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryRange {
    Period(Period),
    Dates { start: NaiveDate, end: NaiveDate },
}

impl fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryRange::Period(p) => write!(f, "{}", p),
            HistoryRange::Dates { start, end } => write!(f, "{}..{}", start, end),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistoryRequest {
    pub range: HistoryRange,
    pub interval: Interval,
}

impl HistoryRequest {
    pub fn period(period: Period, interval: Interval) -> Self {
        Self {
            range: HistoryRange::Period(period),
            interval,
        }
    }

    pub fn dates(start: NaiveDate, end: NaiveDate, interval: Interval) -> Self {
        Self {
            range: HistoryRange::Dates { start, end },
            interval,
        }
    }

    /// A period, when given, wins over explicit dates.
    pub fn resolve(
        period: Option<Period>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        default_period: Period,
        interval: Interval,
    ) -> Self {
        match (period, start, end) {
            (Some(p), _, _) => Self::period(p, interval),
            (None, Some(s), Some(e)) => Self::dates(s, e, interval),
            _ => Self::period(default_period, interval),
        }
    }

    pub fn cache_key(&self, ticker: &str) -> String {
        format!("history:{}:{}:{}", ticker, self.range, self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn period_tokens_round_trip() {
        for token in ["1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max"] {
            let p: Period = token.parse().unwrap();
            assert_eq!(p.to_string(), token);
        }
    }

    #[test]
    fn unknown_period_rejected() {
        assert!("3w".parse::<Period>().is_err());
    }

    #[test]
    fn interval_parse_is_case_insensitive() {
        assert_eq!("1WK".parse::<Interval>().unwrap(), Interval::W1);
        assert!(Interval::M15.is_intraday());
        assert!(!Interval::D1.is_intraday());
    }

    #[test]
    fn period_start_dates() {
        let end = date(2024, 6, 30);
        assert_eq!(Period::YearToDate.start_from(end), Some(date(2024, 1, 1)));
        assert_eq!(Period::FiveDays.start_from(end), Some(date(2024, 6, 26)));
        assert_eq!(Period::Max.start_from(end), None);
    }

    #[test]
    fn period_overrides_dates() {
        let req = HistoryRequest::resolve(
            Some(Period::SixMonths),
            Some(date(2020, 1, 1)),
            Some(date(2020, 12, 31)),
            Period::OneYear,
            Interval::D1,
        );
        assert_eq!(req.range, HistoryRange::Period(Period::SixMonths));
    }

    #[test]
    fn dates_used_when_both_given() {
        let req = HistoryRequest::resolve(
            None,
            Some(date(2020, 1, 1)),
            Some(date(2020, 12, 31)),
            Period::OneYear,
            Interval::D1,
        );
        assert_eq!(
            req.cache_key("AAPL"),
            "history:AAPL:2020-01-01..2020-12-31:1d"
        );
    }

    #[test]
    fn falls_back_to_default_period() {
        let req = HistoryRequest::resolve(None, Some(date(2020, 1, 1)), None, Period::OneYear, Interval::D1);
        assert_eq!(req.cache_key("TSLA"), "history:TSLA:1y:1d");
    }
}

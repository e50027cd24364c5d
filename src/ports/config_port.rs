//! Configuration access port.
//!
//! Lookups never fail: an absent or unreadable value yields the caller's
//! default. Typed tokens go through [`get_parsed`], which does report a value
//! that is present but malformed.

use std::str::FromStr;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;
}

/// Parses `[section] key` with `FromStr`, or returns `default` when the key is absent.
pub fn get_parsed<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, T::Err> {
    match config.get_string(section, key) {
        Some(value) => value.trim().parse(),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use crate::domain::request::{Interval, Period};

    #[test]
    fn parsed_value_or_default() {
        let config = FileConfigAdapter::from_string("[data]\nperiod = 6MO\n").unwrap();
        assert_eq!(
            get_parsed(&config, "data", "period", Period::OneYear),
            Ok(Period::SixMonths)
        );
        assert_eq!(
            get_parsed(&config, "data", "interval", Interval::D1),
            Ok(Interval::D1)
        );
    }

    #[test]
    fn malformed_value_is_an_error() {
        let config = FileConfigAdapter::from_string("[data]\ninterval = hourly\n").unwrap();
        assert!(get_parsed(&config, "data", "interval", Interval::D1).is_err());
    }
}

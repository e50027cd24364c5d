//! Moving-average crossover trend state.

use std::fmt;

pub const DEFAULT_TOLERANCE: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Short,
    Flat,
    Long,
}

impl Signal {
    pub fn value(&self) -> i8 {
        match self {
            Signal::Short => -1,
            Signal::Flat => 0,
            Signal::Long => 1,
        }
    }

    pub fn exposure(&self) -> f64 {
        f64::from(self.value())
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Flat while |short - long| <= tolerance, otherwise the sign of the gap.
pub fn calculate_signal(short: &[f64], long: &[f64], tolerance: f64) -> Vec<Signal> {
    short
        .iter()
        .zip(long)
        .map(|(s, l)| {
            let diff = s - l;
            if diff.abs() <= tolerance {
                Signal::Flat
            } else if diff > 0.0 {
                Signal::Long
            } else {
                Signal::Short
            }
        })
        .collect()
}

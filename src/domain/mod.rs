//! Core domain types and logic.

pub mod price_series;
pub mod normalizer;
pub mod request;
pub mod indicator;
pub mod analyzer;
pub mod snapshot;
pub mod portfolio;
pub mod metrics;
pub mod aggregator;
pub mod catalogue;
pub mod macro_data;
pub mod settings;
pub mod error;

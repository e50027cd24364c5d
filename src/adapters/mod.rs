//! Concrete adapter implementations for ports.

pub mod cached_adapter;
pub mod csv_adapter;
pub mod file_config_adapter;
#[cfg(feature = "yahoo")]
pub mod yahoo_adapter;

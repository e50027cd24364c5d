//! Port traits at the edges of the domain.

pub mod config_port;
pub mod market_data_port;

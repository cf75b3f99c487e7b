//! Moodcart Common - shared types, configuration and storage for the
//! moodcart workspace.
//!
//! The daemon (`moodcartd`) and the CLI (`moodcartctl`) both speak the
//! types defined here; the SQLite-backed `MarketDb` is the single place
//! where patterns, feedback, attempts and the local catalog live.

pub mod config;
pub mod currency;
pub mod db;
pub mod types;

pub use config::MarketConfig;
pub use currency::CurrencyPolicy;
pub use db::{DbLocation, MarketDb};
pub use types::*;

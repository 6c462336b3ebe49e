//! Market Health core: sector health scoring.
//!
//! This crate turns daily price history into a fixed 6×6 grid of bounded
//! checks per sector ETF, and maps the aggregate into rating bands:
//! - Resilient acquisition (multi-strategy fetch, TTL cache, stale fallback)
//! - Field resolution over irregular upstream frames
//! - Six category scorers with explicit insufficient-data defaults
//! - Fixed/quantile/hybrid rating bounds with hysteresis
//! - Lenient JSON payload decoding

pub mod assembly;
pub mod config;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod payload;
pub mod rating;
pub mod scoring;

pub use assembly::compute_scores;
pub use config::{AppConfig, ConfigError, RatingConfig, ScoreConfig};
pub use domain::{Category, CategoryKey, Check, SectorRow};
pub use payload::{DecodedRows, PayloadError};
pub use rating::{Band, BandState, Rating, RatingBounds, RatingScheme};

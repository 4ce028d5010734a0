#![forbid(unsafe_code)]

//! Fasting status and history inference for the Fastwatch tracker.
//!
//! This crate provides:
//! - Domain types (consumption events, phases, refeed protocols, samples)
//! - Default, versioned threshold tables and TOML configuration
//! - Event feed reading
//! - Elapsed-time tracking, phase classification and refeed selection
//! - Historical fast duration inference and CSV export

pub mod types;
pub mod error;
pub mod defaults;
pub mod config;
pub mod logging;
pub mod feed;
pub mod elapsed;
pub mod phase;
pub mod refeed;
pub mod history;
pub mod export;
pub mod engine;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use defaults::{get_default_phase_table, get_default_refeed_table};
pub use config::Config;
pub use feed::{read_feed, EventFeed, FileFeed};
pub use history::{GapPolicy, HistoryRange, HistorySummary};
pub use engine::FastingEngine;

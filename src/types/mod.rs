//! Shared data structures for the CUSUM operations console.
//!
//! - config: stored item configuration, global defaults, and the merge
//!   engine producing effective edit-time parameter sets
//! - records: read-only backend payloads (history rows, option sets,
//!   response envelopes)

mod config;
mod records;

pub use config::*;
pub use records::*;

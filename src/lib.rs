//! CUSUM Console: Operations panel core for the defect warning service
//!
//! Client-side control panel for a CUSUM-based statistical process-control
//! alerting service: browse detection history, inspect alert context, and
//! manage per-item monitoring configuration.
//!
//! ## Architecture
//!
//! - **Identity Resolver**: canonical (product, line, station, item) from
//!   metadata or composite keys
//! - **Config Merge Engine**: item overrides layered on global defaults
//! - **Threshold Calculator**: CUSUM decision threshold from statistical
//!   targets
//! - **Filter/Search Index**: pure predicate filtering over the config set
//! - **Batch Provisioning**: validated bulk item registration
//! - **History Adapter**: alert records shaped into chart-ready series
//! - **Panel State**: explicit application state with staleness guards
//! - **API Client**: typed async client for the backend contract

pub mod client;
pub mod config;
pub mod filter;
pub mod history;
pub mod identity;
pub mod panel;
pub mod provisioning;
pub mod threshold;
pub mod types;

// Re-export console configuration
pub use config::ConsoleConfig;

// Re-export commonly used types
pub use types::{
    AlertRecord, ConfigSnapshot, ConfigTable, EffectiveConfig, GlobalDefaults, ItemConfig,
    ItemMetadata, MonitoringSide, OptionSets,
};

// Re-export the resolution pipeline
pub use filter::{filter_entries, ConfigFilter, FilteredEntry};
pub use identity::{composite_key, resolve_identity, IdentitySource, ResolvedIdentity};
pub use threshold::{decision_threshold, display_threshold, reference_k};

// Re-export provisioning
pub use provisioning::{build_import_request, BatchContext, BatchOverrides, ProvisioningError};

// Re-export history shaping
pub use history::{recent_alerts, ChartSeries, DetailWindow, HistoryQuery};

// Re-export the backend client and panel state
pub use client::{ApiClient, ApiError};
pub use panel::{ActiveModal, PanelState, PanelTab, RequestToken};

//! Explicit application state for the console.
//!
//! Every piece of UI-facing state — active tab, open modal, filter
//! predicates, the selection set, staged drafts — lives in [`PanelState`]
//! with named fields and pure transition methods, instead of being mutated
//! ambiently by unrelated features.
//!
//! Two policies worth calling out:
//! - Selection is filter-scoped: a key that falls outside the filtered view
//!   (filter narrowed, or entry gone after a refresh) is pruned, so a batch
//!   delete can never target an invisible item.
//! - Each logical query stream (options refresh, history search) carries a
//!   generation token; a response is applied only while its token is still
//!   the latest, so a stale response cannot overwrite a newer one.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::filter::{filter_entries, filtered_keys, ConfigFilter, FilteredEntry};
use crate::history::HistoryQuery;
use crate::provisioning::{
    build_import_request, BatchContext, BatchImportRequest, BatchOverrides, ProvisioningError,
};
use crate::types::{ConfigSnapshot, EffectiveConfig};

// ============================================================================
// Navigation
// ============================================================================

/// Top-level view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PanelTab {
    #[default]
    Dashboard,
    Configuration,
}

/// Modal currently open, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActiveModal {
    #[default]
    None,
    RecordDetail,
    ItemEdit,
    BatchImport,
}

// ============================================================================
// Request Generations
// ============================================================================

/// Token identifying one issued request on a query stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestToken(u64);

/// Staleness guard for one logical query stream.
///
/// In-flight requests are never cancelled; overlapping identical requests
/// are allowed. Only the response carrying the latest token is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestGeneration {
    issued: u64,
}

impl RequestGeneration {
    /// Mark a new request issued and return its token.
    pub fn begin(&mut self) -> RequestToken {
        self.issued += 1;
        RequestToken(self.issued)
    }

    /// Whether a response carrying `token` may be applied.
    pub fn accepts(&self, token: RequestToken) -> bool {
        token.0 == self.issued
    }
}

// ============================================================================
// Drafts
// ============================================================================

/// Staged batch-import input. Kept intact on failure so the operator can
/// correct and retry; cleared only on confirmed success.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportDraft {
    pub text: String,
    pub context: BatchContext,
    /// Explicit toggle; overrides are attached only when set.
    pub attach_overrides: bool,
    pub overrides: BatchOverrides,
}

/// One entry opened for editing, with its merged parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditDraft {
    pub key: String,
    pub config: EffectiveConfig,
}

// ============================================================================
// Panel State
// ============================================================================

/// The console's complete mutable state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelState {
    pub tab: PanelTab,
    pub modal: ActiveModal,

    /// Dashboard search predicates.
    pub history_filters: HistoryQuery,

    /// Configuration list predicates.
    pub config_filter: ConfigFilter,

    /// Selected entry keys, always a subset of the filtered view.
    selection: BTreeSet<String>,

    pub import_draft: ImportDraft,
    pub edit_draft: Option<EditDraft>,

    /// Last fetched configuration snapshot. Not a cache: every view
    /// transition re-fetches and replaces it wholesale.
    pub snapshot: ConfigSnapshot,

    pub options_requests: RequestGeneration,
    pub history_requests: RequestGeneration,
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Snapshot & filtering
    // ------------------------------------------------------------------

    /// Replace the configuration snapshot and drop selected keys that no
    /// longer pass the filter or no longer exist.
    pub fn apply_snapshot(&mut self, snapshot: ConfigSnapshot) {
        self.snapshot = snapshot;
        self.prune_selection();
    }

    /// Change the configuration filter; the filtered view is recomputed and
    /// the selection pruned to it.
    pub fn set_config_filter(&mut self, filter: ConfigFilter) {
        self.config_filter = filter;
        self.prune_selection();
    }

    /// The filtered view, in snapshot source order.
    pub fn filtered(&self) -> Vec<FilteredEntry<'_>> {
        filter_entries(&self.snapshot.item_configs, &self.config_filter)
    }

    fn prune_selection(&mut self) {
        let visible: BTreeSet<String> = filtered_keys(&self.snapshot.item_configs, &self.config_filter)
            .into_iter()
            .collect();
        self.selection.retain(|key| visible.contains(key));
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn is_selected(&self, key: &str) -> bool {
        self.selection.contains(key)
    }

    /// Toggle one visible entry. Keys outside the filtered view are ignored.
    pub fn toggle_selected(&mut self, key: &str) {
        if !self.selection.remove(key) {
            let visible = filtered_keys(&self.snapshot.item_configs, &self.config_filter);
            if visible.iter().any(|k| k == key) {
                self.selection.insert(key.to_string());
            }
        }
    }

    /// Whether the filtered view is non-empty and fully selected.
    pub fn is_all_selected(&self) -> bool {
        let visible = filtered_keys(&self.snapshot.item_configs, &self.config_filter);
        !visible.is_empty() && visible.len() == self.selection.len()
    }

    /// Select exactly the keys currently passing the filter, or clear when
    /// everything is already selected.
    pub fn toggle_select_all(&mut self) {
        if self.is_all_selected() {
            self.selection.clear();
        } else {
            self.selection = filtered_keys(&self.snapshot.item_configs, &self.config_filter)
                .into_iter()
                .collect();
        }
    }

    /// Selected keys in stable (sorted) order, for batch operations.
    pub fn selected_keys(&self) -> Vec<String> {
        self.selection.iter().cloned().collect()
    }

    /// Confirmed batch delete: the selection is spent.
    pub fn batch_delete_succeeded(&mut self) {
        self.selection.clear();
    }

    // ------------------------------------------------------------------
    // Item edit
    // ------------------------------------------------------------------

    /// Open the edit modal for `key` with its merged parameter set. Returns
    /// `false` for a key absent from the snapshot.
    pub fn open_item_edit(&mut self, key: &str) -> bool {
        let Some(entry) = self.snapshot.item_configs.get(key) else {
            return false;
        };
        let config = EffectiveConfig::resolve(entry, &self.snapshot.global_defaults);
        self.edit_draft = Some(EditDraft {
            key: key.to_string(),
            config,
        });
        self.modal = ActiveModal::ItemEdit;
        true
    }

    /// Confirmed save: close the modal and drop the draft. The caller
    /// re-fetches the snapshot as the source of truth.
    pub fn edit_saved(&mut self) {
        self.edit_draft = None;
        self.modal = ActiveModal::None;
    }

    // ------------------------------------------------------------------
    // Batch import
    // ------------------------------------------------------------------

    /// Open the import modal with overrides pre-populated from the current
    /// global policy.
    pub fn open_batch_import(&mut self) {
        self.import_draft.overrides = BatchOverrides::from_defaults(&self.snapshot.global_defaults);
        self.modal = ActiveModal::BatchImport;
    }

    /// Validate the staged draft into a request. Rejection has no effect on
    /// the draft or anything else.
    pub fn staged_import_request(&self) -> Result<BatchImportRequest, ProvisioningError> {
        let overrides = self
            .import_draft
            .attach_overrides
            .then(|| self.import_draft.overrides.clone());
        build_import_request(&self.import_draft.text, &self.import_draft.context, overrides)
    }

    /// Confirmed import: clear the staged input and close the modal. On a
    /// failed import nothing is called — the staged text, context and modal
    /// stay intact so the operator can correct and retry.
    pub fn import_succeeded(&mut self) {
        self.import_draft.text.clear();
        self.import_draft.context = BatchContext::default();
        self.modal = ActiveModal::None;
    }

    // ------------------------------------------------------------------
    // Query streams
    // ------------------------------------------------------------------

    pub fn begin_options_refresh(&mut self) -> RequestToken {
        self.options_requests.begin()
    }

    /// Whether an options response with `token` is still current.
    pub fn accept_options_response(&self, token: RequestToken) -> bool {
        self.options_requests.accepts(token)
    }

    pub fn begin_history_search(&mut self) -> RequestToken {
        self.history_requests.begin()
    }

    /// Whether a history response with `token` is still current.
    pub fn accept_history_response(&self, token: RequestToken) -> bool {
        self.history_requests.accepts(token)
    }
}

//! Tab group engine.
//!
//! This crate holds the in-memory model for saved editor tabs organized into
//! named, taggable, pinnable groups, plus per-branch parking of whole group
//! collections. It performs no I/O; callers persist the transfer forms.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut state = TabsState::new();
//! let id = state.create_group(Some("Review".into()), vec![TabItem::new("/a.rs", None, None)]);
//! state.set_pinned(&id, true);
//!
//! // A watched file was deleted on disk.
//! state.remove_tab_from_all_groups("/a.rs");
//!
//! // Park the active state under a branch and start a fresh copy.
//! let mut branches = BranchStore::new();
//! branches.archive("main", state.deep_clone(true));
//! let active = branches.restore("main");
//! ```

pub mod access;
pub mod branch;
pub mod error;
pub mod group;
pub mod grouping;
pub mod import;
pub mod reverse_index;
pub mod state;
pub mod tab_item;

pub use access::{AccessRecord, AccessTracker, SortMode};
pub use branch::{BranchStore, BranchStoreData};
pub use error::{ModelError, ModelResult};
pub use group::{DEFAULT_GROUP_LABEL, TabsGroup, TabsGroupData};
pub use grouping::{GroupingProposal, ProposedGroup};
pub use import::{ImportedData, detect_import};
pub use reverse_index::ReverseIndex;
pub use state::{GroupFilter, TabsState, TabsStateData, priority_score};
pub use tab_item::{DEFAULT_TAB_LABEL, TabInput, TabItem, TabItemData, TabKind, normalize_path};

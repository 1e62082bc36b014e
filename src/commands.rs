//! Host-facing commands. Each one performs a single logical mutation or
//! query against the active state and persists through the store.

use std::path::Path;

use anyhow::Context;
use tabgroups_model::{GroupingProposal, TabInput, TabItem};
use tabgroups_store::{RecordStore, StoreResult};

use crate::context::{AppContext, ImportSummary};
use crate::view::GroupView;

/// Where captured tabs go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupTarget {
    Existing(String),
    /// A new group; `None` picks the next untitled label.
    New { label: Option<String> },
}

/// Outcome of [`save_tabs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub group_id: String,
    pub added: usize,
}

fn to_items(inputs: Vec<TabInput>) -> Vec<TabItem> {
    inputs.into_iter().map(TabItem::from_input).collect()
}

/// Captures open editor tabs into a group. Returns `None` when the target
/// group no longer exists.
pub fn save_tabs<S: RecordStore + Clone + 'static>(
    ctx: &AppContext<S>,
    inputs: Vec<TabInput>,
    target: GroupTarget,
) -> StoreResult<Option<SaveOutcome>> {
    let tabs = to_items(inputs);
    ctx.store().update(|state| match target {
        GroupTarget::Existing(id) => {
            state.group(&id)?;
            let added = state.add_tabs_to_group(&id, tabs);
            Some(SaveOutcome { group_id: id, added })
        }
        GroupTarget::New { label } => {
            let group_id = state.create_group(label, tabs);
            let added = state.group(&group_id).map_or(0, |g| g.len());
            Some(SaveOutcome { group_id, added })
        }
    })
}

/// Turns an externally proposed grouping of the open tabs into groups.
pub fn apply_grouping<S: RecordStore + Clone + 'static>(
    ctx: &AppContext<S>,
    proposal: &GroupingProposal,
    inputs: Vec<TabInput>,
) -> StoreResult<Vec<String>> {
    let candidates = to_items(inputs);
    ctx.store()
        .update(|state| state.apply_grouping(proposal, candidates))
}

/// Returns the tabs of a group in order, ready to be reopened, and records
/// the access. `None` when the group is gone.
pub fn open_group<S: RecordStore + Clone + 'static>(
    ctx: &AppContext<S>,
    group_id: &str,
) -> StoreResult<Option<Vec<TabInput>>> {
    let inputs = ctx.store().read(|state| {
        state.group(group_id).map(|group| {
            group
                .tabs()
                .iter()
                .map(|tab| TabInput {
                    kind: tab.kind(),
                    uri: tab.uri().to_string(),
                    original_uri: tab.original_uri().map(str::to_string),
                    label: Some(tab.label().to_string()),
                })
                .collect::<Vec<_>>()
        })
    });
    if inputs.is_some() {
        ctx.store().touch_group(group_id)?;
    }
    Ok(inputs)
}

/// The groups as the tree view shows them.
pub fn listing<S: RecordStore + Clone + 'static>(ctx: &AppContext<S>) -> Vec<GroupView> {
    ctx.sorted_groups().iter().map(GroupView::from_group).collect()
}

pub fn export_state<S: RecordStore + Clone + 'static>(
    ctx: &AppContext<S>,
    path: &Path,
) -> anyhow::Result<()> {
    let json = ctx.export_state_json()?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write export file {}", path.display()))
}

pub fn export_branches<S: RecordStore + Clone + 'static>(
    ctx: &AppContext<S>,
    path: &Path,
) -> anyhow::Result<()> {
    let json = ctx.export_branches_json()?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write export file {}", path.display()))
}

pub fn import_file<S: RecordStore + Clone + 'static>(
    ctx: &AppContext<S>,
    path: &Path,
) -> anyhow::Result<ImportSummary> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read import file {}", path.display()))?;
    let summary = ctx
        .import_json(&json)
        .with_context(|| format!("cannot import {}", path.display()))?;
    log::info!("imported {}: {summary:?}", path.display());
    Ok(summary)
}

//! Command-line interface for tab-groups.
//!
//! Every subcommand opens the profile store, performs one operation and
//! flushes before exiting.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tabgroups_model::{SortMode, TabInput};
use tabgroups_store::{BranchSwitch, RecordStore};

use crate::commands::{self, GroupTarget};
use crate::context::{AppContext, ImportSummary};
use crate::settings::Settings;
use crate::view::{GroupView, render_tree};

/// tab-groups - Save editor tabs into named, pinnable groups per branch
#[derive(Parser)]
#[command(name = "tab-groups")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (default: <storage root>/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Profile to operate on, overriding the settings file
    #[arg(long, value_name = "NAME", global = true)]
    pub profile: Option<String>,

    /// Append diagnostics to <storage root>/logs/diagnostics.log
    #[arg(long, global = true)]
    pub diagnostics: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the groups of the active state
    List {
        /// Ordering, defaults to the configured sort mode
        #[arg(long, value_enum)]
        sort: Option<SortArg>,

        /// Print JSON instead of a tree
        #[arg(long)]
        json: bool,
    },
    /// Save files into a new group
    Save {
        /// Group label; omitted creates an untitled group
        #[arg(short, long)]
        label: Option<String>,

        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Pin or unpin a group
    Pin {
        id: String,
        #[arg(long)]
        off: bool,
    },
    /// Replace the tags of a group
    Tag { id: String, tags: Vec<String> },
    /// Merge groups into a destination group
    Merge {
        dst: String,
        #[arg(required = true)]
        sources: Vec<String>,
    },
    /// Delete a group
    Remove {
        id: String,
        /// Delete even when the group is pinned
        #[arg(short, long)]
        force: bool,
    },
    /// Remove a deleted file from every group
    Forget { path: String },
    /// List parked branches
    Branches,
    /// Park the active state and activate another branch
    Switch {
        to: String,
        /// Branch the active state is parked under; required unless the
        /// active state is empty
        #[arg(long)]
        from: Option<String>,
    },
    /// Export the active state
    Export { path: PathBuf },
    /// Export all parked branches
    ExportBranches { path: PathBuf },
    /// Import an exported state or branch store
    Import { path: PathBuf },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SortArg {
    Priority,
    Recency,
    Frequency,
}

impl From<SortArg> for SortMode {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Priority => SortMode::Priority,
            SortArg::Recency => SortMode::Recency,
            SortArg::Frequency => SortMode::Frequency,
        }
    }
}

/// Resolves settings for `cli`: the settings file plus command-line overrides.
pub fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    if let Some(profile) = &cli.profile {
        settings.profile = profile.clone();
    }
    if cli.diagnostics {
        settings.diagnostics = true;
    }
    Ok(settings)
}

/// Runs one subcommand, writing its report to stdout.
pub fn run<S: RecordStore + Clone + 'static>(
    ctx: &AppContext<S>,
    command: Commands,
) -> anyhow::Result<String> {
    let report = match command {
        Commands::List { sort, json } => {
            let groups: Vec<GroupView> = match sort {
                Some(mode) => ctx
                    .sorted_groups_by(mode.into())
                    .iter()
                    .map(GroupView::from_group)
                    .collect(),
                None => commands::listing(ctx),
            };
            if json {
                serde_json::to_string_pretty(&groups)?
            } else if groups.is_empty() {
                "no tab groups\n".to_string()
            } else {
                render_tree(&groups)
            }
        }
        Commands::Save { label, paths } => {
            let inputs = paths.into_iter().map(TabInput::text).collect();
            let outcome = commands::save_tabs(ctx, inputs, GroupTarget::New { label })?
                .context("group vanished while saving")?;
            format!("saved {} tab(s) into {}\n", outcome.added, outcome.group_id)
        }
        Commands::Pin { id, off } => {
            if !ctx.store().update(|state| state.set_pinned(&id, !off))? {
                anyhow::bail!("no group with id {id}");
            }
            format!("{} {id}\n", if off { "unpinned" } else { "pinned" })
        }
        Commands::Tag { id, tags } => {
            if !ctx.store().update(|state| state.set_group_tags(&id, tags))? {
                anyhow::bail!("no group with id {id}");
            }
            format!("tagged {id}\n")
        }
        Commands::Merge { dst, sources } => {
            if !ctx
                .store()
                .update(|state| state.merge_tabs_group(&dst, &sources))?
            {
                anyhow::bail!("no group with id {dst}");
            }
            format!("merged {} group(s) into {dst}\n", sources.len())
        }
        Commands::Remove { id, force } => {
            let removed = ctx
                .store()
                .update(|state| state.force_remove_tabs_group(&id, force))?;
            if !removed {
                let exists = ctx.store().read(|state| state.group(&id).is_some());
                if exists {
                    anyhow::bail!("group {id} is pinned; pass --force to delete it");
                }
                anyhow::bail!("no group with id {id}");
            }
            ctx.store().prune_access()?;
            format!("removed {id}\n")
        }
        Commands::Forget { path } => {
            let touched = ctx.on_file_deleted(&path)?;
            format!("removed {path} from {} group(s)\n", touched.len())
        }
        Commands::Branches => {
            let branches = ctx.store().list_branches();
            if branches.is_empty() {
                "no parked branches\n".to_string()
            } else {
                branches.iter().map(|b| format!("{b}\n")).collect()
            }
        }
        Commands::Switch { to, from } => {
            if from.is_none() && !ctx.store().read(|state| state.is_empty()) {
                anyhow::bail!("the active state has groups; pass --from <branch> to park them");
            }
            ctx.set_current_branch(from);
            match ctx.on_branch_changed(&to)? {
                BranchSwitch::Restored { groups } => {
                    format!("restored {groups} group(s) for {to}\n")
                }
                BranchSwitch::Fresh => format!("started an empty state for {to}\n"),
            }
        }
        Commands::Export { path } => {
            commands::export_state(ctx, &path)?;
            format!("exported to {}\n", path.display())
        }
        Commands::ExportBranches { path } => {
            commands::export_branches(ctx, &path)?;
            format!("exported branches to {}\n", path.display())
        }
        Commands::Import { path } => match commands::import_file(ctx, &path)? {
            ImportSummary::Groups(n) => format!("imported {n} group(s)\n"),
            ImportSummary::Branches(n) => format!("imported {n} branch(es)\n"),
        },
    };
    ctx.flush()?;
    Ok(report)
}

//! Application layer for tab groups: settings, the context handed to host
//! commands, presentation models and the CLI.

pub mod cli;
pub mod commands;
pub mod context;
pub mod settings;
pub mod view;

pub use commands::{GroupTarget, SaveOutcome};
pub use context::{AppContext, ImportError, ImportSummary};
pub use settings::Settings;
pub use tabgroups_shared::diagnostics;

//! Command dispatch and handlers.

pub mod diff;
pub mod find;

use crate::cli::Command;
use crate::mappings::MappingKind;

/// Dispatch a parsed command to its handler.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    match command {
        Command::Find { key, kind, manifest, json } => {
            find::run(key, (*kind).map(MappingKind::from), manifest.as_deref(), *json)
        }
        Command::Diff { base, successor } => diff::run(base, successor),
    }
}

//! `lineage diff` command.

use std::path::Path;

use crate::diff::{format_summary, DiffEntry, DiffState, MappingsDiff};
use crate::format;

/// Execute the `diff` command.
///
/// Reads two mapping files, computes the structural diff and prints the
/// change counts followed by one line per changed symbol.
///
/// # Errors
///
/// Returns an error string if either mapping file cannot be read or parsed.
pub fn run(base: &Path, successor: &Path) -> Result<(), String> {
    let base_model = format::read_file(base).map_err(|e| e.to_string())?;
    let successor_model = format::read_file(successor).map_err(|e| e.to_string())?;

    let diff = MappingsDiff::between(&base_model, &successor_model);

    let mut counts = Counts::default();
    for class in diff.classes() {
        counts.tally(class);
    }
    println!(
        "{} added, {} removed, {} changed",
        counts.added, counts.removed, counts.changed
    );
    println!("{}", format_summary(&diff));
    Ok(())
}

#[derive(Debug, Default)]
struct Counts {
    added: usize,
    removed: usize,
    changed: usize,
}

impl Counts {
    fn tally(&mut self, entry: &DiffEntry) {
        match entry.state() {
            DiffState::Added => self.added += 1,
            DiffState::Removed => self.removed += 1,
            DiffState::Changed => self.changed += 1,
            DiffState::Unchanged => {}
        }
        for child in entry.children() {
            self.tally(child);
        }
    }
}

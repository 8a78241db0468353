//! `lineage find` command.

use std::env;
use std::path::{Path, PathBuf};

use crate::history;
use crate::manifest;
use crate::mappings::MappingKind;

/// Manifest path used when neither `--manifest` nor `LINEAGE_MANIFEST` is
/// set.
const DEFAULT_MANIFEST: &str = "lineage.yaml";

/// Execute the `find` command.
///
/// Builds the version graph from the manifest, runs the finder and prints
/// each matched history, as indented text or as JSON.
///
/// # Errors
///
/// Returns an error string if the graph cannot be built or the output cannot
/// be serialized.
pub fn run(
    key: &str,
    kind: Option<MappingKind>,
    manifest_path: Option<&Path>,
    json: bool,
) -> Result<(), String> {
    let manifest_path = match manifest_path {
        Some(path) => path.to_path_buf(),
        None => env::var("LINEAGE_MANIFEST")
            .map_or_else(|_| PathBuf::from(DEFAULT_MANIFEST), PathBuf::from),
    };

    let graph = manifest::load_graph(&manifest_path)?;
    let histories = history::find(&graph, kind, key).map_err(|e| e.to_string())?;

    if json {
        let text = serde_json::to_string_pretty(&histories)
            .map_err(|e| format!("failed to serialize histories: {e}"))?;
        println!("{text}");
    } else if histories.is_empty() {
        println!("No matches for `{key}`.");
    } else {
        for history in &histories {
            println!("{}", history::format_history(history));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_fixture(dir: &Path) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join("v1.tiny"), "tiny\t2\t0\tofficial\tnamed\nc\ta/B\ta/B\n")
            .unwrap();
        std::fs::write(
            dir.join("v2.tiny"),
            "tiny\t2\t0\tofficial\tnamed\nc\ta/B\ta/Renamed\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("lineage.yaml"),
            "versions:\n- id: v1\n  path: v1.tiny\n- id: v2\n  path: v2.tiny\n  parents: [v1]\n",
        )
        .unwrap();
    }

    #[test]
    fn find_runs_against_a_manifest() {
        let dir = std::env::temp_dir().join("lineage_cmd_find");
        write_fixture(&dir);

        let result = run("B", Some(MappingKind::Class), Some(&dir.join("lineage.yaml")), false);
        assert!(result.is_ok());

        let result = run("B", None, Some(&dir.join("lineage.yaml")), true);
        assert!(result.is_ok());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn find_reports_a_missing_manifest() {
        let result = run("B", None, Some(Path::new("/nonexistent/lineage.yaml")), false);
        assert!(result.unwrap_err().contains("failed to read manifest"));
    }
}

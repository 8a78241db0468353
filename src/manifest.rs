//! Graph manifest: the on-disk description of a version graph.
//!
//! A manifest is a YAML document listing versions in insertion order. Each
//! entry names the version, the mapping file it loads, and its parents.
//! Mapping file paths are resolved relative to the manifest's directory.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::format;
use crate::graph::VersionGraph;

/// One version entry in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// The version identifier.
    pub id: String,
    /// Path of the version's mapping file, relative to the manifest.
    pub path: String,
    /// Identifiers of the parent versions, all listed earlier.
    #[serde(default)]
    pub parents: Vec<String>,
}

/// A parsed manifest: the version list in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Version entries, parents before children.
    pub versions: Vec<ManifestEntry>,
}

impl Manifest {
    /// Loads and parses a manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error string if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read manifest at {}: {e}", path.display()))?;
        serde_yaml::from_str(&text)
            .map_err(|e| format!("failed to parse manifest at {}: {e}", path.display()))
    }
}

/// Loads a manifest and builds the version graph it describes.
///
/// # Errors
///
/// Returns an error string if the manifest or any mapping file cannot be
/// loaded, or if the version list violates a graph constraint.
pub fn load_graph(manifest_path: &Path) -> Result<VersionGraph, String> {
    let manifest = Manifest::load(manifest_path)?;
    let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    let mut graph = VersionGraph::new();
    for entry in &manifest.versions {
        debug!(id = %entry.id, path = %entry.path, "loading version");
        let mappings = format::read_file(&base_dir.join(&entry.path))
            .map_err(|e| format!("version `{}`: {e}", entry.id))?;
        let parents: Vec<&str> = entry.parents.iter().map(String::as_str).collect();
        graph
            .add_version(&entry.id, mappings, &parents)
            .map_err(|e| format!("manifest at {}: {e}", manifest_path.display()))?;
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_in_order() {
        let yaml = "versions:\n\
            - id: v1\n  path: v1.tiny\n\
            - id: v2\n  path: v2.tiny\n  parents: [v1]\n";
        let manifest: Manifest = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(manifest.versions.len(), 2);
        assert_eq!(manifest.versions[0].id, "v1");
        assert!(manifest.versions[0].parents.is_empty());
        assert_eq!(manifest.versions[1].parents, ["v1"]);
    }

    #[test]
    fn load_graph_builds_versions_from_files() {
        let dir = std::env::temp_dir().join("lineage_manifest_load");
        std::fs::create_dir_all(&dir).unwrap();
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

        let graph = load_graph(&dir.join("lineage.yaml")).unwrap();
        assert_eq!(graph.versions().len(), 2);
        assert!(graph.version("v1").unwrap().is_root());
        assert!(!graph.version("v2").unwrap().is_root());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_graph_reports_missing_mapping_file() {
        let dir = std::env::temp_dir().join("lineage_manifest_missing");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("lineage.yaml"), "versions:\n- id: v1\n  path: gone.tiny\n")
            .unwrap();

        let err = load_graph(&dir.join("lineage.yaml")).unwrap_err();
        assert!(err.contains("version `v1`"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}

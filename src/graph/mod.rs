//! Version graph: a DAG of mapping sets related by parent edges.
//!
//! Each [`Version`] owns one [`Mappings`] model and refers to its parents by
//! index into the graph's version table. Diffs along parent edges are
//! computed lazily and memoized, so repeated walks over the same graph pay
//! for each edge once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::debug;

use crate::diff::MappingsDiff;
use crate::mappings::Mappings;

/// Errors raised while building or querying a version graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A version with this identifier already exists.
    #[error("version `{0}` already exists")]
    DuplicateVersion(String),
    /// A named parent has not been added to the graph.
    #[error("version `{child}` refers to unknown parent `{parent}`")]
    UnknownParent {
        /// The version naming the parent.
        child: String,
        /// The missing parent identifier.
        parent: String,
    },
    /// The requested version is not in the graph.
    #[error("unknown version `{0}`")]
    UnknownVersion(String),
    /// Adding the edge would make the parent reachable from itself.
    #[error("linking `{child}` under `{parent}` would create a cycle")]
    Cycle {
        /// The would-be child of the rejected edge.
        child: String,
        /// The would-be parent of the rejected edge.
        parent: String,
    },
}

/// One version in the graph: an identifier, its mapping model, and the
/// indices of its parents in the graph's version table.
#[derive(Debug)]
pub struct Version {
    id: String,
    mappings: Mappings,
    parents: Vec<usize>,
    index: usize,
    diffs: Mutex<HashMap<usize, Arc<MappingsDiff>>>,
}

impl Version {
    /// The version identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The mapping model of this version.
    #[must_use]
    pub fn mappings(&self) -> &Mappings {
        &self.mappings
    }

    /// Returns `true` if this version has no parents.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}

/// A DAG of versions. Insertion order is preserved and drives tie-breaking
/// in [`VersionGraph::walk`].
#[derive(Debug, Default)]
pub struct VersionGraph {
    versions: Vec<Version>,
    ids: HashMap<String, usize>,
}

impl VersionGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a version with the given parents, which must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateVersion`] if the identifier is taken
    /// and [`GraphError::UnknownParent`] if any parent is absent. Parents
    /// always precede their children in insertion order, so this operation
    /// can never create a cycle.
    pub fn add_version(
        &mut self,
        id: &str,
        mappings: Mappings,
        parents: &[&str],
    ) -> Result<(), GraphError> {
        if self.ids.contains_key(id) {
            return Err(GraphError::DuplicateVersion(id.to_string()));
        }
        let parent_indices = parents
            .iter()
            .map(|p| {
                self.ids.get(*p).copied().ok_or_else(|| GraphError::UnknownParent {
                    child: id.to_string(),
                    parent: (*p).to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let index = self.versions.len();
        self.ids.insert(id.to_string(), index);
        self.versions.push(Version {
            id: id.to_string(),
            mappings,
            parents: parent_indices,
            index,
            diffs: Mutex::new(HashMap::new()),
        });
        Ok(())
    }

    /// Links an existing version under an additional parent.
    ///
    /// Adding an edge that already exists is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownVersion`] if either version is absent
    /// and [`GraphError::Cycle`] if `parent` is reachable from itself
    /// through the new edge. On error the graph is left unchanged.
    pub fn add_parent(&mut self, child_id: &str, parent_id: &str) -> Result<(), GraphError> {
        let child = self.index_of(child_id)?;
        let parent = self.index_of(parent_id)?;
        if self.versions[child].parents.contains(&parent) {
            return Ok(());
        }
        if parent == child || self.reachable(child, parent) {
            return Err(GraphError::Cycle {
                child: child_id.to_string(),
                parent: parent_id.to_string(),
            });
        }
        self.versions[child].parents.push(parent);
        Ok(())
    }

    /// Returns `true` if `from` is reachable from `to` through parent links.
    fn reachable(&self, from: usize, to: usize) -> bool {
        let mut stack = vec![to];
        let mut seen = vec![false; self.versions.len()];
        while let Some(index) = stack.pop() {
            if index == from {
                return true;
            }
            if seen[index] {
                continue;
            }
            seen[index] = true;
            stack.extend(&self.versions[index].parents);
        }
        false
    }

    fn index_of(&self, id: &str) -> Result<usize, GraphError> {
        self.ids
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnknownVersion(id.to_string()))
    }

    /// Looks up a version by identifier.
    #[must_use]
    pub fn version(&self, id: &str) -> Option<&Version> {
        self.ids.get(id).map(|&i| &self.versions[i])
    }

    /// All versions in insertion order.
    #[must_use]
    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    /// The parents of `version`, in the order they were linked.
    #[must_use]
    pub fn parents_of(&self, version: &Version) -> Vec<&Version> {
        version.parents.iter().map(|&i| &self.versions[i]).collect()
    }

    /// Visits every version exactly once, every parent strictly before its
    /// children. Ties break by insertion order.
    #[must_use]
    pub fn walk(&self) -> Vec<&Version> {
        let mut order = Vec::with_capacity(self.versions.len());
        let mut visited = vec![false; self.versions.len()];
        loop {
            let mut progressed = false;
            for version in &self.versions {
                if visited[version.index] {
                    continue;
                }
                if version.parents.iter().all(|&p| visited[p]) {
                    visited[version.index] = true;
                    order.push(version);
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }
        debug!(visited = order.len(), total = self.versions.len(), "graph walk complete");
        order
    }

    /// The diff along the edge from `parent` (base) to `child` (successor),
    /// computed on first request and memoized in the child version.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownParent`] if no such edge exists.
    pub fn diff(&self, child: &Version, parent: &Version) -> Result<Arc<MappingsDiff>, GraphError> {
        if !child.parents.contains(&parent.index) {
            return Err(GraphError::UnknownParent {
                child: child.id.clone(),
                parent: parent.id.clone(),
            });
        }
        let mut cache = child.diffs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(diff) = cache.get(&parent.index) {
            return Ok(Arc::clone(diff));
        }
        debug!(child = %child.id, parent = %parent.id, "computing edge diff");
        let diff = Arc::new(MappingsDiff::between(&parent.mappings, &child.mappings));
        cache.insert(parent.index, Arc::clone(&diff));
        Ok(diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappings::Mapping;

    fn model(class: &str, dst: &str) -> Mappings {
        let mut mappings = Mappings::new("official", "named");
        mappings.add_class(Mapping::class(class).with_dst(dst)).unwrap();
        mappings
    }

    fn empty() -> Mappings {
        Mappings::new("official", "named")
    }

    #[test]
    fn add_version_rejects_unknown_parent() {
        let mut graph = VersionGraph::new();
        let err = graph.add_version("v2", empty(), &["v1"]).unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownParent { child: "v2".to_string(), parent: "v1".to_string() }
        );
    }

    #[test]
    fn add_version_rejects_duplicate_id() {
        let mut graph = VersionGraph::new();
        graph.add_version("v1", empty(), &[]).unwrap();
        let err = graph.add_version("v1", empty(), &[]).unwrap_err();
        assert_eq!(err, GraphError::DuplicateVersion("v1".to_string()));
    }

    #[test]
    fn add_parent_rejects_cycle_and_leaves_graph_unchanged() {
        let mut graph = VersionGraph::new();
        graph.add_version("v1", empty(), &[]).unwrap();
        graph.add_version("v2", empty(), &["v1"]).unwrap();
        graph.add_version("v3", empty(), &["v2"]).unwrap();

        let err = graph.add_parent("v1", "v3").unwrap_err();
        assert_eq!(err, GraphError::Cycle { child: "v1".to_string(), parent: "v3".to_string() });
        assert!(graph.version("v1").unwrap().is_root());

        let err = graph.add_parent("v1", "v1").unwrap_err();
        assert_eq!(err, GraphError::Cycle { child: "v1".to_string(), parent: "v1".to_string() });
    }

    #[test]
    fn add_parent_twice_is_a_noop() {
        let mut graph = VersionGraph::new();
        graph.add_version("v1", empty(), &[]).unwrap();
        graph.add_version("v2", empty(), &[]).unwrap();
        graph.add_parent("v2", "v1").unwrap();
        graph.add_parent("v2", "v1").unwrap();
        let v2 = graph.version("v2").unwrap();
        assert_eq!(graph.parents_of(v2).len(), 1);
    }

    #[test]
    fn walk_visits_parents_before_children() {
        // Diamond: v1 -> {v2, v3} -> v4.
        let mut graph = VersionGraph::new();
        graph.add_version("v1", empty(), &[]).unwrap();
        graph.add_version("v2", empty(), &["v1"]).unwrap();
        graph.add_version("v3", empty(), &["v1"]).unwrap();
        graph.add_version("v4", empty(), &["v2", "v3"]).unwrap();

        let order: Vec<&str> = graph.walk().iter().map(|v| v.id()).collect();
        assert_eq!(order, ["v1", "v2", "v3", "v4"]);
    }

    #[test]
    fn walk_breaks_ties_by_insertion_order() {
        let mut graph = VersionGraph::new();
        graph.add_version("b", empty(), &[]).unwrap();
        graph.add_version("a", empty(), &[]).unwrap();
        graph.add_version("c", empty(), &["a", "b"]).unwrap();

        let order: Vec<&str> = graph.walk().iter().map(|v| v.id()).collect();
        assert_eq!(order, ["b", "a", "c"]);
    }

    #[test]
    fn diff_is_memoized_per_edge() {
        let mut graph = VersionGraph::new();
        graph.add_version("v1", model("a/B", ""), &[]).unwrap();
        graph.add_version("v2", model("a/B", "a/Renamed"), &["v1"]).unwrap();

        let v1 = graph.version("v1").unwrap();
        let v2 = graph.version("v2").unwrap();
        let first = graph.diff(v2, v1).unwrap();
        let second = graph.diff(v2, v1).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.has_changes());
    }

    #[test]
    fn diff_requires_an_edge() {
        let mut graph = VersionGraph::new();
        graph.add_version("v1", empty(), &[]).unwrap();
        graph.add_version("v2", empty(), &[]).unwrap();

        let v1 = graph.version("v1").unwrap();
        let v2 = graph.version("v2").unwrap();
        let err = graph.diff(v2, v1).unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownParent { child: "v2".to_string(), parent: "v1".to_string() }
        );
    }
}

//! Rename-history aggregation across a version graph.
//!
//! [`find`] walks a [`VersionGraph`] in topological order and collects, for
//! every symbol matching a query key, the sequence of observations made of
//! it: a snapshot where a root version introduces it, and a diff observation
//! for every parent edge of every later version that contains it.

use serde::Serialize;
use tracing::trace;

use crate::diff::{DiffEntry, DiffSide, DiffState};
use crate::graph::{GraphError, Version, VersionGraph};
use crate::mappings::{Mapping, MappingKind};

/// What was seen of a symbol in one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum Observation {
    /// The symbol as it appears in a root version's mapping model.
    Snapshot {
        /// Source name, full for classes.
        src: String,
        /// Raw target name; empty means "unchanged from source".
        dst: String,
        /// Documentation string; empty means none.
        javadoc: String,
    },
    /// The symbol as it appears in the diff against one parent.
    Change {
        /// The diff state of the node on this edge.
        state: DiffState,
        /// Resolved target name on the parent side.
        dst_a: String,
        /// Resolved target name on this version's side.
        dst_b: String,
        /// Documentation on the parent side.
        javadoc_a: String,
        /// Documentation on this version's side.
        javadoc_b: String,
    },
}

/// One observation of a symbol, tagged with the version it was made in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    version: String,
    #[serde(flatten)]
    observation: Observation,
}

impl HistoryEntry {
    /// The version the observation was made in.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// What was observed.
    #[must_use]
    pub fn observation(&self) -> &Observation {
        &self.observation
    }
}

/// The collected history of one symbol across the graph.
///
/// Identity is the path of composite keys from the top-level class down to
/// the node. The path is stable across renames, so one history accumulates
/// every observation of the same source symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingHistory {
    kind: MappingKind,
    path: Vec<String>,
    entries: Vec<HistoryEntry>,
}

impl MappingHistory {
    /// The kind of the symbol.
    #[must_use]
    pub fn kind(&self) -> MappingKind {
        self.kind
    }

    /// Composite keys from the top-level class down to the node.
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Observations in walk order, at most one per version.
    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }
}

/// Finds every symbol matching `key` and aggregates its history.
///
/// Root versions contribute snapshots of their mapping model; every other
/// version contributes one diff observation per parent edge. A symbol
/// reachable through several merge paths is recorded once per version, the
/// first observation in walk order winning. Histories are ordered by first
/// observation.
///
/// Key forms, applied after the optional kind filter:
/// - classes: a key ending in `/` prefix-matches full source and target
///   names; a key containing `/` matches a full name exactly; a bare key
///   matches the package-stripped names, additionally outer-class-stripped
///   when the key has no `$`.
/// - other kinds: a key containing `:` matches the composite key exactly; a
///   bare key matches the simple source or target name.
///
/// # Errors
///
/// Propagates [`GraphError`] from edge-diff computation.
pub fn find(
    graph: &VersionGraph,
    kind_filter: Option<MappingKind>,
    key: &str,
) -> Result<Vec<MappingHistory>, GraphError> {
    let mut histories: Vec<MappingHistory> = Vec::new();

    for version in graph.walk() {
        if version.is_root() {
            let mut matches = Vec::new();
            let mut path = Vec::new();
            for class in version.mappings().classes() {
                scan_mapping(class, None, kind_filter, key, &mut path, &mut matches);
            }
            for m in matches {
                record(&mut histories, version, m);
            }
        } else {
            for parent in graph.parents_of(version) {
                let diff = graph.diff(version, parent)?;
                let mut matches = Vec::new();
                let mut path = Vec::new();
                for class in diff.classes() {
                    scan_entry(class, kind_filter, key, &mut path, &mut matches);
                }
                for m in matches {
                    record(&mut histories, version, m);
                }
            }
        }
    }

    Ok(histories)
}

/// A matched node: its identity and what was observed.
struct Match {
    kind: MappingKind,
    path: Vec<String>,
    observation: Observation,
}

fn record(histories: &mut Vec<MappingHistory>, version: &Version, m: Match) {
    let existing = histories
        .iter_mut()
        .find(|h| h.kind == m.kind && h.path == m.path);
    match existing {
        Some(history) => {
            let seen = history.entries.iter().any(|e| e.version == version.id());
            if !seen {
                history.entries.push(HistoryEntry {
                    version: version.id().to_string(),
                    observation: m.observation,
                });
            }
        }
        None => histories.push(MappingHistory {
            kind: m.kind,
            path: m.path,
            entries: vec![HistoryEntry {
                version: version.id().to_string(),
                observation: m.observation,
            }],
        }),
    }
}

fn scan_mapping(
    mapping: &Mapping,
    enclosing_dst: Option<&str>,
    kind_filter: Option<MappingKind>,
    key: &str,
    path: &mut Vec<String>,
    matches: &mut Vec<Match>,
) {
    path.push(mapping.key());

    let complete = (mapping.kind() == MappingKind::Class)
        .then(|| mapping.complete_dst(enclosing_dst));

    let kind_ok = kind_filter.map_or(true, |k| k == mapping.kind());
    if kind_ok {
        let hit = match mapping.kind() {
            MappingKind::Class => {
                let complete = complete.as_deref().unwrap_or_default();
                class_matches(key, mapping.src()) || class_matches(key, complete)
            }
            _ => member_matches(key, &mapping.key(), mapping.src(), &[mapping.dst_or_src()]),
        };
        if hit {
            trace!(key, node = %mapping.key(), "snapshot match");
            matches.push(Match {
                kind: mapping.kind(),
                path: path.clone(),
                observation: Observation::Snapshot {
                    src: mapping.src().to_string(),
                    dst: mapping.dst().to_string(),
                    javadoc: mapping.javadoc().to_string(),
                },
            });
        }
    }

    for child in mapping.children() {
        scan_mapping(child, complete.as_deref(), kind_filter, key, path, matches);
    }
    path.pop();
}

fn scan_entry(
    entry: &DiffEntry,
    kind_filter: Option<MappingKind>,
    key: &str,
    path: &mut Vec<String>,
    matches: &mut Vec<Match>,
) {
    path.push(entry.key());

    let kind_ok = kind_filter.map_or(true, |k| k == entry.kind());
    if kind_ok {
        let hit = match entry.kind() {
            MappingKind::Class => {
                class_matches(key, entry.src())
                    || class_matches(key, entry.dst(DiffSide::A))
                    || class_matches(key, entry.dst(DiffSide::B))
            }
            _ => member_matches(
                key,
                &entry.key(),
                entry.src(),
                &[entry.dst(DiffSide::A), entry.dst(DiffSide::B)],
            ),
        };
        if hit {
            trace!(key, node = %entry.key(), state = %entry.state(), "diff match");
            matches.push(Match {
                kind: entry.kind(),
                path: path.clone(),
                observation: Observation::Change {
                    state: entry.state(),
                    dst_a: entry.dst(DiffSide::A).to_string(),
                    dst_b: entry.dst(DiffSide::B).to_string(),
                    javadoc_a: entry.javadoc(DiffSide::A).to_string(),
                    javadoc_b: entry.javadoc(DiffSide::B).to_string(),
                },
            });
        }
    }

    for child in entry.children() {
        scan_entry(child, kind_filter, key, path, matches);
    }
    path.pop();
}

/// Matches a class query key against one full class name.
fn class_matches(key: &str, full_name: &str) -> bool {
    if full_name.is_empty() {
        return false;
    }
    if key.ends_with('/') {
        return full_name.starts_with(key);
    }
    if key.contains('/') {
        return full_name == key;
    }
    let simple = strip_package(full_name);
    let simple = if key.contains('$') { simple } else { strip_outer(simple) };
    simple == key
}

/// Matches a member query key against a node's composite key, source name
/// and target names. Empty target names never match.
fn member_matches(key: &str, node_key: &str, src: &str, dsts: &[&str]) -> bool {
    if key.contains(':') {
        return node_key == key;
    }
    src == key || dsts.iter().any(|d| !d.is_empty() && *d == key)
}

fn strip_package(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn strip_outer(name: &str) -> &str {
    name.rsplit('$').next().unwrap_or(name)
}

/// Formats one history as an indented, human-readable block.
#[must_use]
pub fn format_history(history: &MappingHistory) -> String {
    let mut lines = vec![format!("{} {}", history.kind(), history.path().join(" > "))];
    for entry in history.entries() {
        let line = match entry.observation() {
            Observation::Snapshot { src, dst, .. } => {
                if dst.is_empty() {
                    format!("  {}: {src}", entry.version())
                } else {
                    format!("  {}: {src} -> {dst}", entry.version())
                }
            }
            Observation::Change { state, dst_a, dst_b, .. } => match state {
                DiffState::Added => format!("  {}: added {dst_b}", entry.version()),
                DiffState::Removed => format!("  {}: removed {dst_a}", entry.version()),
                DiffState::Changed => {
                    format!("  {}: {dst_a} -> {dst_b}", entry.version())
                }
                DiffState::Unchanged => format!("  {}: unchanged", entry.version()),
            },
        };
        lines.push(line);
    }
    lines.join("\n")
}

//! Structural diffing of two mapping models.
//!
//! [`MappingsDiff::between`] walks two [`Mappings`] forests in lockstep and
//! produces a tree with the union shape of both inputs. Every node records
//! the values of both sides plus a [`DiffState`]. The computation is pure:
//! identical inputs always produce an identical diff tree, including child
//! order.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::mappings::{Mapping, MappingKind, Mappings};

/// Labels the two sides of a diff: `A` is the base, `B` the successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffSide {
    /// The base side of the comparison.
    A,
    /// The successor side of the comparison.
    B,
}

/// How a node differs between the two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffState {
    /// Present on both sides with equal names and documentation.
    Unchanged,
    /// Present only on side B.
    Added,
    /// Present only on side A.
    Removed,
    /// Present on both sides with a differing name or documentation.
    Changed,
}

impl fmt::Display for DiffState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unchanged => "unchanged",
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Changed => "changed",
        };
        f.write_str(label)
    }
}

/// One node of a diff tree: the identity fields shared by both sides plus
/// per-side target names and documentation.
///
/// Target names are stored resolved: the empty "unchanged from source" form
/// is replaced by the source name, and class names are fully qualified. A
/// side that does not contain the node at all holds empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    kind: MappingKind,
    src: String,
    desc: String,
    index: Option<u32>,
    state: DiffState,
    dst_a: String,
    dst_b: String,
    javadoc_a: String,
    javadoc_b: String,
    children: Vec<DiffEntry>,
}

impl DiffEntry {
    /// The kind of symbol this entry describes.
    #[must_use]
    pub fn kind(&self) -> MappingKind {
        self.kind
    }

    /// The shared source name (full name for classes).
    #[must_use]
    pub fn src(&self) -> &str {
        &self.src
    }

    /// The shared type descriptor; empty where not applicable.
    #[must_use]
    pub fn desc(&self) -> &str {
        &self.desc
    }

    /// The ordinal index for parameters and locals.
    #[must_use]
    pub fn index(&self) -> Option<u32> {
        self.index
    }

    /// The change state of this node. Children carry their own states.
    #[must_use]
    pub fn state(&self) -> DiffState {
        self.state
    }

    /// The resolved target name on one side; empty if the node is absent
    /// there.
    #[must_use]
    pub fn dst(&self, side: DiffSide) -> &str {
        match side {
            DiffSide::A => &self.dst_a,
            DiffSide::B => &self.dst_b,
        }
    }

    /// The documentation string on one side.
    #[must_use]
    pub fn javadoc(&self, side: DiffSide) -> &str {
        match side {
            DiffSide::A => &self.javadoc_a,
            DiffSide::B => &self.javadoc_b,
        }
    }

    /// Child entries, in base order followed by successor-only keys.
    #[must_use]
    pub fn children(&self) -> &[DiffEntry] {
        &self.children
    }

    /// The composite key, derived the same way as [`Mapping::key`].
    #[must_use]
    pub fn key(&self) -> String {
        match self.kind {
            MappingKind::Class => self.src.clone(),
            MappingKind::Field | MappingKind::Method => format!("{}:{}", self.src, self.desc),
            MappingKind::Parameter | MappingKind::Local => {
                format!("{}:{}", self.index.unwrap_or_default(), self.src)
            }
        }
    }

    /// Returns `true` if this node or any descendant is not `Unchanged`.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.state != DiffState::Unchanged || self.children.iter().any(DiffEntry::has_changes)
    }
}

/// The structural diff of two mapping models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingsDiff {
    classes: Vec<DiffEntry>,
}

impl MappingsDiff {
    /// Computes the diff of `base` (side A) against `successor` (side B).
    ///
    /// Neither input is mutated. Emission order is the base side's child
    /// order followed by successor-only keys in successor order, at every
    /// level of the tree.
    #[must_use]
    pub fn between(base: &Mappings, successor: &Mappings) -> Self {
        debug!(
            base_classes = base.classes().len(),
            successor_classes = successor.classes().len(),
            "computing mappings diff"
        );
        Self { classes: diff_children(base.classes(), successor.classes(), None, None) }
    }

    /// Top-level class entries.
    #[must_use]
    pub fn classes(&self) -> &[DiffEntry] {
        &self.classes
    }

    /// Returns `true` if any node in the tree is not `Unchanged`.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.classes.iter().any(DiffEntry::has_changes)
    }
}

/// The resolved comparison name of a node: fully qualified for classes,
/// empty-to-src resolved for everything else.
fn resolved_dst(mapping: &Mapping, enclosing: Option<&str>) -> String {
    match mapping.kind() {
        MappingKind::Class => mapping.complete_dst(enclosing),
        _ => mapping.dst_or_src().to_string(),
    }
}

fn diff_children(
    a: &[Mapping],
    b: &[Mapping],
    enclosing_a: Option<&str>,
    enclosing_b: Option<&str>,
) -> Vec<DiffEntry> {
    let mut entries = Vec::new();
    for ma in a {
        let entry = match b.iter().find(|mb| mb.key() == ma.key()) {
            Some(mb) => diff_pair(ma, mb, enclosing_a, enclosing_b),
            None => one_sided(ma, DiffState::Removed, enclosing_a),
        };
        entries.push(entry);
    }
    for mb in b {
        if !a.iter().any(|ma| ma.key() == mb.key()) {
            entries.push(one_sided(mb, DiffState::Added, enclosing_b));
        }
    }
    entries
}

fn diff_pair(
    a: &Mapping,
    b: &Mapping,
    enclosing_a: Option<&str>,
    enclosing_b: Option<&str>,
) -> DiffEntry {
    let dst_a = resolved_dst(a, enclosing_a);
    let dst_b = resolved_dst(b, enclosing_b);
    // Matching keys imply matching descriptors and indices, so only the
    // names and documentation can differ here.
    let state = if dst_a != dst_b || a.javadoc() != b.javadoc() {
        DiffState::Changed
    } else {
        DiffState::Unchanged
    };

    let is_class = a.kind() == MappingKind::Class;
    let children = diff_children(
        a.children(),
        b.children(),
        is_class.then_some(dst_a.as_str()),
        is_class.then_some(dst_b.as_str()),
    );

    DiffEntry {
        kind: a.kind(),
        src: a.src().to_string(),
        desc: a.desc().to_string(),
        index: a.index(),
        state,
        dst_a,
        dst_b,
        javadoc_a: a.javadoc().to_string(),
        javadoc_b: b.javadoc().to_string(),
        children,
    }
}

/// Builds an entry for a subtree present on only one side; every descendant
/// inherits the same `Added` or `Removed` state.
fn one_sided(mapping: &Mapping, state: DiffState, enclosing: Option<&str>) -> DiffEntry {
    let dst = resolved_dst(mapping, enclosing);
    let child_enclosing =
        (mapping.kind() == MappingKind::Class).then(|| dst.clone());
    let children = mapping
        .children()
        .iter()
        .map(|c| one_sided(c, state, child_enclosing.as_deref()))
        .collect();

    let (dst_a, dst_b, javadoc_a, javadoc_b) = if state == DiffState::Removed {
        (dst, String::new(), mapping.javadoc().to_string(), String::new())
    } else {
        (String::new(), dst, String::new(), mapping.javadoc().to_string())
    };

    DiffEntry {
        kind: mapping.kind(),
        src: mapping.src().to_string(),
        desc: mapping.desc().to_string(),
        index: mapping.index(),
        state,
        dst_a,
        dst_b,
        javadoc_a,
        javadoc_b,
        children,
    }
}

/// Format a diff as a human-readable change summary.
///
/// Unchanged subtrees are omitted; unchanged containers with changed
/// descendants are kept as context lines.
#[must_use]
pub fn format_summary(diff: &MappingsDiff) -> String {
    if !diff.has_changes() {
        return "No changes between the two mapping sets.".to_string();
    }

    let mut lines = Vec::new();
    for class in diff.classes() {
        render_entry(class, 0, &mut lines);
    }
    lines.join("\n")
}

fn render_entry(entry: &DiffEntry, depth: usize, lines: &mut Vec<String>) {
    if !entry.has_changes() {
        return;
    }
    let indent = "  ".repeat(depth);
    let line = match entry.state() {
        DiffState::Added => format!("+ {} {}", entry.kind(), entry.dst(DiffSide::B)),
        DiffState::Removed => format!("- {} {}", entry.kind(), entry.dst(DiffSide::A)),
        DiffState::Changed if entry.dst(DiffSide::A) == entry.dst(DiffSide::B) => {
            format!("~ {} {} (docs)", entry.kind(), entry.dst(DiffSide::A))
        }
        DiffState::Changed => format!(
            "~ {} {} -> {}",
            entry.kind(),
            entry.dst(DiffSide::A),
            entry.dst(DiffSide::B)
        ),
        DiffState::Unchanged => format!("  {} {}", entry.kind(), entry.dst(DiffSide::A)),
    };
    lines.push(format!("{indent}{line}"));
    for child in entry.children() {
        render_entry(child, depth + 1, lines);
    }
}

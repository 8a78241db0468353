//! Mapping model: the symbol-rename table for one version.
//!
//! A [`Mappings`] value is a forest of top-level class nodes. Each node maps
//! an obfuscated source name to a target name and owns its child mappings in
//! insertion order: classes contain nested classes, fields and methods;
//! methods contain parameters and locals.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while constructing a mapping tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// A sibling with the same composite key already exists.
    #[error("duplicate key `{key}` under `{parent}`")]
    DuplicateKey {
        /// Key of the container the insertion targeted.
        parent: String,
        /// The offending composite key.
        key: String,
    },
    /// The child kind is not legal under the parent kind.
    #[error("a {child} mapping cannot be a child of a {parent} mapping")]
    InvalidChild {
        /// Kind of the container.
        parent: MappingKind,
        /// Kind of the rejected child.
        child: MappingKind,
    },
    /// A non-class mapping was inserted at the top level.
    #[error("only class mappings may appear at the top level, got a {0} mapping")]
    NotAClass(MappingKind),
}

/// The kind of program symbol a mapping renames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingKind {
    /// A class, possibly nested inside another class.
    Class,
    /// A field declared in a class.
    Field,
    /// A method declared in a class.
    Method,
    /// A method parameter, identified by its ordinal index.
    Parameter,
    /// A local variable, identified by its ordinal index.
    Local,
}

impl MappingKind {
    /// Returns `true` if `child` may appear in the child collection of a
    /// mapping of this kind.
    #[must_use]
    pub fn allows_child(self, child: MappingKind) -> bool {
        match self {
            Self::Class => matches!(child, Self::Class | Self::Field | Self::Method),
            Self::Method => matches!(child, Self::Parameter | Self::Local),
            Self::Field | Self::Parameter | Self::Local => false,
        }
    }
}

impl fmt::Display for MappingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Class => "class",
            Self::Field => "field",
            Self::Method => "method",
            Self::Parameter => "parameter",
            Self::Local => "local",
        };
        f.write_str(label)
    }
}

/// One rename record: an obfuscated source name, its target name, and the
/// child mappings nested under it.
///
/// Class nodes store the *full* source name (package and `$` chain included);
/// their target name is simple for nested classes and fully qualified for
/// top-level ones. All other kinds use simple names on both sides. An empty
/// target name means "unchanged from source".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    kind: MappingKind,
    src: String,
    dst: String,
    desc: String,
    index: Option<u32>,
    javadoc: String,
    children: Vec<Mapping>,
}

impl Mapping {
    fn new(kind: MappingKind, src: &str, desc: &str, index: Option<u32>) -> Self {
        Self {
            kind,
            src: src.to_string(),
            dst: String::new(),
            desc: desc.to_string(),
            index,
            javadoc: String::new(),
            children: Vec::new(),
        }
    }

    /// Creates a class mapping from its full source name.
    #[must_use]
    pub fn class(src: &str) -> Self {
        Self::new(MappingKind::Class, src, "", None)
    }

    /// Creates a field mapping from its source name and type descriptor.
    #[must_use]
    pub fn field(src: &str, desc: &str) -> Self {
        Self::new(MappingKind::Field, src, desc, None)
    }

    /// Creates a method mapping from its source name and descriptor.
    #[must_use]
    pub fn method(src: &str, desc: &str) -> Self {
        Self::new(MappingKind::Method, src, desc, None)
    }

    /// Creates a parameter mapping from its ordinal index and source name.
    #[must_use]
    pub fn parameter(index: u32, src: &str) -> Self {
        Self::new(MappingKind::Parameter, src, "", Some(index))
    }

    /// Creates a local-variable mapping from its ordinal index and source name.
    #[must_use]
    pub fn local(index: u32, src: &str) -> Self {
        Self::new(MappingKind::Local, src, "", Some(index))
    }

    /// Sets the target name, builder style.
    #[must_use]
    pub fn with_dst(mut self, dst: &str) -> Self {
        self.dst = dst.to_string();
        self
    }

    /// Sets the documentation string, builder style.
    #[must_use]
    pub fn with_javadoc(mut self, javadoc: &str) -> Self {
        self.javadoc = javadoc.to_string();
        self
    }

    /// Replaces the target name.
    pub fn set_dst(&mut self, dst: &str) {
        self.dst = dst.to_string();
    }

    /// Replaces the documentation string.
    pub fn set_javadoc(&mut self, javadoc: &str) {
        self.javadoc = javadoc.to_string();
    }

    /// The kind of symbol this mapping renames.
    #[must_use]
    pub fn kind(&self) -> MappingKind {
        self.kind
    }

    /// The source (obfuscated) name. Immutable once set.
    #[must_use]
    pub fn src(&self) -> &str {
        &self.src
    }

    /// The raw target name; empty means "unchanged from source".
    #[must_use]
    pub fn dst(&self) -> &str {
        &self.dst
    }

    /// The target name with the empty case resolved to the source name.
    #[must_use]
    pub fn dst_or_src(&self) -> &str {
        if self.dst.is_empty() { &self.src } else { &self.dst }
    }

    /// The type descriptor; empty for classes, parameters and locals.
    #[must_use]
    pub fn desc(&self) -> &str {
        &self.desc
    }

    /// The ordinal index; present only for parameters and locals.
    #[must_use]
    pub fn index(&self) -> Option<u32> {
        self.index
    }

    /// Returns `true` for local-variable mappings.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.kind == MappingKind::Local
    }

    /// The documentation string; empty means none.
    #[must_use]
    pub fn javadoc(&self) -> &str {
        &self.javadoc
    }

    /// The composite key identifying this node among its siblings.
    ///
    /// Classes use their full source name, fields and methods `src:desc`,
    /// parameters and locals `index:src`.
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

    /// The simple inner name of a class source name: the part after the last
    /// `/` and `$`. For non-class kinds this is the source name itself.
    #[must_use]
    pub fn simple_src(&self) -> &str {
        let stripped = self.src.rsplit('/').next().unwrap_or(&self.src);
        stripped.rsplit('$').next().unwrap_or(stripped)
    }

    /// The fully qualified target name of a class node.
    ///
    /// `enclosing` is the complete target name of the enclosing class, or
    /// `None` for top-level classes. An empty target name resolves to the
    /// full source name, matching what the serialized format writes out.
    #[must_use]
    pub fn complete_dst(&self, enclosing: Option<&str>) -> String {
        if self.dst.is_empty() {
            return self.src.clone();
        }
        match enclosing {
            Some(outer) => format!("{outer}${}", self.dst),
            None => self.dst.clone(),
        }
    }

    /// Adds a child mapping, returning a mutable borrow of the inserted node.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::InvalidChild`] if the child kind is not legal
    /// under this node, or [`MappingError::DuplicateKey`] if a sibling with
    /// the same composite key already exists.
    pub fn add_child(&mut self, child: Mapping) -> Result<&mut Mapping, MappingError> {
        if !self.kind.allows_child(child.kind) {
            return Err(MappingError::InvalidChild { parent: self.kind, child: child.kind });
        }
        let key = child.key();
        if self.children.iter().any(|c| c.key() == key) {
            return Err(MappingError::DuplicateKey { parent: self.key(), key });
        }
        self.children.push(child);
        Ok(self.children.last_mut().unwrap_or_else(|| unreachable!()))
    }

    /// All children in insertion order.
    #[must_use]
    pub fn children(&self) -> &[Mapping] {
        &self.children
    }

    /// The children of one kind, in insertion order.
    pub fn children_of(&self, kind: MappingKind) -> impl Iterator<Item = &Mapping> {
        self.children.iter().filter(move |c| c.kind == kind)
    }

    /// Looks up a direct child by composite key.
    #[must_use]
    pub fn child(&self, key: &str) -> Option<&Mapping> {
        self.children.iter().find(|c| c.key() == key)
    }

    /// Looks up a direct child by composite key, mutably.
    pub fn child_mut(&mut self, key: &str) -> Option<&mut Mapping> {
        self.children.iter_mut().find(|c| c.key() == key)
    }
}

/// The full symbol-rename table for one version: a forest of top-level
/// classes plus the namespace labels the table maps between.
///
/// The namespaces are metadata for serialization; the diff engine never
/// consults them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mappings {
    src_namespace: String,
    dst_namespace: String,
    classes: Vec<Mapping>,
}

impl Mappings {
    /// Creates an empty model mapping `src_namespace` to `dst_namespace`.
    #[must_use]
    pub fn new(src_namespace: &str, dst_namespace: &str) -> Self {
        Self {
            src_namespace: src_namespace.to_string(),
            dst_namespace: dst_namespace.to_string(),
            classes: Vec::new(),
        }
    }

    /// The source namespace label.
    #[must_use]
    pub fn src_namespace(&self) -> &str {
        &self.src_namespace
    }

    /// The destination namespace label.
    #[must_use]
    pub fn dst_namespace(&self) -> &str {
        &self.dst_namespace
    }

    /// Adds a top-level class, returning a mutable borrow of the inserted
    /// node.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::NotAClass`] for non-class mappings and
    /// [`MappingError::DuplicateKey`] if a class with the same key exists.
    pub fn add_class(&mut self, class: Mapping) -> Result<&mut Mapping, MappingError> {
        if class.kind != MappingKind::Class {
            return Err(MappingError::NotAClass(class.kind));
        }
        let key = class.key();
        if self.classes.iter().any(|c| c.key() == key) {
            return Err(MappingError::DuplicateKey { parent: String::new(), key });
        }
        self.classes.push(class);
        Ok(self.classes.last_mut().unwrap_or_else(|| unreachable!()))
    }

    /// The top-level classes in insertion order.
    #[must_use]
    pub fn classes(&self) -> &[Mapping] {
        &self.classes
    }

    /// Looks up a top-level class by key.
    #[must_use]
    pub fn class(&self, key: &str) -> Option<&Mapping> {
        self.classes.iter().find(|c| c.key() == key)
    }

    /// Looks up a top-level class by key, mutably.
    pub fn class_mut(&mut self, key: &str) -> Option<&mut Mapping> {
        self.classes.iter_mut().find(|c| c.key() == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_class() -> Mapping {
        let mut class = Mapping::class("a/B").with_dst("a/Renamed");
        class.add_child(Mapping::field("f", "I").with_dst("count")).unwrap();
        class.add_child(Mapping::method("m", "()V").with_dst("run")).unwrap();
        class
    }

    #[test]
    fn keys_per_kind() {
        assert_eq!(Mapping::class("a/B$C").key(), "a/B$C");
        assert_eq!(Mapping::field("f", "I").key(), "f:I");
        assert_eq!(Mapping::method("m", "(I)V").key(), "m:(I)V");
        assert_eq!(Mapping::parameter(2, "x").key(), "2:x");
        assert_eq!(Mapping::local(0, "v").key(), "0:v");
    }

    #[test]
    fn empty_dst_resolves_to_src() {
        let m = Mapping::field("f", "I");
        assert_eq!(m.dst(), "");
        assert_eq!(m.dst_or_src(), "f");
    }

    #[test]
    fn complete_dst_builds_nested_chain() {
        let outer = Mapping::class("a/B").with_dst("a/Renamed");
        let inner = Mapping::class("a/B$C").with_dst("Inner");
        let outer_complete = outer.complete_dst(None);
        assert_eq!(outer_complete, "a/Renamed");
        assert_eq!(inner.complete_dst(Some(&outer_complete)), "a/Renamed$Inner");
    }

    #[test]
    fn complete_dst_falls_back_to_full_src() {
        let inner = Mapping::class("a/B$C");
        assert_eq!(inner.complete_dst(Some("a/Renamed")), "a/B$C");
    }

    #[test]
    fn simple_src_strips_package_and_outer() {
        assert_eq!(Mapping::class("a/b/C$D").simple_src(), "D");
        assert_eq!(Mapping::class("a/b/C").simple_src(), "C");
        assert_eq!(Mapping::field("f", "I").simple_src(), "f");
    }

    #[test]
    fn duplicate_class_key_rejected() {
        let mut mappings = Mappings::new("official", "named");
        mappings.add_class(Mapping::class("a/B")).unwrap();
        let err = mappings.add_class(Mapping::class("a/B")).unwrap_err();
        assert_eq!(err, MappingError::DuplicateKey { parent: String::new(), key: "a/B".into() });
    }

    #[test]
    fn duplicate_child_key_rejected() {
        let mut class = Mapping::class("a/B");
        class.add_child(Mapping::field("f", "I")).unwrap();
        let err = class.add_child(Mapping::field("f", "I")).unwrap_err();
        assert_eq!(err, MappingError::DuplicateKey { parent: "a/B".into(), key: "f:I".into() });
    }

    #[test]
    fn same_name_different_desc_is_distinct() {
        let mut class = Mapping::class("a/B");
        class.add_child(Mapping::method("m", "()V")).unwrap();
        assert!(class.add_child(Mapping::method("m", "(I)V")).is_ok());
    }

    #[test]
    fn illegal_children_rejected() {
        let mut class = Mapping::class("a/B");
        let err = class.add_child(Mapping::parameter(0, "p")).unwrap_err();
        assert_eq!(
            err,
            MappingError::InvalidChild {
                parent: MappingKind::Class,
                child: MappingKind::Parameter
            }
        );

        let mut field = Mapping::field("f", "I");
        assert!(field.add_child(Mapping::field("g", "I")).is_err());

        let mut method = Mapping::method("m", "()V");
        assert!(method.add_child(Mapping::class("a/C")).is_err());
        assert!(method.add_child(Mapping::parameter(1, "p")).is_ok());
        assert!(method.add_child(Mapping::local(1, "v")).is_ok());
    }

    #[test]
    fn top_level_must_be_a_class() {
        let mut mappings = Mappings::new("official", "named");
        let err = mappings.add_class(Mapping::field("f", "I")).unwrap_err();
        assert_eq!(err, MappingError::NotAClass(MappingKind::Field));
    }

    #[test]
    fn lookup_by_key() {
        let class = sample_class();
        assert!(class.child("f:I").is_some());
        assert!(class.child("m:()V").is_some());
        assert!(class.child("missing:I").is_none());
    }

    #[test]
    fn children_keep_insertion_order() {
        let mut class = Mapping::class("a/B");
        class.add_child(Mapping::method("b", "()V")).unwrap();
        class.add_child(Mapping::field("a", "I")).unwrap();
        class.add_child(Mapping::method("a", "()V")).unwrap();

        let keys: Vec<String> = class.children().iter().map(Mapping::key).collect();
        assert_eq!(keys, vec!["b:()V", "a:I", "a:()V"]);

        let methods: Vec<String> =
            class.children_of(MappingKind::Method).map(Mapping::key).collect();
        assert_eq!(methods, vec!["b:()V", "a:()V"]);
    }
}

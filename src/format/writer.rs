//! Serialization of the tree model back into mapping files.

use std::path::Path;

use super::FormatError;
use crate::mappings::{Mapping, MappingKind, Mappings};

/// Serializes a model and writes it to `path`.
///
/// # Errors
///
/// Returns [`FormatError::Write`] if the file cannot be written.
pub fn write_file(mappings: &Mappings, path: &Path) -> Result<(), FormatError> {
    std::fs::write(path, serialize(mappings)).map_err(|source| FormatError::Write {
        path: path.display().to_string(),
        source,
    })
}

/// Serializes a model into the line format.
///
/// Child ordering is preserved as the model enumerates it, except that a
/// class's nested classes are emitted after its fields and methods: member
/// lines attach to the most recent class line, so nested classes cannot be
/// interleaved.
#[must_use]
pub fn serialize(mappings: &Mappings) -> String {
    let mut lines = vec![format!(
        "tiny\t2\t0\t{}\t{}",
        mappings.src_namespace(),
        mappings.dst_namespace()
    )];
    for class in mappings.classes() {
        write_class(class, None, &mut lines);
    }
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn write_class(class: &Mapping, enclosing: Option<&str>, lines: &mut Vec<String>) {
    let complete = class.complete_dst(enclosing);
    lines.push(format!("c\t{}\t{}", class.src(), complete));
    if !class.javadoc().is_empty() {
        lines.push(format!("\tc\t{}", class.javadoc()));
    }
    for member in class.children().iter().filter(|c| c.kind() != MappingKind::Class) {
        write_member(member, lines);
    }
    for nested in class.children_of(MappingKind::Class) {
        write_class(nested, Some(&complete), lines);
    }
}

fn write_member(member: &Mapping, lines: &mut Vec<String>) {
    let token = if member.kind() == MappingKind::Field { "f" } else { "m" };
    lines.push(format!(
        "\t{token}\t{}\t{}\t{}",
        member.desc(),
        member.src(),
        member.dst_or_src()
    ));
    if !member.javadoc().is_empty() {
        lines.push(format!("\t\tc\t{}", member.javadoc()));
    }
    for var in member.children() {
        let token = if var.is_local() { "v" } else { "p" };
        lines.push(format!(
            "\t\t{token}\t{}\t{}\t{}",
            var.index().unwrap_or_default(),
            var.src(),
            var.dst()
        ));
        if !var.javadoc().is_empty() {
            lines.push(format!("\t\t\tc\t{}", var.javadoc()));
        }
    }
}

//! Parsing of mapping files into the tree model.

use std::collections::HashMap;
use std::path::Path;

use super::FormatError;
use crate::mappings::{Mapping, Mappings};

/// Reads and parses one mapping file.
///
/// # Errors
///
/// Returns [`FormatError::Read`] if the file cannot be read, otherwise any
/// error of [`parse`].
pub fn read_file(path: &Path) -> Result<Mappings, FormatError> {
    let text = std::fs::read_to_string(path).map_err(|source| FormatError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse(&text)
}

/// Parses the text of one mapping file.
///
/// Every node is fully populated before the model is returned; on any
/// malformed line the whole parse fails with a line-numbered error.
///
/// # Errors
///
/// Returns [`FormatError::Parse`] for lines that do not conform to the
/// format and [`FormatError::Model`] for lines that describe an illegal
/// model mutation, such as a duplicate sibling key.
pub fn parse(text: &str) -> Result<Mappings, FormatError> {
    let mut lines = text.lines().enumerate();

    let header = lines
        .next()
        .map(|(_, l)| l)
        .ok_or_else(|| parse_error(1, "missing header", ""))?;
    let fields: Vec<&str> = header.split('\t').collect();
    if fields.len() != 5 || fields[0] != "tiny" || fields[1] != "2" || fields[2] != "0" {
        return Err(parse_error(1, "malformed header", header));
    }
    let mut mappings = Mappings::new(fields[3], fields[4]);

    // Key paths of every class seen so far, by full source name; nested
    // class lines attach through this table.
    let mut class_paths: HashMap<String, Vec<String>> = HashMap::new();
    let mut class_path: Vec<String> = Vec::new();
    let mut member_key: Option<String> = None;
    let mut leaf_key: Option<String> = None;

    for (i, line) in lines {
        let number = i + 1;
        let indent = line.chars().take_while(|&c| c == '\t').count();
        let body = &line[indent..];
        let fields: Vec<&str> = body.split('\t').collect();

        match (fields[0], indent) {
            ("c", 0) => {
                if fields.len() != 3 || fields[1].is_empty() {
                    return Err(parse_error(number, "malformed class line", line));
                }
                let src = fields[1];
                let written_dst = fields[2];

                let parent_path = match src.rfind('$') {
                    Some(pos) => {
                        let enclosing = &src[..pos];
                        Some(class_paths.get(enclosing).cloned().ok_or_else(|| {
                            parse_error(number, "enclosing class has not been defined", line)
                        })?)
                    }
                    None => None,
                };
                // The written target is fully qualified; nested classes
                // store only the simple inner name.
                let dst = match parent_path {
                    Some(_) => written_dst.rsplit('$').next().unwrap_or(written_dst),
                    None => written_dst,
                };

                let class = Mapping::class(src).with_dst(dst);
                let key = class.key();
                match parent_path {
                    Some(path) => {
                        let parent = class_at(&mut mappings, &path).ok_or_else(|| {
                            parse_error(number, "enclosing class has not been defined", line)
                        })?;
                        parent
                            .add_child(class)
                            .map_err(|source| FormatError::Model { line: number, source })?;
                        let mut full = path;
                        full.push(key);
                        class_paths.insert(src.to_string(), full.clone());
                        class_path = full;
                    }
                    None => {
                        mappings
                            .add_class(class)
                            .map_err(|source| FormatError::Model { line: number, source })?;
                        class_paths.insert(src.to_string(), vec![key.clone()]);
                        class_path = vec![key];
                    }
                }
                member_key = None;
                leaf_key = None;
            }
            ("f" | "m", 1) => {
                if fields.len() != 4 || fields[2].is_empty() {
                    return Err(parse_error(number, "malformed member line", line));
                }
                let mapping = if fields[0] == "f" {
                    Mapping::field(fields[2], fields[1])
                } else {
                    Mapping::method(fields[2], fields[1])
                }
                .with_dst(fields[3]);
                let key = mapping.key();

                let class = class_at(&mut mappings, &class_path)
                    .ok_or_else(|| parse_error(number, "member line before any class", line))?;
                class
                    .add_child(mapping)
                    .map_err(|source| FormatError::Model { line: number, source })?;
                member_key = Some(key);
                leaf_key = None;
            }
            ("p" | "v", 2) => {
                if fields.len() != 4 || fields[2].is_empty() {
                    return Err(parse_error(number, "malformed variable line", line));
                }
                let index: u32 = fields[1]
                    .parse()
                    .map_err(|_| parse_error(number, "invalid ordinal index", line))?;
                let mapping = if fields[0] == "p" {
                    Mapping::parameter(index, fields[2])
                } else {
                    Mapping::local(index, fields[2])
                }
                .with_dst(fields[3]);
                let key = mapping.key();

                let method = member_key
                    .as_ref()
                    .and_then(|mk| {
                        class_at(&mut mappings, &class_path).and_then(|c| c.child_mut(mk))
                    })
                    .ok_or_else(|| {
                        parse_error(number, "variable line before any method", line)
                    })?;
                method
                    .add_child(mapping)
                    .map_err(|source| FormatError::Model { line: number, source })?;
                leaf_key = Some(key);
            }
            ("c", 1..=3) => {
                let text = fields[1..].join("\t");
                let owner = match indent {
                    1 => class_at(&mut mappings, &class_path),
                    2 => member_key.as_ref().and_then(|mk| {
                        class_at(&mut mappings, &class_path).and_then(|c| c.child_mut(mk))
                    }),
                    _ => member_key.as_ref().zip(leaf_key.as_ref()).and_then(|(mk, lk)| {
                        class_at(&mut mappings, &class_path)
                            .and_then(|c| c.child_mut(mk))
                            .and_then(|m| m.child_mut(lk))
                    }),
                };
                owner
                    .ok_or_else(|| parse_error(number, "comment line without an owner", line))?
                    .set_javadoc(&text);
            }
            _ => return Err(parse_error(number, "unrecognized line", line)),
        }
    }

    Ok(mappings)
}

fn parse_error(line: usize, msg: &str, raw: &str) -> FormatError {
    FormatError::Parse { line, msg: msg.to_string(), raw: raw.to_string() }
}

/// Navigates to the class at a key path, from the top level down.
fn class_at<'a>(mappings: &'a mut Mappings, path: &[String]) -> Option<&'a mut Mapping> {
    let (first, rest) = path.split_first()?;
    let mut node = mappings.class_mut(first)?;
    for key in rest {
        node = node.child_mut(key)?;
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappings::MappingKind;

    const SAMPLE: &str = "tiny\t2\t0\tofficial\tnamed\n\
        c\ta/B\ta/Renamed\n\
        \tc\tThe main class.\n\
        \tf\tI\tf0\tcount\n\
        \tm\t(I)V\tm0\trun\n\
        \t\tp\t1\tp0\tamount\n\
        \t\tv\t0\tv0\ttotal\n\
        c\ta/B$C\ta/Renamed$Inner\n\
        c\tx/Y\tx/Y\n";

    #[test]
    fn parses_a_complete_document() {
        let mappings = parse(SAMPLE).unwrap();
        assert_eq!(mappings.src_namespace(), "official");
        assert_eq!(mappings.dst_namespace(), "named");
        assert_eq!(mappings.classes().len(), 2);

        let class = mappings.class("a/B").unwrap();
        assert_eq!(class.dst(), "a/Renamed");
        assert_eq!(class.javadoc(), "The main class.");

        let field = class.child("f0:I").unwrap();
        assert_eq!(field.kind(), MappingKind::Field);
        assert_eq!(field.dst(), "count");

        let method = class.child("m0:(I)V").unwrap();
        assert_eq!(method.child("1:p0").unwrap().dst(), "amount");
        assert_eq!(method.child("0:v0").unwrap().kind(), MappingKind::Local);

        let nested = class.child("a/B$C").unwrap();
        assert_eq!(nested.dst(), "Inner");
        assert_eq!(nested.complete_dst(Some("a/Renamed")), "a/Renamed$Inner");
    }

    #[test]
    fn same_as_source_target_is_stored_as_written() {
        let mappings = parse(SAMPLE).unwrap();
        let class = mappings.class("x/Y").unwrap();
        assert_eq!(class.dst(), "x/Y");
        assert_eq!(class.dst_or_src(), "x/Y");
    }

    #[test]
    fn rejects_malformed_header() {
        let err = parse("tiny\t1\t0\ta\tb\n").unwrap_err();
        assert!(matches!(err, FormatError::Parse { line: 1, .. }));
    }

    #[test]
    fn rejects_nested_class_without_enclosing() {
        let text = "tiny\t2\t0\ta\tb\nc\ta/B$C\ta/B$C\n";
        let err = parse(text).unwrap_err();
        assert!(matches!(err, FormatError::Parse { line: 2, .. }));
    }

    #[test]
    fn rejects_member_before_any_class() {
        let text = "tiny\t2\t0\ta\tb\n\tf\tI\tf0\tcount\n";
        let err = parse(text).unwrap_err();
        assert!(matches!(err, FormatError::Parse { line: 2, .. }));
    }

    #[test]
    fn rejects_invalid_ordinal_index() {
        let text = "tiny\t2\t0\ta\tb\nc\ta/B\ta/B\n\tm\t()V\tm0\trun\n\t\tp\tx\tp0\tq\n";
        let err = parse(text).unwrap_err();
        assert!(matches!(err, FormatError::Parse { line: 4, .. }));
    }

    #[test]
    fn rejects_duplicate_sibling_keys() {
        let text = "tiny\t2\t0\ta\tb\nc\ta/B\ta/B\nc\ta/B\ta/B\n";
        let err = parse(text).unwrap_err();
        assert!(matches!(err, FormatError::Model { line: 3, .. }));
    }
}

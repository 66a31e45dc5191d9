//! Struct tag precedence and export filtering.

use std::collections::BTreeMap;

use log::debug;

use crate::model::{Composition, Field, FlowTag, RecordType};

/// Marker in the `json` sub-tag that removes a field from serialization.
pub const OMIT_MARKER: &str = "-";

/// Separator between the name and type halves of a `flow` sub-tag.
const FLOW_SEPARATOR: char = '.';

/// Look up `key` in a Go struct tag.
///
/// Follows the `reflect.StructTag` convention: space separated `key:"value"`
/// pairs, values are double-quoted Go strings. Parsing stops at the first
/// malformed pair.
pub fn lookup_tag(tag: &str, key: &str) -> Option<String> {
    let mut rest = tag;
    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            return None;
        }

        let name_len = rest
            .find(|c: char| c <= ' ' || c == ':' || c == '"' || c == '\u{7f}')
            .unwrap_or(rest.len());
        if name_len == 0 || !rest[name_len..].starts_with(":\"") {
            return None;
        }
        let name = &rest[..name_len];
        rest = &rest[name_len + 1..];

        let (value, after) = split_quoted(rest)?;
        if name == key {
            return Some(value);
        }
        rest = after;
    }
}

/// Split a leading double-quoted string off `s`, returning its unescaped
/// contents and the remainder.
fn split_quoted(s: &str) -> Option<(String, &str)> {
    let body = s.strip_prefix('"')?;
    let mut value = String::new();
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((value, &body[i + 1..])),
            '\\' => {
                let (_, escaped) = chars.next()?;
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    other => other,
                });
            }
            c => value.push(c),
        }
    }
    None
}

/// The name half of the `json` sub-tag, or `None` when there is no `json` key.
pub fn json_name(tag: &str) -> Option<String> {
    lookup_tag(tag, "json").map(|value| match value.split_once(',') {
        Some((name, _)) => name.to_string(),
        None => value,
    })
}

/// True when the `json` sub-tag is the omit marker.
pub fn is_omitted(tag: &str) -> bool {
    lookup_tag(tag, "json").is_some_and(|value| value == OMIT_MARKER)
}

/// Parse a `flow` sub-tag value of the form `name`, `name.Type` or `.Type`.
///
/// Any other number of parts is malformed and yields no override.
pub fn parse_flow_tag(value: &str) -> FlowTag {
    let parts: Vec<&str> = value.split(FLOW_SEPARATOR).collect();
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
    match parts.as_slice() {
        [name] => FlowTag {
            name: non_empty(*name),
            ty: None,
        },
        [name, ty] => FlowTag {
            name: non_empty(*name),
            ty: non_empty(*ty),
        },
        _ => FlowTag::default(),
    }
}

/// Go's export rule: the first character must not be lower-case.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| !c.is_lowercase())
}

/// Drop unexported records and resolve the tags of every remaining field.
pub fn apply(records: &mut BTreeMap<String, RecordType>) {
    records.retain(|name, _| {
        let keep = is_exported(name);
        if !keep {
            debug!("dropping unexported record `{name}`");
        }
        keep
    });
    for record in records.values_mut() {
        apply_fields(&mut record.fields);
    }
}

/// Resolve tags in place, recursing into nested anonymous structs.
pub fn apply_fields(fields: &mut Vec<Field>) {
    fields.retain(|f| f.embed_target().is_some() || is_exported(&f.name));
    for field in fields.iter_mut() {
        if let Composition::Embedded { .. } = field.composition {
            continue;
        }
        field.tags.json = json_name(&field.tags.original).unwrap_or_default();
        field.tags.flow = lookup_tag(&field.tags.original, "flow")
            .map(|value| parse_flow_tag(&value))
            .unwrap_or_default();
        if field.composition == Composition::NestedRecord {
            apply_fields(&mut field.children);
        }
    }
}

//! Documentation comments and the directives they carry.
//!
//! Go doc comments conventionally start with the name of the declaration
//! they document, so comment groups are indexed by their first word.

use std::collections::BTreeMap;

/// Skip the declaration entirely.
pub const IGNORE_DIRECTIVE: &str = "@flowignore";

/// Emit the record as an exact object type, `{| ... |}`.
pub const STRICT_DIRECTIVE: &str = "@strict";

/// Comment groups keyed by their first word.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentIndex {
    groups: BTreeMap<String, String>,
}

impl CommentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a comment group's text by its first word.
    ///
    /// A later group with the same first word replaces the earlier one.
    pub fn insert(&mut self, text: impl Into<String>) {
        let text = text.into();
        let Some(key) = first_word(&text) else {
            return;
        };
        self.groups.insert(key.to_string(), text);
    }

    /// Merge another index into this one. Entries from `other` win.
    pub fn extend(&mut self, other: CommentIndex) {
        self.groups.extend(other.groups);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.groups.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.get(name).is_some_and(|c| c.contains(IGNORE_DIRECTIVE))
    }

    pub fn is_strict(&self, name: &str) -> bool {
        self.get(name).is_some_and(|c| c.contains(STRICT_DIRECTIVE))
    }

    /// Render the comment for `name` as `//` lines.
    ///
    /// Directive words are removed, lines left empty by that are dropped and
    /// trailing blank lines trimmed. Returns `None` when nothing is left.
    pub fn doc_comment(&self, name: &str) -> Option<String> {
        let text = self.get(name)?;
        let mut lines: Vec<String> = text
            .lines()
            .map(str::trim_end)
            .filter_map(strip_directives)
            .collect();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        if lines.is_empty() {
            return None;
        }

        let rendered: Vec<String> = lines
            .iter()
            .map(|line| {
                if line.is_empty() {
                    "//".to_string()
                } else {
                    format!("// {line}")
                }
            })
            .collect();
        Some(rendered.join("\n"))
    }
}

fn first_word(text: &str) -> Option<&str> {
    text.split_whitespace().next()
}

fn is_directive(word: &str) -> bool {
    word == IGNORE_DIRECTIVE || word == STRICT_DIRECTIVE
}

/// Remove directive words from a comment line. A line holding nothing but
/// directives is dropped.
fn strip_directives(line: &str) -> Option<String> {
    if !line.split_whitespace().any(is_directive) {
        return Some(line.to_string());
    }
    let kept: Vec<&str> = line.split_whitespace().filter(|w| !is_directive(w)).collect();
    (!kept.is_empty()).then(|| kept.join(" "))
}

/// Strip the markers from a single `//` or `/* */` comment.
pub(crate) fn comment_lines(raw: &str) -> Vec<String> {
    if let Some(body) = raw.strip_prefix("//") {
        return vec![strip_one_space(body).trim_end().to_string()];
    }
    let body = raw
        .strip_prefix("/*")
        .and_then(|b| b.strip_suffix("*/"))
        .unwrap_or(raw);
    body.lines()
        .map(|line| strip_one_space(line).trim_end().to_string())
        .collect()
}

/// Join the lines of a comment group into its text.
///
/// Leading and trailing blank lines are removed and runs of blank lines
/// collapse into one.
pub(crate) fn group_text(lines: &[String]) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.is_empty() && out.last().is_none_or(|l: &&str| l.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

/// Compiler directives such as `//go:generate` are not documentation.
pub(crate) fn is_compiler_directive(raw: &str) -> bool {
    let Some(body) = raw.strip_prefix("//") else {
        return false;
    };
    if ["line ", "extern ", "export "]
        .iter()
        .any(|prefix| body.starts_with(prefix))
    {
        return true;
    }
    match body.split_once(':') {
        Some((head, tail)) => {
            !head.is_empty()
                && head
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
                && tail
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        }
        None => false,
    }
}

fn strip_one_space(s: &str) -> &str {
    s.strip_prefix(' ').unwrap_or(s)
}

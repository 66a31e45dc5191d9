//! The resolved type model shared by every pipeline stage.

use crate::comments::CommentIndex;
use crate::types::GoType;

/// Override parsed from the `flow:"name.Type"` struct tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowTag {
    pub name: Option<String>,
    pub ty: Option<String>,
}

/// Struct tag data attached to a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    /// The raw tag, without its string delimiters.
    pub original: String,
    /// Name from the `json` sub-tag, empty when absent.
    pub json: String,
    pub flow: FlowTag,
}

/// How a field participates in its record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Composition {
    Plain,
    /// An anonymous field whose fields are spliced in from `target`.
    Embedded { target: String },
    /// A field typed with an anonymous `struct { ... }`.
    NestedRecord,
}

/// One attribute of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Go identifier. Empty for embedded fields.
    pub name: String,
    /// Type spelling exactly as written in source.
    pub declared_type: String,
    pub shape: GoType,
    /// Flow spelling, filled in by type conversion.
    pub canonical_type: String,
    /// Trailing comment on the same line.
    pub comment: Option<String>,
    pub tags: Tags,
    pub composition: Composition,
    /// Fields of a nested anonymous struct.
    pub children: Vec<Field>,
}

impl Field {
    /// Create a plain field with an unresolved tag.
    pub fn new(
        name: impl Into<String>,
        declared_type: impl Into<String>,
        shape: GoType,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            shape,
            canonical_type: String::new(),
            comment: None,
            tags: Tags {
                original: tag.into(),
                ..Tags::default()
            },
            composition: Composition::Plain,
            children: Vec::new(),
        }
    }

    /// Create an embedded field referencing the record `target`.
    pub fn embedded(target: impl Into<String>) -> Self {
        let target = target.into();
        Self {
            name: String::new(),
            declared_type: target.clone(),
            shape: GoType::Named(target.clone()),
            canonical_type: String::new(),
            comment: None,
            tags: Tags::default(),
            composition: Composition::Embedded { target },
            children: Vec::new(),
        }
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }

    /// The record this field embeds, if any.
    pub fn embed_target(&self) -> Option<&str> {
        match &self.composition {
            Composition::Embedded { target } => Some(target),
            _ => None,
        }
    }

    /// Name used in the generated document: the `flow` override, otherwise
    /// the `json` name. The Go identifier is never used.
    pub fn emitted_name(&self) -> &str {
        self.tags
            .flow
            .name
            .as_deref()
            .unwrap_or(self.tags.json.as_str())
    }

    /// Type used in the generated document: the `flow` override, otherwise
    /// the converted type.
    pub fn emitted_type(&self) -> &str {
        self.tags
            .flow
            .ty
            .as_deref()
            .unwrap_or(self.canonical_type.as_str())
    }
}

/// A Go struct declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordType {
    pub name: String,
    /// Fields in source declaration order.
    pub fields: Vec<Field>,
    pub is_strict: bool,
    pub is_ignored: bool,
}

impl RecordType {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
            is_strict: false,
            is_ignored: false,
        }
    }
}

/// A named non-struct declaration: map, slice or any other derived type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasType {
    pub name: String,
    pub declared_type: String,
    pub shape: GoType,
    pub canonical_type: String,
}

impl AliasType {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>, shape: GoType) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            shape,
            canonical_type: String::new(),
        }
    }
}

/// Everything extracted from a single source file.
///
/// Each file is processed independently; the results are merged into the
/// [`CodeGenerator`](crate::CodeGenerator) afterwards.
#[derive(Debug, Clone, Default)]
pub struct FileModel {
    pub records: Vec<RecordType>,
    pub aliases: Vec<AliasType>,
    pub comments: CommentIndex,
}

//! Go source parser that extracts struct and named type declarations.
//!
//! Source files are parsed with tree-sitter's Go grammar. Each file is handled
//! independently and yields a [`FileModel`]:
//!
//! - `type X struct { ... }` becomes a record with its resolved fields
//! - `type X map[K]V`, `type X []T` and any other named type become aliases
//! - interfaces are skipped
//! - every comment group is indexed by its first word
//!
//! Field resolution drops fields without a `json` tag, fields tagged
//! `json:"-"`, and anonymous fields that are not a bare type name.

use crate::CodeGenerator;
use crate::comments::{self, CommentIndex};
use crate::error::{Error, Result};
use crate::model::{AliasType, Composition, Field, FileModel, RecordType};
use crate::policy;
use crate::types::GoType;
use log::{debug, warn};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser};
use walkdir::WalkDir;

fn go_parser() -> Result<Parser> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_go::LANGUAGE.into())?;
    Ok(parser)
}

fn node_text<'s>(node: Node, source: &'s str) -> &'s str {
    &source[node.byte_range()]
}

/// Parse one Go source file into its records, aliases and comments.
pub(crate) fn parse_source(path: &Path, source: &str) -> Result<FileModel> {
    let mut parser = go_parser()?;
    let syntax_error = || Error::Syntax {
        path: path.to_path_buf(),
    };
    let tree = parser.parse(source, None).ok_or_else(syntax_error)?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(syntax_error());
    }

    let mut model = FileModel {
        comments: index_comments(root, source),
        ..FileModel::default()
    };

    let mut cursor = root.walk();
    for decl in root.named_children(&mut cursor) {
        if decl.kind() != "type_declaration" {
            continue;
        }
        let mut specs = decl.walk();
        for spec in decl.named_children(&mut specs) {
            // `type A = B` is treated like `type A B`
            if matches!(spec.kind(), "type_spec" | "type_alias") {
                extract_type_spec(spec, source, &mut model);
            }
        }
    }

    Ok(model)
}

fn read_source(path: &Path) -> Result<FileModel> {
    let source = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_source(path, &source)
}

fn extract_type_spec(spec: Node, source: &str, model: &mut FileModel) {
    let (Some(name), Some(ty)) = (
        spec.child_by_field_name("name"),
        spec.child_by_field_name("type"),
    ) else {
        return;
    };
    let name = node_text(name, source).to_string();

    match ty.kind() {
        "struct_type" => {
            let fields = resolve_fields(ty, source);
            model.records.push(RecordType::new(name, fields));
        }
        "interface_type" => debug!("skipping interface `{name}`"),
        _ => {
            let alias = AliasType::new(name, node_text(ty, source), parse_type(ty, source));
            model.aliases.push(alias);
        }
    }
}

/// Resolve the field list of a `struct_type` node, in declaration order.
fn resolve_fields(struct_type: Node, source: &str) -> Vec<Field> {
    let mut cursor = struct_type.walk();
    let Some(list) = struct_type
        .named_children(&mut cursor)
        .find(|n| n.kind() == "field_declaration_list")
    else {
        return Vec::new();
    };

    let mut cursor = list.walk();
    list.named_children(&mut cursor)
        .filter(|n| n.kind() == "field_declaration")
        .filter_map(|decl| resolve_field(decl, source))
        .collect()
}

fn resolve_field(decl: Node, source: &str) -> Option<Field> {
    let ty = decl.child_by_field_name("type")?;
    let comment = trailing_comment(decl, source);

    // `A, B string` declares two fields; only the first name is used
    let mut cursor = decl.walk();
    let name = decl
        .children_by_field_name("name", &mut cursor)
        .next()
        .map(|n| node_text(n, source).to_string());
    let Some(name) = name else {
        return embedded_field(decl, ty, source).map(|f| f.with_comment(comment));
    };

    let Some(tag) = decl
        .child_by_field_name("tag")
        .map(|t| tag_literal(node_text(t, source)))
    else {
        debug!("dropping untagged field `{name}`");
        return None;
    };
    if policy::json_name(&tag).is_none() || policy::is_omitted(&tag) {
        debug!("dropping field `{name}` without a json name");
        return None;
    }

    let mut field = Field::new(name, node_text(ty, source), parse_type(ty, source), tag)
        .with_comment(comment);
    if ty.kind() == "struct_type" {
        field.composition = Composition::NestedRecord;
        field.children = resolve_fields(ty, source);
    }
    Some(field)
}

/// An anonymous field is only supported when it names a local type.
fn embedded_field(decl: Node, ty: Node, source: &str) -> Option<Field> {
    let mut cursor = decl.walk();
    let is_pointer = decl.children(&mut cursor).any(|c| c.kind() == "*");
    if ty.kind() == "type_identifier" && !is_pointer {
        return Some(Field::embedded(node_text(ty, source)));
    }
    warn!(
        "unsupported embedded field `{}`, skipping",
        node_text(decl, source).trim()
    );
    None
}

fn trailing_comment(decl: Node, source: &str) -> Option<String> {
    let row = decl.end_position().row;
    let comment = decl
        .next_named_sibling()
        .filter(|n| n.kind() == "comment" && n.start_position().row == row)?;
    let text = comments::comment_lines(node_text(comment, source)).join(" ");
    (!text.is_empty()).then_some(text)
}

/// Strip the delimiters from a raw (`` ` ``) or interpreted (`"`) tag literal.
fn tag_literal(raw: &str) -> String {
    if let Some(body) = raw.strip_prefix('`').and_then(|r| r.strip_suffix('`')) {
        return body.to_string();
    }
    let Some(body) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) else {
        return raw.to_string();
    };
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match (c, chars.clone().next()) {
            ('\\', Some(next @ ('"' | '\\'))) => {
                out.push(next);
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}

/// Convert a type node into its structured shape.
fn parse_type(node: Node, source: &str) -> GoType {
    let verbatim = || GoType::Other(node_text(node, source).to_string());
    match node.kind() {
        "type_identifier" => GoType::named(node_text(node, source)),
        "qualified_type" => match (
            node.child_by_field_name("package"),
            node.child_by_field_name("name"),
        ) {
            (Some(package), Some(name)) => {
                GoType::qualified(node_text(package, source), node_text(name, source))
            }
            _ => verbatim(),
        },
        "pointer_type" => node
            .named_child(0)
            .map(|inner| GoType::pointer(parse_type(inner, source)))
            .unwrap_or_else(verbatim),
        "slice_type" | "array_type" | "implicit_length_array_type" => node
            .child_by_field_name("element")
            .map(|elem| GoType::slice(parse_type(elem, source)))
            .unwrap_or_else(verbatim),
        "map_type" => match (
            node.child_by_field_name("key"),
            node.child_by_field_name("value"),
        ) {
            (Some(key), Some(value)) => {
                GoType::map(parse_type(key, source), parse_type(value, source))
            }
            _ => verbatim(),
        },
        "parenthesized_type" => node
            .named_child(0)
            .map(|inner| parse_type(inner, source))
            .unwrap_or_else(verbatim),
        "interface_type" => GoType::Interface,
        "struct_type" => GoType::Struct,
        // function, channel and generic types
        _ => verbatim(),
    }
}

/// All comment nodes in document order.
fn comment_nodes<'t>(root: Node<'t>) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.kind() == "comment" {
            out.push(node);
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    out
}

/// Group comments on adjacent lines with nothing but whitespace between
/// them, and index each group.
///
/// A comment that follows code on its line only groups with comments on that
/// same line.
fn index_comments(root: Node, source: &str) -> CommentIndex {
    let mut index = CommentIndex::new();
    let mut group: Vec<String> = Vec::new();
    let mut previous: Option<Node> = None;
    let mut trailing_group = false;

    for node in comment_nodes(root) {
        let row = node.start_position().row;
        let line_start = source[..node.start_byte()].rfind('\n').map_or(0, |i| i + 1);
        let follows_code = !source[line_start..node.start_byte()].trim().is_empty();

        let adjacent = previous.is_some_and(|prev| {
            let prev_row = prev.end_position().row;
            let between = source[prev.end_byte()..node.start_byte()].trim().is_empty();
            if !between {
                false
            } else if prev_row == row {
                true
            } else {
                !follows_code && !trailing_group && row == prev_row + 1
            }
        });
        if !adjacent {
            if !group.is_empty() {
                index.insert(comments::group_text(&group));
                group.clear();
            }
            trailing_group = follows_code;
        }

        let raw = node_text(node, source);
        if !comments::is_compiler_directive(raw) {
            group.extend(comments::comment_lines(raw));
        }
        previous = Some(node);
    }
    if !group.is_empty() {
        index.insert(comments::group_text(&group));
    }

    index
}

fn is_go_source(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".go") && !n.contains("_test"))
}

/// List the Go source files under `dir`, sorted by path.
///
/// Test files (`*_test.go`) are excluded. When `recursive` is false only the
/// direct children of `dir` are considered.
pub fn discover_sources(dir: impl AsRef<Path>, recursive: bool) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut walker = WalkDir::new(dir).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| Error::Discovery {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && is_go_source(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

impl CodeGenerator {
    /// Parse a single Go source file and extract its type declarations.
    ///
    /// A file that cannot be read or parsed is recorded in
    /// [`failures`](CodeGenerator::failures) and otherwise ignored.
    pub fn add_source_file(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.add_source_files([path.as_ref()])
    }

    /// Parse Go source from a string. `name` is only used in diagnostics.
    pub fn add_source_str(&mut self, name: impl AsRef<Path>, source: &str) -> &mut Self {
        match parse_source(name.as_ref(), source) {
            Ok(model) => self.merge(model),
            Err(err) => self.record_failure(err),
        }
        self
    }

    /// Parse many Go source files in parallel.
    ///
    /// Every file is parsed on its own; results are merged once all of them
    /// are done, in path order, so the outcome does not depend on scheduling.
    pub fn add_source_files<I, P>(&mut self, paths: I) -> &mut Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut paths: Vec<PathBuf> = paths
            .into_iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect();
        paths.sort();
        paths.dedup();

        let results: Vec<Result<FileModel>> =
            paths.par_iter().map(|path| read_source(path)).collect();

        for result in results {
            match result {
                Ok(model) => self.merge(model),
                Err(err) => self.record_failure(err),
            }
        }
        self
    }

    /// Scan a directory for `.go` files and extract their type declarations.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # fn main() -> goflow_codegen::Result<()> {
    /// use goflow_codegen::CodeGenerator;
    ///
    /// let mut generator = CodeGenerator::new();
    /// generator.add_source_dir("models/", true)?;
    /// generator.write_to_file("models.js")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn add_source_dir(&mut self, path: impl AsRef<Path>, recursive: bool) -> Result<&mut Self> {
        let files = discover_sources(path, recursive)?;
        debug!("discovered {} go files", files.len());
        Ok(self.add_source_files(files))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn parse(source: &str) -> FileModel {
        parse_source(Path::new("test.go"), source).unwrap()
    }

    fn record<'a>(model: &'a FileModel, name: &str) -> &'a RecordType {
        model.records.iter().find(|r| r.name == name).unwrap()
    }

    fn alias<'a>(model: &'a FileModel, name: &str) -> &'a AliasType {
        model.aliases.iter().find(|a| a.name == name).unwrap()
    }

    #[test]
    fn test_classifies_declarations() {
        let model = parse(indoc! {r#"
            package models

            type Person struct {
                Name string `json:"name"`
            }

            type Payrate int

            type People []Person

            type Lookup map[string]Person

            type Speaker interface {
                Speak() string
            }
        "#});
        assert_eq!(model.records.len(), 1);
        assert_eq!(model.records[0].name, "Person");
        assert_eq!(alias(&model, "Payrate").shape, GoType::named("int"));
        assert_eq!(
            alias(&model, "People").shape,
            GoType::slice(GoType::named("Person"))
        );
        assert_eq!(
            alias(&model, "Lookup").shape,
            GoType::map(GoType::named("string"), GoType::named("Person"))
        );
        assert!(!model.aliases.iter().any(|a| a.name == "Speaker"));
    }

    #[test]
    fn test_grouped_declarations() {
        let model = parse(indoc! {r#"
            package models

            type (
                ID int64
                Tag struct {
                    Label string `json:"label"`
                }
            )

            type Label = Tag

            type Identifier = ID
        "#});
        assert_eq!(alias(&model, "ID").declared_type, "int64");
        assert_eq!(alias(&model, "Label").shape, GoType::named("Tag"));
        assert_eq!(alias(&model, "Identifier").declared_type, "ID");
        assert_eq!(record(&model, "Tag").fields.len(), 1);
    }

    #[test]
    fn test_field_shapes() {
        let model = parse(indoc! {r#"
            package models

            import "time"

            type Person struct {
                Nullable  *string           `json:"nullable"`
                Animals   *[]Animal         `json:"animals"`
                Born      time.Time         `json:"born"`
                Extra     interface{}       `json:"extra"`
                Scores    map[*string]int64 `json:"scores"`
                Fixed     [4]byte           `json:"fixed"`
                Callback  func() string     `json:"callback"`
            }
        "#});
        let fields = &record(&model, "Person").fields;
        let shapes: Vec<&GoType> = fields.iter().map(|f| &f.shape).collect();
        assert_eq!(
            shapes,
            vec![
                &GoType::pointer(GoType::named("string")),
                &GoType::pointer(GoType::slice(GoType::named("Animal"))),
                &GoType::qualified("time", "Time"),
                &GoType::Interface,
                &GoType::map(
                    GoType::pointer(GoType::named("string")),
                    GoType::named("int64")
                ),
                &GoType::slice(GoType::named("byte")),
                &GoType::Other("func() string".to_string()),
            ]
        );
        assert_eq!(fields[0].declared_type, "*string");
    }

    #[test]
    fn test_field_drop_rules() {
        let model = parse(indoc! {r#"
            package models

            type Person struct {
                Name     string `json:"name"`
                Ignore   string `json:"-"`
                NoTag    string
                OtherTag string `db:"other"`
                Fn       func() string
            }
        "#});
        let names: Vec<&str> = record(&model, "Person")
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["Name"]);
    }

    #[test]
    fn test_embedded_fields() {
        let model = parse(indoc! {r#"
            package models

            import "sync"

            type EmbeddedAnimal struct {
                Animal
                *Horse
                sync.Mutex
                Name string `json:"name"`
            }
        "#});
        let fields = &record(&model, "EmbeddedAnimal").fields;
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].embed_target(), Some("Animal"));
        assert_eq!(fields[1].name, "Name");
    }

    #[test]
    fn test_inline_comments() {
        let model = parse(indoc! {r#"
            package models

            type Person struct {
                Name  string   `json:"name"` // This is a name comment
                Age   int      `json:"age"`
                Pets  []Animal `json:"pets"` // I have no pointer
            }
        "#});
        let fields = &record(&model, "Person").fields;
        assert_eq!(fields[0].comment.as_deref(), Some("This is a name comment"));
        assert_eq!(fields[1].comment, None);
        assert_eq!(fields[2].comment.as_deref(), Some("I have no pointer"));
    }

    #[test]
    fn test_nested_anonymous_struct() {
        let model = parse(indoc! {r#"
            package models

            type Person struct {
                Inner struct {
                    Name  string `json:"name"`
                    Child struct {
                        Toys []string `json:"toys"`
                    } `json:"child"`
                } `json:"inner_struct"` // I have a comment in a nested struct
            }
        "#});
        let inner = &record(&model, "Person").fields[0];
        assert_eq!(inner.composition, Composition::NestedRecord);
        assert_eq!(inner.shape, GoType::Struct);
        assert_eq!(
            inner.comment.as_deref(),
            Some("I have a comment in a nested struct")
        );
        assert_eq!(inner.children.len(), 2);
        assert_eq!(inner.children[1].composition, Composition::NestedRecord);
        assert_eq!(inner.children[1].children[0].name, "Toys");
    }

    #[test]
    fn test_comment_index() {
        let model = parse(indoc! {r#"
            package models

            // Animal is anything, but should probably have a master
            // @strict
            type Animal struct {
                Breed string `json:"breed"`
            }

            //go:generate stringer -type=Payrate
            // Payrate should be a number
            type Payrate int
        "#});
        assert_eq!(
            model.comments.get("Animal"),
            Some("Animal is anything, but should probably have a master\n@strict")
        );
        assert_eq!(model.comments.get("Payrate"), Some("Payrate should be a number"));
    }

    #[test]
    fn test_inline_comments_are_separate_groups() {
        let model = parse(indoc! {r#"
            package models

            type Person struct {
                A string `json:"a"` // Alpha first
                B string `json:"b"` // Beta second
            }
        "#});
        assert_eq!(model.comments.get("Alpha"), Some("Alpha first"));
        assert_eq!(model.comments.get("Beta"), Some("Beta second"));
    }

    #[test]
    fn test_trailing_comment_ends_its_group() {
        let model = parse(indoc! {r#"
            package models

            const Version = 2 // Version of the api
            // Secret holds keys
            // @flowignore
            type Secret struct {
                Key string `json:"key"`
            }
        "#});
        assert_eq!(model.comments.get("Version"), Some("Version of the api"));
        assert_eq!(
            model.comments.get("Secret"),
            Some("Secret holds keys\n@flowignore")
        );
    }

    #[test]
    fn test_comments_on_one_line_group_together() {
        let model = parse(indoc! {r#"
            package models

            /* Alpha */ /* beta */
            type Alpha int
        "#});
        assert_eq!(model.comments.get("Alpha"), Some("Alpha\nbeta"));
    }

    #[test]
    fn test_interpreted_tag_literal() {
        assert_eq!(tag_literal(r#""json:\"name\"""#), r#"json:"name""#);
        assert_eq!(tag_literal("`json:\"name\"`"), r#"json:"name""#);
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_source(Path::new("broken.go"), "package models\ntype Person struct {")
            .unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));
    }

    #[test]
    fn test_discover_sources() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(dir.path().join("a.go"), "package a").unwrap();
        fs::write(dir.path().join("a_test.go"), "package a").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::write(nested.join("b.go"), "package b").unwrap();

        let flat = discover_sources(dir.path(), false).unwrap();
        assert_eq!(flat, vec![dir.path().join("a.go")]);

        let all = discover_sources(dir.path(), true).unwrap();
        assert_eq!(all, vec![dir.path().join("a.go"), nested.join("b.go")]);
    }

    #[test]
    fn test_discover_missing_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_sources(dir.path().join("missing"), true).unwrap_err();
        assert!(matches!(err, Error::Discovery { .. }));
    }

    #[test]
    fn test_unreadable_file_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("ok.go"),
            "package m\ntype Ok struct {\n\tA int `json:\"a\"`\n}\n",
        )
        .unwrap();

        let mut generator = CodeGenerator::new();
        generator.add_source_files([dir.path().join("ok.go"), dir.path().join("missing.go")]);
        assert_eq!(generator.failures().len(), 1);
        assert!(generator.failures()[0].is_per_file());
        assert!(generator.records().contains_key("Ok"));
    }
}

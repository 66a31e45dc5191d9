//! Flow code generator for Go type declarations.

use crate::comments::CommentIndex;
use crate::error::{Error, Result};
use crate::flatten::flatten;
use crate::model::{AliasType, Composition, Field, FileModel, RecordType};
use crate::policy;
use crate::registry::TypeRegistry;
use crate::types::FlowType;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// First line of every generated document.
const FLOW_PRAGMA: &str = "//@flow";

const DEFAULT_HEADER: &str = "DO NOT EDIT -- automatically generated by goflow";

const INDENT: &str = "  ";

/// Code generator that collects Go type declarations and outputs Flow types.
#[derive(Debug)]
pub struct CodeGenerator {
    /// Struct declarations: name -> record
    records: BTreeMap<String, RecordType>,

    /// Non-struct declarations: name -> alias
    aliases: BTreeMap<String, AliasType>,

    /// Comment groups from every parsed file
    comments: CommentIndex,

    /// Inputs that could not be read or parsed
    failures: Vec<Error>,

    /// Custom header comment
    header: Option<String>,

    /// Emit nested anonymous structs as inline objects instead of `Object`
    nested_records: bool,

    pub(crate) registry: TypeRegistry,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            aliases: BTreeMap::new(),
            comments: CommentIndex::new(),
            failures: Vec::new(),
            header: None,
            nested_records: false,
            registry: TypeRegistry::with_builtins(),
        }
    }
}

impl CodeGenerator {
    /// Create a new code generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom header comment for the generated file.
    ///
    /// The `//@flow` pragma is always emitted above it.
    pub fn set_header(&mut self, header: impl Into<String>) -> &mut Self {
        self.header = Some(header.into());
        self
    }

    /// Render fields typed with an anonymous `struct { ... }` as inline
    /// objects. When disabled (the default) they are typed `Object`.
    pub fn nested_records(&mut self, enabled: bool) -> &mut Self {
        self.nested_records = enabled;
        self
    }

    /// Map a Go type name to a Flow type, replacing any built-in mapping.
    ///
    /// # Example
    ///
    /// ```
    /// use goflow_codegen::{CodeGenerator, FlowType};
    ///
    /// let mut generator = CodeGenerator::new();
    /// generator.register_type("uuid.UUID", FlowType::String);
    /// generator.register_type("Money", FlowType::named("string"));
    /// ```
    pub fn register_type(&mut self, name: impl Into<String>, ty: FlowType) -> &mut Self {
        self.registry.register(name, ty);
        self
    }

    /// Remove a type mapping, built-in or custom.
    pub fn unregister_type(&mut self, name: &str) -> &mut Self {
        self.registry.unregister(name);
        self
    }

    /// Get a reference to the type registry.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Add a record declaration. A record with the same name is replaced.
    pub fn add_record(&mut self, record: RecordType) -> &mut Self {
        self.records.insert(record.name.clone(), record);
        self
    }

    /// Add an alias declaration. An alias with the same name is replaced.
    pub fn add_alias(&mut self, alias: AliasType) -> &mut Self {
        self.aliases.insert(alias.name.clone(), alias);
        self
    }

    /// Add a documentation comment, keyed by its first word.
    pub fn add_comment(&mut self, text: impl Into<String>) -> &mut Self {
        self.comments.insert(text);
        self
    }

    pub fn records(&self) -> &BTreeMap<String, RecordType> {
        &self.records
    }

    pub fn aliases(&self) -> &BTreeMap<String, AliasType> {
        &self.aliases
    }

    pub fn comments(&self) -> &CommentIndex {
        &self.comments
    }

    /// Inputs skipped because they could not be read or parsed.
    pub fn failures(&self) -> &[Error] {
        &self.failures
    }

    /// Merge the declarations of one file. Later files win on name clashes.
    pub(crate) fn merge(&mut self, model: FileModel) {
        debug!(
            "merging {} records and {} aliases",
            model.records.len(),
            model.aliases.len()
        );
        for record in model.records {
            self.add_record(record);
        }
        for alias in model.aliases {
            self.add_alias(alias);
        }
        self.comments.extend(model.comments);
    }

    pub(crate) fn record_failure(&mut self, err: Error) {
        warn!("skipping input: {err}");
        self.failures.push(err);
    }

    /// Generate the Flow code as a string.
    ///
    /// Fails only when a record embeds itself, directly or through other
    /// records.
    pub fn generate(&self) -> Result<String> {
        let mut records = self.records.clone();
        policy::apply(&mut records);
        for record in records.values_mut() {
            self.registry.convert_fields(&mut record.fields);
            record.is_ignored = self.comments.is_ignored(&record.name);
            record.is_strict = self.comments.is_strict(&record.name);
        }

        let mut aliases = self.aliases.clone();
        for alias in aliases.values_mut() {
            alias.canonical_type = self.registry.convert(&alias.shape).to_flow_type();
        }

        let mut blocks = Vec::new();

        for alias in aliases.values() {
            if self.comments.is_ignored(&alias.name) {
                continue;
            }
            blocks.push(self.generate_alias(alias));
        }

        for record in records.values() {
            if record.is_ignored {
                continue;
            }
            if flatten(&record.name, &record.fields, &records)?.is_empty() {
                debug!("record `{}` has no exportable fields", record.name);
                continue;
            }
            blocks.push(self.generate_record(record, &records)?);
        }

        let mut output = self.generate_header();
        output.push_str(&blocks.join("\n\n"));
        Ok(output.trim_end().to_string() + "\n")
    }

    /// Write the generated code to a file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let code = self.generate()?;
        fs::write(path, code).map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the generated code to a writer.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let code = self.generate()?;
        writer.write_all(code.as_bytes()).map_err(Error::Sink)?;
        writer.flush().map_err(Error::Sink)
    }

    fn generate_header(&self) -> String {
        let mut output = format!("{FLOW_PRAGMA}\n\n");
        let header = self.header.as_deref().unwrap_or(DEFAULT_HEADER);
        for line in header.lines() {
            if line.is_empty() {
                output.push_str("//\n");
            } else {
                output.push_str("// ");
                output.push_str(line);
                output.push('\n');
            }
        }
        output.push('\n');
        output
    }

    fn generate_alias(&self, alias: &AliasType) -> String {
        let mut output = self.doc_comment(&alias.name);
        output.push_str(&format!(
            "export type {} = {}",
            alias.name, alias.canonical_type
        ));
        output
    }

    fn generate_record(
        &self,
        record: &RecordType,
        records: &BTreeMap<String, RecordType>,
    ) -> Result<String> {
        let (open, close) = if record.is_strict {
            ("{|", "|}")
        } else {
            ("{", "}")
        };

        let mut output = self.doc_comment(&record.name);
        output.push_str(&format!("export type {} = {}\n", record.name, open));
        self.render_fields(&mut output, &record.name, &record.fields, 0, records)?;
        output.push_str(close);
        Ok(output)
    }

    fn doc_comment(&self, name: &str) -> String {
        self.comments
            .doc_comment(name)
            .map(|doc| doc + "\n")
            .unwrap_or_default()
    }

    fn render_fields(
        &self,
        output: &mut String,
        owner: &str,
        fields: &[Field],
        level: usize,
        records: &BTreeMap<String, RecordType>,
    ) -> Result<()> {
        for flat in flatten(owner, fields, records)? {
            // fields taken from an embedded record always sit at the top level
            let level = if flat.spliced { 0 } else { level };
            self.render_field(output, owner, flat.field, level, records)?;
        }
        Ok(())
    }

    fn render_field(
        &self,
        output: &mut String,
        owner: &str,
        field: &Field,
        level: usize,
        records: &BTreeMap<String, RecordType>,
    ) -> Result<()> {
        let indent = INDENT.repeat(level + 1);
        let name = field.emitted_name();

        match field.composition {
            Composition::NestedRecord if self.nested_records && field.tags.flow.ty.is_none() => {
                output.push_str(&format!("{indent}{name}: {{\n"));
                self.render_fields(output, owner, &field.children, level + 1, records)?;
                output.push_str(&format!("{indent}}},"));
            }
            _ => output.push_str(&format!("{indent}{name}: {},", field.emitted_type())),
        }

        if let Some(comment) = &field.comment {
            output.push_str("\t// ");
            output.push_str(comment);
        }
        output.push('\n');
        Ok(())
    }
}

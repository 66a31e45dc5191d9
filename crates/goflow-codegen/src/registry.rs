//! Type registry for mapping Go type names to Flow types.
//!
//! The registry is the single place where the generator learns how a Go name
//! is spelled in Flow. Built-in mappings for Go's predeclared types and the
//! `time` package are registered automatically, and users can add or replace
//! mappings.

use std::collections::HashMap;

use crate::model::Field;
use crate::types::{FlowType, GoType};

/// Go's numeric predeclared types. All of them collapse to `number`.
const NUMERIC_TYPES: &[&str] = &[
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
    "byte",
    "rune",
    "float32",
    "float64",
    "complex64",
    "complex128",
];

/// A registry of Go type name -> [`FlowType`] associations.
///
/// Keys are either bare identifiers (`"int"`), package-qualified names
/// (`"time.Time"`), or a package wildcard (`"time.*"`) that matches every
/// qualified name in that package without an exact entry.
///
/// # Built-in mappings
///
/// | Go type | Flow type |
/// |---------|-----------|
/// | `int`..`int64`, `uint`..`uint64`, `uintptr`, `byte`, `rune` | `number` |
/// | `float32`, `float64`, `complex64`, `complex128` | `number` |
/// | `bool` | `boolean` |
/// | `string`, `error` | `string` |
/// | `any` | `Object` |
/// | `time.Time`, `time.Duration`, `time.*` | `string` |
///
/// # Custom mappings
///
/// ```
/// use goflow_codegen::{FlowType, GoType, TypeRegistry};
///
/// let mut registry = TypeRegistry::with_builtins();
/// registry.register("uuid.UUID", FlowType::String);
///
/// let ty = registry.convert(&GoType::pointer(GoType::qualified("uuid", "UUID")));
/// assert_eq!(ty.to_flow_type(), "?string");
/// ```
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    mappings: HashMap<String, FlowType>,
}

impl TypeRegistry {
    /// Create an empty registry with no mappings.
    pub fn new() -> Self {
        Self {
            mappings: HashMap::new(),
        }
    }

    /// Create a registry pre-populated with the built-in Go mappings.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtins();
        registry
    }

    /// Register all built-in Go type mappings.
    pub fn register_builtins(&mut self) {
        for name in NUMERIC_TYPES {
            self.register(*name, FlowType::Number);
        }

        self.register("bool", FlowType::Boolean);
        self.register("string", FlowType::String);

        // errors are serialized through their message
        self.register("error", FlowType::String);

        self.register("any", FlowType::Object);

        // time.Time marshals to RFC 3339 text
        self.register("time.Time", FlowType::String);
        self.register("time.Duration", FlowType::String);
        self.register("time.*", FlowType::String);
    }

    /// Register a Flow type for a Go type name.
    ///
    /// If a mapping already exists for this name, it is replaced.
    pub fn register(&mut self, name: impl Into<String>, ty: FlowType) {
        self.mappings.insert(name.into(), ty);
    }

    /// Look up the Flow type registered for a Go type name.
    pub fn get(&self, name: &str) -> Option<&FlowType> {
        self.mappings.get(name)
    }

    /// Check if a type name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.mappings.contains_key(name)
    }

    /// Remove a type mapping.
    pub fn unregister(&mut self, name: &str) -> Option<FlowType> {
        self.mappings.remove(name)
    }

    /// Convert a declared Go type into its Flow type.
    ///
    /// Names without a mapping are kept as references to declared types.
    pub fn convert(&self, ty: &GoType) -> FlowType {
        match ty {
            GoType::Named(name) => self
                .get(name)
                .cloned()
                .unwrap_or_else(|| FlowType::named(name)),
            GoType::Qualified { package, name } => {
                let full = format!("{package}.{name}");
                self.get(&full)
                    .or_else(|| self.get(&format!("{package}.*")))
                    .cloned()
                    .unwrap_or(FlowType::Named(full))
            }
            GoType::Pointer(inner) => FlowType::optional(self.convert(inner)),
            GoType::Slice(elem) => FlowType::array(self.convert(elem)),
            GoType::Map(key, value) => FlowType::map(self.convert(key), self.convert(value)),
            GoType::Interface | GoType::Struct => FlowType::Object,
            GoType::Other(raw) => FlowType::Raw(raw.clone()),
        }
    }

    /// Fill in the Flow spelling of every field, including the children of
    /// nested anonymous structs.
    pub fn convert_fields(&self, fields: &mut [Field]) {
        for field in fields {
            field.canonical_type = self.convert(&field.shape).to_flow_type();
            self.convert_fields(&mut field.children);
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_with_builtins() {
        let registry = TypeRegistry::with_builtins();
        assert!(registry.contains("int64"));
        assert!(registry.contains("complex128"));
        assert!(registry.contains("bool"));
        assert!(registry.contains("time.Time"));
        assert!(!registry.contains("Person"));
    }

    #[test]
    fn test_numeric_family_collapses() {
        let registry = TypeRegistry::with_builtins();
        for name in NUMERIC_TYPES {
            let ty = registry.convert(&GoType::named(*name));
            assert_eq!(ty, FlowType::Number, "{name} should be a number");
        }
    }

    #[test]
    fn test_bool_collapses() {
        let registry = TypeRegistry::with_builtins();
        assert_eq!(
            registry.convert(&GoType::named("bool")).to_flow_type(),
            "boolean"
        );
    }

    #[test]
    fn test_no_substring_rewrites() {
        // `Points` contains `int` but is a distinct identifier
        let registry = TypeRegistry::with_builtins();
        assert_eq!(
            registry.convert(&GoType::named("Points")).to_flow_type(),
            "Points"
        );
        assert_eq!(
            registry.convert(&GoType::named("Boolish")).to_flow_type(),
            "Boolish"
        );
    }

    #[test]
    fn test_time_package_wildcard() {
        let registry = TypeRegistry::with_builtins();
        let month = registry.convert(&GoType::qualified("time", "Month"));
        assert_eq!(month, FlowType::String);

        let other = registry.convert(&GoType::qualified("sql", "NullString"));
        assert_eq!(other.to_flow_type(), "sql.NullString");
    }

    #[test]
    fn test_pointer_and_slice() {
        let registry = TypeRegistry::with_builtins();
        let ty = GoType::pointer(GoType::slice(GoType::named("Animal")));
        assert_eq!(registry.convert(&ty).to_flow_type(), "?Array<Animal>");

        let ty = GoType::pointer(GoType::qualified("time", "Duration"));
        assert_eq!(registry.convert(&ty).to_flow_type(), "?string");
    }

    #[test]
    fn test_map_with_error_and_pointers() {
        let registry = TypeRegistry::with_builtins();
        let ty = GoType::map(
            GoType::pointer(GoType::named("string")),
            GoType::slice(GoType::named("error")),
        );
        assert_eq!(
            registry.convert(&ty).to_flow_type(),
            "{ [key: ?string]: Array<string> }"
        );
    }

    #[test]
    fn test_interface_is_object() {
        let registry = TypeRegistry::with_builtins();
        let ty = GoType::map(GoType::named("string"), GoType::Interface);
        assert_eq!(
            registry.convert(&ty).to_flow_type(),
            "{ [key: string]: Object }"
        );
        assert_eq!(registry.convert(&GoType::named("any")), FlowType::Object);
    }

    #[test]
    fn test_registry_override_builtin() {
        let mut registry = TypeRegistry::with_builtins();
        registry.register("int64", FlowType::named("string"));
        assert_eq!(
            registry.convert(&GoType::named("int64")).to_flow_type(),
            "string"
        );
    }

    #[test]
    fn test_registry_unregister() {
        let mut registry = TypeRegistry::with_builtins();
        assert!(registry.contains("error"));
        registry.unregister("error");
        assert_eq!(
            registry.convert(&GoType::named("error")).to_flow_type(),
            "error"
        );
    }

    #[test]
    fn test_convert_fields_recurses() {
        let registry = TypeRegistry::with_builtins();
        let mut nested = Field::new("Inner", "struct{...}", GoType::Struct, "");
        nested.children = vec![Field::new(
            "Toys",
            "[]string",
            GoType::slice(GoType::named("string")),
            "",
        )];
        let mut fields = vec![nested];
        registry.convert_fields(&mut fields);
        assert_eq!(fields[0].canonical_type, "Object");
        assert_eq!(fields[0].children[0].canonical_type, "Array<string>");
    }

    #[test]
    fn test_other_is_verbatim() {
        let registry = TypeRegistry::with_builtins();
        let ty = GoType::Other("chan int".to_string());
        assert_eq!(registry.convert(&ty).to_flow_type(), "chan int");
    }
}

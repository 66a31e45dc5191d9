//! Type shapes for the code generator.
//!
//! [`GoType`] is the structured form of a type expression as it was declared
//! in Go source. [`FlowType`] is the converted form that gets rendered into
//! the output document.

/// A Go type expression, parsed once from the syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoType {
    /// A bare identifier: `int`, `string`, `Person`.
    Named(String),

    /// A package-qualified identifier: `time.Time`.
    Qualified { package: String, name: String },

    /// `*T`
    Pointer(Box<GoType>),

    /// `[]T`, `[N]T` and `[...]T`. The length is not part of the Flow type.
    Slice(Box<GoType>),

    /// `map[K]V`
    Map(Box<GoType>, Box<GoType>),

    /// `interface{ ... }`
    Interface,

    /// An anonymous `struct { ... }`.
    Struct,

    /// Function, channel and generic instantiation types, kept verbatim.
    Other(String),
}

impl GoType {
    pub fn named(name: impl Into<String>) -> Self {
        GoType::Named(name.into())
    }

    pub fn qualified(package: impl Into<String>, name: impl Into<String>) -> Self {
        GoType::Qualified {
            package: package.into(),
            name: name.into(),
        }
    }

    pub fn pointer(inner: GoType) -> Self {
        GoType::Pointer(Box::new(inner))
    }

    pub fn slice(elem: GoType) -> Self {
        GoType::Slice(Box::new(elem))
    }

    pub fn map(key: GoType, value: GoType) -> Self {
        GoType::Map(Box::new(key), Box::new(value))
    }
}

/// A Flow type, ready to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowType {
    Number,
    Boolean,
    String,

    /// The generic object placeholder, `Object`.
    Object,

    /// Reference to another declared type.
    Named(String),

    /// `?T`
    Optional(Box<FlowType>),

    /// `Array<T>`
    Array(Box<FlowType>),

    /// `{ [key: K]: V }`
    Map(Box<FlowType>, Box<FlowType>),

    /// Spelling emitted as-is.
    Raw(String),
}

impl FlowType {
    pub fn named(name: impl Into<String>) -> Self {
        FlowType::Named(name.into())
    }

    pub fn optional(inner: FlowType) -> Self {
        FlowType::Optional(Box::new(inner))
    }

    pub fn array(elem: FlowType) -> Self {
        FlowType::Array(Box::new(elem))
    }

    pub fn map(key: FlowType, value: FlowType) -> Self {
        FlowType::Map(Box::new(key), Box::new(value))
    }

    /// Generate the Flow type spelling.
    pub fn to_flow_type(&self) -> String {
        match self {
            FlowType::Number => "number".to_string(),
            FlowType::Boolean => "boolean".to_string(),
            FlowType::String => "string".to_string(),
            FlowType::Object => "Object".to_string(),
            FlowType::Named(name) | FlowType::Raw(name) => name.clone(),
            FlowType::Optional(inner) => format!("?{}", inner.to_flow_type()),
            FlowType::Array(elem) => format!("Array<{}>", elem.to_flow_type()),
            FlowType::Map(key, value) => {
                format!(
                    "{{ [key: {}]: {} }}",
                    key.to_flow_type(),
                    value.to_flow_type()
                )
            }
        }
    }
}

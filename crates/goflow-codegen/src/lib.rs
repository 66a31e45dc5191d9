//! # goflow-codegen
//!
//! Flow type generator for Go structs. This crate reads Go source files and
//! emits a Flow module describing the JSON shape of every exported struct and
//! named type, so a JavaScript client can type-check the payloads a Go
//! service produces.
//!
//! ## Usage
//!
//! ### 1. Tag your Go structs
//!
//! ```go
//! // Person is somebody.
//! // @strict
//! type Person struct {
//!     Name     string  `json:"name"`
//!     Age      int     `json:"age" flow:"years"`
//!     Nickname *string `json:"nickname"` // optional
//!     Password string  `json:"-"`
//! }
//! ```
//!
//! ### 2. Generate the Flow module
//!
//! ```no_run
//! # fn main() -> goflow_codegen::Result<()> {
//! use goflow_codegen::CodeGenerator;
//!
//! CodeGenerator::new()
//!     .add_source_dir("models/", true)?
//!     .write_to_file("web/models.js")?;
//! # Ok(())
//! # }
//! ```
//!
//! which produces
//!
//! ```js
//! // Person is somebody.
//! export type Person = {|
//!   name: string,
//!   years: number,
//!   nickname: ?string,	// optional
//! |}
//! ```
//!
//! ## Rules
//!
//! - Only exported structs and fields with a `json` tag are emitted; `json:"-"`
//!   removes a field.
//! - `flow:"name"`, `flow:"name.Type"` and `flow:".Type"` override the emitted
//!   name and type.
//! - Embedded structs are flattened into the records that embed them.
//! - A `@flowignore` comment hides a declaration, `@strict` emits an exact
//!   object type.
//! - Go types are converted through a [`TypeRegistry`], see its docs for the
//!   built-in mapping table.

mod comments;
mod error;
mod extractor;
mod flatten;
mod generator;
pub mod model;
pub mod policy;
mod registry;
mod types;

pub use comments::{CommentIndex, IGNORE_DIRECTIVE, STRICT_DIRECTIVE};
pub use error::{Error, Result};
pub use extractor::discover_sources;
pub use generator::CodeGenerator;
pub use model::{AliasType, Composition, Field, FileModel, FlowTag, RecordType, Tags};
pub use registry::TypeRegistry;
pub use types::{FlowType, GoType};

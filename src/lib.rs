//! # unreact
//!
//! Compiles functional JSX components into EJS, Pug or Liquid templates.
//!
//! ## Pipeline
//!
//! 1. **Parse**: the module is parsed as a JSX-enabled ES module.
//! 2. **Transform**: every functional component is lowered into a `Mixin`
//!    of the Template AST; imports and components land in the module's
//!    `SymbolTable`. The root holds the default exported component.
//! 3. **Optimize**: attributes are flattened, string and `undefined`
//!    interpolations degrade to text, statically known conditions are
//!    resolved and required props are propagated onto attributes.
//! 4. **Bundle** (only with a file identity): imports instantiated as
//!    elements are resolved, loaded and merged into one table, then the
//!    optimizer runs again over the merged view.
//! 5. **Generate**: a backend renders the tree, inlining components from
//!    the table.
//!
//! ## Invariants
//!
//! - Optimization is idempotent: a second run changes nothing.
//! - Output is deterministic: tables iterate in key order and sibling
//!   dependencies are merged in a stable order.
//! - A backend that cannot translate a dynamic value fails with
//!   `Unsupported <Kind> "<name>"`; values are never silently dropped.

pub mod ast;
pub mod codegen;
pub mod compile;
pub mod error;
pub mod graph;
pub mod optimize;
pub mod resolve;
pub mod static_eval;
pub mod transform;
pub mod visitor;

#[cfg(test)]
mod transform_tests;

pub use ast::{Attribute, AttributeValue, Node, SymbolTable};
pub use codegen::{CodeGenerator, GenerateOptions, TemplateEngine};
pub use compile::{compile, compile_dir, compile_file, parse_transform_optimize, CompileOptions};
pub use error::{CompileError, Result};
pub use graph::{resolve_dependencies, DependencyGraph};

//! Code generators
//!
//! Turns an optimized Template AST into EJS, Pug or Liquid source. The
//! node dispatch, component inlining and `{children}` slots are shared;
//! each backend only spells the constructs.

mod ejs;
mod liquid;
mod pug;

pub use ejs::EjsGenerator;
pub use liquid::LiquidGenerator;
pub use pug::PugGenerator;

use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ast::{
    AttributeValue, ConditionNode, ElementNode, IterationNode, MixinNode, Node, SymbolTable,
};
use crate::error::{CompileError, Result};

pub const INDENT: &str = "  ";

pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub initial_indent_level: usize,
}

pub trait CodeGenerator: Send + Sync {
    fn generate(&self, ast: &Node, table: &SymbolTable, options: &GenerateOptions)
        -> Result<String>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE SELECTION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TemplateEngine {
    Ejs,
    #[default]
    Pug,
    Liquid,
}

impl TemplateEngine {
    pub fn name(&self) -> &'static str {
        match self {
            TemplateEngine::Ejs => "ejs",
            TemplateEngine::Pug => "pug",
            TemplateEngine::Liquid => "liquid",
        }
    }

    /// Output file extension, dot included.
    pub fn extension(&self) -> &'static str {
        match self {
            TemplateEngine::Ejs => ".ejs",
            TemplateEngine::Pug => ".pug",
            TemplateEngine::Liquid => ".liquid",
        }
    }

    pub fn generator(&self) -> Box<dyn CodeGenerator> {
        match self {
            TemplateEngine::Ejs => Box::new(EjsGenerator),
            TemplateEngine::Pug => Box::new(PugGenerator),
            TemplateEngine::Liquid => Box::new(LiquidGenerator),
        }
    }
}

impl FromStr for TemplateEngine {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ejs" => Ok(TemplateEngine::Ejs),
            "pug" => Ok(TemplateEngine::Pug),
            "liquid" => Ok(TemplateEngine::Liquid),
            other => Err(CompileError::UnknownEngine(other.to_string())),
        }
    }
}

impl TryFrom<String> for TemplateEngine {
    type Error = CompileError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TemplateEngine> for String {
    fn from(engine: TemplateEngine) -> Self {
        engine.name().to_string()
    }
}

impl fmt::Display for TemplateEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHARED RENDERING
// ═══════════════════════════════════════════════════════════════════════════════

/// Inlining state shared by every backend.
pub(crate) struct RenderContext<'t> {
    table: &'t SymbolTable,
    out: String,
    stack: Vec<&'t str>,
    slots: Vec<&'t [Node]>,
}

impl<'t> RenderContext<'t> {
    pub(crate) fn new(table: &'t SymbolTable) -> Self {
        RenderContext {
            table,
            out: String::new(),
            stack: Vec::new(),
            slots: Vec::new(),
        }
    }

    pub(crate) fn line(&mut self, level: usize, text: &str) {
        for _ in 0..level {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }

    fn component(&self, tag: &str) -> Option<&'t MixinNode> {
        let table: &'t SymbolTable = self.table;
        let mixin = table.resolve_component(tag)?;
        if self.stack.iter().any(|name| *name == tag) {
            warn!("recursive use of component {} is rendered as a plain tag", tag);
            return None;
        }
        Some(mixin)
    }
}

/// Props bound at an inlined call site: (prop name, call-site value).
pub(crate) type Bindings<'t> = Vec<(&'t str, Option<&'t AttributeValue>)>;

fn bindings<'t>(mixin: &'t MixinNode, call: &'t ElementNode) -> Bindings<'t> {
    mixin
        .props
        .iter()
        .filter(|p| p.name != "children")
        .map(|p| {
            let value = call
                .attributes
                .iter()
                .find(|a| a.name == p.name)
                .map(|a| &a.value);
            (p.name.as_str(), value)
        })
        .collect()
}

fn is_children_slot(code: &str) -> bool {
    matches!(code.trim(), "children" | "props.children")
}

/// Backend-specific spelling of each construct. `render_node` owns the
/// dispatch, inlining and slot handling.
pub(crate) trait TemplateWriter<'t> {
    fn ctx(&mut self) -> &mut RenderContext<'t>;

    fn element(&mut self, element: &'t ElementNode, level: usize) -> Result<()>;
    fn text(&mut self, value: &str, level: usize) -> Result<()>;
    fn interpolation(&mut self, code: &str, level: usize) -> Result<()>;
    fn condition(&mut self, condition: &'t ConditionNode, level: usize) -> Result<()>;
    fn iteration(&mut self, iteration: &'t IterationNode, level: usize) -> Result<()>;

    /// Opens a component scope; returns the level its body renders at.
    fn open_scope(&mut self, bindings: &Bindings<'t>, level: usize) -> Result<usize>;
    fn close_scope(&mut self, _level: usize) -> Result<()> {
        Ok(())
    }

    fn render_node(&mut self, node: &'t Node, level: usize) -> Result<()> {
        match node {
            Node::Root(root) => self.render_children(&root.children, level),
            Node::Mixin(mixin) => self.render_children(&mixin.children, level),
            Node::Fragment(fragment) => self.render_children(&fragment.children, level),
            Node::Element(element) => match self.ctx().component(&element.tag) {
                Some(mixin) => self.inline_component(mixin, element, level),
                None => self.element(element, level),
            },
            Node::Text(text) => {
                if text.value.is_empty() {
                    return Ok(());
                }
                self.text(&text.value, level)
            }
            Node::InterpolationEscaped(interpolation) => {
                let code = &interpolation.value.code;
                if is_children_slot(code) {
                    if let Some(slot) = self.ctx().slots.pop() {
                        let result = self.render_children(slot, level);
                        self.ctx().slots.push(slot);
                        return result;
                    }
                }
                self.interpolation(code, level)
            }
            Node::Condition(condition) => self.condition(condition, level),
            Node::Iteration(iteration) => self.iteration(iteration, level),
        }
    }

    fn render_children(&mut self, nodes: &'t [Node], level: usize) -> Result<()> {
        for node in nodes {
            self.render_node(node, level)?;
        }
        Ok(())
    }

    fn inline_component(
        &mut self,
        mixin: &'t MixinNode,
        call: &'t ElementNode,
        level: usize,
    ) -> Result<()> {
        let bindings = bindings(mixin, call);
        let body_level = self.open_scope(&bindings, level)?;
        self.ctx().stack.push(&call.tag);
        self.ctx().slots.push(&call.children);
        let result = self.render_children(&mixin.children, body_level);
        self.ctx().slots.pop();
        self.ctx().stack.pop();
        result?;
        self.close_scope(level)
    }
}

/// Escapes text for a double-quoted HTML attribute.
pub(crate) fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

/// JS string literal for a static value.
pub(crate) fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}

pub(crate) fn js_binding_value(value: Option<&AttributeValue>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(AttributeValue::Boolean(b)) => b.to_string(),
        Some(AttributeValue::String(s)) => js_string(s),
        Some(AttributeValue::Dynamic(expr)) => expr.code.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_names_round_trip() {
        for engine in [TemplateEngine::Ejs, TemplateEngine::Pug, TemplateEngine::Liquid] {
            assert_eq!(engine.name().parse::<TemplateEngine>().unwrap(), engine);
        }
        assert_eq!(TemplateEngine::default(), TemplateEngine::Pug);
    }

    #[test]
    fn unknown_engine_is_rejected() {
        let err = "haml".parse::<TemplateEngine>().unwrap_err();
        assert_eq!(err.to_string(), "unknown code generator for haml");
    }

    #[test]
    fn engine_deserializes_from_lowercase_name() {
        let engine: TemplateEngine = serde_json::from_str("\"liquid\"").unwrap();
        assert_eq!(engine, TemplateEngine::Liquid);
        assert!(serde_json::from_str::<TemplateEngine>("\"haml\"").is_err());
    }
}

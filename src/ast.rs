//! Template AST
//!
//! Backend-agnostic node vocabulary produced by the transformer, rewritten in
//! place by the optimizer and consumed by the code generators.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

// ═══════════════════════════════════════════════════════════════════════════════
// NODES
// ═══════════════════════════════════════════════════════════════════════════════

/// Source text of a JS expression that is only known at render time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub code: String,
}

impl Expression {
    pub fn new(code: impl Into<String>) -> Self {
        Expression { code: code.into() }
    }

    pub fn is_identifier(&self, name: &str) -> bool {
        self.code.trim() == name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Node {
    Root(RootNode),
    Element(ElementNode),
    Text(TextNode),
    Condition(ConditionNode),
    Iteration(IterationNode),
    InterpolationEscaped(InterpolationNode),
    Mixin(MixinNode),
    /// Sibling group standing in a single-node slot, e.g. a condition
    /// branch lowered from `<>...</>`.
    Fragment(FragmentNode),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RootNode {
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FragmentNode {
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub tag: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionNode {
    pub test: Expression,
    pub consequent: Option<Box<Node>>,
    pub alternate: Option<Box<Node>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationNode {
    pub iterable: Expression,
    pub item: String,
    pub index: Option<String>,
    pub array: Option<String>,
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpolationNode {
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixinNode {
    pub name: String,
    pub props: Vec<PropDefinition>,
    /// Module-level `const` bindings visible to the body (name → code).
    #[serde(default)]
    pub constants: BTreeMap<String, String>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropDefinition {
    pub name: String,
    pub is_required: bool,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ATTRIBUTES
// ═══════════════════════════════════════════════════════════════════════════════

/// Resolution only ever goes from `Dynamic` to one of the literal variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum AttributeValue {
    Boolean(bool),
    String(String),
    Dynamic(Expression),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
    #[serde(default)]
    pub is_required: bool,
}

impl Attribute {
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::with_value(name, AttributeValue::Boolean(true))
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_value(name, AttributeValue::String(value.into()))
    }

    pub fn dynamic(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self::with_value(name, AttributeValue::Dynamic(Expression::new(code)))
    }

    fn with_value(name: impl Into<String>, value: AttributeValue) -> Self {
        Attribute {
            name: name.into(),
            value,
            is_required: false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self.value, AttributeValue::Dynamic(_))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONSTRUCTORS & CONTEXT HANDLING
// ═══════════════════════════════════════════════════════════════════════════════

impl Node {
    pub fn root() -> Self {
        Node::Root(RootNode::default())
    }

    pub fn element(tag: impl Into<String>) -> Self {
        Node::Element(ElementNode {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        })
    }

    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(TextNode {
            value: value.into(),
        })
    }

    pub fn interpolation(code: impl Into<String>) -> Self {
        Node::InterpolationEscaped(InterpolationNode {
            value: Expression::new(code),
        })
    }

    pub fn condition(test: impl Into<String>) -> Self {
        Node::Condition(ConditionNode {
            test: Expression::new(test),
            consequent: None,
            alternate: None,
        })
    }

    pub fn fragment() -> Self {
        Node::Fragment(FragmentNode::default())
    }

    pub fn conditional(
        test: impl Into<String>,
        consequent: Option<Box<Node>>,
        alternate: Option<Box<Node>>,
    ) -> Self {
        Node::Condition(ConditionNode {
            test: Expression::new(test),
            consequent,
            alternate,
        })
    }

    /// Collapses a fragment used as a branch slot: empty is `None`, a single
    /// child stands on its own.
    pub fn into_slot(self) -> Option<Box<Node>> {
        match self {
            Node::Fragment(mut fragment) => match fragment.children.len() {
                0 => None,
                1 => fragment.children.pop().map(Box::new),
                _ => Some(Box::new(Node::Fragment(fragment))),
            },
            other => Some(Box::new(other)),
        }
    }

    pub fn mixin(name: impl Into<String>, props: Vec<PropDefinition>) -> Self {
        Node::Mixin(MixinNode {
            name: name.into(),
            props,
            constants: BTreeMap::new(),
            children: Vec::new(),
        })
    }

    /// Adds `child` to this node acting as an insertion context. A condition
    /// takes its consequent first and its alternate second.
    pub fn append(&mut self, child: Node) {
        match self {
            Node::Root(n) => n.children.push(child),
            Node::Element(n) => n.children.push(child),
            Node::Mixin(n) => n.children.push(child),
            Node::Fragment(n) => n.children.push(child),
            Node::Iteration(n) => n.body.push(child),
            Node::Condition(n) => {
                if n.consequent.is_none() {
                    n.consequent = Some(Box::new(child));
                } else if n.alternate.is_none() {
                    n.alternate = Some(Box::new(child));
                } else {
                    debug!("condition on `{}` already has both branches", n.test.code);
                }
            }
            Node::Text(_) | Node::InterpolationEscaped(_) => {
                debug!("leaf node cannot take children");
            }
        }
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        if let Node::Element(el) = self {
            el.attributes.push(attribute);
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Root(n) => &n.children,
            Node::Element(n) => &n.children,
            Node::Mixin(n) => &n.children,
            Node::Fragment(n) => &n.children,
            Node::Iteration(n) => &n.body,
            _ => &[],
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYMBOL TABLE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRecord {
    pub mixin: MixinNode,
    pub default_export: bool,
    pub created_from: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyRecord {
    /// Specifier as written in the import declaration.
    pub source: String,
    /// Exported name for a named import; `None` for the default export.
    #[serde(default)]
    pub imported: Option<String>,
    pub required_from: Option<PathBuf>,
    /// Filled in once the specifier has been resolved.
    pub path: Option<PathBuf>,
    pub is_used_as_rc: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SymbolTable {
    pub components: BTreeMap<String, ComponentRecord>,
    pub dependencies: BTreeMap<String, DependencyRecord>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_component(&self) -> Option<&ComponentRecord> {
        self.components.values().find(|c| c.default_export)
    }

    pub fn component(&self, name: &str) -> Option<&MixinNode> {
        self.components.get(name).map(|c| &c.mixin)
    }

    /// Component instantiated by the tag `tag`. A resolved import is looked
    /// up in the file it points to, so aliases and anonymous default
    /// exports match; otherwise the tag names a component directly.
    pub fn resolve_component(&self, tag: &str) -> Option<&MixinNode> {
        let imported = self.dependencies.get(tag).and_then(|dependency| {
            let path = dependency.path.as_deref()?;
            self.components.values().find(|c| {
                c.created_from.as_deref() == Some(path)
                    && match &dependency.imported {
                        Some(name) => c.mixin.name == *name,
                        None => c.default_export,
                    }
            })
        });
        imported.map(|c| &c.mixin).or_else(|| self.component(tag))
    }

    /// Folds `other` into `self`. Keys collide last-write-wins; collisions
    /// between records from different files are reported.
    pub fn merge(&mut self, other: SymbolTable) {
        for (name, record) in other.components {
            if let Some(previous) = self.components.get(&name) {
                if previous.created_from != record.created_from {
                    warn!(
                        "component \"{}\" from {:?} replaces the one from {:?}",
                        name, record.created_from, previous.created_from
                    );
                }
            }
            self.components.insert(name, record);
        }
        for (alias, record) in other.dependencies {
            if let Some(previous) = self.dependencies.get(&alias) {
                if previous.path.is_some() && previous.path != record.path {
                    warn!(
                        "import alias \"{}\" resolves to both {:?} and {:?}",
                        alias, previous.path, record.path
                    );
                }
            }
            self.dependencies.insert(alias, record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, file: &str) -> ComponentRecord {
        let Node::Mixin(mixin) = Node::mixin(name, vec![]) else {
            unreachable!()
        };
        ComponentRecord {
            mixin,
            default_export: false,
            created_from: Some(PathBuf::from(file)),
        }
    }

    #[test]
    fn condition_context_fills_consequent_then_alternate() {
        let mut cond = Node::condition("open");
        cond.append(Node::text("A"));
        cond.append(Node::text("B"));
        cond.append(Node::text("C"));

        let Node::Condition(c) = cond else {
            panic!("expected condition")
        };
        assert_eq!(c.consequent.as_deref(), Some(&Node::text("A")));
        assert_eq!(c.alternate.as_deref(), Some(&Node::text("B")));
    }

    #[test]
    fn merge_is_last_write_wins() {
        let mut left = SymbolTable::new();
        left.components
            .insert("Button".to_string(), record("Button", "a.js"));
        let mut right = SymbolTable::new();
        right
            .components
            .insert("Button".to_string(), record("Button", "b.js"));
        right.components.insert("Card".to_string(), record("Card", "b.js"));

        left.merge(right);

        assert_eq!(left.components.len(), 2);
        assert_eq!(
            left.components["Button"].created_from,
            Some(PathBuf::from("b.js"))
        );
    }

    #[test]
    fn resolved_import_finds_component_by_file() {
        let mut table = SymbolTable::new();
        let mut anonymous = record("DefaultComponent:/app/Tag.jsx", "/app/Tag.jsx");
        anonymous.default_export = true;
        table
            .components
            .insert(anonymous.mixin.name.clone(), anonymous);
        table
            .components
            .insert("Badge".to_string(), record("Badge", "/app/Tag.jsx"));
        let dependency = |imported: Option<&str>| DependencyRecord {
            source: "./Tag".to_string(),
            imported: imported.map(str::to_string),
            required_from: None,
            path: Some(PathBuf::from("/app/Tag.jsx")),
            is_used_as_rc: true,
        };
        table.dependencies.insert("Tag".to_string(), dependency(None));
        table
            .dependencies
            .insert("Pill".to_string(), dependency(Some("Badge")));

        assert_eq!(
            table.resolve_component("Tag").map(|m| m.name.as_str()),
            Some("DefaultComponent:/app/Tag.jsx")
        );
        assert_eq!(
            table.resolve_component("Pill").map(|m| m.name.as_str()),
            Some("Badge")
        );
        assert_eq!(
            table.resolve_component("Badge").map(|m| m.name.as_str()),
            Some("Badge")
        );
        assert!(table.resolve_component("Missing").is_none());
    }

    #[test]
    fn attribute_serializes_with_kind_tag() {
        let attr = Attribute::string("id", "main");
        let json = serde_json::to_value(&attr).unwrap();
        assert_eq!(json["value"]["kind"], "string");
        assert_eq!(json["value"]["value"], "main");
        assert_eq!(json["isRequired"], false);
    }
}

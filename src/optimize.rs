//! Optimizer
//!
//! Rewrite passes over a lowered Template AST: attribute flattening,
//! escaping degrade, dead-branch elimination and required-attribute
//! propagation. Every pass is idempotent.

use lazy_static::lazy_static;
use log::trace;
use oxc_allocator::Allocator;
use oxc_ast::ast::{ChainElement, Expression as JsExpression, LogicalOperator};
use oxc_span::GetSpan;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

use crate::ast::{
    Attribute, AttributeValue, ConditionNode, Expression, InterpolationNode, IterationNode,
    MixinNode, Node, SymbolTable,
};
use crate::static_eval::{self, format_number, parse_expression, strip_parens, Scope, Value};
use crate::visitor::{walk_iteration, walk_mixin, TemplateVisitor};

lazy_static! {
    static ref BINDING_NAME_RE: Regex = Regex::new(r"[A-Za-z_$][A-Za-z0-9_$]*").unwrap();
}

static EMPTY_SCOPE: Scope = BTreeMap::new();

/// Optimizes the root tree and every component of the table in place.
pub fn optimize(ast: &mut Node, table: &mut SymbolTable) {
    Optimizer::default().visit_node(ast);
    propagate_required(ast);

    for record in table.components.values_mut() {
        Optimizer::default().visit_mixin(&mut record.mixin);
        RequiredProps::default().visit_mixin(&mut record.mixin);
    }
}

/// Marks attributes rooted in a required prop of their enclosing mixin.
pub fn propagate_required(ast: &mut Node) {
    RequiredProps::default().visit_node(ast);
}

// ═══════════════════════════════════════════════════════════════════════════════
// REWRITES
// ═══════════════════════════════════════════════════════════════════════════════

enum Rewrite {
    Keep,
    Replace(Node),
    Remove,
}

#[derive(Default)]
struct Optimizer {
    scopes: Vec<Scope>,
}

impl Optimizer {
    fn scope(&self) -> &Scope {
        self.scopes.last().unwrap_or(&EMPTY_SCOPE)
    }

    /// Enter-phase rewrite, before the node's own children are visited.
    fn rewrite(&self, node: &mut Node) -> Rewrite {
        match node {
            Node::InterpolationEscaped(interpolation) => self.rewrite_interpolation(interpolation),
            Node::Condition(condition) => self.rewrite_condition(condition),
            _ => Rewrite::Keep,
        }
    }

    fn rewrite_interpolation(&self, interpolation: &InterpolationNode) -> Rewrite {
        let code = interpolation.value.code.trim();
        if code == "undefined" {
            return Rewrite::Replace(Node::text(""));
        }
        match string_literal(code) {
            Some(value) => Rewrite::Replace(Node::text(value)),
            None => Rewrite::Keep,
        }
    }

    fn rewrite_condition(&self, condition: &mut ConditionNode) -> Rewrite {
        if let Some(identifier) = guard_identifier(&condition.test.code) {
            condition.test = Expression::new(identifier);
        }

        let taken = match static_eval::is_truthy(&condition.test.code, self.scope()) {
            Some(true) => condition.consequent.take(),
            Some(false) => condition.alternate.take(),
            None => return Rewrite::Keep,
        };
        trace!("resolved condition `{}`", condition.test.code);
        match taken {
            Some(node) => Rewrite::Replace(*node),
            None => Rewrite::Remove,
        }
    }

    /// Returns false when the attribute must be dropped.
    fn flatten_attribute(&self, attribute: &mut Attribute) -> bool {
        let AttributeValue::Dynamic(expr) = &attribute.value else {
            return true;
        };
        let code = expr.code.trim();
        if code == "true" {
            attribute.value = AttributeValue::Boolean(true);
            return true;
        }
        if code == "undefined" {
            return false;
        }

        match static_eval::evaluate(code, self.scope()) {
            Some(Value::String(s)) => attribute.value = AttributeValue::String(s),
            Some(Value::Number(n)) => attribute.value = AttributeValue::String(format_number(n)),
            Some(Value::Bool(true)) => attribute.value = AttributeValue::Boolean(true),
            Some(Value::Bool(false) | Value::Null | Value::Undefined) => return false,
            None => {
                if let Some(folded) = fold_template(code, self.scope()) {
                    attribute.value = AttributeValue::Dynamic(Expression::new(folded));
                    return self.flatten_attribute(attribute);
                }
            }
        }
        true
    }
}

impl TemplateVisitor for Optimizer {
    fn visit_mixin(&mut self, mixin: &mut MixinNode) {
        self.scopes.push(mixin.constants.clone());
        walk_mixin(self, mixin);
        self.scopes.pop();
    }

    fn visit_iteration(&mut self, iteration: &mut IterationNode) {
        let mut scope = self.scope().clone();
        let bindings = [Some(&iteration.item), iteration.index.as_ref(), iteration.array.as_ref()];
        for binding in bindings.into_iter().flatten() {
            for name in BINDING_NAME_RE.find_iter(binding) {
                scope.remove(name.as_str());
            }
        }
        self.scopes.push(scope);
        walk_iteration(self, iteration);
        self.scopes.pop();
    }

    fn visit_attributes(&mut self, attributes: &mut Vec<Attribute>) {
        attributes.retain_mut(|attribute| self.flatten_attribute(attribute));
    }

    fn visit_children(&mut self, children: &mut Vec<Node>) {
        let mut i = 0;
        while i < children.len() {
            match self.rewrite(&mut children[i]) {
                Rewrite::Keep => {
                    self.visit_node(&mut children[i]);
                    i += 1;
                }
                // The replacement is re-examined in the same slot.
                Rewrite::Replace(Node::Fragment(fragment)) => {
                    children.splice(i..=i, fragment.children);
                }
                Rewrite::Replace(node) => children[i] = node,
                Rewrite::Remove => {
                    children.remove(i);
                }
            }
        }
    }

    fn visit_branch(&mut self, branch: &mut Option<Box<Node>>) {
        while let Some(node) = branch.as_deref_mut() {
            match self.rewrite(node) {
                Rewrite::Keep => {
                    self.visit_node(node);
                    return;
                }
                Rewrite::Replace(replacement) => *branch = Some(Box::new(replacement)),
                Rewrite::Remove => *branch = None,
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPRESSION HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

fn string_literal(code: &str) -> Option<String> {
    let allocator = Allocator::default();
    match strip_parens(&parse_expression(&allocator, code)?) {
        JsExpression::StringLiteral(s) => Some(s.value.to_string()),
        _ => None,
    }
}

/// `x && "str"` and `"str" && x` reduce to `x`.
fn guard_identifier(code: &str) -> Option<String> {
    let allocator = Allocator::default();
    let expr = parse_expression(&allocator, code)?;
    let JsExpression::LogicalExpression(logical) = strip_parens(&expr) else {
        return None;
    };
    if logical.operator != LogicalOperator::And {
        return None;
    }
    match (strip_parens(&logical.left), strip_parens(&logical.right)) {
        (JsExpression::Identifier(id), JsExpression::StringLiteral(_))
        | (JsExpression::StringLiteral(_), JsExpression::Identifier(id)) => {
            Some(id.name.to_string())
        }
        _ => None,
    }
}

/// Folds constant sub-expressions of a template literal into its quasis.
/// Returns the rebuilt literal when at least one part was folded.
fn fold_template(code: &str, scope: &Scope) -> Option<String> {
    let allocator = Allocator::default();
    let expr = parse_expression(&allocator, code)?;
    let JsExpression::TemplateLiteral(template) = strip_parens(&expr) else {
        return None;
    };

    let mut folded_any = false;
    let mut out = String::from("`");
    for (i, quasi) in template.quasis.iter().enumerate() {
        out.push_str(quasi.value.raw.as_str());
        let Some(part) = template.expressions.get(i) else {
            continue;
        };
        let span = part.span();
        let part_code = &code[span.start as usize..span.end as usize];
        match static_eval::evaluate(part_code, scope) {
            Some(value @ (Value::String(_) | Value::Number(_))) => {
                out.push_str(&escape_template(&value.to_js_string()));
                folded_any = true;
            }
            _ => {
                out.push_str("${");
                out.push_str(part_code);
                out.push('}');
            }
        }
    }
    out.push('`');
    folded_any.then_some(out)
}

fn escape_template(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

/// Name of the identifier an expression is rooted in, following member and
/// call chains.
pub fn leading_identifier(code: &str) -> Option<String> {
    let allocator = Allocator::default();
    let expr = parse_expression(&allocator, code)?;
    let mut current = strip_parens(&expr);
    loop {
        current = match current {
            JsExpression::Identifier(id) => return Some(id.name.to_string()),
            JsExpression::StaticMemberExpression(m) => strip_parens(&m.object),
            JsExpression::ComputedMemberExpression(m) => strip_parens(&m.object),
            JsExpression::CallExpression(c) => strip_parens(&c.callee),
            JsExpression::ChainExpression(chain) => match &chain.expression {
                ChainElement::CallExpression(c) => strip_parens(&c.callee),
                ChainElement::StaticMemberExpression(m) => strip_parens(&m.object),
                ChainElement::ComputedMemberExpression(m) => strip_parens(&m.object),
                _ => return None,
            },
            _ => return None,
        };
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REQUIRED ATTRIBUTES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct RequiredProps {
    required: Vec<BTreeSet<String>>,
}

impl TemplateVisitor for RequiredProps {
    fn visit_mixin(&mut self, mixin: &mut MixinNode) {
        self.required.push(
            mixin
                .props
                .iter()
                .filter(|p| p.is_required)
                .map(|p| p.name.clone())
                .collect(),
        );
        walk_mixin(self, mixin);
        self.required.pop();
    }

    fn visit_attribute(&mut self, attribute: &mut Attribute) {
        let AttributeValue::Dynamic(expr) = &attribute.value else {
            return;
        };
        let Some(required) = self.required.last() else {
            return;
        };
        if let Some(name) = leading_identifier(&expr.code) {
            attribute.is_required = required.contains(&name);
        }
    }
}

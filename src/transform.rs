//! JSX Component Transformer
//!
//! Lowers the functional components of one module into Template AST
//! `Mixin`s and records the module's symbol table.

use lazy_static::lazy_static;
use log::debug;
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::{walk, Visit};
use oxc_parser::Parser;
use oxc_span::{GetSpan, Span};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::ast::{
    Attribute, ComponentRecord, DependencyRecord, MixinNode, Node, PropDefinition, SymbolTable,
};
use crate::error::{CompileError, Result};
use crate::static_eval::{self, source_type, strip_parens};

lazy_static! {
    static ref EVENT_HANDLER_RE: Regex = Regex::new(r"^on[A-Z]").unwrap();
    static ref UPPERCASE_RE: Regex = Regex::new(r"([A-Z])").unwrap();
}

const IGNORED_ATTRIBUTES: &[&str] = &["key", "ref"];

const UNITLESS_STYLES: &[&str] = &[
    "opacity",
    "zIndex",
    "flex",
    "flexGrow",
    "flexShrink",
    "fontWeight",
    "lineHeight",
    "order",
    "zoom",
];

/// Result of lowering one module.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub ast: Node,
    pub table: SymbolTable,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY POINTS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn parse_program<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    file: Option<&Path>,
) -> Result<Program<'a>> {
    let ret = Parser::new(allocator, source, source_type()).parse();
    if let Some(error) = ret.errors.first() {
        return Err(CompileError::Parse {
            file: display_file(file),
            message: format!("{:?}", error),
        });
    }
    Ok(ret.program)
}

/// Parses `source` and lowers it.
pub fn transform_source(source: &str, file: Option<&Path>) -> Result<TransformOutput> {
    let allocator = Allocator::default();
    let program = parse_program(&allocator, source, file)?;
    transform(&program, source, file)
}

/// Lowers every functional component of `program`. The root holds the
/// default exported component.
pub fn transform(program: &Program, source: &str, file: Option<&Path>) -> Result<TransformOutput> {
    let mut transformer = Transformer::new(source, file);
    let candidates = transformer.collect_module_items(program);

    for candidate in candidates {
        transformer.lower_component(candidate);
    }

    let mut table = transformer.table;
    for (name, required) in transformer.required_props {
        if let Some(record) = table.components.get_mut(&name) {
            for prop in record.mixin.props.iter_mut() {
                prop.is_required = required.contains(&prop.name);
            }
        }
    }

    let main = table
        .default_component()
        .map(|c| c.mixin.clone())
        .ok_or_else(|| CompileError::MissingDefaultExport {
            file: display_file(file),
        })?;

    let mut ast = Node::root();
    ast.append(Node::Mixin(main));
    Ok(TransformOutput { ast, table })
}

fn display_file(file: Option<&Path>) -> String {
    file.map(|f| f.display().to_string())
        .unwrap_or_else(|| "<input>".to_string())
}

// ═══════════════════════════════════════════════════════════════════════════════
// MODULE LEVEL
// ═══════════════════════════════════════════════════════════════════════════════

struct Candidate<'p, 'a> {
    name: String,
    params: &'p FormalParameters<'a>,
    body: &'p FunctionBody<'a>,
    returns: Vec<ReturnBranch<'p, 'a>>,
    default_export: bool,
}

/// A returned value, guarded by the `if` tests of earlier early returns.
struct ReturnBranch<'p, 'a> {
    test: Option<&'p Expression<'a>>,
    value: &'p Expression<'a>,
}

struct Transformer<'s> {
    source: &'s str,
    file: Option<PathBuf>,
    table: SymbolTable,
    constants: BTreeMap<String, String>,
    required_props: HashMap<String, BTreeSet<String>>,
}

impl<'s> Transformer<'s> {
    fn new(source: &'s str, file: Option<&Path>) -> Self {
        Transformer {
            source,
            file: file.map(Path::to_path_buf),
            table: SymbolTable::new(),
            constants: BTreeMap::new(),
            required_props: HashMap::new(),
        }
    }

    fn text(&self, span: Span) -> &'s str {
        &self.source[span.start as usize..span.end as usize]
    }

    /// First pass: imports, constants, propTypes and component candidates.
    fn collect_module_items<'p, 'a>(&mut self, program: &'p Program<'a>) -> Vec<Candidate<'p, 'a>> {
        let mut candidates = Vec::new();
        let mut default_name = None;

        for stmt in &program.body {
            match stmt {
                Statement::ImportDeclaration(decl) => self.record_import(decl),
                Statement::FunctionDeclaration(func) => {
                    candidates.extend(function_candidate(func, false));
                }
                Statement::VariableDeclaration(decl) => {
                    candidates.extend(self.variable_candidates(decl));
                }
                Statement::ExportNamedDeclaration(export) => match &export.declaration {
                    Some(Declaration::FunctionDeclaration(func)) => {
                        candidates.extend(function_candidate(func, false));
                    }
                    Some(Declaration::VariableDeclaration(decl)) => {
                        candidates.extend(self.variable_candidates(decl));
                    }
                    _ => {}
                },
                Statement::ExportDefaultDeclaration(export) => match &export.declaration {
                    ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                        let mut candidate = function_candidate(func, true);
                        if let Some(candidate) = candidate.as_mut() {
                            if func.id.is_none() {
                                candidate.name = self.anonymous_name();
                            }
                        }
                        candidates.extend(candidate);
                    }
                    ExportDefaultDeclarationKind::ArrowFunctionExpression(arrow) => {
                        if let Some(returns) = arrow_returns(arrow) {
                            candidates.push(Candidate {
                                name: self.anonymous_name(),
                                params: &arrow.params,
                                body: &arrow.body,
                                returns,
                                default_export: true,
                            });
                        }
                    }
                    ExportDefaultDeclarationKind::Identifier(id) => {
                        default_name = Some(id.name.to_string());
                    }
                    _ => {}
                },
                Statement::ExpressionStatement(stmt) => self.record_prop_types(&stmt.expression),
                _ => {}
            }
        }

        if let Some(name) = default_name {
            for candidate in candidates.iter_mut() {
                if candidate.name == name {
                    candidate.default_export = true;
                }
            }
        }
        candidates
    }

    /// Key of an anonymous default export. Unique per file so merged
    /// tables keep one per module.
    fn anonymous_name(&self) -> String {
        match &self.file {
            Some(file) => format!("DefaultComponent:{}", file.display()),
            None => "DefaultComponent".to_string(),
        }
    }

    fn record_import(&mut self, decl: &ImportDeclaration) {
        let Some(specifiers) = &decl.specifiers else {
            return;
        };
        for specifier in specifiers {
            let (local, imported) = match specifier {
                ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => (&s.local, None),
                ImportDeclarationSpecifier::ImportSpecifier(s) => {
                    let name = s.imported.name();
                    (&s.local, (name != "default").then(|| name.to_string()))
                }
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(_) => continue,
            };
            self.table.dependencies.insert(
                local.name.to_string(),
                DependencyRecord {
                    source: decl.source.value.to_string(),
                    imported,
                    required_from: self.file.clone(),
                    path: None,
                    is_used_as_rc: false,
                },
            );
        }
    }

    fn variable_candidates<'p, 'a>(
        &mut self,
        decl: &'p VariableDeclaration<'a>,
    ) -> Vec<Candidate<'p, 'a>> {
        let mut candidates = Vec::new();
        for declarator in &decl.declarations {
            let BindingPattern::BindingIdentifier(id) = &declarator.id else {
                continue;
            };
            let name = id.name.to_string();
            let Some(init) = &declarator.init else {
                continue;
            };
            let (params, body, returns) = match strip_parens(init) {
                Expression::ArrowFunctionExpression(arrow) => {
                    (&arrow.params, Some(&*arrow.body), arrow_returns(arrow))
                }
                Expression::FunctionExpression(func) => {
                    (&func.params, func.body.as_deref(), function_returns(func))
                }
                other => {
                    if decl.kind == VariableDeclarationKind::Const {
                        self.record_constant(name, other);
                    }
                    continue;
                }
            };
            if let (Some(body), Some(returns)) = (body, returns) {
                if is_component_name(&name) && params.items.len() <= 1 {
                    candidates.push(Candidate {
                        name,
                        params,
                        body,
                        returns,
                        default_export: false,
                    });
                }
            }
        }
        candidates
    }

    fn record_constant(&mut self, name: String, init: &Expression) {
        let code = self.text(init.span()).to_string();
        if static_eval::evaluate(&code, &self.constants).is_some() {
            self.constants.insert(name, code);
        }
    }

    /// `Name.propTypes = { a: PropTypes.string.isRequired }`
    fn record_prop_types(&mut self, expr: &Expression) {
        let Expression::AssignmentExpression(assign) = expr else {
            return;
        };
        let AssignmentTarget::StaticMemberExpression(target) = &assign.left else {
            return;
        };
        if target.property.name != "propTypes" {
            return;
        }
        let Expression::Identifier(component) = &target.object else {
            return;
        };
        let Expression::ObjectExpression(object) = &assign.right else {
            return;
        };
        let required = self
            .required_props
            .entry(component.name.to_string())
            .or_default();
        for property in &object.properties {
            if let ObjectPropertyKind::ObjectProperty(p) = property {
                let value = &self.source[p.value.span().start as usize..p.value.span().end as usize];
                if let Some(key) = property_key_name(&p.key) {
                    if value.trim_end().ends_with(".isRequired") {
                        required.insert(key);
                    }
                }
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // COMPONENT BODIES
    // ═══════════════════════════════════════════════════════════════════════════

    fn lower_component(&mut self, candidate: Candidate) {
        let props = component_props(candidate.params);
        let mut constants = self.constants.clone();
        for name in local_bindings(candidate.params, candidate.body) {
            constants.remove(&name);
        }
        debug!(
            "lowering component {} ({} props, default: {})",
            candidate.name,
            props.len(),
            candidate.default_export
        );

        let mut mixin = Node::Mixin(MixinNode {
            name: candidate.name.clone(),
            props,
            constants,
            children: Vec::new(),
        });
        self.lower_returns(&candidate.returns, &mut mixin);

        let Node::Mixin(mixin) = mixin else {
            return;
        };
        self.table.components.insert(
            candidate.name,
            ComponentRecord {
                mixin,
                default_export: candidate.default_export,
                created_from: self.file.clone(),
            },
        );
    }

    /// `if (a) return <A/>; return <B/>;` renders as a condition on `a`
    /// with the remaining returns as its alternate.
    fn lower_returns(&mut self, branches: &[ReturnBranch], ctx: &mut Node) {
        let Some((first, rest)) = branches.split_first() else {
            return;
        };
        let Some(test) = first.test else {
            self.lower_markup(first.value, ctx);
            return;
        };
        let mut remainder = Node::fragment();
        self.lower_returns(rest, &mut remainder);
        let remainder = remainder.into_slot();

        let condition = if is_null(first.value) {
            let inner = self.text(strip_parens(test).span());
            Node::conditional(negate(test, inner), remainder, None)
        } else {
            let consequent = self.lower_slot(first.value);
            Node::conditional(self.text(test.span()), consequent, remainder)
        };
        ctx.append(condition);
    }

    /// Lowers an expression in markup position (returned value, expression
    /// container, logical/conditional operand) into `ctx`.
    fn lower_markup(&mut self, expr: &Expression, ctx: &mut Node) {
        match strip_parens(expr) {
            Expression::JSXElement(element) => self.lower_element(element, ctx),
            Expression::JSXFragment(fragment) => self.lower_children(&fragment.children, ctx),
            Expression::LogicalExpression(logical) => self.lower_logical(logical, ctx),
            Expression::ConditionalExpression(cond) => self.lower_conditional(cond, ctx),
            Expression::CallExpression(call) if is_map_iterator(call) => {
                self.lower_iteration(call, ctx)
            }
            Expression::NullLiteral(_) => {}
            other => ctx.append(Node::interpolation(self.text(other.span()))),
        }
    }

    fn lower_logical(&mut self, logical: &LogicalExpression, ctx: &mut Node) {
        let test = self.text(logical.left.span());
        match logical.operator {
            LogicalOperator::And => {
                let consequent = self.lower_slot(&logical.right);
                ctx.append(Node::conditional(test, consequent, None));
            }
            LogicalOperator::Or => {
                // Left is rendered when truthy, right markup otherwise.
                let consequent = Some(Box::new(Node::interpolation(test)));
                let alternate = self.lower_slot(&logical.right);
                ctx.append(Node::conditional(test, consequent, alternate));
            }
            LogicalOperator::Coalesce => {
                ctx.append(Node::interpolation(self.text(logical.span)));
            }
        }
    }

    fn lower_conditional(&mut self, cond: &ConditionalExpression, ctx: &mut Node) {
        if is_null(&cond.consequent) {
            let inner = self.text(strip_parens(&cond.test).span());
            let consequent = self.lower_slot(&cond.alternate);
            ctx.append(Node::conditional(negate(&cond.test, inner), consequent, None));
            return;
        }
        let consequent = self.lower_slot(&cond.consequent);
        let alternate = self.lower_slot(&cond.alternate);
        ctx.append(Node::conditional(self.text(cond.test.span()), consequent, alternate));
    }

    /// Lowers a branch on its own so several siblings stay in one slot.
    fn lower_slot(&mut self, expr: &Expression) -> Option<Box<Node>> {
        let mut slot = Node::fragment();
        self.lower_branch(expr, &mut slot);
        slot.into_slot()
    }

    /// Operand of a logical or conditional expression.
    fn lower_branch(&mut self, expr: &Expression, ctx: &mut Node) {
        match strip_parens(expr) {
            Expression::StringLiteral(s) => ctx.append(Node::text(s.value.as_str())),
            other => self.lower_markup(other, ctx),
        }
    }

    fn lower_iteration(&mut self, call: &CallExpression, ctx: &mut Node) {
        let (Expression::StaticMemberExpression(callee), Some(callback)) =
            (&call.callee, call.arguments.first())
        else {
            return;
        };
        let (params, returns) = match callback {
            Argument::ArrowFunctionExpression(arrow) => (&arrow.params, arrow_returns(arrow)),
            Argument::FunctionExpression(func) => (&func.params, function_returns(func)),
            _ => {
                ctx.append(Node::interpolation(self.text(call.span)));
                return;
            }
        };
        let binding = |i: usize| {
            params
                .items
                .get(i)
                .map(|p| self.text(p.pattern.span()).to_string())
        };
        let mut iteration = Node::Iteration(crate::ast::IterationNode {
            iterable: crate::ast::Expression::new(self.text(callee.object.span())),
            item: binding(0).unwrap_or_else(|| "item".to_string()),
            index: binding(1),
            array: binding(2),
            body: Vec::new(),
        });
        if let Some(returns) = returns {
            self.lower_returns(&returns, &mut iteration);
        }
        ctx.append(iteration);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // JSX
    // ═══════════════════════════════════════════════════════════════════════════

    fn lower_element(&mut self, element: &JSXElement, ctx: &mut Node) {
        let tag = tag_name(&element.opening_element.name);
        if matches!(tag.as_str(), "Fragment" | "React.Fragment") {
            self.lower_children(&element.children, ctx);
            return;
        }

        let binding = tag.split('.').next().unwrap_or_default();
        if let Some(dependency) = self.table.dependencies.get_mut(binding) {
            dependency.is_used_as_rc = true;
        }

        let mut node = Node::element(tag);
        for item in &element.opening_element.attributes {
            match item {
                JSXAttributeItem::Attribute(attr) => self.lower_attribute(attr, &mut node),
                JSXAttributeItem::SpreadAttribute(_) => {
                    debug!("spread attributes are not rendered");
                }
            }
        }
        self.lower_children(&element.children, &mut node);
        ctx.append(node);
    }

    fn lower_children(&mut self, children: &[JSXChild], ctx: &mut Node) {
        for child in children {
            match child {
                JSXChild::Text(t) => {
                    let value = clean_jsx_text(t.value.as_str());
                    if !value.is_empty() {
                        ctx.append(Node::text(value));
                    }
                }
                JSXChild::Element(el) => self.lower_element(el, ctx),
                JSXChild::Fragment(frag) => self.lower_children(&frag.children, ctx),
                JSXChild::ExpressionContainer(container) => {
                    if let Some(expr) = container.expression.as_expression() {
                        self.lower_markup(expr, ctx);
                    }
                }
                JSXChild::Spread(_) => {}
            }
        }
    }

    fn lower_attribute(&mut self, attr: &JSXAttribute, element: &mut Node) {
        let name = match &attr.name {
            JSXAttributeName::Identifier(id) => id.name.to_string(),
            JSXAttributeName::NamespacedName(ns) => {
                format!("{}:{}", ns.namespace.name, ns.name.name)
            }
        };
        if should_ignore_attribute(&name) {
            debug!("dropping attribute {}", name);
            return;
        }
        let name = match name.as_str() {
            "className" => "class".to_string(),
            "htmlFor" => "for".to_string(),
            _ => name,
        };

        let attribute = match &attr.value {
            None => Attribute::boolean(name),
            Some(JSXAttributeValue::StringLiteral(s)) => Attribute::string(name, s.value.as_str()),
            Some(JSXAttributeValue::ExpressionContainer(container)) => {
                let Some(expr) = container.expression.as_expression() else {
                    return;
                };
                if name == "style" {
                    if let Expression::ObjectExpression(object) = strip_parens(expr) {
                        if let Some(styles) = inline_styles(object) {
                            if !styles.is_empty() {
                                element.add_attribute(Attribute::string(name, styles));
                            }
                            return;
                        }
                    }
                }
                Attribute::dynamic(name, self.text(expr.span()))
            }
            Some(JSXAttributeValue::Element(el)) => Attribute::dynamic(name, self.text(el.span)),
            Some(JSXAttributeValue::Fragment(frag)) => {
                Attribute::dynamic(name, self.text(frag.span))
            }
        };
        element.add_attribute(attribute);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

fn is_component_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

fn function_candidate<'p, 'a>(func: &'p Function<'a>, default_export: bool) -> Option<Candidate<'p, 'a>> {
    let body = func.body.as_deref()?;
    let returns = function_returns(func)?;
    if func.params.items.len() > 1 {
        return None;
    }
    let name = match &func.id {
        Some(id) => id.name.to_string(),
        None if default_export => "DefaultComponent".to_string(),
        None => return None,
    };
    if !is_component_name(&name) {
        return None;
    }
    Some(Candidate {
        name,
        params: &func.params,
        body,
        returns,
        default_export,
    })
}

fn function_returns<'p, 'a>(func: &'p Function<'a>) -> Option<Vec<ReturnBranch<'p, 'a>>> {
    returned_markup(&func.body.as_ref()?.statements)
}

fn arrow_returns<'p, 'a>(arrow: &'p ArrowFunctionExpression<'a>) -> Option<Vec<ReturnBranch<'p, 'a>>> {
    if arrow.expression {
        if let Some(Statement::ExpressionStatement(stmt)) = arrow.body.statements.first() {
            return contains_markup(&stmt.expression).then(|| {
                vec![ReturnBranch {
                    test: None,
                    value: &stmt.expression,
                }]
            });
        }
        return None;
    }
    returned_markup(&arrow.body.statements)
}

/// Top-level returns in order: guarded early returns (`if (t) return x;`,
/// also with an `else` return) up to the first unconditional one. `None`
/// unless one of them returns markup.
fn returned_markup<'p, 'a>(statements: &'p [Statement<'a>]) -> Option<Vec<ReturnBranch<'p, 'a>>> {
    let mut branches = Vec::new();
    for stmt in statements {
        match stmt {
            Statement::IfStatement(if_stmt) => {
                if guarded_returns(if_stmt, &mut branches) {
                    break;
                }
            }
            Statement::ReturnStatement(ret) => {
                if let Some(value) = &ret.argument {
                    branches.push(ReturnBranch { test: None, value });
                }
                break;
            }
            _ => {}
        }
    }
    branches
        .iter()
        .any(|branch| contains_markup(branch.value))
        .then_some(branches)
}

/// Pushes the returns of an `if` / `else if` chain. True when every path
/// of the chain returns.
fn guarded_returns<'p, 'a>(
    if_stmt: &'p IfStatement<'a>,
    branches: &mut Vec<ReturnBranch<'p, 'a>>,
) -> bool {
    let Some(value) = guarded_return(&if_stmt.consequent) else {
        return false;
    };
    branches.push(ReturnBranch {
        test: Some(&if_stmt.test),
        value,
    });
    match &if_stmt.alternate {
        Some(Statement::IfStatement(nested)) => guarded_returns(nested, branches),
        Some(other) => match guarded_return(other) {
            Some(value) => {
                branches.push(ReturnBranch { test: None, value });
                true
            }
            None => false,
        },
        None => false,
    }
}

/// `return x;` or `{ return x; }`.
fn guarded_return<'p, 'a>(stmt: &'p Statement<'a>) -> Option<&'p Expression<'a>> {
    match stmt {
        Statement::ReturnStatement(ret) => ret.argument.as_ref(),
        Statement::BlockStatement(block) => match block.body.as_slice() {
            [Statement::ReturnStatement(ret)] => ret.argument.as_ref(),
            _ => None,
        },
        _ => None,
    }
}

fn is_null(expr: &Expression) -> bool {
    matches!(strip_parens(expr), Expression::NullLiteral(_))
}

#[derive(Default)]
struct MarkupFinder {
    found: bool,
}

impl<'a> Visit<'a> for MarkupFinder {
    fn visit_jsx_element(&mut self, element: &JSXElement<'a>) {
        self.found = true;
        walk::walk_jsx_element(self, element);
    }

    fn visit_jsx_fragment(&mut self, fragment: &JSXFragment<'a>) {
        self.found = true;
        walk::walk_jsx_fragment(self, fragment);
    }
}

fn contains_markup(expr: &Expression) -> bool {
    let mut finder = MarkupFinder::default();
    finder.visit_expression(expr);
    finder.found
}

/// Every name a component function binds: parameters, locals, nested
/// functions and callback parameters.
#[derive(Default)]
struct BindingCollector {
    names: BTreeSet<String>,
}

impl<'a> Visit<'a> for BindingCollector {
    fn visit_binding_identifier(&mut self, ident: &BindingIdentifier<'a>) {
        self.names.insert(ident.name.to_string());
    }
}

fn local_bindings(params: &FormalParameters, body: &FunctionBody) -> BTreeSet<String> {
    let mut collector = BindingCollector::default();
    collector.visit_formal_parameters(params);
    collector.visit_function_body(body);
    collector.names
}

fn component_props(params: &FormalParameters) -> Vec<PropDefinition> {
    let Some(first) = params.items.first() else {
        return Vec::new();
    };
    let BindingPattern::ObjectPattern(object) = &first.pattern else {
        return Vec::new();
    };
    object
        .properties
        .iter()
        .filter_map(|p| property_key_name(&p.key))
        .map(|name| PropDefinition {
            name,
            is_required: false,
        })
        .collect()
}

fn property_key_name(key: &PropertyKey) -> Option<String> {
    match key {
        PropertyKey::StaticIdentifier(id) => Some(id.name.to_string()),
        PropertyKey::StringLiteral(s) => Some(s.value.to_string()),
        _ => None,
    }
}

fn is_map_iterator(call: &CallExpression) -> bool {
    matches!(&call.callee, Expression::StaticMemberExpression(m) if m.property.name == "map")
}

fn should_ignore_attribute(name: &str) -> bool {
    IGNORED_ATTRIBUTES.contains(&name) || EVENT_HANDLER_RE.is_match(name)
}

fn tag_name(name: &JSXElementName) -> String {
    match name {
        JSXElementName::Identifier(id) => id.name.to_string(),
        JSXElementName::IdentifierReference(id) => id.name.to_string(),
        JSXElementName::NamespacedName(ns) => format!("{}:{}", ns.namespace.name, ns.name.name),
        JSXElementName::MemberExpression(me) => member_name(me),
        JSXElementName::ThisExpression(_) => "this".to_string(),
    }
}

fn member_name(me: &JSXMemberExpression) -> String {
    let object = match &me.object {
        JSXMemberExpressionObject::IdentifierReference(id) => id.name.to_string(),
        JSXMemberExpressionObject::MemberExpression(inner) => member_name(inner),
        _ => "this".to_string(),
    };
    format!("{}.{}", object, me.property.name)
}

/// `!test`, parenthesised unless the operand binds tighter than `!`.
/// A negation is unwrapped instead.
fn negate(expr: &Expression, code: &str) -> String {
    match strip_parens(expr) {
        Expression::UnaryExpression(unary) if unary.operator == UnaryOperator::LogicalNot => {
            code.strip_prefix('!').unwrap_or(code).trim_start().to_string()
        }
        Expression::Identifier(_)
        | Expression::StaticMemberExpression(_)
        | Expression::ComputedMemberExpression(_)
        | Expression::CallExpression(_)
        | Expression::UnaryExpression(_) => format!("!{}", code),
        _ => format!("!({})", code),
    }
}

/// JSX text whitespace rules: lines are trimmed, blank lines dropped and
/// the rest joined with single spaces.
pub fn clean_jsx_text(value: &str) -> String {
    let lines: Vec<&str> = value.split('\n').map(|l| l.trim_end_matches('\r')).collect();
    let last_non_empty = lines
        .iter()
        .rposition(|l| l.chars().any(|c| c != ' ' && c != '\t'))
        .unwrap_or(0);

    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let mut trimmed = line.replace('\t', " ");
        if i != 0 {
            trimmed = trimmed.trim_start_matches(' ').to_string();
        }
        if i != lines.len() - 1 {
            trimmed = trimmed.trim_end_matches(' ').to_string();
        }
        if !trimmed.is_empty() {
            out.push_str(&trimmed);
            if i != last_non_empty {
                out.push(' ');
            }
        }
    }
    out
}

/// Flattens a `style={{...}}` object. `None` when a value is not a literal.
fn inline_styles(object: &ObjectExpression) -> Option<String> {
    let mut out = String::new();
    for property in &object.properties {
        let ObjectPropertyKind::ObjectProperty(p) = property else {
            return None;
        };
        let key = property_key_name(&p.key)?;
        let value = match strip_parens(&p.value) {
            Expression::StringLiteral(s) => s.value.to_string(),
            Expression::NumericLiteral(n) => {
                let number = static_eval::format_number(n.value);
                if n.value == 0.0 || UNITLESS_STYLES.contains(&key.as_str()) {
                    number
                } else {
                    format!("{}px", number)
                }
            }
            _ => return None,
        };
        let css_key = UPPERCASE_RE
            .replace_all(&key, "-$1")
            .to_lowercase();
        out.push_str(&format!("{}:{};", css_key, value));
    }
    Some(out)
}

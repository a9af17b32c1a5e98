//! Liquid backend
//!
//! Liquid cannot run JS, so dynamic values are translated through a small
//! subset (identifiers, member access, literals, comparisons, logical
//! operators, a few string methods and template literals). Anything else
//! is rejected with `Unsupported <Kind> "<name>"`.

use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_span::GetSpan;

use crate::ast::{
    Attribute, AttributeValue, ConditionNode, ElementNode, IterationNode, Node, SymbolTable,
};
use crate::error::{CompileError, Result};
use crate::static_eval::{format_number, parse_expression, strip_parens};

use super::{
    escape_attribute, Bindings, CodeGenerator, GenerateOptions, RenderContext, TemplateWriter,
    VOID_ELEMENTS,
};

pub struct LiquidGenerator;

impl CodeGenerator for LiquidGenerator {
    fn generate(&self, ast: &Node, table: &SymbolTable, options: &GenerateOptions) -> Result<String> {
        let mut writer = LiquidWriter {
            ctx: RenderContext::new(table),
        };
        writer.render_node(ast, options.initial_indent_level)?;
        Ok(writer.ctx.finish())
    }
}

struct LiquidWriter<'t> {
    ctx: RenderContext<'t>,
}

fn attribute(attr: &Attribute) -> Result<String> {
    Ok(match &attr.value {
        AttributeValue::Boolean(true) => format!(" {}", attr.name),
        AttributeValue::Boolean(false) => String::new(),
        AttributeValue::String(s) => format!(" {}=\"{}\"", attr.name, escape_attribute(s)),
        AttributeValue::Dynamic(expr) => {
            let value = translate(&expr.code)?;
            let rendered = format!(" {}=\"{{{{ {} }}}}\"", attr.name, value);
            if attr.is_required {
                rendered
            } else {
                let (negated, test) = translate_test(&expr.code)?;
                let tag = if negated { "unless" } else { "if" };
                format!("{{% {} {} %}}{}{{% end{} %}}", tag, test, rendered, tag)
            }
        }
    })
}

impl<'t> TemplateWriter<'t> for LiquidWriter<'t> {
    fn ctx(&mut self) -> &mut RenderContext<'t> {
        &mut self.ctx
    }

    fn element(&mut self, element: &'t ElementNode, level: usize) -> Result<()> {
        let tag = &element.tag;
        let attrs = element
            .attributes
            .iter()
            .map(attribute)
            .collect::<Result<String>>()?;
        if VOID_ELEMENTS.contains(&tag.as_str()) {
            self.ctx.line(level, &format!("<{}{} />", tag, attrs));
        } else if element.children.is_empty() {
            self.ctx.line(level, &format!("<{}{}></{}>", tag, attrs, tag));
        } else {
            self.ctx.line(level, &format!("<{}{}>", tag, attrs));
            self.render_children(&element.children, level + 1)?;
            self.ctx.line(level, &format!("</{}>", tag));
        }
        Ok(())
    }

    fn text(&mut self, value: &str, level: usize) -> Result<()> {
        self.ctx.line(level, value);
        Ok(())
    }

    fn interpolation(&mut self, code: &str, level: usize) -> Result<()> {
        let value = translate(code)?;
        self.ctx.line(level, &format!("{{{{ {} }}}}", value));
        Ok(())
    }

    fn condition(&mut self, condition: &'t ConditionNode, level: usize) -> Result<()> {
        let (mut negated, test) = translate_test(&condition.test.code)?;
        let (consequent, alternate) = match (&condition.consequent, &condition.alternate) {
            (None, Some(alternate)) => {
                negated = !negated;
                (Some(alternate), None)
            }
            (consequent, alternate) => (consequent.as_ref(), alternate.as_ref()),
        };
        let tag = if negated { "unless" } else { "if" };

        self.ctx.line(level, &format!("{{% {} {} %}}", tag, test));
        if let Some(consequent) = consequent {
            self.render_node(consequent, level + 1)?;
        }
        if let Some(alternate) = alternate {
            self.ctx.line(level, "{% else %}");
            self.render_node(alternate, level + 1)?;
        }
        self.ctx.line(level, &format!("{{% end{} %}}", tag));
        Ok(())
    }

    fn iteration(&mut self, iteration: &'t IterationNode, level: usize) -> Result<()> {
        let mut iterable = translate(&iteration.iterable.code)?;
        if let Some(array) = &iteration.array {
            self.ctx
                .line(level, &format!("{{% assign {} = {} %}}", array, iterable));
            iterable = array.clone();
        }
        self.ctx.line(
            level,
            &format!("{{% for {} in {} %}}", iteration.item, iterable),
        );
        if let Some(index) = &iteration.index {
            self.ctx.line(
                level + 1,
                &format!("{{% assign {} = forloop.index0 %}}", index),
            );
        }
        self.render_children(&iteration.body, level + 1)?;
        self.ctx.line(level, "{% endfor %}");
        Ok(())
    }

    fn open_scope(&mut self, bindings: &Bindings<'t>, level: usize) -> Result<usize> {
        for (name, value) in bindings {
            let value = match value {
                None => "nil".to_string(),
                Some(AttributeValue::Boolean(b)) => b.to_string(),
                Some(AttributeValue::String(s)) => liquid_string(s),
                Some(AttributeValue::Dynamic(expr)) => translate(&expr.code)?,
            };
            self.ctx
                .line(level, &format!("{{% assign {} = {} %}}", name, value));
        }
        Ok(level)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPRESSION TRANSLATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Translates a JS expression to a Liquid value expression.
pub fn translate(code: &str) -> Result<String> {
    let allocator = Allocator::default();
    let expr = parse(&allocator, code)?;
    Translator { source: code }.expression(&expr)
}

/// Translates a condition. A leading `!` is reported separately so the
/// caller can emit `unless`.
pub fn translate_test(code: &str) -> Result<(bool, String)> {
    let allocator = Allocator::default();
    let expr = parse(&allocator, code)?;
    let translator = Translator { source: code };
    match strip_parens(&expr) {
        Expression::UnaryExpression(unary) if unary.operator == UnaryOperator::LogicalNot => {
            Ok((true, translator.expression(&unary.argument)?))
        }
        other => Ok((false, translator.expression(other)?)),
    }
}

fn parse<'a>(allocator: &'a Allocator, code: &'a str) -> Result<Expression<'a>> {
    parse_expression(allocator, code).ok_or_else(|| CompileError::Parse {
        file: "<expression>".to_string(),
        message: format!("invalid expression `{}`", code),
    })
}

/// Liquid string literals have no escapes: a value holding both quote
/// kinds is split into quotable runs joined with `append`.
fn liquid_string(value: &str) -> String {
    let mut runs: Vec<String> = Vec::new();
    let mut current = String::new();
    for c in value.chars() {
        let clashes = (c == '"' && current.contains('\''))
            || (c == '\'' && current.contains('"'));
        if clashes {
            runs.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    runs.push(current);

    runs.iter()
        .map(|run| {
            if run.contains('"') {
                format!("'{}'", run)
            } else {
                format!("\"{}\"", run)
            }
        })
        .collect::<Vec<_>>()
        .join(" | append: ")
}

struct Translator<'s> {
    source: &'s str,
}

impl<'s> Translator<'s> {
    fn text(&self, node: &impl GetSpan) -> &'s str {
        let span = node.span();
        &self.source[span.start as usize..span.end as usize]
    }

    fn unsupported(&self, expr: &Expression) -> CompileError {
        CompileError::unsupported(expression_kind(expr), self.text(expr))
    }

    fn expression(&self, expr: &Expression) -> Result<String> {
        match strip_parens(expr) {
            Expression::Identifier(id) if id.name == "undefined" => Ok("nil".to_string()),
            Expression::Identifier(id) => Ok(id.name.to_string()),
            Expression::StringLiteral(s) => Ok(liquid_string(&s.value)),
            Expression::NumericLiteral(n) => Ok(format_number(n.value)),
            Expression::BooleanLiteral(b) => Ok(b.value.to_string()),
            Expression::NullLiteral(_) => Ok("nil".to_string()),
            Expression::StaticMemberExpression(member) => {
                let object = self.expression(&member.object)?;
                let property = match member.property.name.as_str() {
                    "length" => "size",
                    other => other,
                };
                Ok(format!("{}.{}", object, property))
            }
            Expression::ComputedMemberExpression(member) => Ok(format!(
                "{}[{}]",
                self.expression(&member.object)?,
                self.expression(&member.expression)?
            )),
            Expression::UnaryExpression(unary)
                if unary.operator == UnaryOperator::UnaryNegation
                    && matches!(unary.argument, Expression::NumericLiteral(_)) =>
            {
                Ok(self.text(&**unary).to_string())
            }
            Expression::BinaryExpression(binary) => {
                let operator = match binary.operator {
                    BinaryOperator::Equality | BinaryOperator::StrictEquality => "==",
                    BinaryOperator::Inequality | BinaryOperator::StrictInequality => "!=",
                    BinaryOperator::LessThan => "<",
                    BinaryOperator::LessEqualThan => "<=",
                    BinaryOperator::GreaterThan => ">",
                    BinaryOperator::GreaterEqualThan => ">=",
                    other => {
                        return Err(CompileError::unsupported("BinaryExpression", other.as_str()))
                    }
                };
                let left = self.expression(&binary.left)?;
                let right = self.expression(&binary.right)?;
                // Filters are not allowed inside a comparison.
                if left.contains(" | ") || right.contains(" | ") {
                    return Err(CompileError::unsupported(
                        "BinaryExpression",
                        self.text(&**binary),
                    ));
                }
                Ok(format!("{} {} {}", left, operator, right))
            }
            Expression::LogicalExpression(logical) => {
                let operator = match logical.operator {
                    LogicalOperator::And => "and",
                    LogicalOperator::Or => "or",
                    LogicalOperator::Coalesce => {
                        return Err(CompileError::unsupported("LogicalExpression", "??"))
                    }
                };
                Ok(format!(
                    "{} {} {}",
                    self.expression(&logical.left)?,
                    operator,
                    self.expression(&logical.right)?
                ))
            }
            Expression::CallExpression(call) => self.call(call),
            Expression::TemplateLiteral(template) => self.template(template),
            other => Err(self.unsupported(other)),
        }
    }

    /// `s.toUpperCase()` and friends become filters.
    fn call(&self, call: &CallExpression) -> Result<String> {
        if let Expression::StaticMemberExpression(member) = &call.callee {
            let filter = match member.property.name.as_str() {
                "toUpperCase" => Some("upcase"),
                "toLowerCase" => Some("downcase"),
                "trim" => Some("strip"),
                _ => None,
            };
            if let (Some(filter), true) = (filter, call.arguments.is_empty()) {
                return Ok(format!("{} | {}", self.expression(&member.object)?, filter));
            }
        }
        let name = match strip_parens(&call.callee) {
            Expression::Identifier(id) => id.name.to_string(),
            callee => self.text(callee).to_string(),
        };
        Err(CompileError::unsupported("CallExpression", &name))
    }

    /// `` `a${b}c` `` becomes `"a" | append: b | append: "c"`.
    fn template(&self, template: &TemplateLiteral) -> Result<String> {
        let mut parts = Vec::new();
        for (i, quasi) in template.quasis.iter().enumerate() {
            let cooked = quasi
                .value
                .cooked
                .as_ref()
                .map(|c| c.as_str())
                .unwrap_or(quasi.value.raw.as_str());
            if !cooked.is_empty() {
                parts.push(liquid_string(cooked));
            }
            if let Some(expr) = template.expressions.get(i) {
                let value = self.expression(expr)?;
                if value.contains('|') || value.contains(' ') {
                    return Err(CompileError::unsupported(
                        "TemplateLiteral",
                        self.text(template),
                    ));
                }
                parts.push(value);
            }
        }
        match parts.split_first() {
            None => Ok("\"\"".to_string()),
            Some((first, rest)) => Ok(rest.iter().fold(first.clone(), |acc, part| {
                format!("{} | append: {}", acc, part)
            })),
        }
    }
}

fn expression_kind(expr: &Expression) -> &'static str {
    match expr {
        Expression::ArrayExpression(_) => "ArrayExpression",
        Expression::ArrowFunctionExpression(_) => "ArrowFunctionExpression",
        Expression::AssignmentExpression(_) => "AssignmentExpression",
        Expression::AwaitExpression(_) => "AwaitExpression",
        Expression::ChainExpression(_) => "ChainExpression",
        Expression::ConditionalExpression(_) => "ConditionalExpression",
        Expression::FunctionExpression(_) => "FunctionExpression",
        Expression::JSXElement(_) | Expression::JSXFragment(_) => "JSXElement",
        Expression::NewExpression(_) => "NewExpression",
        Expression::ObjectExpression(_) => "ObjectExpression",
        Expression::SequenceExpression(_) => "SequenceExpression",
        Expression::TaggedTemplateExpression(_) => "TaggedTemplateExpression",
        Expression::ThisExpression(_) => "ThisExpression",
        Expression::UnaryExpression(_) => "UnaryExpression",
        Expression::UpdateExpression(_) => "UpdateExpression",
        _ => "Expression",
    }
}

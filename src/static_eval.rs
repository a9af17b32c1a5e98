//! Static Expression Evaluator
//!
//! Resolves dynamic-value expressions to compile-time constants. The answer
//! is conservative: `None` whenever the value could differ at render time.

use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_parser::Parser;
use oxc_span::SourceType;
use std::collections::BTreeMap;

/// Names bound to constant source code, e.g. module-level `const` declarations.
pub type Scope = BTreeMap<String, String>;

/// Guards against self-referencing bindings.
const MAX_BINDING_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// `String(value)` in JS.
    pub fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
        }
    }

    fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
        }
    }

    fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
        }
    }
}

pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        // Exponent form below 1e-6 and from 1e21 up, with an explicit sign.
        let formatted = format!("{:e}", n);
        match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        }
    } else {
        format!("{}", n)
    }
}

pub fn source_type() -> SourceType {
    SourceType::default().with_module(true).with_jsx(true)
}

/// Parses a single expression into `allocator`.
pub fn parse_expression<'a>(allocator: &'a Allocator, code: &'a str) -> Option<Expression<'a>> {
    Parser::new(allocator, code, source_type())
        .parse_expression()
        .ok()
}

/// Try to evaluate an expression to a constant.
pub fn evaluate(code: &str, scope: &Scope) -> Option<Value> {
    let allocator = Allocator::default();
    let expr = parse_expression(&allocator, code)?;
    Evaluator { scope, depth: 0 }.eval(&expr)
}

/// Truthiness oracle: `Some(true|false)` when known statically.
pub fn is_truthy(code: &str, scope: &Scope) -> Option<bool> {
    let allocator = Allocator::default();
    let expr = parse_expression(&allocator, code)?;
    match strip_parens(&expr) {
        Expression::JSXElement(_)
        | Expression::JSXFragment(_)
        | Expression::ObjectExpression(_)
        | Expression::ArrayExpression(_)
        | Expression::ArrowFunctionExpression(_)
        | Expression::FunctionExpression(_) => Some(true),
        other => Evaluator { scope, depth: 0 }
            .eval(other)
            .map(|v| v.is_truthy()),
    }
}

pub fn strip_parens<'b, 'a>(expr: &'b Expression<'a>) -> &'b Expression<'a> {
    match expr {
        Expression::ParenthesizedExpression(p) => strip_parens(&p.expression),
        _ => expr,
    }
}

struct Evaluator<'s> {
    scope: &'s Scope,
    depth: usize,
}

impl<'s> Evaluator<'s> {
    fn eval(&self, expr: &Expression) -> Option<Value> {
        match expr {
            Expression::StringLiteral(s) => Some(Value::String(s.value.to_string())),
            Expression::NumericLiteral(n) => Some(Value::Number(n.value)),
            Expression::BooleanLiteral(b) => Some(Value::Bool(b.value)),
            Expression::NullLiteral(_) => Some(Value::Null),
            Expression::Identifier(id) => self.identifier(id.name.as_str()),
            Expression::ParenthesizedExpression(p) => self.eval(&p.expression),
            Expression::TemplateLiteral(t) => self.template(t),
            Expression::UnaryExpression(u) => self.unary(u),
            Expression::BinaryExpression(b) => self.binary(b),
            Expression::LogicalExpression(l) => self.logical(l),
            Expression::ConditionalExpression(c) => {
                if self.eval(&c.test)?.is_truthy() {
                    self.eval(&c.consequent)
                } else {
                    self.eval(&c.alternate)
                }
            }
            _ => None,
        }
    }

    fn identifier(&self, name: &str) -> Option<Value> {
        match name {
            "undefined" => Some(Value::Undefined),
            "NaN" => Some(Value::Number(f64::NAN)),
            "Infinity" => Some(Value::Number(f64::INFINITY)),
            _ => {
                if self.depth >= MAX_BINDING_DEPTH {
                    return None;
                }
                let code = self.scope.get(name)?;
                let allocator = Allocator::default();
                let expr = parse_expression(&allocator, code)?;
                Evaluator {
                    scope: self.scope,
                    depth: self.depth + 1,
                }
                .eval(&expr)
            }
        }
    }

    fn template(&self, template: &TemplateLiteral) -> Option<Value> {
        let mut out = String::new();
        for (i, quasi) in template.quasis.iter().enumerate() {
            out.push_str(quasi.value.cooked.as_ref()?.as_str());
            if let Some(expr) = template.expressions.get(i) {
                out.push_str(&self.eval(expr)?.to_js_string());
            }
        }
        Some(Value::String(out))
    }

    fn unary(&self, unary: &UnaryExpression) -> Option<Value> {
        let arg = self.eval(&unary.argument)?;
        match unary.operator {
            UnaryOperator::LogicalNot => Some(Value::Bool(!arg.is_truthy())),
            UnaryOperator::UnaryNegation => Some(Value::Number(-arg.to_number())),
            UnaryOperator::UnaryPlus => Some(Value::Number(arg.to_number())),
            UnaryOperator::Typeof => Some(Value::String(arg.type_of().to_string())),
            UnaryOperator::Void => Some(Value::Undefined),
            _ => None,
        }
    }

    fn binary(&self, binary: &BinaryExpression) -> Option<Value> {
        let left = self.eval(&binary.left)?;
        let right = self.eval(&binary.right)?;
        let value = match binary.operator {
            BinaryOperator::Addition => {
                if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
                    Value::String(left.to_js_string() + &right.to_js_string())
                } else {
                    Value::Number(left.to_number() + right.to_number())
                }
            }
            BinaryOperator::Subtraction => Value::Number(left.to_number() - right.to_number()),
            BinaryOperator::Multiplication => Value::Number(left.to_number() * right.to_number()),
            BinaryOperator::Division => Value::Number(left.to_number() / right.to_number()),
            BinaryOperator::Remainder => Value::Number(left.to_number() % right.to_number()),
            BinaryOperator::StrictEquality => Value::Bool(strict_equals(&left, &right)),
            BinaryOperator::StrictInequality => Value::Bool(!strict_equals(&left, &right)),
            BinaryOperator::Equality => Value::Bool(loose_equals(&left, &right)),
            BinaryOperator::Inequality => Value::Bool(!loose_equals(&left, &right)),
            BinaryOperator::LessThan => compare(&left, &right, |o| o.is_lt()),
            BinaryOperator::LessEqualThan => compare(&left, &right, |o| o.is_le()),
            BinaryOperator::GreaterThan => compare(&left, &right, |o| o.is_gt()),
            BinaryOperator::GreaterEqualThan => compare(&left, &right, |o| o.is_ge()),
            _ => return None,
        };
        Some(value)
    }

    fn logical(&self, logical: &LogicalExpression) -> Option<Value> {
        let left = self.eval(&logical.left)?;
        let short_circuits = match logical.operator {
            LogicalOperator::And => !left.is_truthy(),
            LogicalOperator::Or => left.is_truthy(),
            LogicalOperator::Coalesce => !left.is_nullish(),
        };
        if short_circuits {
            Some(left)
        } else {
            self.eval(&logical.right)
        }
    }
}

fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a == b,
        _ => left == right,
    }
}

fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (a, b) if a.is_nullish() && b.is_nullish() => true,
        (a, b) if a.is_nullish() || b.is_nullish() => false,
        (Value::String(a), Value::String(b)) => a == b,
        _ => left.to_number() == right.to_number(),
    }
}

fn compare(left: &Value, right: &Value, pick: fn(std::cmp::Ordering) -> bool) -> Value {
    let ordering = match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    };
    Value::Bool(ordering.map(pick).unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(code: &str) -> Option<Value> {
        evaluate(code, &Scope::new())
    }

    #[test]
    fn test_literals() {
        assert_eq!(eval("'World'"), Some(Value::String("World".to_string())));
        assert_eq!(eval("42"), Some(Value::Number(42.0)));
        assert_eq!(eval("false"), Some(Value::Bool(false)));
        assert_eq!(eval("null"), Some(Value::Null));
        assert_eq!(eval("undefined"), Some(Value::Undefined));
    }

    #[test]
    fn test_runtime_values_are_unknown() {
        assert_eq!(eval("title"), None);
        assert_eq!(eval("props.title"), None);
        assert_eq!(eval("getTitle()"), None);
        assert_eq!(eval("`a ${name}`"), None);
    }

    #[test]
    fn test_concatenation_and_template_literal() {
        assert_eq!(
            eval("'Page | ' + 1"),
            Some(Value::String("Page | 1".to_string()))
        );
        assert_eq!(
            eval("`btn ${true ? 'active' : ''}`"),
            Some(Value::String("btn active".to_string()))
        );
    }

    #[test]
    fn test_ternary_and_logical() {
        assert_eq!(
            eval("false ? 'Yes' : 'No'"),
            Some(Value::String("No".to_string()))
        );
        // the right operand is never reached
        assert_eq!(eval("false && user.name"), Some(Value::Bool(false)));
        assert_eq!(eval("null ?? 'fallback'"), Some(Value::String("fallback".to_string())));
        assert_eq!(eval("true && user.name"), None);
    }

    #[test]
    fn test_scope_bindings() {
        let mut scope = Scope::new();
        scope.insert("SIZE".to_string(), "'large'".to_string());
        scope.insert("LABEL".to_string(), "`size-${SIZE}`".to_string());
        assert_eq!(
            evaluate("LABEL", &scope),
            Some(Value::String("size-large".to_string()))
        );

        let mut cyclic = Scope::new();
        cyclic.insert("a".to_string(), "b".to_string());
        cyclic.insert("b".to_string(), "a".to_string());
        assert_eq!(evaluate("a", &cyclic), None);
    }

    #[test]
    fn test_truthiness_oracle() {
        let scope = Scope::new();
        assert_eq!(is_truthy("0", &scope), Some(false));
        assert_eq!(is_truthy("'x'", &scope), Some(true));
        assert_eq!(is_truthy("<div />", &scope), Some(true));
        assert_eq!(is_truthy("[]", &scope), Some(true));
        assert_eq!(is_truthy("visible", &scope), None);
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(eval("1 / 0").map(|v| v.to_js_string()), Some("Infinity".to_string()));
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(-2.5e30), "-2.5e+30");
        assert_eq!(format_number(123456789012345680000.0), "123456789012345680000");
        assert_eq!(format_number(0.000001), "0.000001");
        assert_eq!(format_number(1.5e-7), "1.5e-7");
    }
}

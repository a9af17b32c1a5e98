use crate::ast::{
    Attribute, AttributeValue, ConditionNode, ElementNode, IterationNode, Node, SymbolTable,
};
use crate::error::Result;

use super::{
    escape_attribute, js_binding_value, Bindings, CodeGenerator, GenerateOptions, RenderContext,
    TemplateWriter, VOID_ELEMENTS,
};

pub struct EjsGenerator;

impl CodeGenerator for EjsGenerator {
    fn generate(&self, ast: &Node, table: &SymbolTable, options: &GenerateOptions) -> Result<String> {
        let mut writer = EjsWriter {
            ctx: RenderContext::new(table),
            scopes: Vec::new(),
        };
        writer.render_node(ast, options.initial_indent_level)?;
        Ok(writer.ctx.finish())
    }
}

struct EjsWriter<'t> {
    ctx: RenderContext<'t>,
    /// Closing line of each open component scope, if it opened one.
    scopes: Vec<Option<String>>,
}

fn attribute(attr: &Attribute) -> String {
    match &attr.value {
        AttributeValue::Boolean(true) => format!(" {}", attr.name),
        AttributeValue::Boolean(false) => String::new(),
        AttributeValue::String(s) => format!(" {}=\"{}\"", attr.name, escape_attribute(s)),
        AttributeValue::Dynamic(expr) if attr.is_required => {
            format!(" {}=\"<%= {} %>\"", attr.name, expr.code)
        }
        AttributeValue::Dynamic(expr) => format!(
            "<% if ({code}) {{ %> {name}=\"<%= {code} %>\"<% }} %>",
            code = expr.code,
            name = attr.name
        ),
    }
}

impl<'t> TemplateWriter<'t> for EjsWriter<'t> {
    fn ctx(&mut self) -> &mut RenderContext<'t> {
        &mut self.ctx
    }

    fn element(&mut self, element: &'t ElementNode, level: usize) -> Result<()> {
        let tag = &element.tag;
        let attrs: String = element.attributes.iter().map(attribute).collect();
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
        self.ctx.line(level, &format!("<%= {} %>", code));
        Ok(())
    }

    fn condition(&mut self, condition: &'t ConditionNode, level: usize) -> Result<()> {
        self.ctx
            .line(level, &format!("<% if ({}) {{ %>", condition.test.code));
        if let Some(consequent) = &condition.consequent {
            self.render_node(consequent, level + 1)?;
        }
        if let Some(alternate) = &condition.alternate {
            self.ctx.line(level, "<% } else { %>");
            self.render_node(alternate, level + 1)?;
        }
        self.ctx.line(level, "<% } %>");
        Ok(())
    }

    fn iteration(&mut self, iteration: &'t IterationNode, level: usize) -> Result<()> {
        let params: Vec<&str> = [
            Some(iteration.item.as_str()),
            iteration.index.as_deref(),
            iteration.array.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();
        self.ctx.line(
            level,
            &format!(
                "<% {}.forEach(function({}) {{ %>",
                iteration.iterable.code,
                params.join(", ")
            ),
        );
        self.render_children(&iteration.body, level + 1)?;
        self.ctx.line(level, "<% }) %>");
        Ok(())
    }

    fn open_scope(&mut self, bindings: &Bindings<'t>, level: usize) -> Result<usize> {
        if bindings.is_empty() {
            self.scopes.push(None);
            return Ok(level);
        }
        let names: Vec<&str> = bindings.iter().map(|(name, _)| *name).collect();
        let args: Vec<String> = bindings
            .iter()
            .map(|(_, value)| js_binding_value(*value))
            .collect();
        self.ctx
            .line(level, &format!("<% (function ({}) {{ %>", names.join(", ")));
        self.scopes
            .push(Some(format!("<% }})({}); %>", args.join(", "))));
        Ok(level + 1)
    }

    fn close_scope(&mut self, level: usize) -> Result<()> {
        if let Some(Some(close)) = self.scopes.pop() {
            self.ctx.line(level, &close);
        }
        Ok(())
    }
}

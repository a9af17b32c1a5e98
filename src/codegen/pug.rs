use crate::ast::{
    Attribute, AttributeValue, ConditionNode, ElementNode, IterationNode, Node, SymbolTable,
};
use crate::error::Result;

use super::{
    js_binding_value, js_string, Bindings, CodeGenerator, GenerateOptions, RenderContext,
    TemplateWriter,
};

pub struct PugGenerator;

impl CodeGenerator for PugGenerator {
    fn generate(&self, ast: &Node, table: &SymbolTable, options: &GenerateOptions) -> Result<String> {
        let mut writer = PugWriter {
            ctx: RenderContext::new(table),
        };
        writer.render_node(ast, options.initial_indent_level)?;
        Ok(writer.ctx.finish())
    }
}

struct PugWriter<'t> {
    ctx: RenderContext<'t>,
}

/// Pug drops attributes whose value is falsy, so no guard is needed.
fn attribute(attr: &Attribute) -> Option<String> {
    match &attr.value {
        AttributeValue::Boolean(true) => Some(attr.name.clone()),
        AttributeValue::Boolean(false) => None,
        AttributeValue::String(s) => Some(format!("{}={}", attr.name, js_string(s))),
        AttributeValue::Dynamic(expr) => Some(format!("{}={}", attr.name, expr.code)),
    }
}

impl<'t> TemplateWriter<'t> for PugWriter<'t> {
    fn ctx(&mut self) -> &mut RenderContext<'t> {
        &mut self.ctx
    }

    fn element(&mut self, element: &'t ElementNode, level: usize) -> Result<()> {
        let attrs: Vec<String> = element.attributes.iter().filter_map(attribute).collect();
        if attrs.is_empty() {
            self.ctx.line(level, &element.tag);
        } else {
            self.ctx
                .line(level, &format!("{}({})", element.tag, attrs.join(", ")));
        }
        self.render_children(&element.children, level + 1)
    }

    fn text(&mut self, value: &str, level: usize) -> Result<()> {
        self.ctx.line(level, &format!("| {}", value));
        Ok(())
    }

    fn interpolation(&mut self, code: &str, level: usize) -> Result<()> {
        self.ctx.line(level, &format!("= {}", code));
        Ok(())
    }

    fn condition(&mut self, condition: &'t ConditionNode, level: usize) -> Result<()> {
        let test = &condition.test.code;
        match (&condition.consequent, &condition.alternate) {
            (None, Some(alternate)) => {
                self.ctx.line(level, &format!("unless {}", test));
                self.render_node(alternate, level + 1)
            }
            (consequent, alternate) => {
                self.ctx.line(level, &format!("if {}", test));
                if let Some(consequent) = consequent {
                    self.render_node(consequent, level + 1)?;
                }
                if let Some(alternate) = alternate {
                    self.ctx.line(level, "else");
                    self.render_node(alternate, level + 1)?;
                }
                Ok(())
            }
        }
    }

    fn iteration(&mut self, iteration: &'t IterationNode, level: usize) -> Result<()> {
        let mut iterable = iteration.iterable.code.as_str();
        if let Some(array) = &iteration.array {
            self.ctx
                .line(level, &format!("- var {} = {}", array, iterable));
            iterable = array;
        }
        let head = match &iteration.index {
            Some(index) => format!("each {}, {} in {}", iteration.item, index, iterable),
            None => format!("each {} in {}", iteration.item, iterable),
        };
        self.ctx.line(level, &head);
        self.render_children(&iteration.body, level + 1)
    }

    fn open_scope(&mut self, bindings: &Bindings<'t>, level: usize) -> Result<usize> {
        for (name, value) in bindings {
            self.ctx
                .line(level, &format!("- var {} = {}", name, js_binding_value(*value)));
        }
        Ok(level)
    }
}

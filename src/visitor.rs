use crate::ast::{
    Attribute, ConditionNode, ElementNode, FragmentNode, InterpolationNode, IterationNode,
    MixinNode, Node, RootNode, TextNode,
};

/// The TemplateVisitor trait is the single traversal mechanism for Template ASTs.
///
/// Rules:
/// 1. Traversal order is document order: attributes are visited after an
///    element's children, so attribute rewrites see resolved subtrees.
/// 2. Implementers override `visit_*` methods to add behavior.
/// 3. Implementers MUST call the matching `walk_*` function to continue
///    traversal unless pruning is intended.
/// 4. Replacing or removing a node happens in `visit_children` or
///    `visit_branch`, which own the slot the node lives in.
pub trait TemplateVisitor {
    fn visit_node(&mut self, node: &mut Node) {
        walk_node(self, node);
    }

    fn visit_root(&mut self, root: &mut RootNode) {
        walk_root(self, root);
    }

    fn visit_element(&mut self, element: &mut ElementNode) {
        walk_element(self, element);
    }

    fn visit_attributes(&mut self, attributes: &mut Vec<Attribute>) {
        walk_attributes(self, attributes);
    }

    fn visit_attribute(&mut self, _attribute: &mut Attribute) {
        // Leaf, nothing to walk by default
    }

    fn visit_text(&mut self, _text: &mut TextNode) {}

    fn visit_interpolation(&mut self, _interpolation: &mut InterpolationNode) {}

    fn visit_condition(&mut self, condition: &mut ConditionNode) {
        walk_condition(self, condition);
    }

    fn visit_iteration(&mut self, iteration: &mut IterationNode) {
        walk_iteration(self, iteration);
    }

    fn visit_mixin(&mut self, mixin: &mut MixinNode) {
        walk_mixin(self, mixin);
    }

    fn visit_fragment(&mut self, fragment: &mut FragmentNode) {
        walk_fragment(self, fragment);
    }

    fn visit_children(&mut self, children: &mut Vec<Node>) {
        walk_children(self, children);
    }

    /// A condition's consequent or alternate slot.
    fn visit_branch(&mut self, branch: &mut Option<Box<Node>>) {
        walk_branch(self, branch);
    }
}

pub fn walk_node<V: TemplateVisitor + ?Sized>(visitor: &mut V, node: &mut Node) {
    match node {
        Node::Root(r) => visitor.visit_root(r),
        Node::Element(el) => visitor.visit_element(el),
        Node::Text(t) => visitor.visit_text(t),
        Node::Condition(c) => visitor.visit_condition(c),
        Node::Iteration(it) => visitor.visit_iteration(it),
        Node::InterpolationEscaped(i) => visitor.visit_interpolation(i),
        Node::Mixin(m) => visitor.visit_mixin(m),
        Node::Fragment(f) => visitor.visit_fragment(f),
    }
}

pub fn walk_root<V: TemplateVisitor + ?Sized>(visitor: &mut V, root: &mut RootNode) {
    visitor.visit_children(&mut root.children);
}

pub fn walk_children<V: TemplateVisitor + ?Sized>(visitor: &mut V, children: &mut Vec<Node>) {
    for node in children {
        visitor.visit_node(node);
    }
}

pub fn walk_element<V: TemplateVisitor + ?Sized>(visitor: &mut V, element: &mut ElementNode) {
    visitor.visit_children(&mut element.children);
    visitor.visit_attributes(&mut element.attributes);
}

pub fn walk_attributes<V: TemplateVisitor + ?Sized>(
    visitor: &mut V,
    attributes: &mut Vec<Attribute>,
) {
    for attribute in attributes {
        visitor.visit_attribute(attribute);
    }
}

pub fn walk_condition<V: TemplateVisitor + ?Sized>(visitor: &mut V, condition: &mut ConditionNode) {
    visitor.visit_branch(&mut condition.consequent);
    visitor.visit_branch(&mut condition.alternate);
}

pub fn walk_branch<V: TemplateVisitor + ?Sized>(visitor: &mut V, branch: &mut Option<Box<Node>>) {
    if let Some(node) = branch {
        visitor.visit_node(node);
    }
}

pub fn walk_iteration<V: TemplateVisitor + ?Sized>(visitor: &mut V, iteration: &mut IterationNode) {
    visitor.visit_children(&mut iteration.body);
}

pub fn walk_mixin<V: TemplateVisitor + ?Sized>(visitor: &mut V, mixin: &mut MixinNode) {
    visitor.visit_children(&mut mixin.children);
}

pub fn walk_fragment<V: TemplateVisitor + ?Sized>(visitor: &mut V, fragment: &mut FragmentNode) {
    visitor.visit_children(&mut fragment.children);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Attribute;

    #[derive(Default)]
    struct Counter {
        attributes: usize,
        texts: Vec<String>,
    }

    impl TemplateVisitor for Counter {
        fn visit_attribute(&mut self, _attribute: &mut Attribute) {
            self.attributes += 1;
        }

        fn visit_text(&mut self, text: &mut TextNode) {
            self.texts.push(text.value.clone());
        }
    }

    #[test]
    fn walks_every_branch_in_document_order() {
        let mut div = Node::element("div");
        div.add_attribute(Attribute::dynamic("id", "x"));
        let mut cond = Node::condition("y");
        cond.append(Node::text("A"));
        cond.append(Node::text("B"));
        div.append(cond);
        let mut root = Node::root();
        root.append(div);

        let mut counter = Counter::default();
        counter.visit_node(&mut root);

        assert_eq!(counter.attributes, 1);
        assert_eq!(counter.texts, vec!["A", "B"]);
    }
}

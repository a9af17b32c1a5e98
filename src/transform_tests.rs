#[cfg(test)]
mod tests {
    use crate::error::CompileError;
    use crate::transform::{clean_jsx_text, transform_source, TransformOutput};
    use serde_json::{json, Value};

    fn lower(source: &str) -> TransformOutput {
        transform_source(source, None).unwrap()
    }

    /// Children of the root mixin as JSON.
    fn body(source: &str) -> Value {
        let out = lower(source);
        let tree = serde_json::to_value(&out.ast).unwrap();
        assert_eq!(tree["type"], "root");
        assert_eq!(tree["children"][0]["type"], "mixin");
        tree["children"][0]["children"].clone()
    }

    #[test]
    fn test_component_detection_forms() {
        let out = lower(
            r#"
            import React from 'react';
            function Header() { return <header />; }
            const Footer = () => <footer />;
            const Aside = function () { return <aside />; };
            const helper = () => 1;
            function lower() { return <i />; }
            function TooMany(a, b) { return <b />; }
            const Page = () => (<main><Header /><Footer /></main>);
            export default Page;
            "#,
        );
        let names: Vec<&str> = out.table.components.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Aside", "Footer", "Header", "Page"]);
        assert!(out.table.components["Page"].default_export);
        assert!(!out.table.components["Header"].default_export);
    }

    #[test]
    fn test_default_export_forms() {
        let out = lower("export default function Card() { return <div />; }");
        assert_eq!(out.table.default_component().unwrap().mixin.name, "Card");

        let out = lower("export default () => <p />;");
        assert_eq!(
            out.table.default_component().unwrap().mixin.name,
            "DefaultComponent"
        );

        let out = transform_source(
            "export default function ({ label }) { return <b>{label}</b>; }",
            Some(std::path::Path::new("/app/Tag.jsx")),
        )
        .unwrap();
        assert_eq!(
            out.table.default_component().unwrap().mixin.name,
            "DefaultComponent:/app/Tag.jsx"
        );

        let out = lower("export const Badge = () => <span />; export default Badge;");
        assert_eq!(out.table.default_component().unwrap().mixin.name, "Badge");
    }

    #[test]
    fn test_missing_default_export_is_an_error() {
        let err = transform_source("const A = () => <a />;", None).unwrap_err();
        assert!(matches!(err, CompileError::MissingDefaultExport { .. }));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = transform_source("const = ;", None).unwrap_err();
        assert_eq!(err.code(), crate::error::ERR_PARSE);
    }

    #[test]
    fn test_props_and_prop_types() {
        let out = lower(
            r#"
            import PropTypes from 'prop-types';
            const Card = ({ title, subtitle = 'x', ...rest }) => <div title={title}>{subtitle}</div>;
            Card.propTypes = {
              title: PropTypes.string.isRequired,
              subtitle: PropTypes.string,
            };
            export default Card;
            "#,
        );
        let props = serde_json::to_value(&out.table.components["Card"].mixin.props).unwrap();
        assert_eq!(
            props,
            json!([
                { "name": "title", "isRequired": true },
                { "name": "subtitle", "isRequired": false }
            ])
        );
        assert!(!out.table.dependencies["PropTypes"].is_used_as_rc);
    }

    #[test]
    fn test_conditional_with_string_branches() {
        let nodes = body(
            r#"
            export default function App({ x, y }) {
              return <div id={x}>{y ? "A" : "B"}</div>;
            }
            "#,
        );
        assert_eq!(
            nodes,
            json!([{
                "type": "element",
                "tag": "div",
                "attributes": [
                    { "name": "id", "value": { "kind": "dynamic", "value": { "code": "x" } }, "isRequired": false }
                ],
                "children": [{
                    "type": "condition",
                    "test": { "code": "y" },
                    "consequent": { "type": "text", "value": "A" },
                    "alternate": { "type": "text", "value": "B" }
                }]
            }])
        );
    }

    #[test]
    fn test_logical_and_lowering() {
        let nodes = body("const App = ({ open }) => <div>{open && <span>Hi</span>}</div>; export default App;");
        let condition = &nodes[0]["children"][0];
        assert_eq!(condition["type"], "condition");
        assert_eq!(condition["test"]["code"], "open");
        assert_eq!(condition["consequent"]["tag"], "span");
        assert_eq!(condition["alternate"], Value::Null);
    }

    #[test]
    fn test_logical_or_renders_left_or_fallback() {
        let nodes = body("const App = ({ label }) => <p>{label || <i>none</i>}</p>; export default App;");
        let condition = &nodes[0]["children"][0];
        assert_eq!(condition["test"]["code"], "label");
        assert_eq!(condition["consequent"]["type"], "interpolation-escaped");
        assert_eq!(condition["consequent"]["value"]["code"], "label");
        assert_eq!(condition["alternate"]["tag"], "i");
    }

    #[test]
    fn test_null_consequent_negates_test() {
        let nodes = body(
            r#"
            const App = ({ open, a, b }) => (
              <div>
                {open ? null : <em>closed</em>}
                {(a && b) ? null : <em>none</em>}
              </div>
            );
            export default App;
            "#,
        );
        let children = nodes[0]["children"].as_array().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0]["test"]["code"], "!open");
        assert_eq!(children[0]["consequent"]["tag"], "em");
        assert_eq!(children[1]["test"]["code"], "!(a && b)");
    }

    #[test]
    fn test_ternary_non_markup_branch_is_interpolated() {
        let nodes = body("const App = ({ n, x }) => <p>{n ? x.label : <b />}</p>; export default App;");
        let condition = &nodes[0]["children"][0];
        assert_eq!(condition["consequent"]["type"], "interpolation-escaped");
        assert_eq!(condition["consequent"]["value"]["code"], "x.label");
        assert_eq!(condition["alternate"]["tag"], "b");
    }

    #[test]
    fn test_nested_logical_inside_conditional() {
        let nodes = body(
            "const App = ({ a, b }) => <p>{a ? b && <i /> : <u />}</p>; export default App;",
        );
        let outer = &nodes[0]["children"][0];
        assert_eq!(outer["test"]["code"], "a");
        assert_eq!(outer["consequent"]["type"], "condition");
        assert_eq!(outer["consequent"]["test"]["code"], "b");
        assert_eq!(outer["consequent"]["consequent"]["tag"], "i");
        assert_eq!(outer["alternate"]["tag"], "u");
    }

    #[test]
    fn test_map_lowering() {
        let nodes = body(
            r#"
            const List = ({ items }) => (
              <ul>{items.map((item, i) => <li key={i}>{item}</li>)}</ul>
            );
            export default List;
            "#,
        );
        let iteration = &nodes[0]["children"][0];
        assert_eq!(iteration["type"], "iteration");
        assert_eq!(iteration["iterable"]["code"], "items");
        assert_eq!(iteration["item"], "item");
        assert_eq!(iteration["index"], "i");
        assert_eq!(iteration["array"], Value::Null);
        let li = &iteration["body"][0];
        assert_eq!(li["tag"], "li");
        assert_eq!(li["attributes"], json!([]));
        assert_eq!(li["children"][0]["value"]["code"], "item");
    }

    #[test]
    fn test_ignored_and_renamed_attributes() {
        let nodes = body(
            r#"
            const App = ({ r, f }) => (
              <label key="k" ref={r} onClick={f} className="field" htmlFor="name" aria-label="Name" />
            );
            export default App;
            "#,
        );
        let names: Vec<&str> = nodes[0]["attributes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["class", "for", "aria-label"]);
    }

    #[test]
    fn test_inline_style_flattening() {
        let nodes = body(
            "const App = () => <div style={{ fontSize: 12, color: 'red', opacity: 0.5, margin: 0 }} />; export default App;",
        );
        assert_eq!(
            nodes[0]["attributes"][0]["value"],
            json!({ "kind": "string", "value": "font-size:12px;color:red;opacity:0.5;margin:0;" })
        );
    }

    #[test]
    fn test_non_literal_style_stays_dynamic() {
        let nodes = body("const App = ({ c }) => <div style={{ color: c }} />; export default App;");
        assert_eq!(nodes[0]["attributes"][0]["value"]["kind"], "dynamic");
    }

    #[test]
    fn test_fragments_flatten() {
        let nodes = body(
            r#"
            import React, { Fragment } from 'react';
            const App = () => (
              <>
                <h1 />
                <Fragment><h2 /></Fragment>
                <React.Fragment><h3 /></React.Fragment>
              </>
            );
            export default App;
            "#,
        );
        let tags: Vec<&str> = nodes
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["tag"].as_str().unwrap())
            .collect();
        assert_eq!(tags, vec!["h1", "h2", "h3"]);
        let out = lower("import React from 'react'; const App = () => <React.Fragment><p /></React.Fragment>; export default App;");
        assert!(!out.table.dependencies["React"].is_used_as_rc);
    }

    #[test]
    fn test_text_siblings_and_cleaning() {
        let nodes = body(
            r#"
            const App = ({ name }) => (
              <p>
                Hello
                dear {name}!
              </p>
            );
            export default App;
            "#,
        );
        assert_eq!(
            nodes[0]["children"],
            json!([
                { "type": "text", "value": "Hello dear " },
                { "type": "interpolation-escaped", "value": { "code": "name" } },
                { "type": "text", "value": "!" }
            ])
        );
    }

    #[test]
    fn test_clean_jsx_text() {
        assert_eq!(clean_jsx_text("\n   \n  "), "");
        assert_eq!(clean_jsx_text(" a  b "), " a  b ");
        assert_eq!(clean_jsx_text("\n  one\n\n  two\n"), "one two");
        assert_eq!(clean_jsx_text("a\t\n b"), "a b");
    }

    #[test]
    fn test_imports_are_recorded_and_marked() {
        let out = lower(
            r#"
            import Button from './Button';
            import { Icon, Label as Caption } from './icons';
            import * as utils from './utils';
            const App = () => <div><Button /><Caption text={Icon} /></div>;
            export default App;
            "#,
        );
        let deps = &out.table.dependencies;
        assert_eq!(deps.len(), 3);
        assert!(deps["Button"].is_used_as_rc);
        assert!(deps["Caption"].is_used_as_rc);
        assert!(!deps["Icon"].is_used_as_rc);
        assert_eq!(deps["Caption"].source, "./icons");
        assert!(!deps.contains_key("utils"));
    }

    #[test]
    fn test_module_constants_are_scoped_to_components() {
        let out = lower(
            r#"
            const title = "Hi";
            const count = 2 + 1;
            let mutable = "no";
            const items = load();
            const App = ({ count }) => <h1>{title}</h1>;
            export default App;
            "#,
        );
        let constants = &out.table.components["App"].mixin.constants;
        assert_eq!(constants.get("title").map(String::as_str), Some("\"Hi\""));
        // Shadowed by the prop of the same name.
        assert!(!constants.contains_key("count"));
        assert!(!constants.contains_key("mutable"));
        assert!(!constants.contains_key("items"));
    }

    #[test]
    fn test_local_bindings_are_removed_from_constants() {
        let out = lower(
            r#"
            const title = "Hi";
            const label = "L";
            const item = "I";
            const props = "P";
            const footer = "F";
            function App(props) {
              const title = props.title;
              return <ul title={title}>{props.items.map(item => <li>{item}{label}</li>)}</ul>;
            }
            export default App;
            "#,
        );
        let constants = &out.table.components["App"].mixin.constants;
        let names: Vec<&str> = constants.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["footer", "label"]);
    }

    #[test]
    fn test_early_return_lowering() {
        let nodes = body(
            r#"
            export default function Status({ error, ready }) {
              if (error) {
                return <p>{error}</p>;
              } else if (!ready) return null;
              return <main />;
            }
            "#,
        );
        assert_eq!(nodes.as_array().unwrap().len(), 1);
        let outer = &nodes[0];
        assert_eq!(outer["type"], "condition");
        assert_eq!(outer["test"]["code"], "error");
        assert_eq!(outer["consequent"]["tag"], "p");
        assert_eq!(outer["alternate"]["type"], "condition");
        assert_eq!(outer["alternate"]["test"]["code"], "ready");
        assert_eq!(outer["alternate"]["consequent"]["tag"], "main");
        assert_eq!(outer["alternate"]["alternate"], Value::Null);
    }

    #[test]
    fn test_named_import_keeps_exported_name() {
        let out = lower(
            r#"
            import Button, { Badge as Pill, default as Other } from './ui';
            const App = () => <Pill />;
            export default App;
            "#,
        );
        let deps = &out.table.dependencies;
        assert_eq!(deps["Button"].imported, None);
        assert_eq!(deps["Pill"].imported.as_deref(), Some("Badge"));
        assert_eq!(deps["Other"].imported, None);
    }
}

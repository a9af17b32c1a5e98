//! Dependency Graph & Bundler
//!
//! Discovers every component module transitively instantiated from a root
//! module and merges their symbol tables. The root tree is never touched;
//! inlining happens in the code generators off the merged table.

use log::{debug, info};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ast::{Node, SymbolTable};
use crate::compile::parse_transform_optimize;
use crate::error::{CompileError, Result};
use crate::resolve::resolve_from;

#[derive(Debug, Clone)]
pub struct ModuleNode {
    pub path: PathBuf,
    pub ast: Node,
    pub table: SymbolTable,
}

/// Modules keyed by resolved path plus the import edges between them.
/// Owned by one bundle operation and dropped after merging.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    modules: Vec<ModuleNode>,
    index: HashMap<PathBuf, usize>,
    edges: BTreeSet<(PathBuf, PathBuf)>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when a module with the same path is already present.
    pub fn add_module(&mut self, path: PathBuf, ast: Node, table: SymbolTable) -> bool {
        if self.index.contains_key(&path) {
            return false;
        }
        self.index.insert(path.clone(), self.modules.len());
        self.modules.push(ModuleNode { path, ast, table });
        true
    }

    pub fn add_dependency(&mut self, from: PathBuf, to: PathBuf) {
        self.edges.insert((from, to));
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.index.contains_key(path)
    }

    pub fn module(&self, path: &Path) -> Option<&ModuleNode> {
        self.index.get(path).map(|&i| &self.modules[i])
    }

    fn module_mut(&mut self, path: &Path) -> Option<&mut ModuleNode> {
        self.index.get(path).map(|&i| &mut self.modules[i])
    }

    pub fn modules(&self) -> &[ModuleNode] {
        &self.modules
    }

    pub fn edges(&self) -> &BTreeSet<(PathBuf, PathBuf)> {
        &self.edges
    }

    /// Merges every module's table in insertion order (root first).
    pub fn merged_table(&self) -> SymbolTable {
        let mut merged = SymbolTable::new();
        for module in &self.modules {
            merged.merge(module.table.clone());
        }
        merged
    }
}

/// Builds the graph rooted at `file` and returns the merged symbol table.
pub fn resolve_dependencies(file: &Path, ast: &Node, table: SymbolTable) -> Result<SymbolTable> {
    let graph = build_graph(file, ast, table)?;
    info!(
        "bundled {} module(s) from {}",
        graph.modules().len(),
        file.display()
    );
    Ok(graph.merged_table())
}

pub fn build_graph(file: &Path, ast: &Node, table: SymbolTable) -> Result<DependencyGraph> {
    let root = fs::canonicalize(file).unwrap_or_else(|_| file.to_path_buf());
    let mut graph = DependencyGraph::new();
    graph.add_module(root.clone(), ast.clone(), table);

    let mut frontier = vec![root];
    while !frontier.is_empty() {
        let mut requests = Vec::new();
        for from in &frontier {
            let Some(module) = graph.module_mut(from) else {
                continue;
            };
            for dependency in module.table.dependencies.values_mut() {
                if !dependency.is_used_as_rc {
                    continue;
                }
                let path = resolve_from(from, &dependency.source)?;
                dependency.path = Some(path.clone());
                requests.push((from.clone(), path));
            }
        }

        let mut pending: Vec<PathBuf> = Vec::new();
        for (_, to) in &requests {
            if !graph.contains(to) && !pending.contains(to) {
                pending.push(to.clone());
            }
        }

        // Siblings load independently; results come back in request order.
        let loaded = pending
            .par_iter()
            .map(|path| load_module(path))
            .collect::<Result<Vec<_>>>()?;
        for module in loaded {
            debug!("added module {}", module.path.display());
            graph.add_module(module.path, module.ast, module.table);
        }
        for (from, to) in requests {
            graph.add_dependency(from, to);
        }
        frontier = pending;
    }
    Ok(graph)
}

fn load_module(path: &Path) -> Result<ModuleNode> {
    let source = fs::read_to_string(path).map_err(|e| CompileError::io(path, e))?;
    let (ast, table) = parse_transform_optimize(&source, Some(path))?;
    Ok(ModuleNode {
        path: path.to_path_buf(),
        ast,
        table,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(path: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(path)
    }

    fn graph_for(path: &str) -> DependencyGraph {
        let file = fixture(path);
        let source = fs::read_to_string(&file).unwrap();
        let (ast, table) = parse_transform_optimize(&source, Some(&file)).unwrap();
        build_graph(&file, &ast, table).unwrap()
    }

    #[test]
    fn loads_each_instantiated_module_once() {
        let graph = graph_for("inlining-files/input.js");
        let names: Vec<String> = graph
            .modules()
            .iter()
            .filter_map(|m| m.path.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        // Button is imported by both the root and the card, loaded once.
        assert_eq!(names, vec!["input.js", "Button.jsx", "index.js"]);
        assert_eq!(graph.edges().len(), 3);
    }

    #[test]
    fn value_only_imports_are_not_followed() {
        let graph = graph_for("inlining-files/input.js");
        assert!(graph
            .modules()
            .iter()
            .all(|m| !m.path.ends_with("labels.js")));
    }

    #[test]
    fn merged_table_holds_every_component() {
        let graph = graph_for("inlining-files/input.js");
        let table = graph.merged_table();
        let names: Vec<&str> = table.components.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["App", "Button", "Card"]);
        assert!(table.dependencies["Button"].path.is_some());
    }

    #[test]
    fn unresolvable_import_aborts_the_bundle() {
        let file = fixture("broken-import/input.js");
        let source = fs::read_to_string(&file).unwrap();
        let (ast, table) = parse_transform_optimize(&source, Some(&file)).unwrap();
        let err = build_graph(&file, &ast, table).unwrap_err();
        assert_eq!(err.code(), crate::error::ERR_RESOLUTION);
    }
}

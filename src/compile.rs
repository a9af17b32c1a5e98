//! Compile entry points
//!
//! parse → transform → optimize, then (when the source has a file
//! identity) bundle the instantiated dependencies and optimize again over
//! the merged table, and finally hand off to a code generator.

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::ast::{Node, SymbolTable};
use crate::codegen::{GenerateOptions, TemplateEngine};
use crate::error::{CompileError, Result};
use crate::graph::resolve_dependencies;
use crate::optimize::optimize;
use crate::resolve::MODULE_EXTENSIONS;
use crate::transform::{transform_source, TransformOutput};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompileOptions {
    /// Path of the compiled source. Without it no dependency is bundled.
    #[serde(alias = "inputFile")]
    pub file_identity: Option<PathBuf>,
    pub template_engine: TemplateEngine,
    /// Emitted before the generated body.
    pub beginning: String,
    /// Emitted after the generated body.
    pub ending: String,
    pub initial_indent_level: usize,
}

impl CompileOptions {
    pub fn new(template_engine: TemplateEngine) -> Self {
        CompileOptions {
            template_engine,
            ..Default::default()
        }
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file_identity = Some(file.into());
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Lowers and optimizes one module.
pub fn parse_transform_optimize(source: &str, file: Option<&Path>) -> Result<(Node, SymbolTable)> {
    let TransformOutput { mut ast, mut table } = transform_source(source, file)?;
    optimize(&mut ast, &mut table);
    Ok((ast, table))
}

pub fn compile(source: &str, options: &CompileOptions) -> Result<String> {
    let generator = options.template_engine.generator();
    let file = options.file_identity.as_deref();
    let (mut ast, mut table) = parse_transform_optimize(source, file)?;

    if let Some(file) = file {
        table = resolve_dependencies(file, &ast, table)?;
        optimize(&mut ast, &mut table);
    }

    let body = generator.generate(
        &ast,
        &table,
        &GenerateOptions {
            initial_indent_level: options.initial_indent_level,
        },
    )?;
    Ok(wrap_output(&body, &options.beginning, &options.ending))
}

fn wrap_output(body: &str, beginning: &str, ending: &str) -> String {
    let mut out = String::with_capacity(beginning.len() + body.len() + ending.len() + 2);
    out.push_str(beginning);
    if !beginning.is_empty() {
        out.push('\n');
    }
    out.push_str(body);
    out.push_str(ending);
    if !ending.is_empty() {
        out.push('\n');
    }
    out
}

/// Compiles `input` into `output`, creating parent directories as needed.
pub fn compile_file(input: &Path, output: &Path, options: &CompileOptions) -> Result<()> {
    let source = fs::read_to_string(input).map_err(|e| CompileError::io(input, e))?;
    let options = CompileOptions {
        file_identity: Some(input.to_path_buf()),
        ..options.clone()
    };
    let code = compile(&source, &options)?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|e| CompileError::io(parent, e))?;
    }
    fs::write(output, code).map_err(|e| CompileError::io(output, e))?;
    info!("{} -> {}", input.display(), output.display());
    Ok(())
}

/// Compiles every module under `input_dir` to the mirrored path under
/// `output_dir`. Returns the written files, sorted.
pub fn compile_dir(input_dir: &Path, output_dir: &Path, options: &CompileOptions) -> Result<Vec<PathBuf>> {
    let mut jobs = Vec::new();
    for entry in WalkDir::new(input_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| CompileError::io(input_dir, e.into()))?;
        let path = entry.path();
        let is_module = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| MODULE_EXTENSIONS.contains(&ext));
        if !entry.file_type().is_file() || !is_module {
            continue;
        }
        let relative = path.strip_prefix(input_dir).unwrap_or(path);
        let output = output_dir
            .join(relative)
            .with_extension(options.template_engine.extension().trim_start_matches('.'));
        jobs.push((path.to_path_buf(), output));
    }
    debug!("compiling {} module(s) from {}", jobs.len(), input_dir.display());

    let mut written = jobs
        .into_par_iter()
        .map(|(input, output)| compile_file(&input, &output, options).map(|_| output))
        .collect::<Result<Vec<_>>>()?;
    written.sort();
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_wrapped_with_optional_newlines() {
        assert_eq!(wrap_output("body\n", "", ""), "body\n");
        assert_eq!(
            wrap_output("body\n", "<html>", "</html>"),
            "<html>\nbody\n</html>\n"
        );
    }

    #[test]
    fn options_parse_from_camel_case_json() {
        let options = CompileOptions::from_json(
            r#"{"templateEngine": "ejs", "initialIndentLevel": 2, "inputFile": "a.js"}"#,
        )
        .unwrap();
        assert_eq!(options.template_engine, TemplateEngine::Ejs);
        assert_eq!(options.initial_indent_level, 2);
        assert_eq!(options.file_identity, Some(PathBuf::from("a.js")));
        assert_eq!(options.beginning, "");
    }

    #[test]
    fn unknown_engine_in_config_is_a_config_error() {
        let err = CompileOptions::from_json(r#"{"templateEngine": "haml"}"#).unwrap_err();
        assert_eq!(err.code(), crate::error::ERR_CONFIG);
        assert!(err.to_string().contains("unknown code generator for haml"));
    }
}

//! Import specifier resolution.
//!
//! Relative and absolute specifiers are probed with the module extensions
//! and `index` files; bare specifiers are looked up in `node_modules`
//! directories walking up from the importing file.

use log::trace;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CompileError, Result};

pub const MODULE_EXTENSIONS: &[&str] = &["js", "jsx", "mjs"];

/// Resolves `specifier` as imported from the file `importer`.
pub fn resolve_from(importer: &Path, specifier: &str) -> Result<PathBuf> {
    let dir = importer.parent().unwrap_or_else(|| Path::new("."));
    let found = if is_path_specifier(specifier) {
        let candidate = dir.join(specifier);
        resolve_file(&candidate).or_else(|| resolve_directory(&candidate))
    } else {
        dir.ancestors()
            .map(|ancestor| ancestor.join("node_modules").join(specifier))
            .find_map(|candidate| resolve_file(&candidate).or_else(|| resolve_directory(&candidate)))
    };

    let found = found.ok_or_else(|| CompileError::Resolution {
        specifier: specifier.to_string(),
        from: importer.to_path_buf(),
    })?;
    trace!("resolved {} -> {}", specifier, found.display());
    fs::canonicalize(&found).map_err(|e| CompileError::io(found, e))
}

fn is_path_specifier(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../") || specifier.starts_with('/')
}

fn resolve_file(candidate: &Path) -> Option<PathBuf> {
    if candidate.is_file() {
        return Some(candidate.to_path_buf());
    }
    MODULE_EXTENSIONS.iter().find_map(|ext| {
        let mut name = OsString::from(candidate.as_os_str());
        name.push(".");
        name.push(ext);
        let path = PathBuf::from(name);
        path.is_file().then_some(path)
    })
}

fn resolve_directory(candidate: &Path) -> Option<PathBuf> {
    if !candidate.is_dir() {
        return None;
    }
    package_main(candidate)
        .and_then(|main| resolve_file(&candidate.join(main)))
        .or_else(|| resolve_file(&candidate.join("index")))
}

/// The `main` entry of a directory's package.json, if any.
fn package_main(dir: &Path) -> Option<String> {
    let manifest = fs::read_to_string(dir.join("package.json")).ok()?;
    let json: serde_json::Value = serde_json::from_str(&manifest).ok()?;
    json.get("main")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(path: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(path)
    }

    #[test]
    fn resolves_relative_specifier_without_extension() {
        let importer = fixture("inlining-files/input.js");
        let resolved = resolve_from(&importer, "./Button").unwrap();
        assert!(resolved.ends_with("inlining-files/Button.jsx"));
    }

    #[test]
    fn resolves_directory_index() {
        let importer = fixture("inlining-files/input.js");
        let resolved = resolve_from(&importer, "./card").unwrap();
        assert!(resolved.ends_with("inlining-files/card/index.js"));
    }

    #[test]
    fn unresolvable_specifier_is_an_error() {
        let importer = fixture("inlining-files/input.js");
        let err = resolve_from(&importer, "./Nope").unwrap_err();
        assert!(matches!(err, CompileError::Resolution { .. }));
    }
}

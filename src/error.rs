use std::path::PathBuf;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_PARSE: &str = "UR-ERR-PARSE";
pub const ERR_UNSUPPORTED: &str = "UR-ERR-UNSUPPORTED";
pub const ERR_RESOLUTION: &str = "UR-ERR-RESOLUTION";
pub const ERR_IO: &str = "UR-ERR-IO";
pub const ERR_NO_DEFAULT_EXPORT: &str = "UR-ERR-NO-DEFAULT-EXPORT";
pub const ERR_UNKNOWN_ENGINE: &str = "UR-ERR-UNKNOWN-ENGINE";
pub const ERR_CONFIG: &str = "UR-ERR-CONFIG";

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILE ERROR
// ═══════════════════════════════════════════════════════════════════════════════

/// Every failure the compiler can surface. None of them is retried; the
/// same input always fails the same way.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    /// A dynamic-value shape a code generator cannot translate.
    #[error("Unsupported {kind} \"{name}\"")]
    Unsupported { kind: String, name: String },

    #[error("Cannot resolve \"{specifier}\" from {}", from.display())]
    Resolution { specifier: String, from: PathBuf },

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No default exported component found in {file}")]
    MissingDefaultExport { file: String },

    #[error("unknown code generator for {0}")]
    UnknownEngine(String),

    #[error("Invalid compile options: {0}")]
    Config(#[from] serde_json::Error),
}

impl CompileError {
    pub fn unsupported(kind: &str, name: &str) -> Self {
        CompileError::Unsupported {
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CompileError::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable identifier for the failure class.
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::Parse { .. } => ERR_PARSE,
            CompileError::Unsupported { .. } => ERR_UNSUPPORTED,
            CompileError::Resolution { .. } => ERR_RESOLUTION,
            CompileError::Io { .. } => ERR_IO,
            CompileError::MissingDefaultExport { .. } => ERR_NO_DEFAULT_EXPORT,
            CompileError::UnknownEngine(_) => ERR_UNKNOWN_ENGINE,
            CompileError::Config(_) => ERR_CONFIG,
        }
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_message_names_kind_and_callee() {
        let err = CompileError::unsupported("CallExpression", "getId");
        assert_eq!(err.to_string(), "Unsupported CallExpression \"getId\"");
        assert_eq!(err.code(), ERR_UNSUPPORTED);
    }

    #[test]
    fn resolution_error_mentions_specifier() {
        let err = CompileError::Resolution {
            specifier: "./Missing".to_string(),
            from: PathBuf::from("/app/src/index.js"),
        };
        assert!(err.to_string().contains("./Missing"));
        assert_eq!(err.code(), ERR_RESOLUTION);
    }
}

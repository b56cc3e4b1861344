use std::path::PathBuf;

use thiserror::Error;

/// Error type for parsing a single Go source file
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("{line}:{column}: syntax error")]
    Syntax { line: usize, column: usize },

    #[error("{line}:{column}: expected 'package'")]
    MissingPackage { line: usize, column: usize },

    #[error("{line}:{column}: invalid import path literal {literal}")]
    InvalidLiteral {
        literal: String,
        line: usize,
        column: usize,
    },

    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),
}

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("{}:{source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: SourceError,
    },

    #[error("import rewrite: {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Raised by a replace policy to abort the walk
    #[error("import rewrite: {0}")]
    Policy(String),
}

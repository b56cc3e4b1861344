use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("malformed module path {path:?}: {reason}")]
    Invalid { path: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    InvalidPath(#[from] PathError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("proxy: {0}")]
    Registry(String),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("module not found: {0}")]
    NotFound(String),

    #[error("request too many times")]
    TooManyRequests,

    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

#[derive(Debug, Error)]
pub enum LocateError {
    /// The import names a major version the found module does not serve
    #[error("{import} is not in {spec}")]
    NotInModule { import: String, spec: String },

    #[error("failed to find {import} in {prefix}")]
    MajorNotFound { import: String, prefix: String },

    #[error("failed to find module for {0}")]
    NotFound(String),

    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

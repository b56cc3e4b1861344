use thiserror::Error;

use crate::rewrite::error::RewriteError;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

#[derive(Debug, Error)]
pub enum UpgradeError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error("{0}: failed to get major version")]
    InvalidVersion(String),

    #[error("import rewrite task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop a command before it can report on the module graph.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("module path entry `{}` is neither a directory nor a .mdesc file", .0.display())]
    NotADescriptor(PathBuf),

    #[error("no module path given; pass --module-path or set MODGRAPH_MODULE_PATH")]
    EmptyModulePath,

    #[error("module `{0}` not found on the module path")]
    ModuleNotFound(String),

    #[error("cannot write output: {0}")]
    Output(#[from] io::Error),

    #[error("cannot serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CliResult<T> = Result<T, CliError>;

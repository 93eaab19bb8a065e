//! Support code for the `modgraph` binary: module path loading, environment
//! configuration and report output.

pub mod config;
pub mod error;
pub mod loader;
pub mod output;

pub use config::CliConfig;
pub use error::{CliError, CliResult};
pub use loader::{load_module_path, LoadedModules};
pub use output::{write_report, OutputFormat};

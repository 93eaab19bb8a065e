//! Environment defaults for the command line.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use modgraph_module::DEFAULT_BASE_MODULE;

pub const MODULE_PATH_ENV: &str = "MODGRAPH_MODULE_PATH";
pub const BASE_MODULE_ENV: &str = "MODGRAPH_BASE_MODULE";
pub const LOG_ENV: &str = "MODGRAPH_LOG";

/// Settings shared by every subcommand. Flags given on the command line win
/// over the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub module_path: Vec<PathBuf>,
    pub base_module: Option<String>,
}

impl CliConfig {
    /// Reads `MODGRAPH_MODULE_PATH` (a platform path list) and
    /// `MODGRAPH_BASE_MODULE`. Without a module path, `~/.modgraph/modules`
    /// is used when it exists.
    pub fn from_env() -> Self {
        Self::from_vars(
            env::var_os(MODULE_PATH_ENV),
            env::var(BASE_MODULE_ENV).ok(),
        )
    }

    fn from_vars(module_path: Option<OsString>, base_module: Option<String>) -> Self {
        let module_path = module_path
            .filter(|paths| !paths.is_empty())
            .map(|paths| env::split_paths(&paths).collect())
            .unwrap_or_else(default_module_path);

        let base_module = base_module
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_MODULE.to_string());

        Self {
            module_path,
            base_module: Some(base_module),
        }
    }

    /// Replaces the module path when `paths` is non-empty.
    pub fn with_module_path(mut self, paths: Vec<PathBuf>) -> Self {
        if !paths.is_empty() {
            self.module_path = paths;
        }
        self
    }

    pub fn with_base_module(mut self, base_module: Option<String>, disabled: bool) -> Self {
        if disabled {
            self.base_module = None;
        } else if let Some(name) = base_module {
            self.base_module = Some(name);
        }
        self
    }
}

fn default_module_path() -> Vec<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".modgraph/modules"))
        .filter(|dir| dir.is_dir())
        .into_iter()
        .collect()
}

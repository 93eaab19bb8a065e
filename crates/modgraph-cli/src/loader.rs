//! Loading a catalog from the module path.
//!
//! Each module path entry is either a `.mdesc` file or a directory whose
//! `.mdesc` files are read in name order. Entries are searched in order: a
//! module already found in an earlier entry shadows later ones. Declaring the
//! same module twice within one entry is an error.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use modgraph_common::{
    Diagnostic, DiagnosticCode, DiagnosticSink, Label, SourceLocation, SourceMap,
};
use modgraph_module::{Catalog, CatalogError, DescriptorFile, DESCRIPTOR_EXTENSION};
use rustc_hash::FxHashMap;
use tracing::{debug, info, trace};

use crate::error::{CliError, CliResult};

/// Everything read from the module path.
#[derive(Debug, Default)]
pub struct LoadedModules {
    pub source_map: SourceMap,
    pub catalog: Catalog,
    /// Problems with individual descriptor files. The affected modules are
    /// missing from the catalog.
    pub diagnostics: DiagnosticSink,
    origins: BTreeMap<String, SourceLocation>,
}

impl LoadedModules {
    /// Where `module`'s declaration was read from.
    pub fn origin(&self, module: &str) -> Option<SourceLocation> {
        self.origins.get(module).copied()
    }

    /// Points unlabelled diagnostics at the declaration of the first module
    /// they mention.
    pub fn locate<'d>(&self, diagnostics: impl IntoIterator<Item = &'d mut Diagnostic>) {
        for diagnostic in diagnostics {
            if !diagnostic.labels.is_empty() {
                continue;
            }
            let Some(module) = diagnostic.modules.first() else {
                continue;
            };
            if let Some(location) = self.origin(module) {
                let label = Label::primary(location, format!("module `{}` declared here", module));
                diagnostic.labels.push(label);
            }
        }
    }
}

pub fn load_module_path(entries: &[PathBuf]) -> CliResult<LoadedModules> {
    if entries.is_empty() {
        return Err(CliError::EmptyModulePath);
    }

    let mut loaded = LoadedModules::default();
    for entry in entries {
        let files = descriptor_files(entry)?;
        trace!(entry = %entry.display(), files = files.len(), "reading module path entry");
        load_entry(&mut loaded, &files)?;
    }

    info!(
        entries = entries.len(),
        modules = loaded.catalog.len(),
        problems = loaded.diagnostics.len(),
        "loaded module path"
    );
    Ok(loaded)
}

fn load_entry(loaded: &mut LoadedModules, files: &[PathBuf]) -> CliResult<()> {
    let mut in_entry: FxHashMap<String, SourceLocation> = FxHashMap::default();

    for path in files {
        let file = match loaded.source_map.load_file(path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                debug!(file = %path.display(), "skipping descriptor that is not UTF-8");
                loaded.diagnostics.push(Diagnostic::error(
                    DiagnosticCode::DescriptorSyntax,
                    format!("descriptor file `{}` is not valid UTF-8", path.display()),
                ));
                continue;
            }
            Err(source) => {
                return Err(CliError::Io {
                    path: path.clone(),
                    source,
                })
            }
        };
        let content = loaded.source_map.source(file).unwrap_or_default();

        let parsed = match DescriptorFile::parse(content, file) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(file = %path.display(), error = %err, "skipping unreadable descriptor");
                loaded.diagnostics.push(err.to_diagnostic());
                continue;
            }
        };

        let name = parsed.descriptor.name().to_string();
        let location = SourceLocation::new(file, parsed.decl_span);

        if let Some(&first) = in_entry.get(&name) {
            loaded.diagnostics.push(
                CatalogError::DuplicateModule(name)
                    .to_diagnostic()
                    .with_label(Label::primary(location, "declared again here"))
                    .with_label(Label::secondary(first, "first declared here")),
            );
            continue;
        }
        in_entry.insert(name.clone(), location);

        if loaded.origins.contains_key(&name) {
            debug!(module = %name, file = %path.display(), "module shadowed by an earlier module path entry");
            continue;
        }

        match loaded.catalog.insert(parsed.descriptor) {
            Ok(()) => {
                loaded.origins.insert(name, location);
            }
            Err(err) => loaded.diagnostics.push(
                err.to_diagnostic()
                    .with_label(Label::primary(location, "not added to the catalog")),
            ),
        }
    }
    Ok(())
}

/// Descriptor files of one module path entry, in name order.
fn descriptor_files(entry: &Path) -> CliResult<Vec<PathBuf>> {
    let io_error = |source| CliError::Io {
        path: entry.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(entry).map_err(io_error)?;
    if metadata.is_file() {
        return if is_descriptor(entry) {
            Ok(vec![entry.to_path_buf()])
        } else {
            Err(CliError::NotADescriptor(entry.to_path_buf()))
        };
    }

    let mut files = Vec::new();
    for dir_entry in fs::read_dir(entry).map_err(io_error)? {
        let path = dir_entry.map_err(io_error)?.path();
        if path.is_file() && is_descriptor(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_descriptor(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == DESCRIPTOR_EXTENSION)
}

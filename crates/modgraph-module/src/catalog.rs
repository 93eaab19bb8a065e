//! The set of observable modules for one resolution run.

use std::collections::BTreeMap;

use crate::descriptor::{ModuleDescriptor, ModuleKind};
use crate::error::CatalogError;

/// Descriptors indexed by name. Iteration is always in name order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    modules: BTreeMap<String, ModuleDescriptor>,
    unnamed: Option<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog, failing on the first descriptor that cannot enter it.
    pub fn from_descriptors<I>(descriptors: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = ModuleDescriptor>,
    {
        let mut catalog = Self::new();
        for desc in descriptors {
            catalog.insert(desc)?;
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, descriptor: ModuleDescriptor) -> Result<(), CatalogError> {
        let name = descriptor.name().to_string();
        if self.modules.contains_key(&name) {
            return Err(CatalogError::DuplicateModule(name));
        }
        if descriptor.kind() == ModuleKind::Unnamed {
            if let Some(existing) = &self.unnamed {
                return Err(CatalogError::MultipleUnnamed {
                    existing: existing.clone(),
                    rejected: name,
                });
            }
            self.unnamed = Some(name.clone());
        }
        self.modules.insert(name, descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.modules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Name of the unnamed pseudo-module, if the catalog has one.
    pub fn unnamed(&self) -> Option<&str> {
        self.unnamed.as_deref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

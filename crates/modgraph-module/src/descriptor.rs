//! Module descriptors.
//!
//! A [`ModuleDescriptor`] is validated when it is built and immutable
//! afterwards; nothing downstream re-checks its structural rules.

use std::collections::BTreeSet;
use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::error::{DescriptorError, DescriptorResult};

/// Conventional name of the classpath pseudo-module.
pub const UNNAMED_MODULE: &str = "ALL-UNNAMED";

/// How a module entered the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "lowercase"))]
pub enum ModuleKind {
    /// A module with its own declaration.
    #[default]
    Explicit,
    /// A plain archive promoted to the module path. Reads every resolved
    /// module and exports and opens all of its packages.
    Automatic,
    /// The classpath pseudo-module. Reads every resolved module and cannot
    /// be required.
    Unnamed,
}

impl ModuleKind {
    fn keyword(self) -> Option<&'static str> {
        match self {
            ModuleKind::Explicit => None,
            ModuleKind::Automatic => Some("automatic"),
            ModuleKind::Unnamed => Some("unnamed"),
        }
    }
}

/// A `requires` edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Requires {
    pub target: String,
    /// Readers of the requiring module also read `target`.
    pub transitive: bool,
    /// Compile-time only (`requires static`); a missing target is not an error.
    pub optional: bool,
}

impl Requires {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            transitive: false,
            optional: false,
        }
    }

    pub fn transitive(mut self) -> Self {
        self.transitive = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Who an `exports` or `opens` directive grants access to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "lowercase"))]
pub enum Targets {
    All,
    Only(BTreeSet<String>),
}

impl Targets {
    pub fn only<I, S>(modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Targets::Only(modules.into_iter().map(Into::into).collect())
    }

    pub fn includes(&self, module: &str) -> bool {
        match self {
            Targets::All => true,
            Targets::Only(modules) => modules.contains(module),
        }
    }

    pub fn is_qualified(&self) -> bool {
        matches!(self, Targets::Only(_))
    }
}

/// A package exported or opened by a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PackageGrant {
    pub package: String,
    pub targets: Targets,
}

/// A `provides <service> with <provider>` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Provides {
    pub service: String,
    pub provider: String,
}

/// A validated module descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ModuleDescriptor {
    name: String,
    kind: ModuleKind,
    open: bool,
    requires: Vec<Requires>,
    exports: Vec<PackageGrant>,
    opens: Vec<PackageGrant>,
    provides: Vec<Provides>,
    uses: BTreeSet<String>,
    packages: BTreeSet<String>,
}

impl ModuleDescriptor {
    pub fn builder(name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder::new(name.into(), ModuleKind::Explicit)
    }

    /// Builds an automatic module containing `packages`.
    pub fn automatic<I, S>(name: impl Into<String>, packages: I) -> DescriptorResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DescriptorBuilder::new(name.into(), ModuleKind::Automatic)
            .packages(packages)
            .build()
    }

    /// Builds the unnamed pseudo-module containing `packages`.
    pub fn unnamed<I, S>(packages: I) -> DescriptorResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DescriptorBuilder::new(UNNAMED_MODULE.to_string(), ModuleKind::Unnamed)
            .packages(packages)
            .build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_automatic(&self) -> bool {
        self.kind == ModuleKind::Automatic
    }

    pub fn is_unnamed(&self) -> bool {
        self.kind == ModuleKind::Unnamed
    }

    pub fn requires(&self) -> &[Requires] {
        &self.requires
    }

    pub fn exports(&self) -> &[PackageGrant] {
        &self.exports
    }

    pub fn opens(&self) -> &[PackageGrant] {
        &self.opens
    }

    pub fn provides(&self) -> &[Provides] {
        &self.provides
    }

    pub fn uses(&self) -> &BTreeSet<String> {
        &self.uses
    }

    pub fn packages(&self) -> &BTreeSet<String> {
        &self.packages
    }

    pub fn provides_service(&self, service: &str) -> bool {
        self.provides.iter().any(|p| p.service == service)
    }

    /// Whether code in `reader` may access public types of `package`.
    pub fn is_exported_to(&self, package: &str, reader: &str) -> bool {
        if !self.packages.contains(package) {
            return false;
        }
        if self.kind != ModuleKind::Explicit {
            return true;
        }
        self.exports
            .iter()
            .any(|e| e.package == package && e.targets.includes(reader))
    }

    /// Whether code in `reader` may reflect into `package`.
    pub fn is_opened_to(&self, package: &str, reader: &str) -> bool {
        if !self.packages.contains(package) {
            return false;
        }
        if self.open || self.kind != ModuleKind::Explicit {
            return true;
        }
        self.opens
            .iter()
            .any(|o| o.package == package && o.targets.includes(reader))
    }
}

/// Accumulates directives and validates them in [`DescriptorBuilder::build`].
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    name: String,
    kind: ModuleKind,
    open: bool,
    requires: Vec<Requires>,
    exports: Vec<PackageGrant>,
    opens: Vec<PackageGrant>,
    provides: Vec<Provides>,
    uses: BTreeSet<String>,
    packages: BTreeSet<String>,
}

impl DescriptorBuilder {
    fn new(name: String, kind: ModuleKind) -> Self {
        Self {
            name,
            kind,
            open: false,
            requires: Vec::new(),
            exports: Vec::new(),
            opens: Vec::new(),
            provides: Vec::new(),
            uses: BTreeSet::new(),
            packages: BTreeSet::new(),
        }
    }

    pub fn kind(mut self, kind: ModuleKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn open(mut self) -> Self {
        self.open = true;
        self
    }

    pub fn require(mut self, requires: Requires) -> Self {
        self.requires.push(requires);
        self
    }

    pub fn requires(self, target: impl Into<String>) -> Self {
        self.require(Requires::new(target))
    }

    pub fn requires_transitive(self, target: impl Into<String>) -> Self {
        self.require(Requires::new(target).transitive())
    }

    pub fn requires_static(self, target: impl Into<String>) -> Self {
        self.require(Requires::new(target).optional())
    }

    pub fn exports(mut self, package: impl Into<String>) -> Self {
        self.exports.push(PackageGrant {
            package: package.into(),
            targets: Targets::All,
        });
        self
    }

    pub fn exports_to<I, S>(mut self, package: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exports.push(PackageGrant {
            package: package.into(),
            targets: Targets::only(targets),
        });
        self
    }

    pub fn opens(mut self, package: impl Into<String>) -> Self {
        self.opens.push(PackageGrant {
            package: package.into(),
            targets: Targets::All,
        });
        self
    }

    pub fn opens_to<I, S>(mut self, package: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.opens.push(PackageGrant {
            package: package.into(),
            targets: Targets::only(targets),
        });
        self
    }

    pub fn provides(mut self, service: impl Into<String>, provider: impl Into<String>) -> Self {
        self.provides.push(Provides {
            service: service.into(),
            provider: provider.into(),
        });
        self
    }

    pub fn uses(mut self, service: impl Into<String>) -> Self {
        self.uses.insert(service.into());
        self
    }

    pub fn contains(mut self, package: impl Into<String>) -> Self {
        self.packages.insert(package.into());
        self
    }

    pub fn packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages.extend(packages.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> DescriptorResult<ModuleDescriptor> {
        self.check_name()?;
        self.check_packages()?;
        self.check_requires()?;
        self.check_grants("exports", &self.exports)?;
        self.check_grants("opens", &self.opens)?;
        self.check_provides()?;

        Ok(ModuleDescriptor {
            name: self.name,
            kind: self.kind,
            open: self.open,
            requires: self.requires,
            exports: self.exports,
            opens: self.opens,
            provides: self.provides,
            uses: self.uses,
            packages: self.packages,
        })
    }

    fn check_name(&self) -> DescriptorResult<()> {
        if self.name.is_empty() {
            return Err(DescriptorError::EmptyName);
        }
        // The pseudo-module's name is a marker, not a qualified name.
        if self.kind != ModuleKind::Unnamed && !is_qualified_name(&self.name) {
            return Err(DescriptorError::InvalidName(self.name.clone()));
        }
        Ok(())
    }

    fn check_packages(&self) -> DescriptorResult<()> {
        match self.packages.iter().find(|p| !is_qualified_name(p)) {
            Some(package) => Err(DescriptorError::InvalidPackage {
                module: self.name.clone(),
                package: package.clone(),
            }),
            None => Ok(()),
        }
    }

    fn check_requires(&self) -> DescriptorResult<()> {
        let mut seen = BTreeSet::new();
        for req in &self.requires {
            if req.target == self.name {
                return Err(DescriptorError::SelfRequires(self.name.clone()));
            }
            if !seen.insert(req.target.as_str()) {
                return Err(DescriptorError::DuplicateRequires {
                    module: self.name.clone(),
                    target: req.target.clone(),
                });
            }
        }
        Ok(())
    }

    fn check_grants(&self, directive: &'static str, grants: &[PackageGrant]) -> DescriptorResult<()> {
        let module = || self.name.clone();
        let mut seen = BTreeSet::new();

        for grant in grants {
            let package = grant.package.clone();
            if directive == "opens" && self.open {
                return Err(DescriptorError::OpensInOpenModule { module: module(), package });
            }
            if !seen.insert(grant.package.as_str()) {
                return Err(match directive {
                    "exports" => DescriptorError::DuplicateExports { module: module(), package },
                    _ => DescriptorError::DuplicateOpens { module: module(), package },
                });
            }
            if !self.packages.contains(&grant.package) {
                return Err(match directive {
                    "exports" => DescriptorError::ExportedPackageNotContained {
                        module: module(),
                        package,
                    },
                    _ => DescriptorError::OpenedPackageNotContained { module: module(), package },
                });
            }
            if matches!(&grant.targets, Targets::Only(targets) if targets.is_empty()) {
                return Err(DescriptorError::EmptyTargets {
                    module: module(),
                    directive,
                    package,
                });
            }
        }
        Ok(())
    }

    fn check_provides(&self) -> DescriptorResult<()> {
        for p in &self.provides {
            let package = p.provider.rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or("");
            if !self.packages.contains(package) {
                return Err(DescriptorError::ProviderNotContained {
                    module: self.name.clone(),
                    service: p.service.clone(),
                    provider: p.provider.clone(),
                });
            }
        }
        Ok(())
    }
}

/// A dot-separated sequence of identifiers, e.g. `java.logging`.
pub(crate) fn is_qualified_name(name: &str) -> bool {
    !name.is_empty() && name.split('.').all(is_identifier)
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Writes the descriptor in `.mdesc` form.
impl fmt::Display for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.open {
            write!(f, "open ")?;
        }
        if let Some(keyword) = self.kind.keyword() {
            write!(f, "{} ", keyword)?;
        }
        writeln!(f, "module {}", self.name)?;

        for req in &self.requires {
            write!(f, "requires ")?;
            if req.transitive {
                write!(f, "transitive ")?;
            }
            if req.optional {
                write!(f, "static ")?;
            }
            writeln!(f, "{}", req.target)?;
        }
        for (directive, grants) in [("exports", &self.exports), ("opens", &self.opens)] {
            for grant in grants {
                write!(f, "{} {}", directive, grant.package)?;
                if let Targets::Only(targets) = &grant.targets {
                    let targets: Vec<&str> = targets.iter().map(String::as_str).collect();
                    write!(f, " to {}", targets.join(", "))?;
                }
                writeln!(f)?;
            }
        }
        for p in &self.provides {
            writeln!(f, "provides {} with {}", p.service, p.provider)?;
        }
        for service in &self.uses {
            writeln!(f, "uses {}", service)?;
        }
        for package in &self.packages {
            writeln!(f, "contains {}", package)?;
        }
        Ok(())
    }
}

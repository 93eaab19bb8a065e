//! Dependency resolution.
//!
//! Computes the set of modules reachable from a request's roots by following
//! `requires` edges breadth-first, then the readability relation over that
//! set. An automatic module requires transitively every other resolved
//! module. Those edges depend on the final set rather than on any
//! descriptor, so they are only added once the closure is complete, and
//! readability is then grown until no reader gains a module.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use modgraph_common::{Diagnostic, DiagnosticCode, DiagnosticSink};
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::catalog::Catalog;
use crate::descriptor::{ModuleDescriptor, ModuleKind};

/// Module every explicit module reads without declaring it.
pub const DEFAULT_BASE_MODULE: &str = "java.base";

/// What to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    /// Root modules, in the order they were given.
    pub roots: Vec<String>,
    /// Additional roots, e.g. from `--add-modules`.
    pub extra_roots: BTreeSet<String>,
    /// Seeded as a root when present in the catalog; `None` disables it.
    pub base_module: Option<String>,
}

impl ResolveRequest {
    pub fn new<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            extra_roots: BTreeSet::new(),
            base_module: Some(DEFAULT_BASE_MODULE.to_string()),
        }
    }

    pub fn with_extra_roots<I, S>(mut self, extra_roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_roots.extend(extra_roots.into_iter().map(Into::into));
        self
    }

    pub fn with_base_module(mut self, base_module: Option<impl Into<String>>) -> Self {
        self.base_module = base_module.map(Into::into);
        self
    }
}

/// The resolved modules and what each of them reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ResolvedSet {
    reads: BTreeMap<String, BTreeSet<String>>,
}

impl ResolvedSet {
    pub fn contains(&self, module: &str) -> bool {
        self.reads.contains_key(module)
    }

    /// Resolved module names, in name order.
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.reads.keys().map(String::as_str)
    }

    /// Modules `module` reads, or `None` if it is not resolved.
    pub fn reads(&self, module: &str) -> Option<&BTreeSet<String>> {
        self.reads.get(module)
    }

    pub fn can_read(&self, reader: &str, target: &str) -> bool {
        self.reads(reader).is_some_and(|reads| reads.contains(target))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.reads.iter().map(|(name, reads)| (name.as_str(), reads))
    }

    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }
}

/// Worklist state of one resolution.
#[derive(Default)]
struct Closure<'a> {
    visited: FxHashSet<&'a str>,
    queue: VecDeque<&'a ModuleDescriptor>,
}

impl<'a> Closure<'a> {
    /// Returns true if the module was not seen before.
    fn enqueue(&mut self, desc: &'a ModuleDescriptor) -> bool {
        if self.visited.insert(desc.name()) {
            self.queue.push_back(desc);
            true
        } else {
            false
        }
    }
}

/// Resolves root sets against one catalog.
pub struct ModuleResolver<'a> {
    catalog: &'a Catalog,
}

impl<'a> ModuleResolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Resolves the request. On any error the returned set is empty and
    /// every missing dependency is reported.
    pub fn resolve(&self, request: &ResolveRequest) -> (ResolvedSet, DiagnosticSink) {
        let catalog = self.catalog;
        let mut diagnostics = DiagnosticSink::new();
        let mut closure = Closure::default();

        debug!(roots = ?request.roots, extra_roots = ?request.extra_roots, "resolving module graph");

        for root in request.roots.iter().chain(&request.extra_roots) {
            match catalog.get(root) {
                Some(desc) => {
                    closure.enqueue(desc);
                }
                None => diagnostics.push(
                    Diagnostic::error(
                        DiagnosticCode::UnresolvedDependency,
                        format!("root module `{}` not found", root),
                    )
                    .with_modules([root.as_str()]),
                ),
            }
        }
        let base = request.base_module.as_deref().and_then(|b| catalog.get(b));
        if let Some(base) = base {
            closure.enqueue(base);
        }

        while let Some(desc) = closure.queue.pop_front() {
            self.visit(desc, &mut closure, &mut diagnostics);
        }

        if diagnostics.has_errors() {
            debug!(errors = diagnostics.error_count(), "resolution failed");
            return (ResolvedSet::default(), diagnostics);
        }

        let resolved: BTreeSet<&str> = closure.visited.into_iter().collect();
        let reads = self.readability(&resolved, base.map(ModuleDescriptor::name));
        debug!(modules = resolved.len(), "resolved module graph");

        (ResolvedSet { reads }, diagnostics)
    }

    fn visit(
        &self,
        desc: &'a ModuleDescriptor,
        closure: &mut Closure<'a>,
        diagnostics: &mut DiagnosticSink,
    ) {
        let catalog = self.catalog;
        for req in desc.requires() {
            match catalog.get(&req.target) {
                Some(target) if !target.is_unnamed() => {
                    if closure.enqueue(target) {
                        trace!(module = desc.name(), dependency = target.name(), "enqueue dependency");
                    }
                }
                _ if req.optional => {
                    trace!(module = desc.name(), dependency = %req.target, "dropping optional dependency");
                }
                Some(target) => diagnostics.push(
                    Diagnostic::error(
                        DiagnosticCode::UnresolvedDependency,
                        format!(
                            "module `{}` requires `{}`, which is the unnamed module and cannot be required",
                            desc.name(),
                            target.name()
                        ),
                    )
                    .with_modules([desc.name(), target.name()]),
                ),
                None => diagnostics.push(
                    Diagnostic::error(
                        DiagnosticCode::UnresolvedDependency,
                        format!(
                            "module `{}` requires `{}`, which is not in the catalog",
                            desc.name(),
                            req.target
                        ),
                    )
                    .with_modules([desc.name(), req.target.as_str()]),
                ),
            }
        }
    }

    fn readability(
        &self,
        resolved: &BTreeSet<&'a str>,
        base: Option<&'a str>,
    ) -> BTreeMap<String, BTreeSet<String>> {
        resolved
            .iter()
            .filter_map(|&name| self.catalog.get(name))
            .map(|desc| {
                let reads = self.reads_of(desc, resolved, base);
                (
                    desc.name().to_string(),
                    reads.into_iter().map(str::to_string).collect(),
                )
            })
            .collect()
    }

    fn reads_of(
        &self,
        desc: &'a ModuleDescriptor,
        resolved: &BTreeSet<&'a str>,
        base: Option<&'a str>,
    ) -> BTreeSet<&'a str> {
        let name = desc.name();
        if desc.kind() != ModuleKind::Explicit {
            return resolved.iter().copied().filter(|&m| m != name).collect();
        }

        let mut reads = BTreeSet::new();
        let mut pending = Vec::new();
        for req in desc.requires() {
            if let Some(&target) = resolved.get(req.target.as_str()) {
                if reads.insert(target) {
                    pending.push(target);
                }
            }
        }
        if let Some(base) = base.filter(|&b| b != name) {
            reads.insert(base);
        }

        while let Some(read) = pending.pop() {
            for implied in self.implied_by(read, resolved) {
                if implied != name && reads.insert(implied) {
                    pending.push(implied);
                }
            }
        }
        reads
    }

    /// Modules that readers of `module` also read.
    fn implied_by(&self, module: &str, resolved: &BTreeSet<&'a str>) -> Vec<&'a str> {
        let Some(desc) = self.catalog.get(module) else {
            return Vec::new();
        };
        match desc.kind() {
            ModuleKind::Explicit => desc
                .requires()
                .iter()
                .filter(|req| req.transitive)
                .filter_map(|req| resolved.get(req.target.as_str()).copied())
                .collect(),
            ModuleKind::Automatic => resolved
                .iter()
                .copied()
                .filter(|&m| {
                    m != module && !self.catalog.get(m).is_some_and(ModuleDescriptor::is_unnamed)
                })
                .collect(),
            ModuleKind::Unnamed => Vec::new(),
        }
    }
}

/// Resolves `request` against `catalog`.
pub fn resolve(catalog: &Catalog, request: &ResolveRequest) -> (ResolvedSet, DiagnosticSink) {
    ModuleResolver::new(catalog).resolve(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::UNNAMED_MODULE;
    use modgraph_common::Severity;
    use pretty_assertions::assert_eq;

    fn module(name: &str) -> ModuleDescriptor {
        ModuleDescriptor::builder(name).build().unwrap()
    }

    fn names(resolved: &ResolvedSet) -> Vec<&str> {
        resolved.modules().collect()
    }

    fn reads(resolved: &ResolvedSet, module: &str) -> Vec<String> {
        resolved.reads(module).unwrap().iter().cloned().collect()
    }

    #[test]
    fn test_resolve_chain() {
        let catalog = Catalog::from_descriptors([
            ModuleDescriptor::builder("app").requires("lib").build().unwrap(),
            ModuleDescriptor::builder("lib").requires("util").build().unwrap(),
            module("util"),
            module("unrelated"),
        ])
        .unwrap();

        let (resolved, diags) = resolve(&catalog, &ResolveRequest::new(["app"]));
        assert!(diags.is_empty());
        assert_eq!(names(&resolved), vec!["app", "lib", "util"]);
        assert_eq!(reads(&resolved, "app"), vec!["lib"]);
        assert!(!resolved.can_read("app", "util"));
    }

    #[test]
    fn test_all_missing_dependencies_reported() {
        let catalog = Catalog::from_descriptors([
            ModuleDescriptor::builder("app")
                .requires("a")
                .requires("b")
                .build()
                .unwrap(),
        ])
        .unwrap();

        let (resolved, diags) = resolve(&catalog, &ResolveRequest::new(["app", "ghost"]));
        assert!(resolved.is_empty());
        assert_eq!(diags.error_count(), 3);
        assert!(diags.iter().all(|d| d.code == DiagnosticCode::UnresolvedDependency));

        let modules: Vec<Vec<String>> = diags.iter().map(|d| d.modules.clone()).collect();
        assert_eq!(
            modules,
            vec![
                vec!["ghost".to_string()],
                vec!["app".to_string(), "a".to_string()],
                vec!["app".to_string(), "b".to_string()],
            ]
        );
    }

    #[test]
    fn test_optional_present_target_is_followed() {
        let catalog = Catalog::from_descriptors([
            ModuleDescriptor::builder("app").requires_static("tools").build().unwrap(),
            module("tools"),
        ])
        .unwrap();

        let (resolved, diags) = resolve(&catalog, &ResolveRequest::new(["app"]));
        assert!(diags.is_empty());
        assert_eq!(names(&resolved), vec!["app", "tools"]);
        assert!(resolved.can_read("app", "tools"));
    }

    #[test]
    fn test_base_module_seeded_and_read() {
        let catalog = Catalog::from_descriptors([
            module("app"),
            module(DEFAULT_BASE_MODULE),
        ])
        .unwrap();

        let (resolved, _) = resolve(&catalog, &ResolveRequest::new(["app"]));
        assert_eq!(names(&resolved), vec!["app", "java.base"]);
        assert_eq!(reads(&resolved, "app"), vec!["java.base"]);
        assert!(reads(&resolved, "java.base").is_empty());

        let request = ResolveRequest::new(["app"]).with_base_module(None::<String>);
        let (resolved, _) = resolve(&catalog, &request);
        assert_eq!(names(&resolved), vec!["app"]);
    }

    #[test]
    fn test_extra_roots() {
        let catalog = Catalog::from_descriptors([module("app"), module("agent")]).unwrap();
        let request = ResolveRequest::new(["app"]).with_extra_roots(["agent"]);

        let (resolved, diags) = resolve(&catalog, &request);
        assert!(diags.is_empty());
        assert_eq!(names(&resolved), vec!["agent", "app"]);
    }

    #[test]
    fn test_requiring_unnamed_is_an_error() {
        let catalog = Catalog::from_descriptors([
            ModuleDescriptor::builder("app").requires("ALL-UNNAMED").build().unwrap(),
            ModuleDescriptor::unnamed(["com.cp"]).unwrap(),
        ])
        .unwrap();

        let (resolved, diags) = resolve(&catalog, &ResolveRequest::new(["app"]));
        assert!(resolved.is_empty());
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.iter().next().unwrap().severity, Severity::Error);
    }

    #[test]
    fn test_reading_automatic_implies_every_resolved_module() {
        let catalog = Catalog::from_descriptors([
            ModuleDescriptor::builder("app").requires("legacy").build().unwrap(),
            ModuleDescriptor::automatic("legacy", ["org.legacy"]).unwrap(),
            ModuleDescriptor::automatic("other.jar", ["org.other"]).unwrap(),
            ModuleDescriptor::unnamed(["com.cp"]).unwrap(),
            module("lib"),
        ])
        .unwrap();

        let request = ResolveRequest::new(["app", UNNAMED_MODULE]).with_extra_roots(["lib"]);
        let (resolved, diags) = resolve(&catalog, &request);
        assert!(diags.is_empty());
        assert_eq!(names(&resolved), vec![UNNAMED_MODULE, "app", "legacy", "lib"]);
        assert_eq!(reads(&resolved, "legacy"), vec![UNNAMED_MODULE, "app", "lib"]);
        assert_eq!(reads(&resolved, UNNAMED_MODULE), vec!["app", "legacy", "lib"]);
        assert_eq!(reads(&resolved, "app"), vec!["legacy", "lib"]);
        assert!(reads(&resolved, "lib").is_empty());
    }

    #[test]
    fn test_transitive_chain_propagates() {
        let catalog = Catalog::from_descriptors([
            ModuleDescriptor::builder("a").requires("b").build().unwrap(),
            ModuleDescriptor::builder("b").requires_transitive("c").build().unwrap(),
            ModuleDescriptor::builder("c").requires_transitive("d").build().unwrap(),
            ModuleDescriptor::builder("d").requires("e").build().unwrap(),
            module("e"),
        ])
        .unwrap();

        let (resolved, _) = resolve(&catalog, &ResolveRequest::new(["a"]));
        assert_eq!(reads(&resolved, "a"), vec!["b", "c", "d"]);
        assert_eq!(reads(&resolved, "b"), vec!["c", "d"]);
        assert_eq!(reads(&resolved, "d"), vec!["e"]);
    }
}

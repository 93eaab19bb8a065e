//! Structural checks over a resolved module graph.
//!
//! Four independent checks run in a fixed order and all of them always run,
//! so one bad graph reports every problem it has.

use std::collections::BTreeMap;

use modgraph_common::{Diagnostic, DiagnosticCode, DiagnosticSink};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::catalog::Catalog;
use crate::descriptor::{ModuleDescriptor, Targets};
use crate::resolver::ResolvedSet;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnStack,
    Done,
}

/// DFS state of the cycle check.
#[derive(Default)]
struct CycleSearch<'a> {
    marks: FxHashMap<&'a str, Mark>,
    stack: Vec<&'a str>,
    cycles: Vec<Vec<&'a str>>,
}

impl<'a> CycleSearch<'a> {
    fn enter(&mut self, module: &'a str) {
        self.marks.insert(module, Mark::OnStack);
        self.stack.push(module);
    }

    fn leave(&mut self) {
        if let Some(module) = self.stack.pop() {
            self.marks.insert(module, Mark::Done);
        }
    }

    /// Records the stack from `target` onward as one cycle.
    fn record_cycle(&mut self, target: &str) {
        if let Some(start) = self.stack.iter().position(|&m| m == target) {
            self.cycles.push(self.stack[start..].to_vec());
        }
    }
}

pub struct Validator<'a> {
    catalog: &'a Catalog,
    resolved: &'a ResolvedSet,
}

impl<'a> Validator<'a> {
    pub fn new(catalog: &'a Catalog, resolved: &'a ResolvedSet) -> Self {
        Self { catalog, resolved }
    }

    pub fn validate(&self) -> DiagnosticSink {
        let mut sink = DiagnosticSink::new();
        self.check_cycles(&mut sink);
        self.check_split_packages(&mut sink);
        self.check_qualified_targets(&mut sink);
        self.check_services(&mut sink);
        debug!(
            errors = sink.error_count(),
            warnings = sink.warning_count(),
            "validated module graph"
        );
        sink
    }

    /// Resolved descriptors in name order.
    fn modules(&self) -> impl Iterator<Item = &'a ModuleDescriptor> + '_ {
        let catalog = self.catalog;
        self.resolved.modules().filter_map(move |name| catalog.get(name))
    }

    fn resolved_module(&self, name: &str) -> Option<&'a ModuleDescriptor> {
        if self.resolved.contains(name) {
            self.catalog.get(name)
        } else {
            None
        }
    }

    fn check_cycles(&self, sink: &mut DiagnosticSink) {
        let mut search = CycleSearch::default();
        for desc in self.modules() {
            if !search.marks.contains_key(desc.name()) {
                self.search_cycles(desc, &mut search);
            }
        }

        for cycle in search.cycles {
            let path: Vec<&str> = cycle.iter().chain(cycle.first()).copied().collect();
            sink.push(
                Diagnostic::error(
                    DiagnosticCode::CyclicDependency,
                    format!("cyclic dependency: {}", path.join(" -> ")),
                )
                .with_modules(cycle),
            );
        }
    }

    /// Depth-first search from `start`, driven by an explicit stack of
    /// `(module, next requires index)` frames.
    fn search_cycles(&self, start: &'a ModuleDescriptor, search: &mut CycleSearch<'a>) {
        let mut frames = vec![(start, 0)];
        search.enter(start.name());

        while let Some(frame) = frames.last_mut() {
            let (desc, index) = *frame;
            let Some(req) = desc.requires().get(index) else {
                frames.pop();
                search.leave();
                continue;
            };
            frame.1 += 1;

            if req.optional {
                continue;
            }
            let Some(target) = self.resolved_module(&req.target) else {
                continue;
            };
            match search.marks.get(target.name()) {
                None => {
                    search.enter(target.name());
                    frames.push((target, 0));
                }
                Some(Mark::OnStack) => search.record_cycle(target.name()),
                Some(Mark::Done) => {}
            }
        }
    }

    fn check_split_packages(&self, sink: &mut DiagnosticSink) {
        let mut owners: BTreeMap<&str, Vec<&ModuleDescriptor>> = BTreeMap::new();
        for desc in self.modules() {
            for package in desc.packages() {
                owners.entry(package.as_str()).or_default().push(desc);
            }
        }

        for (package, owners) in owners.into_iter().filter(|(_, o)| o.len() > 1) {
            let names: Vec<&str> = owners.iter().map(|d| d.name()).collect();
            let named: Vec<&str> = owners
                .iter()
                .filter(|d| !d.is_unnamed())
                .map(|d| d.name())
                .collect();

            let diagnostic = if named.len() > 1 {
                Diagnostic::error(
                    DiagnosticCode::SplitPackage,
                    format!(
                        "package `{}` is contained in more than one module: {}",
                        package,
                        names.join(", ")
                    ),
                )
            } else {
                Diagnostic::warning(
                    DiagnosticCode::SplitPackage,
                    format!(
                        "package `{}` in module `{}` is also on the classpath",
                        package,
                        named.join(", ")
                    ),
                )
                .with_note("classes of the package on the classpath are not visible to modules")
            };
            sink.push(diagnostic.with_modules(names));
        }
    }

    fn check_qualified_targets(&self, sink: &mut DiagnosticSink) {
        for desc in self.modules() {
            for (directive, grants) in [("exports", desc.exports()), ("opens", desc.opens())] {
                for grant in grants {
                    let Targets::Only(targets) = &grant.targets else {
                        continue;
                    };
                    for target in targets.iter().filter(|t| !self.resolved.contains(t)) {
                        let diagnostic = if self.catalog.contains(target) {
                            Diagnostic::warning(
                                DiagnosticCode::DanglingQualifiedExport,
                                format!(
                                    "qualified {} of `{}` from `{}` has no effect: `{}` is not resolved",
                                    directive,
                                    grant.package,
                                    desc.name(),
                                    target
                                ),
                            )
                        } else {
                            Diagnostic::error(
                                DiagnosticCode::DanglingQualifiedExport,
                                format!(
                                    "qualified {} of `{}` from `{}` names unknown module `{}`",
                                    directive,
                                    grant.package,
                                    desc.name(),
                                    target
                                ),
                            )
                        };
                        sink.push(diagnostic.with_modules([desc.name(), target.as_str()]));
                    }
                }
            }
        }
    }

    fn check_services(&self, sink: &mut DiagnosticSink) {
        let provided = |service: &str| self.modules().any(|desc| desc.provides_service(service));

        for desc in self.modules() {
            for service in desc.uses().iter().filter(|s| !provided(s.as_str())) {
                sink.push(
                    Diagnostic::warning(
                        DiagnosticCode::NoServiceProvider,
                        format!(
                            "module `{}` uses `{}` but no resolved module provides it",
                            desc.name(),
                            service
                        ),
                    )
                    .with_modules([desc.name()]),
                );
            }
        }
    }
}

/// Runs every check over `resolved`.
pub fn validate(resolved: &ResolvedSet, catalog: &Catalog) -> DiagnosticSink {
    Validator::new(catalog, resolved).validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{resolve, ResolveRequest};
    use modgraph_common::Severity;
    use pretty_assertions::assert_eq;

    fn check(catalog: &Catalog, roots: &[&str]) -> DiagnosticSink {
        let (resolved, diags) = resolve(catalog, &ResolveRequest::new(roots.iter().copied()));
        assert!(diags.is_empty(), "unexpected resolution errors: {:?}", diags);
        validate(&resolved, catalog)
    }

    #[test]
    fn test_clean_graph() {
        let catalog = Catalog::from_descriptors([
            ModuleDescriptor::builder("app").requires("lib").build().unwrap(),
            ModuleDescriptor::builder("lib").contains("com.lib").exports("com.lib").build().unwrap(),
        ])
        .unwrap();

        assert!(check(&catalog, &["app"]).is_empty());
    }

    #[test]
    fn test_two_cycles() {
        let catalog = Catalog::from_descriptors([
            ModuleDescriptor::builder("a").requires("b").requires("x").build().unwrap(),
            ModuleDescriptor::builder("b").requires("a").build().unwrap(),
            ModuleDescriptor::builder("x").requires("y").build().unwrap(),
            ModuleDescriptor::builder("y").requires("x").build().unwrap(),
        ])
        .unwrap();

        let diags = check(&catalog, &["a"]);
        let cycles: Vec<Vec<String>> = diags.iter().map(|d| d.modules.clone()).collect();
        assert_eq!(
            cycles,
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["x".to_string(), "y".to_string()],
            ]
        );
        assert_eq!(
            diags.iter().next().unwrap().message,
            "cyclic dependency: a -> b -> a"
        );
    }

    #[test]
    fn test_optional_edges_do_not_form_cycles() {
        let catalog = Catalog::from_descriptors([
            ModuleDescriptor::builder("a").requires("b").build().unwrap(),
            ModuleDescriptor::builder("b").requires_static("a").build().unwrap(),
        ])
        .unwrap();

        assert!(check(&catalog, &["a"]).is_empty());
    }

    #[test]
    fn test_deep_chain_does_not_exhaust_the_stack() {
        const DEPTH: usize = 100_000;
        let catalog = Catalog::from_descriptors((0..DEPTH).map(|i| {
            let builder = ModuleDescriptor::builder(format!("m{}", i));
            let builder = if i + 1 < DEPTH {
                builder.requires(format!("m{}", i + 1))
            } else {
                builder.requires("m0")
            };
            builder.build().unwrap()
        }))
        .unwrap();

        let diags = check(&catalog, &["m0"]);
        assert_eq!(diags.len(), 1);
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.code, DiagnosticCode::CyclicDependency);
        assert_eq!(diag.modules.len(), DEPTH);
    }

    #[test]
    fn test_split_package_among_named_modules() {
        let catalog = Catalog::from_descriptors([
            ModuleDescriptor::builder("app")
                .requires("one")
                .requires("two")
                .build()
                .unwrap(),
            ModuleDescriptor::builder("one").contains("com.shared").build().unwrap(),
            ModuleDescriptor::builder("two").contains("com.shared").build().unwrap(),
        ])
        .unwrap();

        let diags = check(&catalog, &["app"]);
        assert_eq!(diags.len(), 1);
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.code, DiagnosticCode::SplitPackage);
        assert_eq!(diag.modules, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_qualified_targets() {
        let catalog = Catalog::from_descriptors([
            ModuleDescriptor::builder("lib")
                .contains("com.lib.a")
                .contains("com.lib.b")
                .exports_to("com.lib.a", ["known.unresolved"])
                .opens_to("com.lib.b", ["nowhere"])
                .build()
                .unwrap(),
            ModuleDescriptor::builder("known.unresolved").build().unwrap(),
        ])
        .unwrap();

        let diags = check(&catalog, &["lib"]);
        let summary: Vec<(Severity, Vec<String>)> = diags
            .iter()
            .map(|d| (d.severity, d.modules.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Severity::Warning, vec!["lib".to_string(), "known.unresolved".to_string()]),
                (Severity::Error, vec!["lib".to_string(), "nowhere".to_string()]),
            ]
        );
        assert!(diags.iter().all(|d| d.code == DiagnosticCode::DanglingQualifiedExport));
    }

    #[test]
    fn test_service_with_provider() {
        let catalog = Catalog::from_descriptors([
            ModuleDescriptor::builder("app")
                .requires("impl")
                .uses("spi.Codec")
                .build()
                .unwrap(),
            ModuleDescriptor::builder("impl")
                .contains("com.impl")
                .provides("spi.Codec", "com.impl.GzipCodec")
                .build()
                .unwrap(),
        ])
        .unwrap();

        assert!(check(&catalog, &["app"]).is_empty());
    }

    #[test]
    fn test_all_checks_run() {
        let catalog = Catalog::from_descriptors([
            ModuleDescriptor::builder("a")
                .requires("b")
                .contains("p")
                .exports_to("p", ["ghost"])
                .uses("spi.Missing")
                .build()
                .unwrap(),
            ModuleDescriptor::builder("b").requires("a").contains("p").build().unwrap(),
        ])
        .unwrap();

        let codes: Vec<DiagnosticCode> = check(&catalog, &["a"]).iter().map(|d| d.code).collect();
        assert_eq!(
            codes,
            vec![
                DiagnosticCode::CyclicDependency,
                DiagnosticCode::SplitPackage,
                DiagnosticCode::DanglingQualifiedExport,
                DiagnosticCode::NoServiceProvider,
            ]
        );
    }
}

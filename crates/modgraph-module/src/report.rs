//! The outcome of one resolution run.

use modgraph_common::{Diagnostic, DiagnosticSink, Severity};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::catalog::Catalog;
use crate::resolver::{resolve, ResolveRequest, ResolvedSet};
use crate::validate::validate;

/// A resolved module and the modules it reads, both in name order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ResolvedModule {
    pub name: String,
    pub reads: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Report {
    pub resolved: Vec<ResolvedModule>,
    /// Errors first, then warnings; within a severity by check phase.
    pub diagnostics: Vec<Diagnostic>,
    pub success: bool,
}

impl Report {
    pub fn new(resolved: &ResolvedSet, diagnostics: DiagnosticSink) -> Self {
        let resolved = resolved
            .iter()
            .map(|(name, reads)| ResolvedModule {
                name: name.to_string(),
                reads: reads.iter().cloned().collect(),
            })
            .collect();
        Self::from_parts(resolved, diagnostics)
    }

    fn from_parts(mut resolved: Vec<ResolvedModule>, mut diagnostics: DiagnosticSink) -> Self {
        diagnostics.sort();
        let success = !diagnostics.has_errors();
        if !success {
            resolved.clear();
        }
        Self {
            resolved,
            diagnostics: diagnostics.into_vec(),
            success,
        }
    }

    /// Folds diagnostics produced outside the pipeline, e.g. while loading
    /// descriptors, into the report.
    pub fn merge_diagnostics(self, extra: DiagnosticSink) -> Self {
        let mut diagnostics = DiagnosticSink::from(self.diagnostics);
        diagnostics.extend(extra);
        Self::from_parts(self.resolved, diagnostics)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn module(&self, name: &str) -> Option<&ResolvedModule> {
        self.resolved.iter().find(|m| m.name == name)
    }
}

/// Resolves `request` and validates the result. Validation only runs on a
/// graph that resolved cleanly; any error leaves the report's module list
/// empty.
pub fn resolve_and_validate(catalog: &Catalog, request: &ResolveRequest) -> Report {
    let (resolved, mut diagnostics) = resolve(catalog, request);
    if !diagnostics.has_errors() {
        diagnostics.extend(validate(&resolved, catalog));
    }
    Report::new(&resolved, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ModuleDescriptor;
    use modgraph_common::DiagnosticCode;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_report_orders_diagnostics() {
        let mut sink = DiagnosticSink::new();
        sink.push(Diagnostic::warning(DiagnosticCode::NoServiceProvider, "w1"));
        sink.push(Diagnostic::error(DiagnosticCode::SplitPackage, "e2"));
        sink.push(Diagnostic::warning(DiagnosticCode::SplitPackage, "w2"));
        sink.push(Diagnostic::error(DiagnosticCode::CyclicDependency, "e1"));

        let report = Report::new(&ResolvedSet::default(), sink);
        let messages: Vec<&str> = report.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["e1", "e2", "w2", "w1"]);
        assert!(!report.success);
        assert_eq!(report.error_count(), 2);
        assert_eq!(report.warning_count(), 2);
    }

    #[test]
    fn test_warnings_keep_success() {
        let catalog = Catalog::from_descriptors([ModuleDescriptor::builder("app")
            .uses("spi.Missing")
            .build()
            .unwrap()])
        .unwrap();

        let report = resolve_and_validate(&catalog, &ResolveRequest::new(["app"]));
        assert!(report.success);
        assert_eq!(report.warning_count(), 1);
        assert_eq!(
            report.module("app"),
            Some(&ResolvedModule {
                name: "app".to_string(),
                reads: Vec::new(),
            })
        );
    }

    #[test]
    fn test_merge_diagnostics_clears_modules_on_error() {
        let catalog = Catalog::from_descriptors([ModuleDescriptor::builder("app").build().unwrap()]).unwrap();
        let report = resolve_and_validate(&catalog, &ResolveRequest::new(["app"]));
        assert_eq!(report.resolved.len(), 1);

        let mut load = DiagnosticSink::new();
        load.push(Diagnostic::error(DiagnosticCode::DescriptorSyntax, "bad file"));
        let report = report.merge_diagnostics(load);
        assert!(report.resolved.is_empty());
        assert!(!report.success);
    }
}

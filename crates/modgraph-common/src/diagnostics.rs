//! Diagnostic model shared by every phase of a resolution run.
//!
//! Nothing in the resolver is reported through `Err`: every problem found
//! while loading, resolving or validating a module graph becomes a
//! [`Diagnostic`] pushed into a [`DiagnosticSink`], and the caller decides
//! what to do with it.

use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::source::SourceLocation;

/// Diagnostic severity. Errors sort before warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "lowercase"))]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// The phase that produces a diagnostic, in the order phases run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Load,
    Resolve,
    Cycles,
    SplitPackages,
    QualifiedTargets,
    Services,
}

/// Stable identifier of a diagnostic kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum DiagnosticCode {
    /// A descriptor file could not be parsed.
    DescriptorSyntax,
    /// A descriptor violates a structural rule and was left out of the catalog.
    MalformedDescriptor,
    /// Two descriptors share a name.
    DuplicateModule,
    /// A root or a non-optional `requires` target is not in the catalog.
    UnresolvedDependency,
    /// Non-optional `requires` edges form a cycle.
    CyclicDependency,
    /// A package is contained in more than one resolved module.
    SplitPackage,
    /// A qualified `exports`/`opens` names a module that is not resolved.
    DanglingQualifiedExport,
    /// A used service has no provider among the resolved modules.
    NoServiceProvider,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::DescriptorSyntax => "DescriptorSyntax",
            DiagnosticCode::MalformedDescriptor => "MalformedDescriptor",
            DiagnosticCode::DuplicateModule => "DuplicateModule",
            DiagnosticCode::UnresolvedDependency => "UnresolvedDependency",
            DiagnosticCode::CyclicDependency => "CyclicDependency",
            DiagnosticCode::SplitPackage => "SplitPackage",
            DiagnosticCode::DanglingQualifiedExport => "DanglingQualifiedExport",
            DiagnosticCode::NoServiceProvider => "NoServiceProvider",
        }
    }

    pub fn phase(self) -> Phase {
        match self {
            DiagnosticCode::DescriptorSyntax
            | DiagnosticCode::MalformedDescriptor
            | DiagnosticCode::DuplicateModule => Phase::Load,
            DiagnosticCode::UnresolvedDependency => Phase::Resolve,
            DiagnosticCode::CyclicDependency => Phase::Cycles,
            DiagnosticCode::SplitPackage => Phase::SplitPackages,
            DiagnosticCode::DanglingQualifiedExport => Phase::QualifiedTargets,
            DiagnosticCode::NoServiceProvider => Phase::Services,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source location attached to a diagnostic by whoever knows where a
/// module was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub location: SourceLocation,
    pub message: String,
    pub primary: bool,
}

impl Label {
    pub fn primary(location: SourceLocation, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
            primary: true,
        }
    }

    pub fn secondary(location: SourceLocation, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
            primary: false,
        }
    }
}

/// A single reported problem.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    /// Modules involved, in a meaningful order (e.g. cycle traversal order).
    pub modules: Vec<String>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub labels: Vec<Label>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Vec::is_empty"))]
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            modules: Vec::new(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    pub fn with_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modules.extend(modules.into_iter().map(Into::into));
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
    }
}

/// Ordered collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, other: DiagnosticSink) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Diagnostic> {
        self.diagnostics.iter_mut()
    }

    /// Orders diagnostics errors-first, then by the phase that produced
    /// them. Emission order is kept within a phase.
    pub fn sort(&mut self) {
        self.diagnostics
            .sort_by_key(|d| (d.severity, d.code.phase()));
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl From<Vec<Diagnostic>> for DiagnosticSink {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

impl IntoIterator for DiagnosticSink {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

impl<'a> IntoIterator for &'a DiagnosticSink {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

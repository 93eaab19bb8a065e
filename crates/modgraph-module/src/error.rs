//! Error types for descriptor construction, catalogs and descriptor files.

use modgraph_common::{Diagnostic, DiagnosticCode, FileId, Label, SourceLocation, Span};

/// A structural defect found while building a single descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error("module name cannot be empty")]
    EmptyName,

    #[error("invalid module name `{0}`")]
    InvalidName(String),

    #[error("invalid package name `{package}` in module `{module}`")]
    InvalidPackage { module: String, package: String },

    #[error("module `{0}` requires itself")]
    SelfRequires(String),

    #[error("module `{module}` requires `{target}` more than once")]
    DuplicateRequires { module: String, target: String },

    #[error("module `{module}` exports package `{package}` which it does not contain")]
    ExportedPackageNotContained { module: String, package: String },

    #[error("module `{module}` opens package `{package}` which it does not contain")]
    OpenedPackageNotContained { module: String, package: String },

    #[error("module `{module}` exports package `{package}` more than once")]
    DuplicateExports { module: String, package: String },

    #[error("module `{module}` opens package `{package}` more than once")]
    DuplicateOpens { module: String, package: String },

    #[error("open module `{module}` cannot declare `opens {package}`")]
    OpensInOpenModule { module: String, package: String },

    #[error("qualified {directive} of `{package}` in module `{module}` has no targets")]
    EmptyTargets {
        module: String,
        directive: &'static str,
        package: String,
    },

    #[error("provider `{provider}` of `{service}` is not in a package of module `{module}`")]
    ProviderNotContained {
        module: String,
        service: String,
        provider: String,
    },
}

impl DescriptorError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(DiagnosticCode::MalformedDescriptor, self.to_string());
        match self.module() {
            Some(module) => diag.with_modules([module]),
            None => diag,
        }
    }

    /// The module the defect was found in, when it has a usable name.
    pub fn module(&self) -> Option<&str> {
        match self {
            DescriptorError::EmptyName => None,
            DescriptorError::InvalidName(name) | DescriptorError::SelfRequires(name) => Some(name),
            DescriptorError::InvalidPackage { module, .. }
            | DescriptorError::DuplicateRequires { module, .. }
            | DescriptorError::ExportedPackageNotContained { module, .. }
            | DescriptorError::OpenedPackageNotContained { module, .. }
            | DescriptorError::DuplicateExports { module, .. }
            | DescriptorError::DuplicateOpens { module, .. }
            | DescriptorError::OpensInOpenModule { module, .. }
            | DescriptorError::EmptyTargets { module, .. }
            | DescriptorError::ProviderNotContained { module, .. } => Some(module),
        }
    }
}

/// A descriptor that cannot enter a catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("module `{0}` is already in the catalog")]
    DuplicateModule(String),

    #[error("catalog already has an unnamed module `{existing}`; cannot add `{rejected}`")]
    MultipleUnnamed { existing: String, rejected: String },
}

impl CatalogError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(DiagnosticCode::DuplicateModule, self.to_string());
        match self {
            CatalogError::DuplicateModule(name) => diag.with_modules([name.as_str()]),
            CatalogError::MultipleUnnamed { existing, rejected } => {
                diag.with_modules([existing.as_str(), rejected.as_str()])
            }
        }
    }
}

/// Failure to read a descriptor file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("{message}")]
    Syntax {
        file: FileId,
        span: Span,
        message: String,
    },

    #[error("{error}")]
    Malformed {
        file: FileId,
        /// Span of the module declaration.
        span: Span,
        error: DescriptorError,
    },
}

impl ParseError {
    pub fn location(&self) -> SourceLocation {
        match self {
            ParseError::Syntax { file, span, .. } | ParseError::Malformed { file, span, .. } => {
                SourceLocation::new(*file, *span)
            }
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ParseError::Syntax { message, .. } => {
                Diagnostic::error(DiagnosticCode::DescriptorSyntax, message.clone())
                    .with_label(Label::primary(self.location(), "cannot parse this line"))
            }
            ParseError::Malformed { error, .. } => error
                .to_diagnostic()
                .with_label(Label::primary(self.location(), "in this module declaration")),
        }
    }
}

pub type DescriptorResult<T> = Result<T, DescriptorError>;
pub type ParseResult<T> = Result<T, ParseError>;

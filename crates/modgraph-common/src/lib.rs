//! Shared infrastructure for modgraph.
//!
//! - `span` / `source`: descriptor source files and byte positions
//! - `diagnostics`: the diagnostic model shared by every resolution phase
//! - `emitter`: terminal rendering of diagnostics via codespan-reporting

pub mod diagnostics;
pub mod emitter;
pub mod source;
pub mod span;

pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Label, Phase, Severity};
pub use emitter::DiagnosticEmitter;
pub use source::{FileId, SourceFile, SourceLocation, SourceMap};
pub use span::{BytePos, Span};

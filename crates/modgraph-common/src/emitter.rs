//! Terminal rendering of diagnostics.

use codespan_reporting::diagnostic::{
    Diagnostic as CsDiagnostic, Label as CsLabel, Severity as CsSeverity,
};
use codespan_reporting::files::Error as FilesError;
use codespan_reporting::term::{self, Config};
use termcolor::{ColorChoice, StandardStream, WriteColor};

use crate::diagnostics::{Diagnostic, DiagnosticSink, Severity};
use crate::source::{FileId, SourceMap};

/// Renders diagnostics against the descriptor files they refer to.
pub struct DiagnosticEmitter<'a> {
    source_map: &'a SourceMap,
    config: Config,
}

impl<'a> DiagnosticEmitter<'a> {
    pub fn new(source_map: &'a SourceMap) -> Self {
        Self {
            source_map,
            config: Config::default(),
        }
    }

    /// Writes every diagnostic to stderr.
    pub fn emit_all(&self, diagnostics: &DiagnosticSink) {
        let stream = StandardStream::stderr(ColorChoice::Auto);
        let mut writer = stream.lock();
        for diagnostic in diagnostics {
            // A broken stderr leaves nothing useful to report to.
            let _ = self.emit_to(&mut writer, diagnostic);
        }
    }

    pub fn emit_to(
        &self,
        writer: &mut dyn WriteColor,
        diagnostic: &Diagnostic,
    ) -> Result<(), FilesError> {
        term::emit(writer, &self.config, self.source_map, &self.convert(diagnostic))
    }

    fn convert(&self, diagnostic: &Diagnostic) -> CsDiagnostic<FileId> {
        let severity = match diagnostic.severity {
            Severity::Error => CsSeverity::Error,
            Severity::Warning => CsSeverity::Warning,
        };

        let labels = diagnostic
            .labels
            .iter()
            .filter(|label| self.source_map.get_file(label.location.file).is_some())
            .map(|label| {
                let range = label.location.span.to_range();
                let cs = if label.primary {
                    CsLabel::primary(label.location.file, range)
                } else {
                    CsLabel::secondary(label.location.file, range)
                };
                cs.with_message(label.message.clone())
            })
            .collect();

        let mut notes = diagnostic.notes.clone();
        if diagnostic.labels.is_empty() && !diagnostic.modules.is_empty() {
            notes.push(format!("involved modules: {}", diagnostic.modules.join(", ")));
        }

        CsDiagnostic::new(severity)
            .with_code(diagnostic.code.as_str())
            .with_message(diagnostic.message.clone())
            .with_labels(labels)
            .with_notes(notes)
    }
}

//! Presenting reports.
//!
//! Text output lists the resolved modules on stdout and renders diagnostics
//! against their descriptor files on stderr. JSON output writes the whole
//! report to stdout.

use std::io::Write;

use clap::ValueEnum;
use modgraph_common::{DiagnosticEmitter, DiagnosticSink};
use modgraph_module::Report;

use crate::error::CliResult;
use crate::loader::LoadedModules;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn write_report(
    out: &mut dyn Write,
    report: &Report,
    loaded: &LoadedModules,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Text => {
            emit_diagnostics(loaded, report);
            write_modules(out, report)?;
            writeln!(out, "{}", summary(report))?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn emit_diagnostics(loaded: &LoadedModules, report: &Report) {
    let sink = DiagnosticSink::from(report.diagnostics.clone());
    DiagnosticEmitter::new(&loaded.source_map).emit_all(&sink);
}

fn write_modules(out: &mut dyn Write, report: &Report) -> CliResult<()> {
    for module in &report.resolved {
        if module.reads.is_empty() {
            writeln!(out, "{}", module.name)?;
        } else {
            writeln!(out, "{} -> {}", module.name, module.reads.join(", "))?;
        }
    }
    Ok(())
}

pub fn summary(report: &Report) -> String {
    let outcome = if report.success { "resolved" } else { "resolution failed" };
    format!(
        "{}: {} module(s), {} error(s), {} warning(s)",
        outcome,
        report.resolved.len(),
        report.error_count(),
        report.warning_count()
    )
}

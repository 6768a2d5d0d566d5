//! @ai:module:intent Format the extracted model, warnings and run reports (JSON, text)
//! @ai:module:layer infrastructure
//! @ai:module:public_api OutputFormat, format_model, format_warnings, format_report, to_json
//! @ai:module:depends_on extractor, diagnostics, generator
//! @ai:module:stateless true

use crate::construct::Construct;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::extractor::{FileSpec, SpecModel};
use crate::generator::GenerationReport;
use crate::language::detect_source_kind;
use colored::Colorize;
use serde::Serialize;

/// @ai:intent Output format options
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
}

/// @ai:intent Format an extracted model as a string
/// @ai:effects pure
pub fn format_model(model: &SpecModel, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(model, false),
        OutputFormat::JsonPretty => to_json(model, true),
        OutputFormat::Text => Ok(format_model_text(model)),
    }
}

/// @ai:intent Format an extracted model as human-readable text
/// @ai:effects pure
fn format_model_text(model: &SpecModel) -> String {
    let mut output = String::new();
    let global = &model.global;

    output.push_str(&format!(
        "{} ({})\n",
        "@DeclareState".bold(),
        global.location
    ));
    for field in &global.declared_state {
        output.push_str(&format!("    {}\n", field));
    }
    let generated: Vec<&str> = [
        (global.auto_gen.initial, "Initial"),
        (global.auto_gen.copy, "Copy"),
        (global.auto_gen.clear, "Clear"),
        (global.auto_gen.print, "Print"),
    ]
    .iter()
    .filter(|(on, _)| *on)
    .map(|(_, name)| *name)
    .collect();
    if !generated.is_empty() {
        output.push_str(&format!("  auto-generated: {}\n", generated.join(", ")));
    }
    for rule in &global.commutativity_rules {
        output.push_str(&format!("  commutativity: {}\n", rule));
    }

    for file in &model.files {
        output.push('\n');
        output.push_str(&format_file_text(file));
    }

    if !model.headers.is_empty() {
        output.push_str(&format!(
            "\nHeaders: {}\n",
            model.headers.iter().cloned().collect::<Vec<_>>().join(", ")
        ));
    }
    if !model.forward_classes.is_empty() {
        output.push_str(&format!(
            "Forward declarations: {}\n",
            model
                .forward_classes
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    output
}

fn format_file_text(file: &FileSpec) -> String {
    let mut output = String::new();
    let kind = detect_source_kind(&file.path).map_or("unknown", |k| k.name());
    output.push_str(&format!(
        "{} ({}, {} constructs)\n",
        file.path.display().to_string().bold(),
        kind,
        file.construct_count()
    ));

    for interface in &file.interfaces {
        output.push_str(&format!(
            "  {} {} (line {}, body ends at line {})\n",
            "@Interface".cyan(),
            interface.label,
            interface.begin_line(),
            interface.body_end_line
        ));
        output.push_str(&format!("      {}\n", interface.header));
    }
    for op in &file.ops {
        let label = op
            .label
            .as_deref()
            .map(|l| format!("({})", l))
            .unwrap_or_default();
        output.push_str(&format!(
            "  {}{} (line {}): {}\n",
            format!("@{}", op.tag()).cyan(),
            label,
            op.begin_line(),
            op.condition
        ));
    }
    for define in &file.defines {
        output.push_str(&format!(
            "  {} (lines {}-{}, {} lines of code)\n",
            "@Define".cyan(),
            define.begin_line(),
            define.end_line,
            define.code.len()
        ));
    }
    if let Some(entry) = &file.entry {
        output.push_str(&format!("  {} (line {})\n", "@Entry".cyan(), entry.begin_line()));
    }
    output
}

/// @ai:intent Format collected warnings, one per line
/// @ai:effects pure
pub fn format_warnings(diagnostics: &Diagnostics) -> String {
    diagnostics
        .warnings()
        .iter()
        .map(|w| format!("{} {}\n", "WARN".yellow().bold(), w))
        .collect()
}

/// @ai:intent Summarize a finished generation run
/// @ai:effects pure
pub fn format_report(report: &GenerationReport) -> String {
    let mut output = format_warnings(&report.diagnostics);
    output.push_str(&format!(
        "{} Wrote {} files to {}",
        "OK".green().bold(),
        report.written.len(),
        report.output_dir.display()
    ));
    let warnings = report.diagnostics.warnings().len();
    if warnings > 0 {
        output.push_str(&format!(" ({} warnings)", warnings.to_string().yellow()));
    }
    output.push('\n');
    output
}

/// @ai:intent Format any serializable value as JSON
/// @ai:effects pure
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

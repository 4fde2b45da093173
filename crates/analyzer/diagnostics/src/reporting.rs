//! Terminal rendering for reports.

use ariadne::{Label, Report as TermReport, ReportKind};

use crate::{Report, Severity};

impl From<Severity> for ReportKind<'static> {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
            Severity::Notice => ReportKind::Advice,
        }
    }
}

/// Render a report against its source text, ariadne-style.
pub fn build_report_message(source_content: &str, report: &Report, with_color: bool) -> String {
    let mut write_buffer = Vec::new();

    let file_id = report.file_path.clone();
    let report_span = (file_id.clone(), report.range.start_byte..report.range.end_byte);
    let cache = ariadne::sources(vec![(file_id, source_content.to_string())]);

    TermReport::build(report.severity.into(), report_span.clone())
        .with_config(
            ariadne::Config::new()
                .with_index_type(ariadne::IndexType::Byte)
                .with_color(with_color),
        )
        .with_message(&report.message)
        .with_label(Label::new(report_span).with_message(&report.message))
        .finish()
        .write(cache, &mut write_buffer)
        .expect("writing to a Vec cannot fail");

    String::from_utf8_lossy(&write_buffer).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vls_analyzer_syntax::SourceText;

    #[test]
    fn rendered_message_names_file_and_text() {
        let source = "fn main() {\n\tprintln(foo)\n}\n";
        let range = SourceText::new(source).range_between(21, 24);
        let report = Report::error("unresolved symbol `foo`", range, "main.vv");

        let rendered = build_report_message(source, &report, false);
        assert!(rendered.contains("unresolved symbol `foo`"));
        assert!(rendered.contains("main.vv"));
    }
}

//! Terminal rendering of resolution results.

pub mod tables;
pub mod theme;

pub use tables::{create_plan_table, create_summary_table};
pub use theme::{THEME, Theme};

use crate::engine::RunReport;
use std::fmt::Write;

/// Plans, diagnostics and a summary, as printed by `mapweave resolve`
pub fn render_report(report: &RunReport, show_plans: bool) -> String {
    let mut out = String::new();

    if show_plans {
        for plan in report.plans() {
            let _ = writeln!(
                out,
                "{} {} {}",
                THEME.apply(&THEME.header, &plan.target),
                THEME.apply(&THEME.dim, "<-"),
                THEME.apply(&THEME.code, &plan.source)
            );
            let _ = writeln!(
                out,
                "  {} {}",
                THEME.apply(&THEME.dim, "imports:"),
                plan.imports.join(", ")
            );
            if plan.needs_auxiliary_constructor {
                let _ = writeln!(out, "  {}", THEME.apply(&THEME.dim, "generates auxiliary constructor"));
            }
            let _ = writeln!(out, "{}", create_plan_table(plan));
        }
    }

    let diagnostics: Vec<_> = report.all_diagnostics().collect();
    if !diagnostics.is_empty() {
        for diagnostic in diagnostics {
            let _ = writeln!(out, "{}", THEME.diagnostic(diagnostic));
        }
        out.push('\n');
    }

    let _ = writeln!(out, "{}", create_summary_table(report));
    let verdict = if report.has_errors() {
        THEME.error_with_icon(&format!(
            "{} error(s), {} warning(s)",
            report.error_count(),
            report.warning_count()
        ))
    } else if report.warning_count() > 0 {
        THEME.warning_with_icon(&format!("{} warning(s)", report.warning_count()))
    } else {
        THEME.success_with_icon("all mappings resolved")
    };
    out.push_str(&verdict);
    out
}

//! Table formatting utilities for structured output.

use crate::engine::RunReport;
use crate::plan::MappingPlan;
use comfy_table::{
    Attribute, Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.apply_modifier(UTF8_ROUND_CORNERS);
    table
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
        .collect()
}

/// Matched pairs of one plan, in emission order
pub fn create_plan_table(plan: &MappingPlan) -> String {
    let mut table = new_table();
    table.set_header(header(&["Target", "Source", "Types", "Strategy"]));

    for pair in &plan.pairs {
        table.add_row(vec![
            pair.target_member.clone(),
            pair.source_member.clone(),
            format!("{} <- {}", pair.target_type, pair.source_type),
            pair.strategy.to_string(),
        ]);
    }

    table.to_string()
}

/// One row per triple plus a totals row
pub fn create_summary_table(report: &RunReport) -> String {
    let mut table = new_table();
    table.set_header(header(&["Source", "Target", "Direction", "Members", "Result"]));

    for outcome in &report.outcomes {
        let errors = outcome.diagnostics.iter().filter(|d| d.is_error()).count();
        let warnings = outcome.diagnostics.len() - errors;
        let (result, color) = match &outcome.plan {
            Some(_) if warnings == 0 => ("✓ planned".to_string(), Color::Green),
            Some(_) => (format!("⚠ {warnings} warning(s)"), Color::Yellow),
            None => (format!("✗ {errors} error(s)"), Color::Red),
        };
        let members = outcome
            .plan
            .as_ref()
            .map_or_else(|| "-".to_string(), |p| p.len().to_string());

        table.add_row(vec![
            Cell::new(&outcome.triple.source),
            Cell::new(&outcome.triple.target),
            Cell::new(outcome.triple.direction),
            Cell::new(members),
            Cell::new(result).fg(color),
        ]);
    }

    table.add_row(vec![
        Cell::new("TOTAL").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        Cell::new(report.plans().map(MappingPlan::len).sum::<usize>()).add_attribute(Attribute::Bold),
        Cell::new(format!(
            "{} plans, {} errors, {} warnings",
            report.plans().count(),
            report.error_count(),
            report.warning_count()
        ))
        .add_attribute(Attribute::Bold),
    ]);

    table.to_string()
}

//! Table rendering for command output.

use battant::{
    cart::{CartLine, CartSummary},
    changes::{BatchReport, ChangeEntry, ReportScope},
    pricing::PricingError,
};
use battant_app::resources::Record;
use serde_json::Value;
use tabled::{
    Table,
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};

pub(crate) fn cart(lines: &[CartLine]) -> Result<String, PricingError> {
    let mut builder = Builder::default();

    builder.push_record(["Item", "Size", "Variant", "Qty", "Unit", "Total"]);

    for line in lines {
        builder.push_record([
            line.name.clone().unwrap_or_else(|| line.id.to_string()),
            line.size.clone().unwrap_or_default(),
            line.variant.clone().unwrap_or_default(),
            line.quantity.to_string(),
            line.unit_price()?.to_string(),
            line.line_total()?.to_string(),
        ]);
    }

    let mut table = builder.build();

    table.modify(Columns::new(3..6), Alignment::right());

    Ok(finish(table))
}

pub(crate) fn summary(summary: &CartSummary) -> String {
    let mut out = format!(
        "{} item(s)  Subtotal: {}  Total: {}",
        summary.item_count, summary.subtotal, summary.total
    );

    if summary.has_savings() {
        out.push_str(&format!("  Savings: {}", summary.savings));
    }

    out
}

pub(crate) fn changes(entries: &[ChangeEntry]) -> String {
    let mut builder = Builder::default();

    builder.push_record(["Id", "Queued", "Type", "Resource", "Target", "Source"]);

    for entry in entries {
        builder.push_record([
            entry.id.to_string(),
            entry.created_at.to_string(),
            entry.kind.to_string(),
            entry.resource.to_string(),
            entry
                .target_id()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            entry.source.clone().unwrap_or_default(),
        ]);
    }

    finish(builder.build())
}

pub(crate) fn report(report: &BatchReport) -> String {
    let mut builder = Builder::default();

    builder.push_record(["Id", "Resource", "Status", "Message"]);

    for outcome in report.outcomes() {
        let status = if outcome.ok { "applied" } else { "failed" };

        builder.push_record([
            outcome.id.to_string(),
            scope(outcome.resource).to_string(),
            status.to_string(),
            outcome.msg.clone(),
        ]);
    }

    finish(builder.build())
}

/// One row per record, one column per field in first-seen order.
pub(crate) fn records(records: &[Record]) -> String {
    let mut columns: Vec<&str> = Vec::new();

    for key in records.iter().flat_map(|record| record.keys()) {
        if !columns.contains(&key.as_str()) {
            columns.push(key);
        }
    }

    let mut builder = Builder::default();

    builder.push_record(columns.iter().copied());

    for record in records {
        builder.push_record(
            columns
                .iter()
                .map(|column| record.get(*column).map(cell).unwrap_or_default()),
        );
    }

    finish(builder.build())
}

fn scope(scope: ReportScope) -> &'static str {
    match scope {
        ReportScope::Article => "article",
        ReportScope::Event => "event",
        ReportScope::Global => "global",
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn finish(mut table: Table) -> String {
    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.to_string()
}

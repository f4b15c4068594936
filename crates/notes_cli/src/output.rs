//! Text and JSON rendering for command results.
//!
//! Renderers return strings so commands stay free of formatting rules.

use notes_core::{ConfigValidation, ListResult, Note};
use serde::Serialize;
use serde_json::Value;

const NO_TITLE: &str = "(no title)";

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Header line plus one `  [ID] Title` line per note.
pub fn render_list(result: &ListResult, has_query: bool) -> String {
    let showing = result.results.len();
    let total = result.total_count;
    let header = match (has_query, showing < total) {
        (true, true) => format!("Showing {showing} of {total} matching notes:"),
        (true, false) => format!("Found {total} matching notes:"),
        (false, true) => format!("Showing {showing} of {total} notes:"),
        (false, false) => format!("Showing all {total} notes:"),
    };

    let mut lines = vec![header];
    lines.extend(
        result
            .results
            .iter()
            .map(|note| format!("  [{}] {}", note.id, title_or_placeholder(note))),
    );
    lines.join("\n")
}

pub fn render_note(note: &Note) -> String {
    let mut out = format!("[{}] {}", note.id, title_or_placeholder(note));
    if !note.labels.is_empty() {
        out.push_str(&format!("\nLabels: {}", note.labels));
    }
    if !note.content.is_empty() {
        out.push_str(&format!("\n\n{}", note.content));
    }
    out
}

pub fn render_created(note: &Note) -> String {
    format!("Created note [{}]: {}", note.id, title_or_placeholder(note))
}

pub fn render_updated(note: &Note) -> String {
    format!("Updated note [{}]: {}", note.id, title_or_placeholder(note))
}

/// Attachment rows are backend-shaped; only common columns are read.
pub fn render_attachments(rows: &[Value]) -> String {
    if rows.is_empty() {
        return "No attachments found.".to_string();
    }

    let mut lines = vec![format!("Found {} attachments:", rows.len())];
    for row in rows {
        let id = field(row, &["ID"]).unwrap_or_else(|| "?".to_string());
        let kind = field(row, &["Type", "Kind"]).unwrap_or_else(|| "?".to_string());
        let detail = match kind.as_str() {
            "Image" => field(row, &["Image", "List Image"]),
            "Link" => field(row, &["Link"]),
            _ => field(row, &["Target"]),
        };
        lines.push(match detail {
            Some(detail) => format!("  [{id}] {kind}: {detail}"),
            None => format!("  [{id}] {kind}"),
        });
    }
    lines.join("\n")
}

/// `Provider: x`, indented stats, then the outcome message.
pub fn render_validation(provider: &str, validation: &ConfigValidation) -> String {
    let mut lines = vec![format!("Provider: {provider}")];
    lines.extend(
        validation
            .stats
            .iter()
            .map(|(key, value)| format!("  {key}: {value}")),
    );
    lines.push(String::new());
    lines.push(format!("  {}", validation.message));
    lines.join("\n")
}

fn title_or_placeholder(note: &Note) -> &str {
    if note.title.is_empty() {
        NO_TITLE
    } else {
        &note.title
    }
}

fn field(row: &Value, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| match row.get(*name)? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Null | Value::String(_) => None,
        other => Some(other.to_string()),
    })
}

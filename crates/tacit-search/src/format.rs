//! Text rendering of normalized results for chat display.
//!
//! Rendering never fails. Blank fields are omitted, never replaced with
//! placeholder text, and counts are always printed even when zero.

use std::fmt::Write;

use serde_json::Value as JsonValue;

use tacit_core::defaults::CONTENT_PREVIEW_CHARS;
use tacit_core::models::non_blank;
use tacit_core::{Attachment, Candidate, CollectionAllowList, CollectionInfo, Hit, Timestamp};

use crate::normalize::{DocumentPage, Entity, EntityPage};

/// Truncate to `max_chars` characters, appending `...` when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

fn no_results(found: u64, page: u32) -> String {
    format!("No results found (found: {}, page: {}).", found, page)
}

fn header(found: u64, page: u32, per_page: u32, shown: usize, returned: usize) -> String {
    format!(
        "Found {} results (Page {})\nShowing {} of {} hits ({} per page)",
        found, page, shown, returned, per_page
    )
}

/// Push `"<label>: <value>"` when the value is not blank.
fn push_field(lines: &mut Vec<String>, label: &str, value: &Option<String>) {
    if let Some(v) = non_blank(value) {
        lines.push(format!("{}: {}", label, v));
    }
}

fn push_timestamps(
    lines: &mut Vec<String>,
    created: &Option<Timestamp>,
    updated: &Option<Timestamp>,
) {
    for (label, stamp) in [("Created", created), ("Updated", updated)] {
        if let Some(ts) = stamp.as_ref().map(|t| t.as_str().trim()).filter(|t| !t.is_empty()) {
            lines.push(format!("{}: {}", label, ts));
        }
    }
}

/// Number the first line and indent the rest under it.
fn write_entry(out: &mut String, index: usize, lines: &[String]) {
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            let _ = writeln!(out, "{}. {}", index, line);
        } else {
            let _ = writeln!(out, "   {}", line);
        }
    }
    out.push('\n');
}

fn candidate_lines(c: &Candidate) -> Vec<String> {
    let mut lines = Vec::new();

    // Identity
    if let Some(name) = c.full_name() {
        lines.push(format!("Name: {}", name));
    }
    push_field(&mut lines, "Pronouns", &c.pronouns);
    push_field(&mut lines, "ID", &c.id);

    // Contact
    push_field(&mut lines, "Email", &c.email);
    push_field(&mut lines, "Phone", &c.phone);
    push_field(&mut lines, "Location", &c.location);

    // Profile
    let skills: Vec<&str> = c
        .skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if !skills.is_empty() {
        lines.push(format!("Skills: {}", skills.join(", ")));
    }
    push_field(&mut lines, "Latest Experience", &c.latest_experience);
    push_field(&mut lines, "Highest Education", &c.highest_education);

    for (label, link) in c.social_links() {
        lines.push(format!("{}: {}", label, link));
    }

    push_field(&mut lines, "Description", &c.description);
    push_timestamps(&mut lines, &c.created_at, &c.updated_at);
    lines
}

fn attachment_lines(a: &Attachment) -> Vec<String> {
    let mut lines = Vec::new();

    push_field(&mut lines, "Attachment", &a.name);
    push_field(&mut lines, "ID", &a.id);
    push_field(&mut lines, "Record ID", &a.record_id);
    push_field(&mut lines, "Parent", &a.parent);
    push_field(&mut lines, "Model", &a.model_name);
    push_field(&mut lines, "Object Key", &a.object_key);
    if let Some(content) = non_blank(&a.content) {
        lines.push(format!(
            "Content Preview: {}",
            truncate_chars(content, CONTENT_PREVIEW_CHARS)
        ));
    }
    push_timestamps(&mut lines, &a.created_at, &a.updated_at);
    lines
}

/// Render a page of typed entities.
pub fn format_entities(page: &EntityPage) -> String {
    if page.entities.is_empty() {
        let mut out = no_results(page.found, page.page);
        if page.dropped() > 0 {
            let _ = write!(out, " {} hits could not be read.", page.dropped());
        }
        return out;
    }

    let mut out = header(
        page.found,
        page.page,
        page.per_page,
        page.entities.len(),
        page.returned,
    );
    if page.dropped() > 0 {
        let _ = write!(out, ", {} unreadable hits skipped", page.dropped());
    }
    out.push_str("\n\n");

    for (i, entity) in page.entities.iter().enumerate() {
        let lines = match entity {
            Entity::Candidate(c) => candidate_lines(c),
            Entity::Attachment(a) => attachment_lines(a),
        };
        write_entry(&mut out, i + 1, &lines);
    }

    out.trim_end().to_string()
}

fn render_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(items) if items.iter().all(|v| !v.is_object() && !v.is_array()) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

fn is_blank(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.trim().is_empty(),
        JsonValue::Array(items) => items.is_empty(),
        JsonValue::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn document_lines(hit: &Hit) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(id) = hit.document.get("id").filter(|v| !is_blank(v)) {
        lines.push(format!("id: {}", render_value(id)));
    }

    let mut keys: Vec<&String> = hit
        .document
        .iter()
        .filter(|(k, v)| k.as_str() != "id" && !is_blank(v))
        .map(|(k, _)| k)
        .collect();
    keys.sort();
    for key in keys {
        lines.push(format!("{}: {}", key, render_value(&hit.document[key.as_str()])));
    }

    if let Some(score) = hit.text_match {
        lines.push(format!("Text match: {}", score));
    }
    for highlight in &hit.highlights {
        let snippet = highlight
            .snippet
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| highlight.snippets.join(" ... "));
        if !snippet.trim().is_empty() {
            lines.push(format!("Highlight ({}): {}", highlight.field, snippet));
        }
    }
    lines
}

/// Render a page of generic documents with highlights and facets.
pub fn format_documents(page: &DocumentPage) -> String {
    if page.documents.is_empty() {
        return no_results(page.found, page.page);
    }

    let mut out = header(
        page.found,
        page.page,
        page.per_page,
        page.documents.len(),
        page.documents.len(),
    );
    out.push_str("\n\n");

    for (i, hit) in page.documents.iter().enumerate() {
        let mut lines = document_lines(hit);
        if lines.is_empty() {
            lines.push("(empty document)".to_string());
        }
        write_entry(&mut out, i + 1, &lines);
    }

    if !page.facets.is_empty() {
        out.push_str("Facets:\n");
        for facet in &page.facets {
            let counts: Vec<String> = facet
                .counts
                .iter()
                .map(|c| format!("{} ({})", c.value, c.count))
                .collect();
            let _ = writeln!(out, "  {}: {}", facet.field_name, counts.join(", "));
        }
    }

    out.trim_end().to_string()
}

/// Render the allow-listed collections with their document counts.
///
/// Allowed collections missing from the server are still listed.
pub fn format_collections(allow_list: &CollectionAllowList, available: &[CollectionInfo]) -> String {
    let names: Vec<&str> = allow_list.names().collect();
    let mut out = format!("Searchable collections ({}):\n", names.len());
    for name in names {
        match available.iter().find(|c| c.name == name) {
            Some(info) => {
                let _ = writeln!(out, "- {} ({} documents)", name, info.num_documents);
            }
            None => {
                let _ = writeln!(out, "- {} (not found on search server)", name);
            }
        }
    }
    out.trim_end().to_string()
}

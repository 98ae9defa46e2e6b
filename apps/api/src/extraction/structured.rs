//! Structured-data strategy: schema.org `JobPosting` nodes in JSON-LD blocks.

use serde_json::Value;
use tracing::debug;

use crate::extraction::dom;
use crate::extraction::normalize::normalize;
use crate::extraction::{ExtractionResult, ExtractionSource};

const JSON_LD_SELECTOR: &str = r#"script[type="application/ld+json"]"#;
const JOB_POSTING_TYPE: &str = "JobPosting";

/// Optional HTML fields appended after `title` and `description`, in this order.
const SECTION_FIELDS: &[&str] = &[
    "responsibilities",
    "qualifications",
    "skills",
    "experienceRequirements",
];

/// Returns the text of the first `JobPosting` node that yields non-empty text.
///
/// Blocks that fail to parse are skipped. A block may hold one node, an array
/// of nodes, or an object with an `@graph` list.
pub fn extract_structured(html: &str) -> Option<ExtractionResult> {
    let doc = dom::parse(html);

    for script in doc.select(JSON_LD_SELECTOR).iter() {
        let raw = script.text();
        let value: Value = match serde_json::from_str(raw.trim()) {
            Ok(value) => value,
            Err(e) => {
                debug!("Skipping unparseable JSON-LD block: {e}");
                continue;
            }
        };

        let found = candidate_nodes(&value)
            .into_iter()
            .filter(|node| is_job_posting(node))
            .find_map(posting_text);
        if found.is_some() {
            return found;
        }
    }

    None
}

/// Flattens a parsed JSON-LD value into the nodes worth inspecting.
fn candidate_nodes(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match map.get("@graph") {
            Some(Value::Array(graph)) => graph.iter().collect(),
            Some(graph @ Value::Object(_)) => vec![graph],
            _ => vec![value],
        },
        _ => Vec::new(),
    }
}

fn is_job_posting(node: &Value) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => t == JOB_POSTING_TYPE,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(JOB_POSTING_TYPE)),
        _ => false,
    }
}

fn posting_text(node: &Value) -> Option<ExtractionResult> {
    let mut parts = Vec::new();

    if let Some(title) = node.get("title").and_then(scalar_text) {
        parts.push(title);
    }
    if let Some(description) = node.get("description") {
        parts.push(html_field_text(description));
    }
    for field in SECTION_FIELDS {
        if let Some(value) = node.get(*field) {
            parts.push(html_field_text(value));
        }
    }

    parts.retain(|p| !p.trim().is_empty());
    ExtractionResult::from_raw(&parts.join("\n\n"), ExtractionSource::Structured)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Plain text of a field that may hold HTML, or a list of HTML strings.
fn html_field_text(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(html_field_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        other => scalar_text(other).map(|s| strip_html(&s)).unwrap_or_default(),
    }
}

fn strip_html(fragment: &str) -> String {
    let text = dom::fragment_text(fragment);
    // Some boards entity-encode the markup inside the JSON string.
    let text = if text.contains('<') && text.contains('>') {
        dom::fragment_text(&text)
    } else {
        text
    };
    normalize(&text)
}

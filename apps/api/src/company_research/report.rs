//! Splits a research completion into its markdown report and trailing JSON,
//! then validates the JSON against the report schema.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::company_research::types::CompanyResearchJson;

static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?[ \t]*\n?(\{.*?\})\s*```").expect("valid fence regex")
});

#[derive(Debug, Error, PartialEq)]
pub enum ReportError {
    #[error("no JSON object found in the model output")]
    MissingJson,

    #[error("report JSON does not match the schema: {0}")]
    Schema(String),

    #[error("report field {0} is empty")]
    EmptyField(&'static str),

    #[error("confidence.{0} must be between 0 and 1")]
    ConfidenceOutOfRange(&'static str),
}

/// Separates the report prose from its JSON object.
///
/// A fenced ```json block wins (the last one when there are several);
/// otherwise the longest JSON object running to the end of the text is used.
/// The markdown is everything else, trimmed.
pub fn extract_json_and_markdown(raw: &str) -> Result<(Value, String), ReportError> {
    if let Some(fence) = JSON_FENCE.captures_iter(raw).last() {
        let (Some(whole), Some(body)) = (fence.get(0), fence.get(1)) else {
            return Err(ReportError::MissingJson);
        };
        if let Ok(json @ Value::Object(_)) = serde_json::from_str::<Value>(body.as_str()) {
            let markdown = format!("{}{}", &raw[..whole.start()], &raw[whole.end()..]);
            return Ok((json, markdown.trim().to_string()));
        }
    }

    let tail = raw.trim_end();
    for (start, _) in tail.match_indices('{') {
        if let Ok(json @ Value::Object(_)) = serde_json::from_str::<Value>(&tail[start..]) {
            return Ok((json, tail[..start].trim().to_string()));
        }
    }

    Err(ReportError::MissingJson)
}

/// Deserializes `json` into the typed report and checks value constraints.
pub fn validate_research_json(json: Value) -> Result<CompanyResearchJson, ReportError> {
    let report: CompanyResearchJson =
        serde_json::from_value(json).map_err(|e| ReportError::Schema(e.to_string()))?;

    if report.company.trim().is_empty() {
        return Err(ReportError::EmptyField("company"));
    }
    if let Some(field) = report.confidence.out_of_range() {
        return Err(ReportError::ConfidenceOutOfRange(field));
    }
    Ok(report)
}

//! Ordered parse chain: direct, boundary extraction, repair.

use super::repair::{repair, RepairRule};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, trace};

/// Which attempt produced the parsed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStage {
    Direct,
    Extracted,
    Repaired,
    /// Nothing parsed; the record was synthesised.
    Fallback,
}

impl std::fmt::Display for ParseStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ParseStage::Direct => "direct",
            ParseStage::Extracted => "extracted",
            ParseStage::Repaired => "repaired",
            ParseStage::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    pub object: Map<String, Value>,
    pub stage: ParseStage,
    pub repairs: Vec<RepairRule>,
}

/// Runs the chain and returns the first JSON object any stage yields.
pub fn recover_object(raw: &str) -> Option<Recovered> {
    let trimmed = raw.trim();

    if let Some(object) = parse_object(trimmed) {
        return Some(Recovered {
            object,
            stage: ParseStage::Direct,
            repairs: Vec::new(),
        });
    }

    let span = widest_object_span(trimmed);
    if let Some(candidate) = span {
        trace!(len = candidate.len(), "Trying brace-delimited span");
        if let Some(object) = parse_object(candidate) {
            return Some(Recovered {
                object,
                stage: ParseStage::Extracted,
                repairs: Vec::new(),
            });
        }
    }

    let repaired = repair(span.unwrap_or(trimmed));
    if repaired.applied.is_empty() {
        debug!("No repair rule applied; giving up on parsing");
        return None;
    }
    parse_object(&repaired.text).map(|object| Recovered {
        object,
        stage: ParseStage::Repaired,
        repairs: repaired.applied,
    })
}

/// From the first `{` to the last `}` inclusive.
pub fn widest_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => Some(object),
        Ok(other) => {
            trace!(kind = json_kind(&other), "Parsed JSON is not an object");
            None
        }
        Err(e) => {
            trace!(error = %e, "JSON parse failed");
            None
        }
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

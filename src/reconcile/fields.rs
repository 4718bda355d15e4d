//! Field-by-field reconciliation of a parsed object against the record shape.

use super::extract::json_kind;
use super::schema::*;
use serde::Serialize;
use serde_json::{Map, Value};

/// Something the model got wrong that was fixed in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Defect {
    /// Field absent or `null`; default used.
    MissingField { field: &'static str },
    /// Field had an unusable shape; default used.
    ReplacedField {
        field: &'static str,
        found: &'static str,
    },
    /// Scalar or nested value converted to text.
    CoercedField {
        field: &'static str,
        found: &'static str,
    },
    /// Bare value where a list was expected; wrapped.
    WrappedScalar { field: &'static str },
    /// Step element was not an object.
    PlaceholderStep { position: u32, found: &'static str },
    /// Step number missing, non-numeric or not positive.
    RenumberedStep { position: u32 },
    /// Step object lacked one of its text fields.
    IncompleteStep {
        position: u32,
        field: &'static str,
    },
    /// No parse stage produced an object.
    Unparseable,
}

pub(crate) fn reconcile_fields(
    object: &Map<String, Value>,
    problem: &str,
) -> (ProblemBreakdown, Vec<Defect>) {
    let mut reader = FieldReader {
        object,
        defects: Vec::new(),
    };

    let breakdown = ProblemBreakdown {
        title: reader.text("title", DEFAULT_TITLE),
        problem: reader.text("problem", problem),
        given: reader.list("given", DEFAULT_GIVEN),
        find: reader.text("find", DEFAULT_FIND),
        principles: reader.list("principles", DEFAULT_PRINCIPLE),
        steps: reader.steps(),
        final_answer: reader.text("finalAnswer", DEFAULT_FINAL_ANSWER),
        concept: reader.text("concept", DEFAULT_CONCEPT),
    };

    (breakdown, reader.defects)
}

struct FieldReader<'a> {
    object: &'a Map<String, Value>,
    defects: Vec<Defect>,
}

impl<'a> FieldReader<'a> {
    fn get(&self, field: &str) -> Option<&'a Value> {
        let object = self.object;
        let value = object.get(field).or_else(|| {
            // Models occasionally fall back to snake_case keys.
            (field == "finalAnswer")
                .then(|| object.get("final_answer"))
                .flatten()
        });
        value.filter(|v| !v.is_null())
    }

    fn text(&mut self, field: &'static str, default: &str) -> String {
        match self.get(field) {
            None => {
                self.defects.push(Defect::MissingField { field });
                default.to_string()
            }
            Some(Value::String(s)) => s.clone(),
            Some(scalar @ (Value::Number(_) | Value::Bool(_))) => {
                self.defects.push(Defect::CoercedField {
                    field,
                    found: json_kind(scalar),
                });
                scalar.to_string()
            }
            Some(other) => {
                self.defects.push(Defect::ReplacedField {
                    field,
                    found: json_kind(other),
                });
                default.to_string()
            }
        }
    }

    fn list(&mut self, field: &'static str, default: &str) -> Vec<String> {
        match self.get(field) {
            None => {
                self.defects.push(Defect::MissingField { field });
                vec![default.to_string()]
            }
            Some(Value::String(s)) => {
                self.defects.push(Defect::WrappedScalar { field });
                vec![s.clone()]
            }
            Some(scalar @ (Value::Number(_) | Value::Bool(_))) => {
                self.defects.push(Defect::WrappedScalar { field });
                vec![scalar.to_string()]
            }
            Some(Value::Array(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(s) => out.push(s.clone()),
                        Value::Null => self.defects.push(Defect::CoercedField {
                            field,
                            found: "null",
                        }),
                        other => {
                            self.defects.push(Defect::CoercedField {
                                field,
                                found: json_kind(other),
                            });
                            out.push(other.to_string());
                        }
                    }
                }
                out
            }
            Some(other) => {
                self.defects.push(Defect::ReplacedField {
                    field,
                    found: json_kind(other),
                });
                vec![default.to_string()]
            }
        }
    }

    fn steps(&mut self) -> Vec<Step> {
        match self.get("steps") {
            None => {
                self.defects.push(Defect::MissingField { field: "steps" });
                Vec::new()
            }
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    let position = u32::try_from(index + 1).unwrap_or(u32::MAX);
                    self.step(position, item)
                })
                .collect(),
            Some(other) => {
                self.defects.push(Defect::ReplacedField {
                    field: "steps",
                    found: json_kind(other),
                });
                Vec::new()
            }
        }
    }

    fn step(&mut self, position: u32, item: &Value) -> Step {
        let fields = match item {
            Value::Object(fields) if has_any_step_field(fields) => fields,
            Value::String(text) => {
                self.defects.push(Defect::PlaceholderStep {
                    position,
                    found: "string",
                });
                return Step {
                    description: text.clone(),
                    ..Step::placeholder(position)
                };
            }
            other => {
                self.defects.push(Defect::PlaceholderStep {
                    position,
                    found: json_kind(other),
                });
                return Step::placeholder(position);
            }
        };

        let step = match fields.get("step").and_then(step_number) {
            Some(n) => n,
            None => {
                self.defects.push(Defect::RenumberedStep { position });
                position
            }
        };

        Step {
            step,
            description: self.step_text(
                fields,
                position,
                "description",
                PLACEHOLDER_STEP_DESCRIPTION,
            ),
            calculation: self.step_text(fields, position, "calculation", ""),
            result: self.step_text(fields, position, "result", ""),
        }
    }

    fn step_text(
        &mut self,
        fields: &Map<String, Value>,
        position: u32,
        field: &'static str,
        default: &str,
    ) -> String {
        match fields.get(field) {
            Some(Value::String(s)) => s.clone(),
            Some(scalar @ (Value::Number(_) | Value::Bool(_))) => scalar.to_string(),
            _ => {
                self.defects.push(Defect::IncompleteStep { position, field });
                default.to_string()
            }
        }
    }
}

fn has_any_step_field(fields: &Map<String, Value>) -> bool {
    ["step", "description", "calculation", "result"]
        .iter()
        .any(|key| fields.contains_key(*key))
}

/// Positive integers, whole floats and numeric strings are accepted.
fn step_number(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 1.0 && *f <= u32::MAX as f64)
                .map(|f| f as u64)
        })?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    u32::try_from(n).ok().filter(|n| *n > 0)
}

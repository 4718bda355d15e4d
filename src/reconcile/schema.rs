//! The record handed to renderers, and the defaults that fill its gaps.

use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "Problem Breakdown";
pub const DEFAULT_GIVEN: &str = "Information provided in the problem";
pub const DEFAULT_FIND: &str = "Solution to the problem";
pub const DEFAULT_PRINCIPLE: &str = "Relevant mathematical and physical principles";
pub const DEFAULT_FINAL_ANSWER: &str = "See step-by-step solution above";
pub const DEFAULT_CONCEPT: &str =
    "The solution involves applying relevant mathematical and physical principles";

pub const PLACEHOLDER_STEP_DESCRIPTION: &str = "Step details unavailable";
pub const FALLBACK_STEP_DESCRIPTION: &str = "Analysis of the problem";
pub const FALLBACK_STEP_RESULT: &str = "See calculation above";

/// A worked solution, shaped for display.
///
/// Every field is always populated; renderers never need to check for
/// absence.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProblemBreakdown {
    pub title: String,
    pub problem: String,
    pub given: Vec<String>,
    pub find: String,
    pub principles: Vec<String>,
    pub steps: Vec<Step>,
    pub final_answer: String,
    pub concept: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub step: u32,
    pub description: String,
    pub calculation: String,
    pub result: String,
}

impl Step {
    /// Stand-in for an element the model got wrong, keeping its position.
    pub fn placeholder(position: u32) -> Self {
        Self {
            step: position,
            description: PLACEHOLDER_STEP_DESCRIPTION.to_string(),
            calculation: String::new(),
            result: String::new(),
        }
    }
}

impl ProblemBreakdown {
    /// Record with every field at its documented default.
    pub fn with_defaults(problem: &str) -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            problem: problem.to_string(),
            given: vec![DEFAULT_GIVEN.to_string()],
            find: DEFAULT_FIND.to_string(),
            principles: vec![DEFAULT_PRINCIPLE.to_string()],
            steps: Vec::new(),
            final_answer: DEFAULT_FINAL_ANSWER.to_string(),
            concept: DEFAULT_CONCEPT.to_string(),
        }
    }

    /// Last-resort record: the raw model text is shown as the single step's
    /// calculation so the user still sees what came back.
    pub fn fallback(problem: &str, raw_text: &str, excerpt_limit: usize) -> Self {
        let mut breakdown = Self::with_defaults(problem);
        breakdown.steps = vec![Step {
            step: 1,
            description: FALLBACK_STEP_DESCRIPTION.to_string(),
            calculation: excerpt(raw_text, excerpt_limit),
            result: FALLBACK_STEP_RESULT.to_string(),
        }];
        breakdown
    }
}

/// First `limit` characters of `text`, with an ellipsis when cut.
pub fn excerpt(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

//! # Structured-response reconciliation
//!
//! Turns whatever text a generative model sent back into a fully populated
//! [`ProblemBreakdown`]. Parsing walks an ordered chain and stops at the first
//! stage that yields a JSON object:
//!
//! ```text
//! raw text → direct parse → first '{' .. last '}' → repair pass → field reconciliation
//!                                                        ↘ (nothing parsed) → fallback record
//! ```
//!
//! Malformed input never produces an error. [`ReconciliationError`] is
//! reserved for payloads that are not text at all, or a missing problem
//! statement.

pub mod extract;
pub mod fields;
pub mod repair;
pub mod schema;

pub use extract::{recover_object, ParseStage, Recovered};
pub use fields::Defect;
pub use repair::{RepairRule, Repaired};
pub use schema::{ProblemBreakdown, Step};

use crate::llm::config::ReconcilerConfig;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconciliationError {
    #[error("Model payload must be text, found {found}")]
    NotText { found: &'static str },

    #[error("The original problem statement is required")]
    MissingProblem,
}

/// Outcome of a reconciliation, tagged by whether anything had to be fixed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reconciled {
    /// The model's object was complete and well-shaped.
    Clean {
        breakdown: ProblemBreakdown,
        stage: ParseStage,
    },
    /// Some or all of the record is defaults.
    Degraded {
        breakdown: ProblemBreakdown,
        stage: ParseStage,
        defects: Vec<Defect>,
    },
}

impl Reconciled {
    pub fn breakdown(&self) -> &ProblemBreakdown {
        match self {
            Reconciled::Clean { breakdown, .. } | Reconciled::Degraded { breakdown, .. } => {
                breakdown
            }
        }
    }

    pub fn into_breakdown(self) -> ProblemBreakdown {
        match self {
            Reconciled::Clean { breakdown, .. } | Reconciled::Degraded { breakdown, .. } => {
                breakdown
            }
        }
    }

    pub fn stage(&self) -> ParseStage {
        match self {
            Reconciled::Clean { stage, .. } | Reconciled::Degraded { stage, .. } => *stage,
        }
    }

    pub fn defects(&self) -> &[Defect] {
        match self {
            Reconciled::Clean { .. } => &[],
            Reconciled::Degraded { defects, .. } => defects,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Reconciled::Degraded { .. })
    }

    /// One-line note for the user when the record is not entirely the model's.
    pub fn degraded_note(&self) -> Option<String> {
        match self {
            Reconciled::Clean { .. } => None,
            Reconciled::Degraded {
                stage: ParseStage::Fallback,
                ..
            } => Some(
                "The AI response could not be read automatically; showing the raw answer instead."
                    .to_string(),
            ),
            Reconciled::Degraded { defects, .. } => Some(format!(
                "Some parts of the AI response were incomplete ({} issue{} repaired).",
                defects.len(),
                if defects.len() == 1 { "" } else { "s" }
            )),
        }
    }
}

/// Reconciler with an explicit excerpt limit for the fallback record.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    config: ReconcilerConfig,
}

impl Reconciler {
    pub fn new(config: ReconcilerConfig) -> Self {
        Self { config }
    }

    #[instrument(skip_all, fields(raw_len = raw_text.len()))]
    pub fn reconcile(&self, raw_text: &str, original_problem: &str) -> Reconciled {
        let Some(recovered) = recover_object(raw_text) else {
            warn!(
                excerpt_limit = self.config.excerpt_limit,
                "All parsing attempts failed, creating fallback response"
            );
            return Reconciled::Degraded {
                breakdown: ProblemBreakdown::fallback(
                    original_problem,
                    raw_text,
                    self.config.excerpt_limit,
                ),
                stage: ParseStage::Fallback,
                defects: vec![Defect::Unparseable],
            };
        };

        let (breakdown, defects) = fields::reconcile_fields(&recovered.object, original_problem);

        if recovered.stage == ParseStage::Direct {
            debug!(stage = %recovered.stage, "Model response parsed");
        } else {
            info!(
                stage = %recovered.stage,
                repairs = ?recovered.repairs,
                "Model response needed recovery"
            );
        }

        if defects.is_empty() {
            Reconciled::Clean {
                breakdown,
                stage: recovered.stage,
            }
        } else {
            warn!(count = defects.len(), defects = ?defects, "Repaired incomplete fields");
            Reconciled::Degraded {
                breakdown,
                stage: recovered.stage,
                defects,
            }
        }
    }

    /// Entry point for callers holding an untyped payload.
    pub fn reconcile_payload(
        &self,
        payload: &Value,
        original_problem: Option<&str>,
    ) -> Result<Reconciled, ReconciliationError> {
        let raw_text = payload.as_str().ok_or(ReconciliationError::NotText {
            found: extract::json_kind(payload),
        })?;
        let problem = original_problem.ok_or(ReconciliationError::MissingProblem)?;
        Ok(self.reconcile(raw_text, problem))
    }
}

/// [`Reconciler::reconcile`] with the default configuration.
pub fn reconcile(raw_text: &str, original_problem: &str) -> Reconciled {
    Reconciler::default().reconcile(raw_text, original_problem)
}

/// [`Reconciler::reconcile_payload`] with the default configuration.
pub fn reconcile_payload(
    payload: &Value,
    original_problem: Option<&str>,
) -> Result<Reconciled, ReconciliationError> {
    Reconciler::default().reconcile_payload(payload, original_problem)
}

#[cfg(test)]
mod tests;

//! Study tools built on a [`TextGenerator`]: tips, quotes, problem
//! breakdowns and revision timetables.

use super::client::{GenerationConfig, LLMError, TextGenerator};
use super::prompts;
use crate::reconcile::{Reconciled, Reconciler};
use crate::timetable::{parse_timetable, RevisionRequest, Timetable, TimetableError};
use lru::LruCache;
use std::num::NonZeroUsize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Please enter a problem to break down.")]
    EmptyInput,
    #[error(transparent)]
    Upstream(#[from] LLMError),
    #[error(transparent)]
    Timetable(#[from] TimetableError),
}

/// Message shown in place of AI output when no generator is configured.
pub fn unavailable_message() -> &'static str {
    "AI service is currently unavailable. Please ensure the API key is configured."
}

pub struct StudyTools<G: TextGenerator> {
    generator: G,
    reconciler: Reconciler,
    breakdowns: Option<Mutex<LruCache<String, Reconciled>>>,
}

impl<G: TextGenerator> StudyTools<G> {
    /// `cache_size` of zero disables breakdown caching.
    pub fn new(generator: G, reconciler: Reconciler, cache_size: usize) -> Self {
        let breakdowns = NonZeroUsize::new(cache_size).map(|size| Mutex::new(LruCache::new(size)));
        Self {
            generator,
            reconciler,
            breakdowns,
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Never fails; problems are reported in the returned text.
    #[instrument(skip(self))]
    pub async fn study_tip(&self, topic: &str) -> String {
        if topic.trim().is_empty() {
            return "Please provide a topic for the study tip.".to_string();
        }
        match self
            .generator
            .generate(&prompts::study_tip(topic), &GenerationConfig::quick())
            .await
        {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "Study tip generation failed");
                user_message("generate study tip", &e)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn motivational_quote(&self) -> String {
        match self
            .generator
            .generate(&prompts::motivational_quote(), &GenerationConfig::quick())
            .await
        {
            Ok(text) => text.trim().trim_matches('"').trim().to_string(),
            Err(e) => {
                warn!(error = %e, "Quote generation failed");
                user_message("generate quote", &e)
            }
        }
    }

    /// Asks the model for a step-by-step breakdown and reconciles whatever
    /// comes back. Results are cached per trimmed problem text.
    #[instrument(skip(self, problem), fields(problem_len = problem.len()))]
    pub async fn breakdown_problem(&self, problem: &str) -> Result<Reconciled, ToolError> {
        let problem = problem.trim();
        if problem.is_empty() {
            return Err(ToolError::EmptyInput);
        }

        let key = problem.to_string();
        if let Some(cache) = &self.breakdowns {
            if let Some(hit) = cache.lock().await.get(&key) {
                debug!("Breakdown cache hit");
                return Ok(hit.clone());
            }
        }

        let raw = self
            .generator
            .generate(
                &prompts::problem_breakdown(problem),
                &GenerationConfig::structured(),
            )
            .await?;
        let reconciled = self.reconciler.reconcile(&raw, problem);
        info!(
            model = self.generator.model_name(),
            stage = %reconciled.stage(),
            degraded = reconciled.is_degraded(),
            steps = reconciled.breakdown().steps.len(),
            "Problem breakdown ready"
        );

        // Fallback records are not cached so a retry can reach the model.
        if let (Some(cache), false) = (&self.breakdowns, reconciled.is_degraded()) {
            cache.lock().await.put(key, reconciled.clone());
        }
        Ok(reconciled)
    }

    #[instrument(skip(self, request), fields(exams = request.exams.len()))]
    pub async fn revision_timetable(&self, request: &RevisionRequest) -> Result<Timetable, ToolError> {
        let last_exam = request.validate()?;
        let prompt = prompts::revision_timetable(request, &last_exam.format("%Y-%m-%d").to_string());

        let raw = self
            .generator
            .generate(&prompt, &GenerationConfig::structured())
            .await?;
        let (timetable, stage) = parse_timetable(&raw)?;
        info!(
            model = self.generator.model_name(),
            %stage,
            weeks = timetable.weekly_schedule.len(),
            sessions = timetable.total_sessions(),
            "Revision timetable ready"
        );
        Ok(timetable)
    }
}

fn user_message(action: &str, error: &LLMError) -> String {
    match error {
        LLMError::NotConfigured => unavailable_message().to_string(),
        LLMError::InvalidApiKey => format!("Failed to {}: {}", action, error),
        other => format!("Failed to {}: {}. Please try again later.", action, other),
    }
}

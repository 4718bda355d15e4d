//! # AI study tools
//!
//! Talks to a hosted text-generation service and turns its answers into
//! tutoring features.
//!
//! - `config`: layered configuration (defaults, TOML file, `.env`, environment)
//! - `client`: the [`TextGenerator`] seam and the Gemini HTTP client behind it
//! - `prompts`: prompt text for each tool
//! - `tools`: tips, quotes, problem breakdowns and revision timetables
//!
//! ## Flow
//!
//! ```text
//! request → prompts → TextGenerator::generate → reconcile / parse_timetable → typed result
//! ```
//!
//! Tips and quotes never fail: errors come back as a readable message.
//! Breakdowns and timetables return [`ToolError`].

pub mod client;
pub mod config;
pub mod prompts;
pub mod tools;

pub use client::{GeminiClient, GenerationConfig, LLMError, TextGenerator};
pub use config::{validate_environment, Config, ConfigError};
pub use tools::{unavailable_message, StudyTools, ToolError};

use crate::reconcile::Reconciler;

/// Builds the study tools from configuration.
///
/// # Errors
/// [`LLMError::NotConfigured`] when no API key is available.
///
/// # Example
/// ```no_run
/// use tutordesk::llm::{self, Config};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::load(None)?;
/// let tools = llm::study_tools(&config)?;
/// println!("{}", tools.motivational_quote().await);
/// # Ok(())
/// # }
/// ```
pub fn study_tools(config: &Config) -> Result<StudyTools<GeminiClient>, LLMError> {
    let client = GeminiClient::new(&config.api)?;
    Ok(StudyTools::new(
        client,
        Reconciler::new(config.reconciler.clone()),
        config.api.cache_size,
    ))
}

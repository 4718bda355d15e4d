pub mod cart;
pub mod commands;
pub mod contact;
pub mod llm;
pub mod reconcile;
pub mod timetable;

#[cfg(test)]
mod test_support;

pub use reconcile::{reconcile, reconcile_payload, ProblemBreakdown, Reconciled, Reconciler};

use tracing_subscriber::EnvFilter;

/// Installs the stderr log subscriber. `RUST_LOG` overrides `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

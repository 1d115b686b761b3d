//! Metric names and descriptions.
//!
//! The runtime only records through the `metrics` facade; whichever recorder
//! the host process installs (if any) receives the values.

use metrics::describe_counter;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge, histogram};

/// Metric names used by the runtime
pub mod names {
    /// Gateway requests made while initializing a payment
    pub const INIT_ATTEMPTS: &str = "payments_init_attempts_total";
    /// Attempts beyond the first
    pub const INIT_RETRIES: &str = "payments_init_retries_total";
    /// Final result of an initialization (`result` label)
    pub const INIT_OUTCOME: &str = "payments_init_outcome_total";
    /// Effects executed by stores (`type` label)
    pub const EFFECTS_EXECUTED: &str = "store_effects_executed_total";
    /// Actions processed by stores
    pub const ACTIONS_PROCESSED: &str = "store_actions_processed_total";
}

/// Register all metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(
        names::INIT_ATTEMPTS,
        "Total number of payment-intent requests sent to the gateway"
    );
    describe_counter!(
        names::INIT_RETRIES,
        "Total number of payment-intent requests retried after a not-ready answer"
    );
    describe_counter!(
        names::INIT_OUTCOME,
        "Payment initializations by final result"
    );
    describe_counter!(
        names::EFFECTS_EXECUTED,
        "Total number of effects executed by stores"
    );
    describe_counter!(
        names::ACTIONS_PROCESSED,
        "Total number of actions processed by store reducers"
    );
}

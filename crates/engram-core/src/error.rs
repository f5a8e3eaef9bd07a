//! Engine error taxonomy
//!
//! Four caller-visible failure classes:
//! - `Validation`: bad input on commit (rejected, never corrected)
//! - `NotFound`: operations on unknown memory ids
//! - `PolicyViolation`: attempts to bypass the policy engine
//! - `Dependency`: an external collaborator is unavailable
//!
//! Background jobs never surface `Dependency` errors to the host
//! process; they log, skip the affected unit, and report failure counts.

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Engine error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid input on commit (importance range, empty tenant/user, etc.)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Memory id does not exist
    #[error("Memory not found: {0}")]
    NotFound(String),

    /// Attempt to mutate policy-owned state outside the policy engine
    #[error("Policy violation: {0}")]
    PolicyViolation(String),

    /// An external collaborator (vector index, store, summarizer) is down
    #[error("Dependency unavailable: {component}: {message}")]
    Dependency {
        /// Which collaborator failed
        component: &'static str,
        /// Backend-provided detail
        message: String,
    },

    /// Storage backend error that is not a simple unavailability
    #[error("Store error: {0}")]
    Store(String),
}

impl EngineError {
    /// Build a dependency-unavailable error for a named collaborator
    pub fn dependency(component: &'static str, message: impl Into<String>) -> Self {
        EngineError::Dependency {
            component,
            message: message.into(),
        }
    }

    /// Whether this error means an external collaborator is down
    pub fn is_dependency(&self) -> bool {
        matches!(self, EngineError::Dependency { .. })
    }
}

/// Engine result type
pub type Result<T> = std::result::Result<T, EngineError>;

// ============================================================================
// TESTS
// ============================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {0}")]
    NotFound(String),
    #[error("Entity already exists: {0}")]
    AlreadyExists(String),
    #[error("Concurrent modification: {0}")]
    Concurrency(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Rule violation: {0}")]
    RuleViolation(String),
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DomainError {
    /// Rule violations recur under at-least-once delivery; callers in this
    /// core treat them as benign no-ops rather than failures.
    pub fn is_rule_violation(&self) -> bool {
        matches!(self, DomainError::RuleViolation(_))
    }
}

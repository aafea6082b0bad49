use thiserror::Error;

/// Record invariants checked whenever a session or task is built or loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
    #[error("session {id} must start before it ends ({start} >= {end})")]
    SessionTimes {
        id: String,
        start: String,
        end: String,
    },
    #[error("unknown priority '{0}', expected high|medium|low")]
    Priority(String),
    #[error("unknown notification kind '{0}'")]
    NotificationKind(String),
    #[error("unknown study time '{0}', expected morning|afternoon|evening|night|any")]
    StudyTime(String),
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },
    #[error("{field} cannot contain control characters")]
    ControlCharacter { field: &'static str },
    #[error("duplicate record id {id}")]
    DuplicateId { id: String },
}

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("task not found: {0}")]
    TaskNotFound(String),
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("notification not found: {0}")]
    NotificationNotFound(String),
}

impl PlannerError {
    /// Not-found results leave the planner untouched; callers may keep going.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TaskNotFound(_) | Self::SessionNotFound(_) | Self::NotificationNotFound(_)
        )
    }
}

use std::fmt;

/// Result of one crawl task, returned through the worker pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The page was processed (persisted or already present)
    Ok,

    /// The job's stop signal was observed; nothing was persisted
    Stopped,

    /// Another task already claimed this URL
    Duplicate,

    /// The task failed in a way that aborts the site job
    Error(String),
}

impl TaskOutcome {
    /// Returns true if this outcome must fail the whole site job
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Stopped => write!(f, "stopped"),
            Self::Duplicate => write!(f, "duplicate"),
            Self::Error(message) => write!(f, "error: {}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(TaskOutcome::Error("boom".to_string()).is_error());
        assert!(!TaskOutcome::Ok.is_error());
        assert!(TaskOutcome::Stopped.is_stopped());
        assert!(!TaskOutcome::Duplicate.is_stopped());
    }

    #[test]
    fn test_display() {
        assert_eq!(TaskOutcome::Duplicate.to_string(), "duplicate");
        assert_eq!(
            TaskOutcome::Error("root page unreachable".to_string()).to_string(),
            "error: root page unreachable"
        );
    }
}

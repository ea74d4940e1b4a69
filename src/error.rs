use thiserror::Error;

use crate::tasks::TaskStatus;

/// Status of a dependency blocking a claim, as seen at claim time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyState {
    /// The dependency exists but is not completed.
    Unfinished(TaskStatus),
    /// The dependency id does not resolve to any task. Treated as
    /// permanently unmet.
    Missing,
}

impl std::fmt::Display for DependencyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unfinished(status) => write!(f, "{}", status),
            Self::Missing => write!(f, "missing"),
        }
    }
}

#[derive(Error, Debug)]
pub enum KernelError {
    #[error("Task not found: {team_name}/{task_id}")]
    TaskNotFound { team_name: String, task_id: u64 },

    #[error("Task list not initialized for team: {0}")]
    TaskListNotFound(String),

    #[error("Team not found: {0}")]
    TeamNotFound(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Team template not found: {0}")]
    TemplateNotFound(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("Invalid transition for task {task_id}: status is {actual}, expected {expected}")]
    InvalidTransition {
        task_id: u64,
        actual: String,
        expected: String,
    },

    #[error("Task {task_id} has unmet dependencies: {}", format_unmet(.unmet))]
    UnmetDependency {
        task_id: u64,
        unmet: Vec<(u64, DependencyState)>,
    },

    #[error("Invalid project status transition: {from} -> {to}")]
    InvalidProjectStatus { from: String, to: String },

    #[error("Configuration integrity error: {0}")]
    ConfigIntegrity(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_unmet(unmet: &[(u64, DependencyState)]) -> String {
    unmet
        .iter()
        .map(|(id, state)| format!("{} ({})", id, state))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, KernelError>;

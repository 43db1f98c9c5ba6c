use std::fmt;

use serde::{Deserialize, Serialize};

use crate::action::Action;

/// Lifecycle of the most recent remote operation. Process-wide, last write
/// wins; it is not tracked per request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RequestStatus::Idle => "idle",
            RequestStatus::Loading => "loading",
            RequestStatus::Succeeded => "succeeded",
            RequestStatus::Failed => "failed",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppState {
    pub status: RequestStatus,
    /// Cleared only by an explicit `SetError { error: None }`.
    pub error: Option<String>,
}

pub fn reduce(state: AppState, action: &Action) -> AppState {
    match action {
        Action::SetStatus { status } => AppState {
            status: *status,
            ..state
        },
        Action::SetError { error } => AppState {
            error: error.clone(),
            ..state
        },
        Action::SetLists { .. }
        | Action::AddList { .. }
        | Action::RemoveList { .. }
        | Action::SetListFilter { .. }
        | Action::RenameList { .. }
        | Action::SetTasks { .. }
        | Action::AddTask { .. }
        | Action::RemoveTask { .. }
        | Action::UpdateTask { .. } => state,
    }
}

use serde::{Deserialize, Serialize};
use todolists_shared::{Filter, TaskDto, TaskPatch, TodoList};

use crate::status::RequestStatus;

/// Every state transition the stores know about. Each reducer matches all
/// variants explicitly, so a new variant does not compile until every
/// reducer has decided how to treat it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING-KEBAB-CASE")]
pub enum Action {
    SetLists {
        lists: Vec<TodoList>,
    },
    AddList {
        list: TodoList,
    },
    RemoveList {
        id: String,
    },
    SetListFilter {
        id: String,
        filter: Filter,
    },
    RenameList {
        id: String,
        title: String,
    },
    #[serde(rename_all = "camelCase")]
    SetTasks {
        todolist_id: String,
        tasks: Vec<TaskDto>,
    },
    AddTask {
        task: TaskDto,
    },
    #[serde(rename_all = "camelCase")]
    RemoveTask {
        todolist_id: String,
        task_id: String,
    },
    #[serde(rename_all = "camelCase")]
    UpdateTask {
        todolist_id: String,
        task_id: String,
        model: TaskPatch,
    },
    SetStatus {
        status: RequestStatus,
    },
    SetError {
        error: Option<String>,
    },
}

impl Action {
    /// The `type` tag as it appears in the serialized action log.
    pub fn tag(&self) -> &'static str {
        match self {
            Action::SetLists { .. } => "SET-LISTS",
            Action::AddList { .. } => "ADD-LIST",
            Action::RemoveList { .. } => "REMOVE-LIST",
            Action::SetListFilter { .. } => "SET-LIST-FILTER",
            Action::RenameList { .. } => "RENAME-LIST",
            Action::SetTasks { .. } => "SET-TASKS",
            Action::AddTask { .. } => "ADD-TASK",
            Action::RemoveTask { .. } => "REMOVE-TASK",
            Action::UpdateTask { .. } => "UPDATE-TASK",
            Action::SetStatus { .. } => "SET-STATUS",
            Action::SetError { .. } => "SET-ERROR",
        }
    }

    /// True for actions that create or destroy lists, i.e. the ones both the
    /// list and the task reducer react to.
    pub fn is_list_lifecycle(&self) -> bool {
        matches!(
            self,
            Action::SetLists { .. } | Action::AddList { .. } | Action::RemoveList { .. }
        )
    }
}

use std::collections::BTreeMap;

use todolists_shared::{Filter, TaskDto};

use crate::action::Action;

/// List id -> bucket. Newest task first.
pub type TasksState = BTreeMap<String, Vec<TaskDto>>;

/// Task reducer. It also follows the list lifecycle so that there is exactly
/// one bucket per known list. Mutations aimed at a missing bucket or task are
/// absorbed as no-ops.
pub fn reduce(state: TasksState, action: &Action) -> TasksState {
    match action {
        Action::SetTasks { todolist_id, tasks } => {
            let mut next = state;
            if let Some(bucket) = next.get_mut(todolist_id) {
                *bucket = tasks.clone();
            }
            next
        }
        Action::AddTask { task } => {
            let mut next = state;
            if let Some(bucket) = next.get_mut(&task.todo_list_id) {
                bucket.insert(0, task.clone());
            }
            next
        }
        Action::RemoveTask {
            todolist_id,
            task_id,
        } => {
            let mut next = state;
            if let Some(bucket) = next.get_mut(todolist_id) {
                bucket.retain(|t| &t.id != task_id);
            }
            next
        }
        Action::UpdateTask {
            todolist_id,
            task_id,
            model,
        } => {
            let mut next = state;
            if let Some(task) = next
                .get_mut(todolist_id)
                .and_then(|bucket| bucket.iter_mut().find(|t| &t.id == task_id))
            {
                task.apply_patch(model);
            }
            next
        }
        Action::SetLists { lists } => lists
            .iter()
            .map(|list| (list.id.clone(), Vec::new()))
            .collect(),
        Action::AddList { list } => {
            let mut next = state;
            next.insert(list.id.clone(), Vec::new());
            next
        }
        Action::RemoveList { id } => {
            let mut next = state;
            next.remove(id);
            next
        }
        Action::SetListFilter { .. }
        | Action::RenameList { .. }
        | Action::SetStatus { .. }
        | Action::SetError { .. } => state,
    }
}

pub fn find<'a>(state: &'a TasksState, list_id: &str, task_id: &str) -> Option<&'a TaskDto> {
    state.get(list_id)?.iter().find(|t| t.id == task_id)
}

/// The projection of a bucket a list's filter selects.
pub fn visible_tasks(tasks: &[TaskDto], filter: Filter) -> Vec<&TaskDto> {
    tasks
        .iter()
        .filter(|t| match filter {
            Filter::All => true,
            Filter::Active => !t.is_done(),
            Filter::Completed => t.is_done(),
        })
        .collect()
}

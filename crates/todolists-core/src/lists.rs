use todolists_shared::TodoList;

use crate::action::Action;

pub type ListsState = Vec<TodoList>;

/// List reducer. Unknown ids are no-ops, never errors.
pub fn reduce(state: ListsState, action: &Action) -> ListsState {
    match action {
        Action::SetLists { lists } => lists.clone(),
        Action::AddList { list } => {
            let mut next = state;
            next.push(list.clone());
            next
        }
        Action::RemoveList { id } => state.into_iter().filter(|l| &l.id != id).collect(),
        Action::SetListFilter { id, filter } => state
            .into_iter()
            .map(|l| {
                if &l.id == id {
                    TodoList {
                        filter: *filter,
                        ..l
                    }
                } else {
                    l
                }
            })
            .collect(),
        Action::RenameList { id, title } => state
            .into_iter()
            .map(|l| {
                if &l.id == id {
                    TodoList {
                        title: title.clone(),
                        ..l
                    }
                } else {
                    l
                }
            })
            .collect(),
        Action::SetTasks { .. }
        | Action::AddTask { .. }
        | Action::RemoveTask { .. }
        | Action::UpdateTask { .. }
        | Action::SetStatus { .. }
        | Action::SetError { .. } => state,
    }
}

pub fn find<'a>(state: &'a [TodoList], id: &str) -> Option<&'a TodoList> {
    state.iter().find(|l| l.id == id)
}

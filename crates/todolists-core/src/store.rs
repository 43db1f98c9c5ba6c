use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::action::Action;
use crate::lists::{self, ListsState};
use crate::status::{self, AppState};
use crate::tasks::{self, TasksState};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootState {
    pub app: AppState,
    pub lists: ListsState,
    pub tasks: TasksState,
}

impl RootState {
    /// Every list has exactly one bucket and every bucket belongs to a list.
    pub fn is_consistent(&self) -> bool {
        let list_ids: BTreeSet<&str> = self.lists.iter().map(|l| l.id.as_str()).collect();
        let bucket_ids: BTreeSet<&str> = self.tasks.keys().map(String::as_str).collect();
        list_ids == bucket_ids && list_ids.len() == self.lists.len()
    }
}

/// Applies one action to every slice. This is the only place the slices are
/// combined, so list lifecycle actions always reach both the list and the
/// task reducer in the same step.
pub fn reduce(state: RootState, action: &Action) -> RootState {
    RootState {
        app: status::reduce(state.app, action),
        lists: lists::reduce(state.lists, action),
        tasks: tasks::reduce(state.tasks, action),
    }
}

/// Shared handle to the application state. Clones point at the same state;
/// each `dispatch` is one indivisible commit.
#[derive(Debug, Clone, Default)]
pub struct Store {
    state: Arc<Mutex<RootState>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial(state: RootState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn replay<I>(actions: I) -> Self
    where
        I: IntoIterator<Item = Action>,
    {
        let store = Self::new();
        for action in actions {
            store.dispatch(action);
        }
        store
    }

    pub fn dispatch(&self, action: Action) {
        debug!(action = action.tag(), "dispatch");
        trace!(?action, "dispatch payload");
        let mut guard = self.state.lock();
        let current = std::mem::take(&mut *guard);
        *guard = reduce(current, &action);
        if action.is_list_lifecycle() && !guard.is_consistent() {
            warn!(action = action.tag(), "list ids are not unique; buckets are shared");
        }
    }

    pub fn snapshot(&self) -> RootState {
        self.state.lock().clone()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&RootState) -> R) -> R {
        let guard = self.state.lock();
        f(&guard)
    }
}

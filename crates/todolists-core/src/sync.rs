use anyhow::Context;
use todolists_shared::{Filter, GENERIC_ERROR_MESSAGE, TaskPatch, TodoList};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::action::Action;
use crate::api::TodolistApi;
use crate::status::RequestStatus;
use crate::store::Store;
use crate::tasks;

/// Runs user intents against the remote service and commits the outcome to
/// the store. Business failures end as `failed` plus an error message;
/// transport failures propagate as `Err` and leave the status as written.
pub struct Synchronizer<A> {
    api: A,
    store: Store,
}

impl<A> Synchronizer<A>
where
    A: TodolistApi,
{
    pub fn new(api: A, store: Store) -> Self {
        Self { api, store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn set_status(&self, status: RequestStatus) {
        self.store.dispatch(Action::SetStatus { status });
    }

    fn reject(&self, message: String) {
        warn!(%message, "remote service rejected request");
        self.store.dispatch(Action::SetError {
            error: Some(message),
        });
        self.set_status(RequestStatus::Failed);
    }

    pub fn clear_error(&self) {
        self.store.dispatch(Action::SetError { error: None });
    }

    #[instrument(skip(self), fields(request_id = %Uuid::new_v4()))]
    pub async fn fetch_lists(&self) -> anyhow::Result<()> {
        self.set_status(RequestStatus::Loading);
        let dtos = self
            .api
            .get_lists()
            .await
            .context("failed to fetch lists")?;
        info!(count = dtos.len(), "fetched lists");
        let lists = dtos.into_iter().map(TodoList::from).collect();
        self.store.dispatch(Action::SetLists { lists });
        self.set_status(RequestStatus::Succeeded);
        Ok(())
    }

    #[instrument(skip(self), fields(request_id = %Uuid::new_v4()))]
    pub async fn add_list(&self, title: &str) -> anyhow::Result<()> {
        self.set_status(RequestStatus::Loading);
        let envelope = self
            .api
            .create_list(title)
            .await
            .context("failed to create list")?;

        if let Some(message) = envelope.failure_message() {
            self.reject(message);
            return Ok(());
        }
        let Some(dto) = envelope.data else {
            self.reject(GENERIC_ERROR_MESSAGE.to_string());
            return Ok(());
        };

        info!(list_id = %dto.id, "list created");
        self.store.dispatch(Action::AddList {
            list: TodoList::from(dto),
        });
        self.set_status(RequestStatus::Succeeded);
        Ok(())
    }

    #[instrument(skip(self), fields(request_id = %Uuid::new_v4()))]
    pub async fn remove_list(&self, list_id: &str) -> anyhow::Result<()> {
        self.set_status(RequestStatus::Loading);
        let envelope = self
            .api
            .delete_list(list_id)
            .await
            .with_context(|| format!("failed to delete list {list_id}"))?;

        if let Some(message) = envelope.failure_message() {
            self.reject(message);
            return Ok(());
        }

        self.store.dispatch(Action::RemoveList {
            id: list_id.to_string(),
        });
        self.set_status(RequestStatus::Succeeded);
        Ok(())
    }

    #[instrument(skip(self), fields(request_id = %Uuid::new_v4()))]
    pub async fn rename_list(&self, list_id: &str, title: &str) -> anyhow::Result<()> {
        self.set_status(RequestStatus::Loading);
        let envelope = self
            .api
            .update_list_title(list_id, title)
            .await
            .with_context(|| format!("failed to rename list {list_id}"))?;

        if let Some(message) = envelope.failure_message() {
            self.reject(message);
            return Ok(());
        }

        self.store.dispatch(Action::RenameList {
            id: list_id.to_string(),
            title: title.to_string(),
        });
        self.set_status(RequestStatus::Succeeded);
        Ok(())
    }

    /// Filters live only on the client; nothing goes over the wire.
    pub fn change_list_filter(&self, list_id: &str, filter: Filter) {
        self.store.dispatch(Action::SetListFilter {
            id: list_id.to_string(),
            filter,
        });
    }

    #[instrument(skip(self), fields(request_id = %Uuid::new_v4()))]
    pub async fn fetch_tasks(&self, list_id: &str) -> anyhow::Result<()> {
        self.set_status(RequestStatus::Loading);
        let page = self
            .api
            .get_tasks(list_id)
            .await
            .with_context(|| format!("failed to fetch tasks of list {list_id}"))?;
        debug!(count = page.items.len(), "fetched tasks");
        self.store.dispatch(Action::SetTasks {
            todolist_id: list_id.to_string(),
            tasks: page.items,
        });
        self.set_status(RequestStatus::Succeeded);
        Ok(())
    }

    #[instrument(skip(self), fields(request_id = %Uuid::new_v4()))]
    pub async fn add_task(&self, list_id: &str, title: &str) -> anyhow::Result<()> {
        self.set_status(RequestStatus::Loading);
        let envelope = self
            .api
            .create_task(list_id, title)
            .await
            .with_context(|| format!("failed to create task in list {list_id}"))?;

        if let Some(message) = envelope.failure_message() {
            self.reject(message);
            return Ok(());
        }
        let Some(created) = envelope.data else {
            self.reject(GENERIC_ERROR_MESSAGE.to_string());
            return Ok(());
        };

        info!(task_id = %created.item.id, "task created");
        self.store.dispatch(Action::AddTask { task: created.item });
        self.set_status(RequestStatus::Succeeded);
        Ok(())
    }

    #[instrument(skip(self), fields(request_id = %Uuid::new_v4()))]
    pub async fn remove_task(&self, list_id: &str, task_id: &str) -> anyhow::Result<()> {
        self.set_status(RequestStatus::Loading);
        let envelope = self
            .api
            .delete_task(list_id, task_id)
            .await
            .with_context(|| format!("failed to delete task {task_id}"))?;

        if let Some(message) = envelope.failure_message() {
            self.reject(message);
            return Ok(());
        }

        self.store.dispatch(Action::RemoveTask {
            todolist_id: list_id.to_string(),
            task_id: task_id.to_string(),
        });
        self.set_status(RequestStatus::Succeeded);
        Ok(())
    }

    /// Skipped entirely, without a remote call, when the task is not in the
    /// store. The remote gets the full merged record; the store gets only
    /// the patch, after confirmation.
    #[instrument(skip(self, patch), fields(request_id = %Uuid::new_v4()))]
    pub async fn update_task(
        &self,
        list_id: &str,
        task_id: &str,
        patch: TaskPatch,
    ) -> anyhow::Result<()> {
        let Some(model) = self.store.with_state(|state| {
            tasks::find(&state.tasks, list_id, task_id).map(|task| task.update_model(&patch))
        }) else {
            debug!("task not in store, skipping update");
            return Ok(());
        };

        self.set_status(RequestStatus::Loading);
        let envelope = self
            .api
            .update_task(list_id, task_id, &model)
            .await
            .with_context(|| format!("failed to update task {task_id}"))?;

        if let Some(message) = envelope.failure_message() {
            self.reject(message);
            return Ok(());
        }

        self.store.dispatch(Action::UpdateTask {
            todolist_id: list_id.to_string(),
            task_id: task_id.to_string(),
            model: patch,
        });
        self.set_status(RequestStatus::Succeeded);
        Ok(())
    }
}

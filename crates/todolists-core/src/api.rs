use async_trait::async_trait;
use todolists_shared::{
    Empty, Envelope, Item, TaskDto, TasksPage, TodolistDto, UpdateTaskModel,
};

/// The remote list/task service. An `Err` is a transport or decode failure;
/// business failures arrive as an `Ok` envelope with a non-zero result code.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodolistApi: Send + Sync {
    async fn get_lists(&self) -> anyhow::Result<Vec<TodolistDto>>;

    async fn create_list(&self, title: &str) -> anyhow::Result<Envelope<TodolistDto>>;

    async fn delete_list(&self, list_id: &str) -> anyhow::Result<Envelope<Empty>>;

    async fn update_list_title(
        &self,
        list_id: &str,
        title: &str,
    ) -> anyhow::Result<Envelope<Empty>>;

    async fn get_tasks(&self, list_id: &str) -> anyhow::Result<TasksPage>;

    async fn create_task(
        &self,
        list_id: &str,
        title: &str,
    ) -> anyhow::Result<Envelope<Item<TaskDto>>>;

    async fn delete_task(&self, list_id: &str, task_id: &str)
    -> anyhow::Result<Envelope<Empty>>;

    /// Takes the full record; the endpoint does not accept patches.
    async fn update_task(
        &self,
        list_id: &str,
        task_id: &str,
        model: &UpdateTaskModel,
    ) -> anyhow::Result<Envelope<Empty>>;
}

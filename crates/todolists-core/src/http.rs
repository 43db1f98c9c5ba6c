use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use todolists_shared::{
    CreateTitleArgs, Empty, Envelope, Item, TaskDto, TasksPage, TodolistDto, UpdateTaskModel,
};
use tracing::{debug, instrument};

use crate::api::TodolistApi;
use crate::config::Config;

pub const DEFAULT_API_URL: &str = "https://social-network.samuraijs.com/api/1.1";
const API_KEY_HEADER: &str = "api-key";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct HttpTodolistApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTodolistApi {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(key).context("api.key is not a valid header value")?;
            headers.insert(API_KEY_HEADER, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let base_url = cfg
            .get("api.url")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let timeout = match cfg.get("api.timeout") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| anyhow!("invalid api.timeout {raw:?}: {e}"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let api_key = cfg.get("api.key");

        Self::new(base_url, api_key.as_deref(), Duration::from_secs(timeout))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    async fn send<R>(&self, builder: RequestBuilder, what: &str) -> anyhow::Result<R>
    where
        R: DeserializeOwned + Send,
    {
        let response = builder
            .send()
            .await
            .with_context(|| format!("{what}: request failed"))?;

        let status = response.status();
        debug!(%status, what, "received response");
        if !status.is_success() {
            return Err(anyhow!("{what}: server returned HTTP {status}"));
        }

        response
            .json::<R>()
            .await
            .with_context(|| format!("{what}: failed to decode response"))
    }

    async fn send_json<B, R>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        what: &str,
    ) -> anyhow::Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned + Send,
    {
        self.send(self.request(method, path).json(body), what).await
    }
}

#[async_trait]
impl TodolistApi for HttpTodolistApi {
    #[instrument(skip(self))]
    async fn get_lists(&self) -> anyhow::Result<Vec<TodolistDto>> {
        self.send(self.request(Method::GET, "todo-lists"), "get lists")
            .await
    }

    #[instrument(skip(self), fields(title_len = title.len()))]
    async fn create_list(&self, title: &str) -> anyhow::Result<Envelope<TodolistDto>> {
        let args = CreateTitleArgs {
            title: title.to_string(),
        };
        let envelope: Envelope<Item<TodolistDto>> = self
            .send_json(Method::POST, "todo-lists", &args, "create list")
            .await?;
        Ok(envelope.map(|wrapped| wrapped.item))
    }

    #[instrument(skip(self))]
    async fn delete_list(&self, list_id: &str) -> anyhow::Result<Envelope<Empty>> {
        self.send(
            self.request(Method::DELETE, &format!("todo-lists/{list_id}")),
            "delete list",
        )
        .await
    }

    #[instrument(skip(self), fields(title_len = title.len()))]
    async fn update_list_title(
        &self,
        list_id: &str,
        title: &str,
    ) -> anyhow::Result<Envelope<Empty>> {
        let args = CreateTitleArgs {
            title: title.to_string(),
        };
        self.send_json(
            Method::PUT,
            &format!("todo-lists/{list_id}"),
            &args,
            "rename list",
        )
        .await
    }

    #[instrument(skip(self))]
    async fn get_tasks(&self, list_id: &str) -> anyhow::Result<TasksPage> {
        self.send(
            self.request(Method::GET, &format!("todo-lists/{list_id}/tasks")),
            "get tasks",
        )
        .await
    }

    #[instrument(skip(self), fields(title_len = title.len()))]
    async fn create_task(
        &self,
        list_id: &str,
        title: &str,
    ) -> anyhow::Result<Envelope<Item<TaskDto>>> {
        let args = CreateTitleArgs {
            title: title.to_string(),
        };
        self.send_json(
            Method::POST,
            &format!("todo-lists/{list_id}/tasks"),
            &args,
            "create task",
        )
        .await
    }

    #[instrument(skip(self))]
    async fn delete_task(&self, list_id: &str, task_id: &str) -> anyhow::Result<Envelope<Empty>> {
        self.send(
            self.request(
                Method::DELETE,
                &format!("todo-lists/{list_id}/tasks/{task_id}"),
            ),
            "delete task",
        )
        .await
    }

    #[instrument(skip(self, model), fields(status = ?model.status))]
    async fn update_task(
        &self,
        list_id: &str,
        task_id: &str,
        model: &UpdateTaskModel,
    ) -> anyhow::Result<Envelope<Empty>> {
        self.send_json(
            Method::PUT,
            &format!("todo-lists/{list_id}/tasks/{task_id}"),
            model,
            "update task",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let api = HttpTodolistApi::new("http://localhost:8080/api/", None, Duration::from_secs(1))
            .unwrap();
        assert_eq!(api.url("todo-lists"), "http://localhost:8080/api/todo-lists");
    }

    #[test]
    fn rejects_unprintable_api_key() {
        let err = HttpTodolistApi::new("http://x", Some("bad\nkey"), Duration::from_secs(1))
            .unwrap_err();
        assert!(err.to_string().contains("api.key"));
    }
}

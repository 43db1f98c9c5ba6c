use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::tempdir;
use todolists_core::prefs::FilterPrefs;
use todolists_core::tasks::visible_tasks;
use todolists_core::{Action, RequestStatus, Store, Synchronizer, TodolistApi};
use todolists_shared::{
    Empty, Envelope, Filter, Item, TaskDto, TaskPatch, TaskStatus, TasksPage, TodoList,
    TodolistDto, UpdateTaskModel,
};

/// In-memory stand-in for the remote service.
#[derive(Default)]
struct FakeApi {
    lists: Mutex<Vec<TodolistDto>>,
    tasks: Mutex<BTreeMap<String, Vec<TaskDto>>>,
    next_id: Mutex<u32>,
}

impl FakeApi {
    fn fresh_id(&self, prefix: &str) -> String {
        let mut next = self.next_id.lock();
        *next += 1;
        format!("{prefix}{next}")
    }
}

#[async_trait]
impl TodolistApi for FakeApi {
    async fn get_lists(&self) -> anyhow::Result<Vec<TodolistDto>> {
        Ok(self.lists.lock().clone())
    }

    async fn create_list(&self, title: &str) -> anyhow::Result<Envelope<TodolistDto>> {
        if title.trim().is_empty() {
            return Ok(Envelope::rejected(1, vec!["Title required".to_string()]));
        }
        let dto = TodolistDto {
            id: self.fresh_id("L"),
            title: title.to_string(),
            added_date: None,
            order: None,
        };
        self.lists.lock().push(dto.clone());
        self.tasks.lock().insert(dto.id.clone(), vec![]);
        Ok(Envelope::ok(dto))
    }

    async fn delete_list(&self, list_id: &str) -> anyhow::Result<Envelope<Empty>> {
        self.lists.lock().retain(|l| l.id != list_id);
        self.tasks.lock().remove(list_id);
        Ok(Envelope::ok(Empty {}))
    }

    async fn update_list_title(
        &self,
        list_id: &str,
        title: &str,
    ) -> anyhow::Result<Envelope<Empty>> {
        for list in self.lists.lock().iter_mut().filter(|l| l.id == list_id) {
            list.title = title.to_string();
        }
        Ok(Envelope::ok(Empty {}))
    }

    async fn get_tasks(&self, list_id: &str) -> anyhow::Result<TasksPage> {
        Ok(TasksPage {
            items: self.tasks.lock().get(list_id).cloned().unwrap_or_default(),
            ..TasksPage::default()
        })
    }

    async fn create_task(
        &self,
        list_id: &str,
        title: &str,
    ) -> anyhow::Result<Envelope<Item<TaskDto>>> {
        let task = TaskDto::new(self.fresh_id("T"), list_id, title);
        let mut tasks = self.tasks.lock();
        let Some(bucket) = tasks.get_mut(list_id) else {
            return Ok(Envelope::rejected(1, vec![]));
        };
        bucket.insert(0, task.clone());
        Ok(Envelope::ok(Item { item: task }))
    }

    async fn delete_task(&self, list_id: &str, task_id: &str) -> anyhow::Result<Envelope<Empty>> {
        if let Some(bucket) = self.tasks.lock().get_mut(list_id) {
            bucket.retain(|t| t.id != task_id);
        }
        Ok(Envelope::ok(Empty {}))
    }

    async fn update_task(
        &self,
        list_id: &str,
        task_id: &str,
        model: &UpdateTaskModel,
    ) -> anyhow::Result<Envelope<Empty>> {
        if let Some(task) = self
            .tasks
            .lock()
            .get_mut(list_id)
            .and_then(|bucket| bucket.iter_mut().find(|t| t.id == task_id))
        {
            task.title = model.title.clone();
            task.status = model.status;
            task.priority = model.priority;
        }
        Ok(Envelope::ok(Empty {}))
    }
}

#[test]
fn action_log_replay_keeps_buckets_in_step_with_lists() {
    let store = Store::replay([
        Action::AddList {
            list: TodoList::new("L1", "Groceries"),
        },
        Action::AddTask {
            task: TaskDto::new("T1", "L1", "Milk"),
        },
    ]);

    let state = store.snapshot();
    assert_eq!(state.lists, vec![TodoList::new("L1", "Groceries")]);
    assert_eq!(state.tasks["L1"].len(), 1);
    assert!(state.is_consistent());

    let before_noop = store.snapshot();
    store.dispatch(Action::RemoveList {
        id: "missing".to_string(),
    });
    assert_eq!(store.snapshot(), before_noop);

    store.dispatch(Action::RemoveList {
        id: "L1".to_string(),
    });
    let state = store.snapshot();
    assert!(state.lists.is_empty());
    assert!(state.tasks.is_empty());
}

#[test]
fn action_log_decodes_from_tagged_json() {
    let raw = r#"[
        {"type": "ADD-LIST", "list": {"id": "L1", "title": "Groceries", "filter": "all"}},
        {"type": "ADD-TASK", "task": {
            "id": "T1", "todoListId": "L1", "title": "Milk", "status": 0, "priority": 1
        }},
        {"type": "SET-LIST-FILTER", "id": "L1", "filter": "active"}
    ]"#;
    let actions: Vec<Action> = serde_json::from_str(raw).expect("decode action log");
    let state = Store::replay(actions).snapshot();

    assert_eq!(state.lists[0].filter, Filter::Active);
    assert_eq!(state.tasks["L1"][0].title, "Milk");
}

#[tokio::test(flavor = "current_thread")]
async fn synchronizer_round_trip_against_fake_service() {
    let sync = Synchronizer::new(FakeApi::default(), Store::new());

    sync.add_list("Groceries").await.expect("add list");
    let list_id = sync.store().with_state(|s| s.lists[0].id.clone());
    sync.add_task(&list_id, "Milk").await.expect("add milk");
    sync.add_task(&list_id, "Bread").await.expect("add bread");

    let titles: Vec<String> = sync
        .store()
        .with_state(|s| s.tasks[&list_id].iter().map(|t| t.title.clone()).collect());
    assert_eq!(titles, vec!["Bread", "Milk"]);

    let milk_id = sync
        .store()
        .with_state(|s| s.tasks[&list_id][1].id.clone());
    sync.update_task(&list_id, &milk_id, TaskPatch::status(TaskStatus::Completed))
        .await
        .expect("complete milk");
    sync.update_task(&list_id, &milk_id, TaskPatch::title("Oat milk"))
        .await
        .expect("rename milk");

    sync.change_list_filter(&list_id, Filter::Completed);
    let state = sync.store().snapshot();
    let visible = visible_tasks(&state.tasks[&list_id], state.lists[0].filter);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].title, "Oat milk");
    assert_eq!(state.app.status, RequestStatus::Succeeded);

    // A fresh fetch sees the same server-side state.
    sync.fetch_lists().await.expect("fetch lists");
    sync.fetch_tasks(&list_id).await.expect("fetch tasks");
    let state = sync.store().snapshot();
    assert_eq!(state.tasks[&list_id][1].status, TaskStatus::Completed);
    assert_eq!(state.tasks[&list_id][1].title, "Oat milk");
    assert!(state.is_consistent());

    sync.add_list("  ").await.expect("rejected add list");
    let state = sync.store().snapshot();
    assert_eq!(state.app.status, RequestStatus::Failed);
    assert_eq!(state.app.error.as_deref(), Some("Title required"));
    assert_eq!(state.lists.len(), 1);

    sync.remove_list(&list_id).await.expect("remove list");
    let state = sync.store().snapshot();
    assert!(state.lists.is_empty());
    assert!(state.tasks.is_empty());
}

#[test]
fn saved_filters_are_restored_after_a_refetch() {
    let temp = tempdir().expect("tempdir");
    let mut prefs = FilterPrefs::open(temp.path()).expect("open prefs");
    prefs.set("L1", Filter::Completed);
    prefs.save().expect("save prefs");

    let reopened = FilterPrefs::open(temp.path()).expect("reopen prefs");
    let lists = vec![TodoList::new("L1", "Groceries"), TodoList::new("L2", "Books")];
    let mut log = vec![Action::SetLists {
        lists: lists.clone(),
    }];
    log.extend(reopened.restore_actions(&lists));

    let state = Store::replay(log).snapshot();
    assert_eq!(state.lists[0].filter, Filter::Completed);
    assert_eq!(state.lists[1].filter, Filter::All);
    assert!(state.is_consistent());
}

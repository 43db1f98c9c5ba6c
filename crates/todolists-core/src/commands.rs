use anyhow::{Context, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use todolists_shared::{
  Filter,
  GENERIC_ERROR_MESSAGE,
  TaskDto,
  TaskPatch,
  TaskPriority,
  TaskStatus,
  TodoList
};
use tracing::{
  debug,
  info,
  instrument,
  warn
};

use crate::api::TodolistApi;
use crate::cli::Invocation;
use crate::prefs::FilterPrefs;
use crate::render::Renderer;
use crate::status::RequestStatus;
use crate::sync::Synchronizer;
use crate::tasks::visible_tasks;

const API_DATE_FORMAT: &str =
  "%Y-%m-%dT%H:%M:%S";

pub fn known_command_names()
-> Vec<&'static str> {
  vec![
    "lists",
    "add-list",
    "remove-list",
    "rename-list",
    "filter",
    "tasks",
    "add",
    "remove",
    "done",
    "undone",
    "modify",
    "info",
    "help",
    "version",
  ]
}

pub fn expand_command_abbrev<'a>(
  token: &'a str,
  known: &[&'a str]
) -> Option<&'a str> {
  if known.contains(&token) {
    return Some(token);
  }

  let mut matches = known
    .iter()
    .copied()
    .filter(|name| {
      name.starts_with(token)
    });
  let first = matches.next()?;
  if matches.next().is_some() {
    None
  } else {
    Some(first)
  }
}

#[instrument(skip(
  sync, prefs, renderer, inv
))]
pub async fn dispatch<A>(
  sync: &Synchronizer<A>,
  prefs: &mut FilterPrefs,
  renderer: &mut Renderer,
  inv: Invocation
) -> anyhow::Result<()>
where
  A: TodolistApi
{
  let command = inv.command.as_str();
  let args = inv.command_args.as_slice();
  debug!(
    command,
    args = ?args,
    "dispatching command"
  );

  match command {
    | "lists" => {
      cmd_lists(sync, prefs, renderer)
        .await
    }
    | "add-list" => {
      cmd_add_list(sync, args).await
    }
    | "remove-list" => {
      cmd_remove_list(sync, prefs, args)
        .await
    }
    | "rename-list" => {
      cmd_rename_list(sync, prefs, args)
        .await
    }
    | "filter" => {
      cmd_filter(sync, prefs, args).await
    }
    | "tasks" => {
      cmd_tasks(
        sync, prefs, renderer, args
      )
      .await
    }
    | "add" => {
      cmd_add(sync, prefs, args).await
    }
    | "remove" => {
      cmd_remove(sync, prefs, args).await
    }
    | "done" => {
      cmd_set_status(
        sync,
        prefs,
        args,
        TaskStatus::Completed
      )
      .await
    }
    | "undone" => {
      cmd_set_status(
        sync,
        prefs,
        args,
        TaskStatus::New
      )
      .await
    }
    | "modify" => {
      cmd_modify(sync, prefs, args).await
    }
    | "info" => {
      cmd_info(
        sync, prefs, renderer, args
      )
      .await
    }
    | "help" => cmd_help(),
    | "version" => {
      println!(
        "{}",
        env!("CARGO_PKG_VERSION")
      );
      Ok(())
    }
    | other => {
      Err(anyhow!(
        "unknown command: {other}"
      ))
    }
  }
}

/// Turns a terminal `failed` status
/// into an error carrying the surfaced
/// message.
fn ensure_succeeded<A>(
  sync: &Synchronizer<A>
) -> anyhow::Result<()>
where
  A: TodolistApi
{
  sync.store().with_state(|state| {
    if state.app.status
      == RequestStatus::Failed
    {
      let message = state
        .app
        .error
        .clone()
        .unwrap_or_else(|| {
          GENERIC_ERROR_MESSAGE
            .to_string()
        });
      Err(anyhow!(message))
    } else {
      Ok(())
    }
  })
}

async fn load_lists<A>(
  sync: &Synchronizer<A>,
  prefs: &FilterPrefs
) -> anyhow::Result<Vec<TodoList>>
where
  A: TodolistApi
{
  sync.fetch_lists().await?;
  let lists = sync
    .store()
    .with_state(|s| s.lists.clone());
  for action in
    prefs.restore_actions(&lists)
  {
    sync.store().dispatch(action);
  }
  Ok(
    sync
      .store()
      .with_state(|s| s.lists.clone())
  )
}

/// Accepts an id, a unique id prefix
/// or an exact (case-insensitive)
/// title.
pub fn resolve_list<'a>(
  lists: &'a [TodoList],
  token: &str
) -> anyhow::Result<&'a TodoList> {
  if let Some(list) =
    crate::lists::find(lists, token)
  {
    return Ok(list);
  }

  let by_prefix: Vec<_> = lists
    .iter()
    .filter(|l| l.id.starts_with(token))
    .collect();
  if by_prefix.len() == 1 {
    return Ok(by_prefix[0]);
  }

  let by_title: Vec<_> = lists
    .iter()
    .filter(|l| {
      l.title.eq_ignore_ascii_case(token)
    })
    .collect();
  match by_title.as_slice() {
    | [only] => Ok(*only),
    | [] if by_prefix.is_empty() => {
      Err(anyhow!(
        "no list matches {token:?}"
      ))
    }
    | _ => {
      Err(anyhow!(
        "{token:?} matches more than \
         one list"
      ))
    }
  }
}

pub fn resolve_task<'a>(
  tasks: &'a [TaskDto],
  token: &str
) -> anyhow::Result<&'a TaskDto> {
  if let Some(task) =
    tasks.iter().find(|t| t.id == token)
  {
    return Ok(task);
  }

  let by_prefix: Vec<_> = tasks
    .iter()
    .filter(|t| t.id.starts_with(token))
    .collect();
  if by_prefix.len() == 1 {
    return Ok(by_prefix[0]);
  }

  let by_title: Vec<_> = tasks
    .iter()
    .filter(|t| t.title == token)
    .collect();
  match by_title.as_slice() {
    | [only] => Ok(*only),
    | [] if by_prefix.is_empty() => {
      Err(anyhow!(
        "no task matches {token:?}"
      ))
    }
    | _ => {
      Err(anyhow!(
        "{token:?} matches more than \
         one task"
      ))
    }
  }
}

fn require_args<'a>(
  args: &'a [String],
  count: usize,
  usage: &str
) -> anyhow::Result<&'a [String]> {
  if args.len() < count {
    return Err(anyhow!(
      "usage: todo {usage}"
    ));
  }
  Ok(args)
}

fn join_title(
  words: &[String],
  usage: &str
) -> anyhow::Result<String> {
  let title = words.join(" ");
  if title.trim().is_empty() {
    return Err(anyhow!(
      "usage: todo {usage}"
    ));
  }
  Ok(title)
}

/// Fetches lists and the target list's
/// tasks, returning the list id and
/// its bucket.
async fn load_bucket<A>(
  sync: &Synchronizer<A>,
  prefs: &FilterPrefs,
  list_token: &str
) -> anyhow::Result<(TodoList, Vec<TaskDto>)>
where
  A: TodolistApi
{
  let lists =
    load_lists(sync, prefs).await?;
  let list =
    resolve_list(&lists, list_token)?
      .clone();
  sync.fetch_tasks(&list.id).await?;
  let bucket = sync.store().with_state(
    |s| {
      s.tasks
        .get(&list.id)
        .cloned()
        .unwrap_or_default()
    }
  );
  Ok((list, bucket))
}

#[instrument(skip(
  sync, prefs, renderer
))]
async fn cmd_lists<A>(
  sync: &Synchronizer<A>,
  prefs: &mut FilterPrefs,
  renderer: &mut Renderer
) -> anyhow::Result<()>
where
  A: TodolistApi
{
  info!("command lists");
  let lists =
    load_lists(sync, prefs).await?;
  for list in &lists {
    sync.fetch_tasks(&list.id).await?;
  }

  prefs.retain_lists(&lists);
  prefs.save()?;

  let state = sync.store().snapshot();
  renderer
    .print_lists(&state.lists, &state.tasks)
}

#[instrument(skip(sync, args))]
async fn cmd_add_list<A>(
  sync: &Synchronizer<A>,
  args: &[String]
) -> anyhow::Result<()>
where
  A: TodolistApi
{
  info!("command add-list");
  let title =
    join_title(args, "add-list <title>")?;
  sync.add_list(&title).await?;
  ensure_succeeded(sync)?;

  if let Some(list) = sync
    .store()
    .with_state(|s| s.lists.last().cloned())
  {
    println!(
      "Created list {} ({}).",
      list.id, list.title
    );
  }
  Ok(())
}

#[instrument(skip(sync, prefs, args))]
async fn cmd_remove_list<A>(
  sync: &Synchronizer<A>,
  prefs: &mut FilterPrefs,
  args: &[String]
) -> anyhow::Result<()>
where
  A: TodolistApi
{
  info!("command remove-list");
  let args = require_args(
    args,
    1,
    "remove-list <list>"
  )?;
  let lists =
    load_lists(sync, prefs).await?;
  let list =
    resolve_list(&lists, &args[0])?
      .clone();

  sync.remove_list(&list.id).await?;
  ensure_succeeded(sync)?;

  let remaining = sync
    .store()
    .with_state(|s| s.lists.clone());
  prefs.retain_lists(&remaining);
  prefs.save()?;
  println!(
    "Removed list {} ({}).",
    list.id, list.title
  );
  Ok(())
}

#[instrument(skip(sync, prefs, args))]
async fn cmd_rename_list<A>(
  sync: &Synchronizer<A>,
  prefs: &FilterPrefs,
  args: &[String]
) -> anyhow::Result<()>
where
  A: TodolistApi
{
  info!("command rename-list");
  let usage = "rename-list <list> <title>";
  let args = require_args(args, 2, usage)?;
  let lists =
    load_lists(sync, prefs).await?;
  let list =
    resolve_list(&lists, &args[0])?
      .clone();
  let title =
    join_title(&args[1..], usage)?;

  sync
    .rename_list(&list.id, &title)
    .await?;
  ensure_succeeded(sync)?;
  println!(
    "Renamed list {} to {title}.",
    list.id
  );
  Ok(())
}

#[instrument(skip(sync, prefs, args))]
async fn cmd_filter<A>(
  sync: &Synchronizer<A>,
  prefs: &mut FilterPrefs,
  args: &[String]
) -> anyhow::Result<()>
where
  A: TodolistApi
{
  info!("command filter");
  let args = require_args(
    args,
    2,
    "filter <list> <all|active|completed>"
  )?;
  let filter: Filter = args[1]
    .parse()
    .map_err(|e: String| anyhow!(e))?;
  let lists =
    load_lists(sync, prefs).await?;
  let list =
    resolve_list(&lists, &args[0])?
      .clone();

  sync.change_list_filter(&list.id, filter);
  prefs.set(&list.id, filter);
  prefs.save()?;
  println!(
    "List {} now shows {filter} tasks.",
    list.title
  );
  Ok(())
}

#[instrument(skip(
  sync, prefs, renderer, args
))]
async fn cmd_tasks<A>(
  sync: &Synchronizer<A>,
  prefs: &FilterPrefs,
  renderer: &mut Renderer,
  args: &[String]
) -> anyhow::Result<()>
where
  A: TodolistApi
{
  info!("command tasks");
  let args =
    require_args(args, 1, "tasks <list>")?;
  let (list, bucket) =
    load_bucket(sync, prefs, &args[0])
      .await?;

  let visible =
    visible_tasks(&bucket, list.filter);
  renderer.print_tasks(&list, &visible)
}

#[instrument(skip(sync, prefs, args))]
async fn cmd_add<A>(
  sync: &Synchronizer<A>,
  prefs: &FilterPrefs,
  args: &[String]
) -> anyhow::Result<()>
where
  A: TodolistApi
{
  info!("command add");
  let usage = "add <list> <title>";
  let args = require_args(args, 2, usage)?;
  let (list, _) =
    load_bucket(sync, prefs, &args[0])
      .await?;
  let title =
    join_title(&args[1..], usage)?;

  sync.add_task(&list.id, &title).await?;
  ensure_succeeded(sync)?;

  if let Some(task) =
    sync.store().with_state(|s| {
      s.tasks
        .get(&list.id)
        .and_then(|bucket| {
          bucket.first().cloned()
        })
    })
  {
    println!(
      "Created task {} in {}.",
      task.id, list.title
    );
  }
  Ok(())
}

#[instrument(skip(sync, prefs, args))]
async fn cmd_remove<A>(
  sync: &Synchronizer<A>,
  prefs: &FilterPrefs,
  args: &[String]
) -> anyhow::Result<()>
where
  A: TodolistApi
{
  info!("command remove");
  let args = require_args(
    args,
    2,
    "remove <list> <task>"
  )?;
  let (list, bucket) =
    load_bucket(sync, prefs, &args[0])
      .await?;
  let task =
    resolve_task(&bucket, &args[1])?;

  sync
    .remove_task(&list.id, &task.id)
    .await?;
  ensure_succeeded(sync)?;
  println!(
    "Removed task {} ({}).",
    task.id, task.title
  );
  Ok(())
}

#[instrument(skip(sync, prefs, args))]
async fn cmd_set_status<A>(
  sync: &Synchronizer<A>,
  prefs: &FilterPrefs,
  args: &[String],
  status: TaskStatus
) -> anyhow::Result<()>
where
  A: TodolistApi
{
  info!(status = status.as_str(), "command done/undone");
  let args = require_args(
    args,
    2,
    "done|undone <list> <task>"
  )?;
  let (list, bucket) =
    load_bucket(sync, prefs, &args[0])
      .await?;
  let task =
    resolve_task(&bucket, &args[1])?;

  sync
    .update_task(
      &list.id,
      &task.id,
      TaskPatch::status(status)
    )
    .await?;
  ensure_succeeded(sync)?;
  println!(
    "Task {} is {}.",
    task.id,
    status.as_str()
  );
  Ok(())
}

#[instrument(skip(sync, prefs, args))]
async fn cmd_modify<A>(
  sync: &Synchronizer<A>,
  prefs: &FilterPrefs,
  args: &[String]
) -> anyhow::Result<()>
where
  A: TodolistApi
{
  info!("command modify");
  let args = require_args(
    args,
    3,
    "modify <list> <task> key:value..."
  )?;
  let patch = parse_patch(&args[2..])?;
  if patch.is_empty() {
    return Err(anyhow!(
      "modify: nothing to change"
    ));
  }

  let (list, bucket) =
    load_bucket(sync, prefs, &args[0])
      .await?;
  let task =
    resolve_task(&bucket, &args[1])?;

  sync
    .update_task(&list.id, &task.id, patch)
    .await?;
  ensure_succeeded(sync)?;
  println!("Modified task {}.", task.id);
  Ok(())
}

#[instrument(skip(
  sync, prefs, renderer, args
))]
async fn cmd_info<A>(
  sync: &Synchronizer<A>,
  prefs: &FilterPrefs,
  renderer: &mut Renderer,
  args: &[String]
) -> anyhow::Result<()>
where
  A: TodolistApi
{
  info!("command info");
  let args = require_args(
    args,
    2,
    "info <list> <task>"
  )?;
  let (_, bucket) =
    load_bucket(sync, prefs, &args[0])
      .await?;
  let task =
    resolve_task(&bucket, &args[1])?;
  renderer.print_task_info(task)
}

fn cmd_help() -> anyhow::Result<()> {
  println!(
    "usage: todo [options] <command> \
     [args]\n\n\
     commands:\n  \
     lists                          \
     show all lists\n  \
     add-list <title>               \
     create a list\n  \
     remove-list <list>             \
     delete a list and its tasks\n  \
     rename-list <list> <title>     \
     rename a list\n  \
     filter <list> <filter>         \
     all | active | completed\n  \
     tasks <list>                   \
     show the list's tasks\n  \
     add <list> <title>             \
     create a task\n  \
     remove <list> <task>           \
     delete a task\n  \
     done|undone <list> <task>      \
     toggle completion\n  \
     modify <list> <task> k:v...    \
     title, desc, status, priority, \
     start, deadline\n  \
     info <list> <task>             \
     show one task"
  );
  Ok(())
}

/// Parses `key:value` (or `key=value`)
/// tokens into a patch. An empty value
/// clears a nullable field.
pub fn parse_patch(
  args: &[String]
) -> anyhow::Result<TaskPatch> {
  let mut patch = TaskPatch::default();

  for tok in args {
    let Some((key, value)) = tok
      .find([':', '='])
      .map(|at| {
        (&tok[..at], &tok[at + 1..])
      })
    else {
      warn!(arg = %tok, "unrecognized modifier token ignored");
      continue;
    };

    let value = value.trim();
    match key
      .to_ascii_lowercase()
      .as_str()
    {
      | "title" => {
        if value.is_empty() {
          return Err(anyhow!(
            "title cannot be empty"
          ));
        }
        patch.title =
          Some(value.to_string());
      }
      | "description" | "desc" => {
        patch.description =
          Some(non_empty(value));
      }
      | "status" => {
        patch.status = Some(
          value
            .parse::<TaskStatus>()
            .map_err(|e| anyhow!(e))?
        );
      }
      | "priority" | "pri" => {
        patch.priority = Some(
          value
            .parse::<TaskPriority>()
            .map_err(|e| anyhow!(e))?
        );
      }
      | "start" => {
        patch.start_date =
          Some(parse_api_date(value)?);
      }
      | "deadline" | "due" => {
        patch.deadline =
          Some(parse_api_date(value)?);
      }
      | _ => {
        warn!(arg = %tok, "unrecognized modifier key ignored");
      }
    }
  }

  Ok(patch)
}

fn non_empty(
  value: &str
) -> Option<String> {
  if value.is_empty() {
    None
  } else {
    Some(value.to_string())
  }
}

/// `YYYY-MM-DD` or
/// `YYYY-MM-DDTHH:MM:SS`, normalized to
/// the service's timestamp format.
fn parse_api_date(
  value: &str
) -> anyhow::Result<Option<String>> {
  if value.is_empty() {
    return Ok(None);
  }

  let parsed = NaiveDateTime::parse_from_str(
    value,
    API_DATE_FORMAT
  )
  .or_else(|_| {
    NaiveDate::parse_from_str(
      value, "%Y-%m-%d"
    )
    .map(|date| {
      date.and_time(
        chrono::NaiveTime::MIN
      )
    })
  })
  .with_context(|| {
    format!(
      "invalid date {value:?}; \
       expected YYYY-MM-DD"
    )
  })?;

  Ok(Some(
    parsed
      .format(API_DATE_FORMAT)
      .to_string()
  ))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn args(
    items: &[&str]
  ) -> Vec<String> {
    items
      .iter()
      .map(|s| s.to_string())
      .collect()
  }

  #[test]
  fn patch_parses_known_keys() {
    let patch = parse_patch(&args(&[
      "title:Buy milk",
      "pri:urgent",
      "status=done",
      "due:2026-03-01",
      "desc:",
      "colour:red"
    ]))
    .unwrap();

    assert_eq!(
      patch.title.as_deref(),
      Some("Buy milk")
    );
    assert_eq!(
      patch.priority,
      Some(TaskPriority::Urgent)
    );
    assert_eq!(
      patch.status,
      Some(TaskStatus::Completed)
    );
    assert_eq!(
      patch.deadline,
      Some(Some(
        "2026-03-01T00:00:00"
          .to_string()
      ))
    );
    assert_eq!(
      patch.description,
      Some(None)
    );
    assert_eq!(patch.start_date, None);
  }

  #[test]
  fn patch_values_may_contain_separators()
   {
    let patch = parse_patch(&args(&[
      "title=Call at 10:30",
      "start=2026-01-02T10:00:00",
      "desc:a=b"
    ]))
    .unwrap();

    assert_eq!(
      patch.title.as_deref(),
      Some("Call at 10:30")
    );
    assert_eq!(
      patch.start_date,
      Some(Some(
        "2026-01-02T10:00:00"
          .to_string()
      ))
    );
    assert_eq!(
      patch.description,
      Some(Some("a=b".to_string()))
    );
  }

  #[test]
  fn patch_rejects_bad_dates_and_priorities()
   {
    assert!(
      parse_patch(&args(&[
        "due:tomorrow"
      ]))
      .is_err()
    );
    assert!(
      parse_patch(&args(&["pri:max"]))
        .is_err()
    );
    assert!(
      parse_patch(&args(&["title:"]))
        .is_err()
    );
  }

  #[test]
  fn lists_resolve_by_id_prefix_or_title()
   {
    let lists = vec![
      TodoList::new(
        "a1b2",
        "What to learn"
      ),
      TodoList::new("a1c3", "What to buy"),
    ];

    assert_eq!(
      resolve_list(&lists, "a1b2")
        .unwrap()
        .title,
      "What to learn"
    );
    assert_eq!(
      resolve_list(&lists, "a1c")
        .unwrap()
        .id,
      "a1c3"
    );
    assert_eq!(
      resolve_list(
        &lists,
        "what to buy"
      )
      .unwrap()
      .id,
      "a1c3"
    );
    assert!(
      resolve_list(&lists, "a1").is_err()
    );
    assert!(
      resolve_list(&lists, "zzz").is_err()
    );
  }

  #[test]
  fn abbreviations_must_be_unique() {
    let known = known_command_names();
    assert_eq!(
      expand_command_abbrev(
        "add", &known
      ),
      Some("add")
    );
    assert_eq!(
      expand_command_abbrev(
        "add-", &known
      ),
      Some("add-list")
    );
    assert_eq!(
      expand_command_abbrev("un", &known),
      Some("undone")
    );
    assert_eq!(
      expand_command_abbrev("re", &known),
      None
    );
  }
}

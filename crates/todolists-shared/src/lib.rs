use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{
  Deserialize,
  Deserializer,
  Serialize
};

/// `resultCode` of a successful
/// envelope.
pub const RESULT_CODE_OK: i32 = 0;

/// Message surfaced when a rejected
/// envelope carries no messages.
pub const GENERIC_ERROR_MESSAGE: &str =
  "Some error";

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
  Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
  #[default]
  All,
  Active,
  Completed
}

impl Filter {
  pub fn as_str(self) -> &'static str {
    match self {
      | Filter::All => "all",
      | Filter::Active => "active",
      | Filter::Completed => {
        "completed"
      }
    }
  }
}

impl fmt::Display for Filter {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Filter {
  type Err = String;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "all" => Ok(Filter::All),
      | "active" => Ok(Filter::Active),
      | "completed" | "done" => {
        Ok(Filter::Completed)
      }
      | other => {
        Err(format!(
          "unknown filter: {other}"
        ))
      }
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
)]
#[serde(
  try_from = "u8",
  into = "u8"
)]
pub enum TaskStatus {
  New,
  InProgress,
  Completed,
  Draft
}

impl TaskStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      | TaskStatus::New => "new",
      | TaskStatus::InProgress => {
        "in-progress"
      }
      | TaskStatus::Completed => {
        "completed"
      }
      | TaskStatus::Draft => "draft"
    }
  }
}

impl From<TaskStatus> for u8 {
  fn from(status: TaskStatus) -> u8 {
    match status {
      | TaskStatus::New => 0,
      | TaskStatus::InProgress => 1,
      | TaskStatus::Completed => 2,
      | TaskStatus::Draft => 3
    }
  }
}

impl TryFrom<u8> for TaskStatus {
  type Error = String;

  fn try_from(
    code: u8
  ) -> Result<Self, Self::Error> {
    match code {
      | 0 => Ok(TaskStatus::New),
      | 1 => Ok(TaskStatus::InProgress),
      | 2 => Ok(TaskStatus::Completed),
      | 3 => Ok(TaskStatus::Draft),
      | other => {
        Err(format!(
          "unknown task status code: \
           {other}"
        ))
      }
    }
  }
}

impl FromStr for TaskStatus {
  type Err = String;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "new" => Ok(TaskStatus::New),
      | "in-progress" | "inprogress"
      | "progress" => {
        Ok(TaskStatus::InProgress)
      }
      | "completed" | "done" => {
        Ok(TaskStatus::Completed)
      }
      | "draft" => Ok(TaskStatus::Draft),
      | other => {
        Err(format!(
          "unknown task status: {other}"
        ))
      }
    }
  }
}

/// Ordered by wire value, so `Low <
/// Urgent` holds; `Later` sorts last.
#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
)]
#[serde(
  try_from = "u8",
  into = "u8"
)]
pub enum TaskPriority {
  Low,
  Middle,
  High,
  Urgent,
  Later
}

impl TaskPriority {
  pub fn as_str(self) -> &'static str {
    match self {
      | TaskPriority::Low => "low",
      | TaskPriority::Middle => "middle",
      | TaskPriority::High => "high",
      | TaskPriority::Urgent => "urgent",
      | TaskPriority::Later => "later"
    }
  }
}

impl From<TaskPriority> for u8 {
  fn from(priority: TaskPriority) -> u8 {
    match priority {
      | TaskPriority::Low => 0,
      | TaskPriority::Middle => 1,
      | TaskPriority::High => 2,
      | TaskPriority::Urgent => 3,
      | TaskPriority::Later => 4
    }
  }
}

impl TryFrom<u8> for TaskPriority {
  type Error = String;

  fn try_from(
    code: u8
  ) -> Result<Self, Self::Error> {
    match code {
      | 0 => Ok(TaskPriority::Low),
      | 1 => Ok(TaskPriority::Middle),
      | 2 => Ok(TaskPriority::High),
      | 3 => Ok(TaskPriority::Urgent),
      | 4 => Ok(TaskPriority::Later),
      | other => {
        Err(format!(
          "unknown task priority code: \
           {other}"
        ))
      }
    }
  }
}

impl FromStr for TaskPriority {
  type Err = String;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "low" | "l" => {
        Ok(TaskPriority::Low)
      }
      | "middle" | "medium" | "m" => {
        Ok(TaskPriority::Middle)
      }
      | "high" | "hi" | "h" => {
        Ok(TaskPriority::High)
      }
      | "urgent" | "urgently" | "u" => {
        Ok(TaskPriority::Urgent)
      }
      | "later" => {
        Ok(TaskPriority::Later)
      }
      | other => {
        Err(format!(
          "unknown task priority: \
           {other}"
        ))
      }
    }
  }
}

/// A list as the remote service
/// returns it.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct TodolistDto {
  pub id:         String,
  #[serde(default)]
  pub title:      String,
  #[serde(default)]
  pub added_date: Option<String>,
  #[serde(default)]
  pub order:      Option<i64>
}

/// A list as the client holds it: the
/// server record plus its display
/// filter.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct TodoList {
  pub id:     String,
  pub title:  String,
  #[serde(default)]
  pub filter: Filter
}

impl TodoList {
  pub fn new(
    id: impl Into<String>,
    title: impl Into<String>
  ) -> Self {
    Self {
      id:     id.into(),
      title:  title.into(),
      filter: Filter::All
    }
  }
}

impl From<TodolistDto> for TodoList {
  fn from(dto: TodolistDto) -> Self {
    Self::new(dto.id, dto.title)
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
  pub id:           String,
  pub todo_list_id: String,
  #[serde(default)]
  pub title:        String,
  #[serde(default)]
  pub description:  Option<String>,
  pub status:       TaskStatus,
  pub priority:     TaskPriority,
  #[serde(default)]
  pub start_date:   Option<String>,
  #[serde(default)]
  pub deadline:     Option<String>,
  #[serde(default)]
  pub order:        Option<i64>,
  #[serde(default)]
  pub added_date:   Option<String>
}

impl TaskDto {
  pub fn new(
    id: impl Into<String>,
    todo_list_id: impl Into<String>,
    title: impl Into<String>
  ) -> Self {
    Self {
      id:           id.into(),
      todo_list_id: todo_list_id.into(),
      title:        title.into(),
      description:  None,
      status:       TaskStatus::New,
      priority:     TaskPriority::Low,
      start_date:   None,
      deadline:     None,
      order:        None,
      added_date:   None
    }
  }

  pub fn is_done(&self) -> bool {
    self.status == TaskStatus::Completed
  }

  /// Merges the fields set in `patch`;
  /// everything else is kept.
  pub fn apply_patch(
    &mut self,
    patch: &TaskPatch
  ) {
    if let Some(title) = &patch.title {
      self.title = title.clone();
    }
    if let Some(description) =
      &patch.description
    {
      self.description =
        description.clone();
    }
    if let Some(status) = patch.status {
      self.status = status;
    }
    if let Some(priority) =
      patch.priority
    {
      self.priority = priority;
    }
    if let Some(start_date) =
      &patch.start_date
    {
      self.start_date =
        start_date.clone();
    }
    if let Some(deadline) =
      &patch.deadline
    {
      self.deadline = deadline.clone();
    }
  }

  /// The full record the update
  /// endpoint expects: this task's
  /// persisted fields overlaid with
  /// `patch`.
  pub fn update_model(
    &self,
    patch: &TaskPatch
  ) -> UpdateTaskModel {
    let mut merged = self.clone();
    merged.apply_patch(patch);
    UpdateTaskModel {
      title:       merged.title,
      description: merged.description,
      status:      merged.status,
      priority:    merged.priority,
      start_date:  merged.start_date,
      deadline:    merged.deadline
    }
  }
}

/// Partial task change. Nullable
/// fields use `Some(None)` to clear.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  Default,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub title:       Option<String>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    deserialize_with = "double_option"
  )]
  pub description:
    Option<Option<String>>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub status:      Option<TaskStatus>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub priority:    Option<TaskPriority>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    deserialize_with = "double_option"
  )]
  pub start_date:
    Option<Option<String>>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    deserialize_with = "double_option"
  )]
  pub deadline:
    Option<Option<String>>
}

impl TaskPatch {
  pub fn status(
    status: TaskStatus
  ) -> Self {
    Self {
      status: Some(status),
      ..Self::default()
    }
  }

  pub fn title(
    title: impl Into<String>
  ) -> Self {
    Self {
      title: Some(title.into()),
      ..Self::default()
    }
  }

  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskModel {
  pub title:       String,
  pub description: Option<String>,
  pub status:      TaskStatus,
  pub priority:    TaskPriority,
  pub start_date:  Option<String>,
  pub deadline:    Option<String>
}

/// Response wrapper of every mutating
/// endpoint.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
#[serde(
  try_from = "RawEnvelope",
  bound(
    serialize = "T: Serialize",
    deserialize = "T: DeserializeOwned"
  )
)]
pub struct Envelope<T> {
  pub result_code: i32,
  pub messages:    Vec<String>,
  pub data:        Option<T>
}

/// Wire shape of an envelope before
/// `data` is decoded into its payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEnvelope {
  result_code: i32,
  #[serde(default)]
  messages:    Vec<String>,
  #[serde(default)]
  data:        Option<serde_json::Value>
}

// Rejected envelopes carry `{}` as
// data, so only a successful envelope
// must decode its payload.
impl<T> TryFrom<RawEnvelope>
  for Envelope<T>
where
  T: DeserializeOwned
{
  type Error = serde_json::Error;

  fn try_from(
    raw: RawEnvelope
  ) -> Result<Self, Self::Error> {
    let data = match raw.data {
      | None
      | Some(serde_json::Value::Null) => {
        None
      }
      | Some(value)
        if raw.result_code
          == RESULT_CODE_OK =>
      {
        Some(serde_json::from_value(
          value
        )?)
      }
      | Some(value) => {
        serde_json::from_value(value)
          .ok()
      }
    };

    Ok(Self {
      result_code: raw.result_code,
      messages: raw.messages,
      data
    })
  }
}

impl<T> Envelope<T> {
  pub fn ok(data: T) -> Self {
    Self {
      result_code: RESULT_CODE_OK,
      messages:    vec![],
      data:        Some(data)
    }
  }

  pub fn rejected(
    result_code: i32,
    messages: Vec<String>
  ) -> Self {
    Self {
      result_code,
      messages,
      data: None
    }
  }

  pub fn is_success(&self) -> bool {
    self.result_code == RESULT_CODE_OK
  }

  /// `None` for a successful envelope,
  /// otherwise the first message or
  /// the generic one.
  pub fn failure_message(
    &self
  ) -> Option<String> {
    if self.is_success() {
      return None;
    }
    Some(
      self
        .messages
        .first()
        .cloned()
        .unwrap_or_else(|| {
          GENERIC_ERROR_MESSAGE
            .to_string()
        })
    )
  }

  pub fn map<U>(
    self,
    f: impl FnOnce(T) -> U
  ) -> Envelope<U> {
    Envelope {
      result_code: self.result_code,
      messages:    self.messages,
      data:        self.data.map(f)
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct Item<T> {
  pub item: T
}

/// Payload of endpoints that return
/// nothing.
#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  Default,
  PartialEq,
  Eq,
)]
pub struct Empty {}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  Default,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct TasksPage {
  #[serde(default)]
  pub items:       Vec<TaskDto>,
  #[serde(default)]
  pub total_count: Option<u64>,
  #[serde(default)]
  pub error:       Option<String>
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct CreateTitleArgs {
  pub title: String
}

fn double_option<'de, D, T>(
  de: D
) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>
{
  Option::<T>::deserialize(de).map(Some)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_and_priority_use_integer_codes()
   {
    let task = TaskDto {
      status: TaskStatus::Completed,
      priority: TaskPriority::Urgent,
      ..TaskDto::new("t1", "l1", "Milk")
    };
    let json =
      serde_json::to_value(&task)
        .unwrap();
    assert_eq!(json["status"], 2);
    assert_eq!(json["priority"], 3);
    assert_eq!(json["todoListId"], "l1");

    let bad = serde_json::json!({
      "id": "t1",
      "todoListId": "l1",
      "title": "x",
      "status": 9,
      "priority": 0
    });
    assert!(
      serde_json::from_value::<TaskDto>(
        bad
      )
      .is_err()
    );
  }

  #[test]
  fn rejected_envelope_tolerates_empty_data()
   {
    let raw = r#"{"resultCode":1,"messages":["Title required"],"data":{}}"#;
    let envelope: Envelope<
      Item<TaskDto>
    > = serde_json::from_str(raw)
      .unwrap();
    assert!(!envelope.is_success());
    assert_eq!(envelope.data, None);
    assert_eq!(
      envelope.failure_message(),
      Some("Title required".to_string())
    );
  }

  #[test]
  fn successful_envelope_rejects_undecodable_data()
   {
    let raw = r#"{"resultCode":0,"messages":[],"data":{"item":{"id":"t1","todoListId":"l1","title":"x","status":7,"priority":0}}}"#;
    let err = serde_json::from_str::<
      Envelope<Item<TaskDto>>
    >(raw)
    .unwrap_err();
    assert!(
      err
        .to_string()
        .contains("unknown task status")
    );

    let empty: Envelope<Empty> =
      serde_json::from_str(
        r#"{"resultCode":0,"messages":[],"data":{}}"#
      )
      .unwrap();
    assert_eq!(empty.data, Some(Empty {}));
  }

  #[test]
  fn failure_message_falls_back_to_generic()
   {
    let envelope: Envelope<Empty> =
      Envelope::rejected(1, vec![]);
    assert_eq!(
      envelope.failure_message(),
      Some(
        GENERIC_ERROR_MESSAGE
          .to_string()
      )
    );
    assert_eq!(
      Envelope::ok(Empty {})
        .failure_message(),
      None
    );
  }

  #[test]
  fn patch_distinguishes_absent_and_cleared()
   {
    let patch: TaskPatch =
      serde_json::from_str(
        r#"{"deadline":null,"title":"b"}"#
      )
      .unwrap();
    assert_eq!(patch.deadline, Some(None));
    assert_eq!(patch.description, None);
    assert_eq!(
      patch.title.as_deref(),
      Some("b")
    );
  }

  #[test]
  fn update_model_keeps_unpatched_fields()
   {
    let mut task =
      TaskDto::new("t1", "l1", "a");
    task.description =
      Some("desc".to_string());
    task.deadline =
      Some("2026-01-01".to_string());

    let model = task.update_model(
      &TaskPatch {
        status: Some(
          TaskStatus::Completed
        ),
        deadline: Some(None),
        ..TaskPatch::default()
      }
    );
    assert_eq!(model.title, "a");
    assert_eq!(
      model.description.as_deref(),
      Some("desc")
    );
    assert_eq!(
      model.status,
      TaskStatus::Completed
    );
    assert_eq!(model.deadline, None);
  }
}

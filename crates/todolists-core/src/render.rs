use std::io::{self, IsTerminal, Write};

use todolists_shared::{TaskDto, TaskPriority, TaskStatus, TodoList};
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::tasks::TasksState;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = cfg.get_bool("color")?.unwrap_or(true);
        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, lists, tasks))]
    pub fn print_lists(&mut self, lists: &[TodoList], tasks: &TasksState) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let (headers, rows) = self.list_rows(lists, tasks);
        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, list, tasks))]
    pub fn print_tasks(&mut self, list: &TodoList, tasks: &[&TaskDto]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{} [{}]", list.title, list.filter)?;
        let (headers, rows) = self.task_rows(tasks);
        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, task))]
    pub fn print_task_info(&mut self, task: &TaskDto) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "id        {}", task.id)?;
        writeln!(out, "list      {}", task.todo_list_id)?;
        writeln!(out, "title     {}", task.title)?;
        writeln!(out, "status    {}", task.status.as_str())?;
        writeln!(out, "priority  {}", task.priority.as_str())?;
        if let Some(description) = &task.description {
            writeln!(out, "desc      {description}")?;
        }
        if let Some(start) = &task.start_date {
            writeln!(out, "start     {start}")?;
        }
        if let Some(deadline) = &task.deadline {
            writeln!(out, "deadline  {deadline}")?;
        }
        if let Some(added) = &task.added_date {
            writeln!(out, "added     {added}")?;
        }

        Ok(())
    }

    fn list_rows(&self, lists: &[TodoList], tasks: &TasksState) -> (Vec<String>, Vec<Vec<String>>) {
        let headers = vec![
            "ID".to_string(),
            "Title".to_string(),
            "Filter".to_string(),
            "Open".to_string(),
        ];

        let rows = lists
            .iter()
            .map(|list| {
                let open = tasks
                    .get(&list.id)
                    .map(|bucket| bucket.iter().filter(|t| !t.is_done()).count().to_string())
                    .unwrap_or_else(|| "-".to_string());
                vec![
                    self.paint(&list.id, "33"),
                    list.title.clone(),
                    list.filter.to_string(),
                    open,
                ]
            })
            .collect();

        (headers, rows)
    }

    fn task_rows(&self, tasks: &[&TaskDto]) -> (Vec<String>, Vec<Vec<String>>) {
        let headers = vec![
            "ID".to_string(),
            "Status".to_string(),
            "Pri".to_string(),
            "Deadline".to_string(),
            "Title".to_string(),
        ];

        let rows = tasks
            .iter()
            .map(|task| {
                let status = match task.status {
                    TaskStatus::Completed => self.paint("done", "32"),
                    other => other.as_str().to_string(),
                };
                let priority = match task.priority {
                    TaskPriority::High | TaskPriority::Urgent => {
                        self.paint(task.priority.as_str(), "31")
                    }
                    other => other.as_str().to_string(),
                };
                vec![
                    self.paint(&task.id, "33"),
                    status,
                    priority,
                    task.deadline.clone().unwrap_or_default(),
                    task.title.clone(),
                ]
            })
            .collect();

        (headers, rows)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_pads_by_visible_width() {
        let mut buf = Vec::new();
        write_table(
            &mut buf,
            vec!["ID".to_string(), "Title".to_string()],
            vec![
                vec!["\x1b[33mL1\x1b[0m".to_string(), "Молоко".to_string()],
                vec!["L22".to_string(), "x".to_string()],
            ],
        )
        .unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "ID  Title  ");
        assert_eq!(lines[1], "--- ------ ");
        assert_eq!(strip_ansi(lines[2]), "L1  Молоко ");
        assert_eq!(lines[3], "L22 x      ");
    }

    #[test]
    fn color_setting_must_be_a_boolean() {
        let mut cfg = Config::default();
        assert!(Renderer::new(&cfg).unwrap().color);

        cfg.apply_overrides([("rc.color".to_string(), "off".to_string())]);
        assert!(!Renderer::new(&cfg).unwrap().color);

        cfg.apply_overrides([("color".to_string(), "sometimes".to_string())]);
        let err = Renderer::new(&cfg).unwrap_err();
        assert!(err.to_string().contains("invalid color setting: sometimes"));
    }

    #[test]
    fn open_count_ignores_completed_tasks() {
        let renderer = Renderer { color: false };
        let mut done = TaskDto::new("t1", "L1", "a");
        done.status = TaskStatus::Completed;
        let mut tasks = TasksState::new();
        tasks.insert("L1".to_string(), vec![done, TaskDto::new("t2", "L1", "b")]);

        let (_, rows) = renderer.list_rows(&[TodoList::new("L1", "Groceries")], &tasks);
        assert_eq!(rows[0], vec!["L1", "Groceries", "all", "1"]);
    }
}

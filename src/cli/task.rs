//! kanban board command implementations.

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::cli::Board;
use crate::error::{Error, Result};
use crate::export;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::query::{self, Selection, TaskFilter};
use crate::stats::{self, BoardStats};
use crate::task::{FieldUpdate, Mutation, NewTask, Task, TaskPatch, TaskPriority, TaskStatus};

pub struct AddOptions {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due: Option<String>,
    pub assignee: Option<String>,
    pub labels: Option<String>,
}

pub struct EditOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due: Option<String>,
    pub clear_due: bool,
    pub assignee: Option<String>,
    pub clear_assignee: bool,
    pub labels: Option<String>,
}

pub struct MoveOptions {
    pub id: String,
    pub status: String,
}

pub struct RmOptions {
    pub id: String,
    pub yes: bool,
}

pub struct ShowOptions {
    pub id: String,
}

pub struct ListOptions {
    pub status: String,
    pub priority: String,
    pub search: String,
}

pub struct ExportOptions {
    pub out: Option<PathBuf>,
}

pub struct ClearOptions {
    pub yes: bool,
}

#[derive(Serialize)]
struct TaskView<'a> {
    #[serde(flatten)]
    task: &'a Task,
    overdue: bool,
}

#[derive(Serialize)]
struct TaskListOutput<'a> {
    filter: &'a TaskFilter,
    total: usize,
    tasks: Vec<&'a Task>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsOutput {
    #[serde(flatten)]
    stats: BoardStats,
    last_saved: Option<chrono::DateTime<Utc>>,
    last_saved_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    theme: Option<String>,
}

#[derive(Serialize)]
struct ExportOutput {
    path: PathBuf,
    count: usize,
}

#[derive(Serialize)]
struct ClearOutput {
    removed: usize,
}

pub fn run_add(board: &mut Board, options: AddOptions, output: OutputOptions) -> Result<()> {
    let input = NewTask {
        title: options.title,
        description: options.description,
        status: parse_opt::<TaskStatus>(options.status.as_deref())?,
        priority: parse_opt::<TaskPriority>(options.priority.as_deref())?,
        due_date: options.due.as_deref().map(parse_due).transpose()?,
        assignee: options.assignee,
        labels: options.labels,
    };
    let mutation = board.store.create(input)?;

    let mut human = HumanOutput::new("Task created");
    push_task_summary(&mut human, &mutation.value);
    finish(board, &mut human, &mutation);
    human.push_next_step(format!("kanban move {} progress", mutation.value.id));

    emit_success(output, "add", &mutation.value, Some(&human))
}

pub fn run_edit(board: &mut Board, options: EditOptions, output: OutputOptions) -> Result<()> {
    let patch = TaskPatch {
        title: options.title,
        description: options.description,
        status: parse_opt::<TaskStatus>(options.status.as_deref())?,
        priority: parse_opt::<TaskPriority>(options.priority.as_deref())?,
        due_date: match (options.clear_due, options.due.as_deref()) {
            (true, _) => FieldUpdate::Clear,
            (false, Some(raw)) => FieldUpdate::Set(parse_due(raw)?),
            (false, None) => FieldUpdate::Keep,
        },
        assignee: match (options.clear_assignee, options.assignee) {
            (true, _) => FieldUpdate::Clear,
            (false, Some(value)) => FieldUpdate::Set(value),
            (false, None) => FieldUpdate::Keep,
        },
        labels: options.labels,
    };
    if patch.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to change; pass at least one field flag".to_string(),
        ));
    }
    let mutation = board.store.update(&options.id, patch)?;

    let mut human = HumanOutput::new("Task updated");
    push_task_summary(&mut human, &mutation.value);
    finish(board, &mut human, &mutation);

    emit_success(output, "edit", &mutation.value, Some(&human))
}

pub fn run_move(board: &mut Board, options: MoveOptions, output: OutputOptions) -> Result<()> {
    let status: TaskStatus = options.status.parse()?;
    let mutation = board.store.move_to(&options.id, status)?;

    let mut human = HumanOutput::new("Task moved");
    human.push_summary("ID", mutation.value.id.clone());
    human.push_summary("Title", mutation.value.title.clone());
    human.push_summary("Column", status.title());
    finish(board, &mut human, &mutation);

    emit_success(output, "move", &mutation.value, Some(&human))
}

pub fn run_rm(board: &mut Board, options: RmOptions, output: OutputOptions) -> Result<()> {
    // Fail on unknown ids before asking for confirmation.
    board.store.get(&options.id)?;
    if !options.yes {
        return Err(Error::InvalidArgument(format!(
            "refusing to delete task {} without --yes",
            options.id
        )));
    }
    let mutation = board.store.delete(&options.id)?;

    let mut human = HumanOutput::new("Task deleted");
    human.push_summary("ID", mutation.value.id.clone());
    human.push_summary("Title", mutation.value.title.clone());
    finish(board, &mut human, &mutation);

    emit_success(output, "rm", &mutation.value, Some(&human))
}

pub fn run_show(board: &mut Board, options: ShowOptions, output: OutputOptions) -> Result<()> {
    let now = Utc::now();
    let mut human = HumanOutput::new("Task");
    for warning in board.take_warnings() {
        human.push_warning(warning);
    }

    let task = board.store.get(&options.id)?;
    let view = TaskView {
        task,
        overdue: stats::is_overdue(task, now),
    };

    push_task_summary(&mut human, task);
    if !task.description.is_empty() {
        human.push_summary("Description", task.description.clone());
    }
    human.push_summary("Created", task.created_at.to_rfc3339());
    human.push_summary("Updated", task.updated_at.to_rfc3339());
    if view.overdue {
        human.push_warning("task is overdue");
    }

    emit_success(output, "show", &view, Some(&human))
}

pub fn run_list(board: &mut Board, options: ListOptions, output: OutputOptions) -> Result<()> {
    let now = Utc::now();
    let criteria = TaskFilter::parse(&options.status, &options.priority, &options.search)?;
    let mut human = HumanOutput::new("Tasks");
    for warning in board.take_warnings() {
        human.push_warning(warning);
    }

    let tasks = query::filter(board.store.list(), &criteria);
    human.push_summary("Shown", format!("{} of {}", tasks.len(), board.store.len()));
    if !criteria.is_empty() {
        human.push_summary("Filter", describe_filter(&criteria));
    }
    for status in TaskStatus::ALL {
        if !criteria.status.matches(&status) {
            continue;
        }
        let items: Vec<String> = query::column(board.store.list(), status)
            .into_iter()
            .filter(|task| criteria.matches(task))
            .map(|task| format_task_line(task, stats::is_overdue(task, now)))
            .collect();
        human.push_group(format!("{} ({})", status.title(), items.len()), items);
    }
    if board.store.is_empty() {
        human.push_next_step("kanban add \"<title>\"");
    }

    let data = TaskListOutput {
        filter: &criteria,
        total: tasks.len(),
        tasks,
    };
    emit_success(output, "list", &data, Some(&human))
}

pub fn run_stats(board: &mut Board, output: OutputOptions) -> Result<()> {
    let now = Utc::now();
    let mut human = HumanOutput::new("Board stats");
    for warning in board.take_warnings() {
        human.push_warning(warning);
    }

    let stats = stats::compute(board.store.list(), now);
    let last_saved = board.store.last_saved();
    let last_saved_label = stats::last_saved_label(last_saved, now);
    let theme = board
        .store
        .persistence()
        .read_theme()
        .map(|theme| theme.to_string());

    human.push_summary("Total", stats.total.to_string());
    human.push_summary("Completed", stats.completed.to_string());
    human.push_summary("In progress", stats.in_progress.to_string());
    human.push_summary("Created today", stats.today.to_string());
    human.push_summary("Overdue", stats.overdue.to_string());
    human.push_summary("Completion", format!("{}%", stats.completion_rate));
    human.push_summary("Last saved", last_saved_label.clone());
    human.push_detail(format!(
        "Columns: {}",
        stats
            .by_status
            .iter()
            .map(|entry| format!("{} {}", entry.title, entry.count))
            .collect::<Vec<_>>()
            .join(", ")
    ));
    human.push_detail(format!(
        "Priorities: {}",
        stats
            .by_priority
            .iter()
            .map(|entry| format!("{} {}", entry.label, entry.count))
            .collect::<Vec<_>>()
            .join(", ")
    ));
    if let Some(theme) = theme.as_deref() {
        human.push_detail(format!("Theme: {theme}"));
    }

    let data = StatsOutput {
        stats,
        last_saved,
        last_saved_label,
        theme,
    };
    emit_success(output, "stats", &data, Some(&human))
}

pub fn run_export(board: &mut Board, options: ExportOptions, output: OutputOptions) -> Result<()> {
    let dir = options
        .out
        .unwrap_or_else(|| board.config.export.dir_or_current());
    let path = export::write_export(&dir, board.store.list(), Utc::now())?;

    let mut human = HumanOutput::new("Tasks exported");
    for warning in board.take_warnings() {
        human.push_warning(warning);
    }
    human.push_summary("File", path.display().to_string());
    human.push_summary("Tasks", board.store.len().to_string());

    let data = ExportOutput {
        path,
        count: board.store.len(),
    };
    emit_success(output, "export", &data, Some(&human))
}

pub fn run_clear(board: &mut Board, options: ClearOptions, output: OutputOptions) -> Result<()> {
    if !options.yes {
        return Err(Error::InvalidArgument(
            "refusing to clear the board without --yes".to_string(),
        ));
    }
    let mutation = board.store.clear();

    let mut human = HumanOutput::new("Board cleared");
    human.push_summary("Removed", mutation.value.to_string());
    finish(board, &mut human, &mutation);
    if board.config.seed.enabled {
        human.push_next_step("pass --no-seed to keep the next run from adding sample tasks");
    }

    let data = ClearOutput {
        removed: mutation.value,
    };
    emit_success(output, "clear", &data, Some(&human))
}

fn parse_opt<T: std::str::FromStr<Err = Error>>(value: Option<&str>) -> Result<Option<T>> {
    value.map(str::parse).transpose()
}

fn parse_due(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        Error::InvalidArgument(format!("invalid due date '{raw}' (expected YYYY-MM-DD)"))
    })
}

/// Attach startup and write-through warnings to a mutation's output
fn finish<T>(board: &mut Board, human: &mut HumanOutput, mutation: &Mutation<T>) {
    for warning in board.take_warnings() {
        human.push_warning(warning);
    }
    if let Some(warning) = mutation.save_warning.as_ref() {
        human.push_warning(warning.clone());
    }
}

fn push_task_summary(human: &mut HumanOutput, task: &Task) {
    human.push_summary("ID", task.id.clone());
    human.push_summary("Title", task.title.clone());
    human.push_summary("Status", task.status.title());
    human.push_summary("Priority", task.priority.label());
    if let Some(due) = task.due_date {
        human.push_summary("Due", due.to_string());
    }
    if let Some(assignee) = task.assignee.as_ref() {
        human.push_summary("Assignee", assignee.clone());
    }
    if !task.labels.is_empty() {
        human.push_summary("Labels", task.labels.join(", "));
    }
}

fn format_task_line(task: &Task, overdue: bool) -> String {
    let mut line = format!("{} [{}] {}", task.id, task.priority, task.title);
    if let Some(assignee) = task.assignee.as_ref() {
        line.push_str(&format!(" @{assignee}"));
    }
    if let Some(due) = task.due_date {
        line.push_str(&format!(" (due {due})"));
    }
    if overdue {
        line.push_str(" OVERDUE");
    }
    for label in &task.labels {
        line.push_str(&format!(" #{label}"));
    }
    line
}

fn describe_filter(criteria: &TaskFilter) -> String {
    let mut parts = Vec::new();
    if let Selection::Only(status) = criteria.status {
        parts.push(format!("status={status}"));
    }
    if let Selection::Only(priority) = criteria.priority {
        parts.push(format!("priority={priority}"));
    }
    if !criteria.search.is_empty() {
        parts.push(format!("search=\"{}\"", criteria.search));
    }
    parts.join(" ")
}

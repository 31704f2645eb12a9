//! tb task command implementations.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::board::Board;
use crate::cli::{CommandContext, GlobalOptions};
use crate::codec::{format_timestamp, parse_timestamp};
use crate::config::DeadlineConfig;
use crate::developer::DeveloperId;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::session::TaskEdit;
use crate::task::{Task, TaskId, TaskStatus};

pub struct AddOptions {
    pub title: String,
    pub description: String,
    pub deadline: Option<String>,
    pub deadline_in: Option<Option<i64>>,
    pub assign: Option<i64>,
    pub status: Option<String>,
    pub global: GlobalOptions,
}

pub struct ListOptions {
    pub status: Option<String>,
    pub developer: Option<i64>,
    pub search: Option<String>,
    pub unassigned: bool,
    pub overdue: bool,
    pub global: GlobalOptions,
}

pub struct EditOptions {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub global: GlobalOptions,
}

pub struct DeadlineOptions {
    pub id: i64,
    pub when: Option<String>,
    pub days: Option<i64>,
    pub clear: bool,
    pub global: GlobalOptions,
}

#[derive(Serialize)]
struct TaskSummary {
    id: TaskId,
    title: String,
    description: String,
    status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    assigned_developer: Option<DeveloperId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deadline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    days_until_deadline: Option<i64>,
    overdue: bool,
}

#[derive(Serialize)]
struct HistoryView {
    timestamp: String,
    action: String,
    details: String,
}

#[derive(Serialize)]
struct TaskDetail {
    #[serde(flatten)]
    task: TaskSummary,
    history: Vec<HistoryView>,
}

#[derive(Serialize)]
struct TaskListOutput {
    total: usize,
    tasks: Vec<TaskSummary>,
}

#[derive(Serialize)]
struct TaskChangeOutput {
    id: TaskId,
    changed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    changes: Vec<String>,
    task: TaskSummary,
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let mut ctx = CommandContext::open(options.global)?;
    let status = options
        .status
        .as_deref()
        .map(str::parse::<TaskStatus>)
        .transpose()?;
    let deadline = match (options.deadline.as_deref(), options.deadline_in) {
        (Some(raw), _) => Some(parse_deadline(raw, &ctx.config.deadlines)?),
        (None, Some(days)) => {
            let days = days.unwrap_or(ctx.config.deadlines.default_offset_days);
            Some(deadline_in_days(days, &ctx.config.deadlines)?)
        }
        (None, None) => None,
    };
    let developer = options.assign.map(DeveloperId::new);
    if let Some(developer) = developer {
        if ctx.session.board().developer(developer).is_none() {
            return Err(Error::DeveloperNotFound(developer));
        }
    }

    let id = ctx
        .session
        .add_task(&options.title, &options.description, deadline)?;
    if let Some(developer) = developer {
        ctx.session.assign_task(id, developer)?;
    }
    if let Some(status) = status {
        ctx.session.move_task(id, status)?;
    }
    ctx.save()?;

    let board = ctx.session.board();
    let summary = summarize(board, ctx.session.task(id)?, Utc::now());
    let mut human = HumanOutput::new("Task created");
    push_task_summary(&mut human, &summary);
    ctx.finish_output(&mut human);

    emit_success(ctx.output(), "task add", &summary, Some(&human))
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let mut ctx = CommandContext::open(options.global)?;
    let status = options
        .status
        .as_deref()
        .map(str::parse::<TaskStatus>)
        .transpose()?;
    let developer = options.developer.map(DeveloperId::new);
    let now = Utc::now();
    let board = ctx.session.board();

    let matches: Vec<&Task> = board
        .search_tasks(options.search.as_deref().unwrap_or(""))
        .filter(|task| status.is_none_or(|status| task.status() == status))
        .filter(|task| developer.is_none_or(|dev| task.assigned_developer() == Some(dev)))
        .filter(|task| !options.unassigned || !task.is_assigned())
        .filter(|task| !options.overdue || task.is_overdue_at(now))
        .collect();

    let preview = ctx.config.display.description_preview;
    let mut human = HumanOutput::new("Tasks");
    human.push_summary("Total", matches.len().to_string());
    let mut tasks = Vec::with_capacity(matches.len());
    for task in matches {
        let summary = summarize(board, task, now);
        human.push_detail(list_line(&summary, &task.description_preview(preview)));
        tasks.push(summary);
    }
    if board.task_count() == 0 {
        human.push_next_step("tb task add <title>");
    }
    let output = TaskListOutput {
        total: tasks.len(),
        tasks,
    };
    ctx.finish_output(&mut human);

    emit_success(ctx.output(), "task list", &output, Some(&human))
}

pub fn run_show(id: i64, global: GlobalOptions) -> Result<()> {
    let mut ctx = CommandContext::open(global)?;
    let task = ctx.session.task(TaskId::new(id))?;
    let detail = TaskDetail {
        task: summarize(ctx.session.board(), task, Utc::now()),
        history: history_views(task),
    };

    let mut human = HumanOutput::new(format!("Task {}: {}", detail.task.id, detail.task.title));
    push_task_summary(&mut human, &detail.task);
    if !detail.task.description.is_empty() {
        human.push_summary("Description", detail.task.description.clone());
    }
    for entry in &detail.history {
        human.push_detail(history_line(entry));
    }
    ctx.finish_output(&mut human);

    emit_success(ctx.output(), "task show", &detail, Some(&human))
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let mut ctx = CommandContext::open(options.global)?;
    let id = TaskId::new(options.id);
    let edit = TaskEdit {
        title: options.title,
        description: options.description,
        status: options
            .status
            .as_deref()
            .map(str::parse::<TaskStatus>)
            .transpose()?,
        ..TaskEdit::default()
    };
    if edit.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to edit (use --title, --description or --status)".to_string(),
        ));
    }

    let changes = ctx.session.edit_task(id, edit)?;
    finish_change(ctx, id, changes, "task edit", "Task updated")
}

pub fn run_move(id: i64, status: String, global: GlobalOptions) -> Result<()> {
    let mut ctx = CommandContext::open(global)?;
    let id = TaskId::new(id);
    let status: TaskStatus = status.parse()?;
    let changes = if ctx.session.move_task(id, status)? {
        vec![crate::task::actions::STATUS_CHANGED.to_string()]
    } else {
        Vec::new()
    };
    finish_change(ctx, id, changes, "task move", "Task moved")
}

pub fn run_advance(id: i64, global: GlobalOptions) -> Result<()> {
    let mut ctx = CommandContext::open(global)?;
    let id = TaskId::new(id);
    let changes = match ctx.session.advance_task(id)? {
        Some(_) => vec![crate::task::actions::STATUS_CHANGED.to_string()],
        None => Vec::new(),
    };
    finish_change(ctx, id, changes, "task advance", "Task advanced")
}

pub fn run_assign(id: i64, developer: i64, global: GlobalOptions) -> Result<()> {
    let mut ctx = CommandContext::open(global)?;
    let id = TaskId::new(id);
    let changes = if ctx.session.assign_task(id, DeveloperId::new(developer))? {
        vec![crate::task::actions::ASSIGNED.to_string()]
    } else {
        Vec::new()
    };
    finish_change(ctx, id, changes, "task assign", "Task assigned")
}

pub fn run_unassign(id: i64, global: GlobalOptions) -> Result<()> {
    let mut ctx = CommandContext::open(global)?;
    let id = TaskId::new(id);
    let changes = if ctx.session.unassign_task(id)? {
        vec![crate::task::actions::UNASSIGNED.to_string()]
    } else {
        Vec::new()
    };
    finish_change(ctx, id, changes, "task unassign", "Task unassigned")
}

pub fn run_deadline(options: DeadlineOptions) -> Result<()> {
    let mut ctx = CommandContext::open(options.global)?;
    let id = TaskId::new(options.id);
    let deadline = match (options.when.as_deref(), options.days, options.clear) {
        (_, _, true) => None,
        (Some(raw), _, false) => Some(parse_deadline(raw, &ctx.config.deadlines)?),
        (None, Some(days), false) => Some(deadline_in_days(days, &ctx.config.deadlines)?),
        (None, None, false) => {
            return Err(Error::InvalidArgument(
                "give a deadline, --in <DAYS> or --clear".to_string(),
            ));
        }
    };
    let edit = TaskEdit {
        deadline: Some(deadline),
        ..TaskEdit::default()
    };
    let changes = ctx.session.edit_task(id, edit)?;
    finish_change(ctx, id, changes, "task deadline", "Deadline updated")
}

pub fn run_rm(id: i64, global: GlobalOptions) -> Result<()> {
    let mut ctx = CommandContext::open(global)?;
    let id = TaskId::new(id);
    let summary = summarize(ctx.session.board(), ctx.session.task(id)?, Utc::now());
    ctx.session.delete_task(id)?;
    ctx.save()?;

    let mut human = HumanOutput::new("Task deleted");
    human.push_summary("ID", summary.id.to_string());
    human.push_summary("Title", summary.title.clone());
    ctx.finish_output(&mut human);

    emit_success(ctx.output(), "task rm", &summary, Some(&human))
}

pub fn run_history(id: i64, global: GlobalOptions) -> Result<()> {
    let mut ctx = CommandContext::open(global)?;
    let task = ctx.session.task(TaskId::new(id))?;
    let history = history_views(task);

    let mut human = HumanOutput::new(format!("History of task {}: {}", task.id(), task.title()));
    for entry in &history {
        human.push_detail(history_line(entry));
    }
    ctx.finish_output(&mut human);

    emit_success(ctx.output(), "task history", &history, Some(&human))
}

/// Save if anything changed and report the task as it now stands.
fn finish_change(
    mut ctx: CommandContext,
    id: TaskId,
    changes: Vec<String>,
    command: &str,
    header: &str,
) -> Result<()> {
    let changed = !changes.is_empty();
    if changed {
        ctx.save()?;
    }

    let task = summarize(ctx.session.board(), ctx.session.task(id)?, Utc::now());
    let mut human = if changed {
        HumanOutput::new(header)
    } else {
        HumanOutput::new("No changes")
    };
    push_task_summary(&mut human, &task);
    for change in &changes {
        human.push_detail(change.clone());
    }
    ctx.finish_output(&mut human);

    let output = TaskChangeOutput {
        id,
        changed,
        changes,
        task,
    };
    emit_success(ctx.output(), command, &output, Some(&human))
}

fn summarize(board: &Board, task: &Task, now: DateTime<Utc>) -> TaskSummary {
    let assignee = task
        .assigned_developer()
        .and_then(|id| board.developer(id))
        .map(|developer| developer.display_label());
    TaskSummary {
        id: task.id(),
        title: task.title().to_string(),
        description: task.description().to_string(),
        status: task.status(),
        assigned_developer: task.assigned_developer(),
        assignee,
        deadline: task.deadline().map(|at| format_timestamp(Some(at))),
        days_until_deadline: task
            .has_deadline()
            .then(|| task.days_until_deadline_at(now)),
        overdue: task.is_overdue_at(now),
    }
}

fn history_views(task: &Task) -> Vec<HistoryView> {
    task.history()
        .iter()
        .map(|entry| HistoryView {
            timestamp: format_timestamp(entry.timestamp()),
            action: entry.action().to_string(),
            details: entry.details().to_string(),
        })
        .collect()
}

fn push_task_summary(human: &mut HumanOutput, task: &TaskSummary) {
    human.push_summary("ID", task.id.to_string());
    human.push_summary("Title", task.title.clone());
    human.push_summary("Status", task.status.to_string());
    match (&task.assignee, task.assigned_developer) {
        (Some(label), _) => human.push_summary("Assignee", label.clone()),
        (None, Some(id)) => human.push_summary("Assignee", format!("#{id} (unknown)")),
        (None, None) => {}
    }
    if let Some(deadline) = &task.deadline {
        human.push_summary("Deadline", deadline.clone());
    }
    if task.overdue {
        human.push_warning("deadline has passed");
    }
}

fn list_line(task: &TaskSummary, description: &str) -> String {
    let mut line = format!("#{} [{}] {}", task.id, task.status, task.title);
    if let Some(assignee) = &task.assignee {
        line.push_str(&format!(" @ {assignee}"));
    }
    match task.days_until_deadline {
        Some(_) if task.overdue => line.push_str(" (overdue)"),
        Some(days) => line.push_str(&format!(" (due in {days}d)")),
        None => {}
    }
    if !description.is_empty() {
        line.push_str(" - ");
        line.push_str(description);
    }
    line
}

fn history_line(entry: &HistoryView) -> String {
    let at = if entry.timestamp.is_empty() {
        "?"
    } else {
        entry.timestamp.as_str()
    };
    format!("{at} {}: {}", entry.action, entry.details)
}

/// Parse `YYYY-MM-DD` (placed per `deadlines.end_of_day`) or a full
/// timestamp.
fn parse_deadline(raw: &str, deadlines: &DeadlineConfig) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(deadlines.deadline_for(date));
    }
    parse_timestamp(raw).ok_or_else(|| {
        Error::InvalidArgument(format!(
            "invalid deadline '{raw}' (expected YYYY-MM-DD or an RFC 3339 timestamp)"
        ))
    })
}

fn deadline_in_days(days: i64, deadlines: &DeadlineConfig) -> Result<DateTime<Utc>> {
    let date = Duration::try_days(days)
        .and_then(|offset| Utc::now().date_naive().checked_add_signed(offset))
        .ok_or_else(|| Error::InvalidArgument(format!("deadline offset out of range: {days}")))?;
    Ok(deadlines.deadline_for(date))
}

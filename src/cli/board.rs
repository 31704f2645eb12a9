//! Board-wide reports: statistics and warnings.

use chrono::Utc;
use serde::Serialize;

use crate::cli::{CommandContext, GlobalOptions};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::stats::BoardStats;
use crate::task::{Task, TaskId, TaskStatus};

#[derive(Serialize)]
struct FlaggedTask {
    id: TaskId,
    title: String,
    status: TaskStatus,
}

#[derive(Serialize)]
struct WarningsOutput {
    unassigned: Vec<FlaggedTask>,
    overdue: Vec<FlaggedTask>,
}

pub fn run_stats(global: GlobalOptions) -> Result<()> {
    let mut ctx = CommandContext::open(global)?;
    let stats = BoardStats::compute(ctx.session.board(), ctx.config.deadlines.soon_days);

    let mut human = HumanOutput::new("Board stats");
    human.push_summary("Tasks", stats.total.to_string());
    for (status, count) in stats.status_counts() {
        human.push_summary(status.to_string(), count.to_string());
    }
    human.push_summary("Completed", format!("{}%", stats.percent_done));
    human.push_summary("Overdue", stats.overdue.to_string());
    human.push_summary("Due today", stats.due_today.to_string());
    human.push_summary(
        format!("Due within {} days", stats.soon_days),
        stats.due_soon.to_string(),
    );
    human.push_summary("Developers", stats.developers.to_string());
    if let Some(top) = &stats.top_developer {
        human.push_summary("Top developer", format!("{} ({} tasks)", top.name, top.task_count));
    }
    if stats.has_unassigned_tasks {
        human.push_warning("some tasks past the backlog have no developer");
        human.push_next_step("tb warnings");
    }
    ctx.finish_output(&mut human);

    emit_success(ctx.output(), "stats", &stats, Some(&human))
}

pub fn run_warnings(global: GlobalOptions) -> Result<()> {
    let mut ctx = CommandContext::open(global)?;
    let board = ctx.session.board();
    let now = Utc::now();

    let flag = |task: &Task| FlaggedTask {
        id: task.id(),
        title: task.title().to_string(),
        status: task.status(),
    };
    let output = WarningsOutput {
        unassigned: board
            .tasks()
            .iter()
            .filter(|task| !task.is_assigned() && task.status() != TaskStatus::Backlog)
            .map(flag)
            .collect(),
        overdue: board
            .tasks()
            .iter()
            .filter(|task| task.is_overdue_at(now))
            .map(flag)
            .collect(),
    };

    let mut human = HumanOutput::new("Board warnings");
    for task in &output.unassigned {
        human.push_warning(format!(
            "#{} {} is {} with no developer",
            task.id, task.title, task.status
        ));
    }
    for task in &output.overdue {
        human.push_warning(format!("#{} {} is overdue", task.id, task.title));
    }
    if output.unassigned.is_empty() && output.overdue.is_empty() {
        human.push_detail("nothing needs attention");
    } else if !output.unassigned.is_empty() {
        human.push_next_step("tb task assign <task> <developer>");
    }
    ctx.finish_output(&mut human);

    emit_success(ctx.output(), "warnings", &output, Some(&human))
}

//! tb dev command implementations.

use serde::Serialize;

use crate::board::Board;
use crate::cli::{CommandContext, GlobalOptions};
use crate::developer::{Developer, DeveloperId};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::task::TaskId;

pub struct EditOptions {
    pub id: i64,
    pub name: Option<String>,
    pub position: Option<String>,
    pub global: GlobalOptions,
}

#[derive(Serialize)]
struct DeveloperSummary {
    id: DeveloperId,
    name: String,
    position: String,
    tasks: usize,
}

#[derive(Serialize)]
struct DeveloperListOutput {
    total: usize,
    developers: Vec<DeveloperSummary>,
}

#[derive(Serialize)]
struct DeveloperEditOutput {
    changed: bool,
    developer: DeveloperSummary,
}

#[derive(Serialize)]
struct DeveloperRemovedOutput {
    id: DeveloperId,
    name: String,
    unassigned_tasks: Vec<TaskId>,
}

pub fn run_add(name: &str, position: &str, global: GlobalOptions) -> Result<()> {
    let mut ctx = CommandContext::open(global)?;
    let id = ctx.session.add_developer(name, position)?;
    ctx.save()?;

    let summary = summarize_id(ctx.session.board(), id);
    let mut human = HumanOutput::new("Developer added");
    push_developer_summary(&mut human, summary.as_ref());
    ctx.finish_output(&mut human);

    emit_success(ctx.output(), "dev add", &summary, Some(&human))
}

pub fn run_list(global: GlobalOptions) -> Result<()> {
    let mut ctx = CommandContext::open(global)?;
    let board = ctx.session.board();
    let developers: Vec<DeveloperSummary> = board
        .developers()
        .iter()
        .map(|developer| summarize(board, developer))
        .collect();

    let mut human = HumanOutput::new("Developers");
    human.push_summary("Total", developers.len().to_string());
    for developer in &developers {
        human.push_detail(format!(
            "#{} {} ({}) - {} task(s)",
            developer.id, developer.name, developer.position, developer.tasks
        ));
    }
    if developers.is_empty() {
        human.push_next_step("tb dev add <name> --position <role>");
    }
    let output = DeveloperListOutput {
        total: developers.len(),
        developers,
    };
    ctx.finish_output(&mut human);

    emit_success(ctx.output(), "dev list", &output, Some(&human))
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let mut ctx = CommandContext::open(options.global)?;
    let id = DeveloperId::new(options.id);
    let changed = ctx.session.edit_developer(
        id,
        options.name.as_deref(),
        options.position.as_deref(),
    )?;
    if changed {
        ctx.save()?;
    }

    let summary = summarize_id(ctx.session.board(), id);
    let mut human = HumanOutput::new(if changed {
        "Developer updated"
    } else {
        "No changes"
    });
    push_developer_summary(&mut human, summary.as_ref());
    ctx.finish_output(&mut human);

    let output = summary.map(|developer| DeveloperEditOutput { changed, developer });
    emit_success(ctx.output(), "dev edit", &output, Some(&human))
}

pub fn run_rm(id: i64, global: GlobalOptions) -> Result<()> {
    let mut ctx = CommandContext::open(global)?;
    let id = DeveloperId::new(id);
    let name = ctx
        .session
        .board()
        .developer(id)
        .map(|developer| developer.name().to_string())
        .unwrap_or_default();
    let unassigned_tasks = ctx.session.remove_developer(id)?;
    ctx.save()?;

    let mut human = HumanOutput::new("Developer removed");
    human.push_summary("ID", id.to_string());
    human.push_summary("Name", name.clone());
    if !unassigned_tasks.is_empty() {
        let ids: Vec<String> = unassigned_tasks.iter().map(|task| format!("#{task}")).collect();
        human.push_warning(format!("tasks left without a developer: {}", ids.join(", ")));
        human.push_next_step("tb warnings");
    }
    ctx.finish_output(&mut human);

    let output = DeveloperRemovedOutput {
        id,
        name,
        unassigned_tasks,
    };
    emit_success(ctx.output(), "dev rm", &output, Some(&human))
}

fn summarize(board: &Board, developer: &Developer) -> DeveloperSummary {
    DeveloperSummary {
        id: developer.id(),
        name: developer.name().to_string(),
        position: developer.position().to_string(),
        tasks: board.tasks_by_developer(developer.id()).count(),
    }
}

fn summarize_id(board: &Board, id: DeveloperId) -> Option<DeveloperSummary> {
    board
        .developer(id)
        .map(|developer| summarize(board, developer))
}

fn push_developer_summary(human: &mut HumanOutput, developer: Option<&DeveloperSummary>) {
    let Some(developer) = developer else {
        return;
    };
    human.push_summary("ID", developer.id.to_string());
    human.push_summary("Name", developer.name.clone());
    if !developer.position.is_empty() {
        human.push_summary("Position", developer.position.clone());
    }
}

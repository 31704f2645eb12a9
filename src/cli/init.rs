//! tb init command implementation
//!
//! Creates an empty board file and, on request, a default `.taskboard.toml`.

use std::path::PathBuf;

use crate::cli::{resolve_board, CommandContext, GlobalOptions};
use crate::config::{Config, CONFIG_FILE};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::session::BoardSession;

pub struct InitOptions {
    pub force: bool,
    pub write_config: bool,
    pub global: GlobalOptions,
}

#[derive(serde::Serialize)]
struct InitReport {
    board: PathBuf,
    replaced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<PathBuf>,
}

pub fn run(options: InitOptions) -> Result<()> {
    let resolved = resolve_board(options.global.board.clone())?;
    let path = resolved.path;
    let replaced = path.exists();
    if replaced && !options.force {
        return Err(Error::InvalidArgument(format!(
            "board already exists: {} (use --force to replace it)",
            path.display()
        )));
    }

    let config_path = if options.write_config {
        ensure_config()?
    } else {
        None
    };

    let session = BoardSession::create(path.clone());
    let mut ctx = CommandContext::with_session(session, resolved.config, options.global)?;
    if let Some(warning) = resolved.config_warning {
        ctx.push_warning(warning);
    }
    ctx.save()?;

    let report = InitReport {
        board: path.clone(),
        replaced,
        config: config_path.clone(),
    };

    let header = if replaced {
        "tb init: board replaced"
    } else {
        "tb init: board created"
    };
    let mut human = HumanOutput::new(header);
    ctx.finish_output(&mut human);
    human.push_summary("board", path.display().to_string());
    if let Some(config_path) = config_path {
        human.push_detail(format!("created {}", config_path.display()));
    }
    human.push_next_step("tb dev add <name>");
    human.push_next_step("tb task add <title>");

    emit_success(ctx.output(), "init", &report, Some(&human))
}

/// Write the default config into the working directory unless one exists.
fn ensure_config() -> Result<Option<PathBuf>> {
    let path = std::env::current_dir()?.join(CONFIG_FILE);
    if path.exists() {
        return Ok(None);
    }
    Config::default().save(&path)?;
    Ok(Some(path))
}

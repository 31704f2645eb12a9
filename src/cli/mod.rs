//! Command-line interface for tb
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::events::{EventDestination, EventSink};
use crate::output::{HumanOutput, OutputOptions};
use crate::session::BoardSession;

mod board;
mod dev;
mod init;
mod task;

/// tb - Kanban task board
///
/// Tracks tasks through Backlog, Assigned, InProgress, Review and Done,
/// with developers, deadlines and a per-task history, stored as one JSON file.
#[derive(Parser, Debug)]
#[command(name = "tb")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Board file (defaults to board.file from .taskboard.toml)
    #[arg(long, global = true, env = "TASKBOARD_FILE")]
    pub board: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Write board events as JSON lines to a file, or `-` for stdout
    #[arg(long, global = true)]
    pub events: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new empty board file
    Init {
        /// Replace an existing board file
        #[arg(long)]
        force: bool,

        /// Also write a default .taskboard.toml if none exists
        #[arg(long)]
        config: bool,
    },

    /// Board statistics
    Stats,

    /// Tasks that need attention (unassigned work, missed deadlines)
    Warnings,

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Developer management
    #[command(subcommand)]
    Dev(DevCommands),
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task in the backlog
    Add {
        /// Task title
        title: String,

        /// Task description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Deadline as YYYY-MM-DD or an RFC 3339 timestamp
        #[arg(long, conflicts_with = "deadline_in")]
        deadline: Option<String>,

        /// Deadline in N days (default from deadlines.default_offset_days)
        #[arg(long, num_args = 0..=1, value_name = "DAYS")]
        deadline_in: Option<Option<i64>>,

        /// Assign to a developer id
        #[arg(long, value_name = "DEV_ID")]
        assign: Option<i64>,

        /// Initial status
        #[arg(long)]
        status: Option<String>,
    },

    /// List tasks
    List {
        /// Only tasks in this status
        #[arg(long)]
        status: Option<String>,

        /// Only tasks assigned to this developer id
        #[arg(long, value_name = "DEV_ID")]
        developer: Option<i64>,

        /// Case-insensitive title search
        #[arg(long)]
        search: Option<String>,

        /// Only tasks without a developer
        #[arg(long)]
        unassigned: bool,

        /// Only overdue tasks
        #[arg(long)]
        overdue: bool,
    },

    /// Show a task with its history
    Show {
        /// Task id
        id: i64,
    },

    /// Edit task fields
    Edit {
        /// Task id
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        status: Option<String>,
    },

    /// Put a task in a status column
    Move {
        /// Task id
        id: i64,

        /// Target status (backlog, assigned, in_progress, review, done)
        status: String,
    },

    /// Move a task to the next status
    Advance {
        /// Task id
        id: i64,
    },

    /// Assign a task to a developer
    Assign {
        /// Task id
        id: i64,

        /// Developer id
        developer: i64,
    },

    /// Remove the developer from a task
    Unassign {
        /// Task id
        id: i64,
    },

    /// Set or clear a task deadline
    Deadline {
        /// Task id
        id: i64,

        /// Deadline as YYYY-MM-DD or an RFC 3339 timestamp
        #[arg(conflicts_with_all = ["days", "clear"])]
        when: Option<String>,

        /// Deadline in N days
        #[arg(long = "in", value_name = "DAYS", conflicts_with = "clear")]
        days: Option<i64>,

        /// Remove the deadline
        #[arg(long)]
        clear: bool,
    },

    /// Delete a task
    Rm {
        /// Task id
        id: i64,
    },

    /// Show the history of a task
    History {
        /// Task id
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum DevCommands {
    /// Add a developer
    Add {
        /// Developer name
        name: String,

        /// Position or role
        #[arg(short, long, default_value = "")]
        position: String,
    },

    /// List developers
    List,

    /// Edit a developer
    Edit {
        /// Developer id
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        position: Option<String>,
    },

    /// Remove a developer and unassign their tasks
    Rm {
        /// Developer id
        id: i64,
    },
}

/// Flags shared by every command.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub board: Option<PathBuf>,
    pub events: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let global = GlobalOptions {
            board: self.board,
            events: self.events,
            json: self.json,
            quiet: self.quiet,
        };

        match self.command {
            Commands::Init { force, config } => init::run(init::InitOptions {
                force,
                write_config: config,
                global,
            }),
            Commands::Stats => board::run_stats(global),
            Commands::Warnings => board::run_warnings(global),
            Commands::Task(cmd) => match cmd {
                TaskCommands::Add {
                    title,
                    description,
                    deadline,
                    deadline_in,
                    assign,
                    status,
                } => task::run_add(task::AddOptions {
                    title,
                    description,
                    deadline,
                    deadline_in,
                    assign,
                    status,
                    global,
                }),
                TaskCommands::List {
                    status,
                    developer,
                    search,
                    unassigned,
                    overdue,
                } => task::run_list(task::ListOptions {
                    status,
                    developer,
                    search,
                    unassigned,
                    overdue,
                    global,
                }),
                TaskCommands::Show { id } => task::run_show(id, global),
                TaskCommands::Edit {
                    id,
                    title,
                    description,
                    status,
                } => task::run_edit(task::EditOptions {
                    id,
                    title,
                    description,
                    status,
                    global,
                }),
                TaskCommands::Move { id, status } => task::run_move(id, status, global),
                TaskCommands::Advance { id } => task::run_advance(id, global),
                TaskCommands::Assign { id, developer } => task::run_assign(id, developer, global),
                TaskCommands::Unassign { id } => task::run_unassign(id, global),
                TaskCommands::Deadline {
                    id,
                    when,
                    days,
                    clear,
                } => task::run_deadline(task::DeadlineOptions {
                    id,
                    when,
                    days,
                    clear,
                    global,
                }),
                TaskCommands::Rm { id } => task::run_rm(id, global),
                TaskCommands::History { id } => task::run_history(id, global),
            },
            Commands::Dev(cmd) => match cmd {
                DevCommands::Add { name, position } => dev::run_add(&name, &position, global),
                DevCommands::List => dev::run_list(global),
                DevCommands::Edit { id, name, position } => dev::run_edit(dev::EditOptions {
                    id,
                    name,
                    position,
                    global,
                }),
                DevCommands::Rm { id } => dev::run_rm(id, global),
            },
        }
    }
}

/// An open board plus everything a command needs to report on it.
pub(crate) struct CommandContext {
    pub session: BoardSession,
    pub config: Config,
    sink: Option<EventSink>,
    events_to_stdout: bool,
    json: bool,
    quiet: bool,
    warnings: Vec<String>,
}

impl CommandContext {
    /// Open the board an existing-board command works on.
    pub fn open(global: GlobalOptions) -> Result<Self> {
        let resolved = resolve_board(global.board.clone())?;
        let session = match BoardSession::open(resolved.path) {
            Ok(session) => session,
            Err(err) => {
                // The command output that would carry this never gets built.
                if let Some(warning) = &resolved.config_warning {
                    eprintln!("warning: {warning}");
                }
                return Err(err);
            }
        };
        let mut ctx = Self::with_session(session, resolved.config, global)?;
        ctx.warnings.extend(resolved.config_warning);
        Ok(ctx)
    }

    pub fn with_session(session: BoardSession, config: Config, global: GlobalOptions) -> Result<Self> {
        let (sink, events_to_stdout) = open_event_sink(global.events.as_deref())?;
        Ok(Self {
            session,
            config,
            sink,
            events_to_stdout,
            json: global.json,
            quiet: global.quiet,
            warnings: Vec::new(),
        })
    }

    pub fn push_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn save(&mut self) -> Result<()> {
        self.session.save()
    }

    /// Attach collected warnings and forward queued session events to the
    /// sink. Sink failures become warnings on the command output rather than
    /// failing the command.
    pub fn finish_output(&mut self, human: &mut HumanOutput) {
        for warning in self.warnings.drain(..) {
            human.push_warning(warning);
        }
        let events = self.session.drain_events();
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        if let Err(err) = sink.emit_all(&events) {
            human.push_warning(format!("event output failed: {err}"));
        }
    }

    pub fn output(&self) -> OutputOptions {
        OutputOptions {
            json: self.json && !self.events_to_stdout,
            quiet: self.quiet || self.events_to_stdout,
        }
    }
}

/// Board file and config a command runs with.
pub(crate) struct ResolvedBoard {
    pub path: PathBuf,
    pub config: Config,
    /// Set when `.taskboard.toml` exists but was ignored.
    pub config_warning: Option<String>,
}

/// Board path from `--board`/`TASKBOARD_FILE`, else from the config in the
/// working directory.
pub(crate) fn resolve_board(board: Option<PathBuf>) -> Result<ResolvedBoard> {
    let cwd = std::env::current_dir()?;
    let (config, config_warning) = Config::load_from_dir_reporting(&cwd);
    let path = match board {
        Some(path) if path.as_os_str().is_empty() => {
            return Err(Error::InvalidArgument("--board cannot be empty".to_string()));
        }
        Some(path) => path,
        None => config.board.file.clone(),
    };
    Ok(ResolvedBoard {
        path,
        config,
        config_warning,
    })
}

fn open_event_sink(events: Option<&str>) -> Result<(Option<EventSink>, bool)> {
    let destination = EventDestination::parse(events);
    let sink = destination.as_ref().map(|dest| dest.open()).transpose()?;
    let events_to_stdout = matches!(destination, Some(EventDestination::Stdout));
    Ok((sink, events_to_stdout))
}

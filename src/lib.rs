//! taskboard - Kanban task board library
//!
//! This library provides the board domain model behind the `tb` CLI:
//! developers, tasks moving through a fixed status workflow, a per-task
//! audit history and a JSON file format that round-trips the whole board.
//!
//! # Core Concepts
//!
//! - **Tasks**: title, description, status, optional assignee and deadline,
//!   plus an append-only history that records every effective change
//! - **Developers**: people tasks are assigned to
//! - **Board**: owns both collections and the id counters that number them
//! - **Session**: a board bound to its file, queueing events for observers
//!
//! # Module Organization
//!
//! - `board`: the aggregate, queries and cascading removal
//! - `cli`: Command-line interface using clap
//! - `codec`: board <-> JSON document
//! - `config`: Configuration loading from `.taskboard.toml`
//! - `developer`, `task`: the entities
//! - `error`: Error types and result aliases
//! - `events`: JSON-lines event output
//! - `ids`: id allocation
//! - `output`: human and JSON command output
//! - `session`: collaborator-facing operations
//! - `stats`: board statistics
//! - `storage`: atomic file writes

pub mod board;
pub mod cli;
pub mod codec;
pub mod config;
pub mod developer;
pub mod error;
pub mod events;
pub mod ids;
pub mod output;
pub mod session;
pub mod stats;
pub mod storage;
pub mod task;

pub use board::Board;
pub use developer::{Developer, DeveloperId};
pub use error::{Error, Result};
pub use session::{BoardSession, TaskEdit};
pub use task::{Task, TaskHistoryEntry, TaskId, TaskStatus};

//! A board bound to its file, with the operations a front end drives.
//!
//! Every operation that changes the board queues an [`Event`]; callers drain
//! the queue and forward it to an [`EventSink`](crate::events::EventSink).
//! Lookups that miss surface as [`Error::TaskNotFound`] or
//! [`Error::DeveloperNotFound`], and a rejected operation leaves both the
//! board and the queue untouched.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::board::Board;
use crate::developer::DeveloperId;
use crate::error::{Error, Result};
use crate::events::{Event, EventKind};
use crate::task::{Task, TaskId, TaskStatus};

/// Field changes applied by [`BoardSession::edit_task`]. `None` leaves a
/// field alone; the nested options clear a deadline or an assignee.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub deadline: Option<Option<DateTime<Utc>>>,
    pub assignee: Option<Option<DeveloperId>>,
}

impl TaskEdit {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.deadline.is_none()
            && self.assignee.is_none()
    }
}

#[derive(Debug)]
pub struct BoardSession {
    path: PathBuf,
    board: Board,
    events: Vec<Event>,
}

impl BoardSession {
    /// Start an empty board that will be saved to `path`. Nothing is written
    /// until [`BoardSession::save`].
    pub fn create(path: impl Into<PathBuf>) -> Self {
        let mut session = Self {
            path: path.into(),
            board: Board::new(),
            events: Vec::new(),
        };
        let data = json!({ "path": session.path.to_string_lossy() });
        session.push(EventKind::BoardCreated, data);
        session
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut board = Board::new();
        board.load_from_file(&path)?;

        let mut session = Self {
            path,
            board,
            events: Vec::new(),
        };
        let data = json!({
            "path": session.path.to_string_lossy(),
            "tasks": session.board.task_count(),
            "developers": session.board.developer_count(),
        });
        session.push(EventKind::BoardLoaded, data);
        Ok(session)
    }

    pub fn open_or_create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.exists() {
            Self::open(path)
        } else {
            Ok(Self::create(path))
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn save(&mut self) -> Result<()> {
        self.board.save_to_file(&self.path)?;
        let data = json!({
            "path": self.path.to_string_lossy(),
            "tasks": self.board.task_count(),
            "developers": self.board.developer_count(),
        });
        self.push(EventKind::BoardSaved, data);
        Ok(())
    }

    /// End the session and hand back everything still queued, ending with
    /// `BoardClosed`. Unsaved changes are dropped.
    pub fn close(mut self) -> Vec<Event> {
        let data = json!({ "path": self.path.to_string_lossy() });
        self.push(EventKind::BoardClosed, data);
        self.events
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    pub fn add_task(
        &mut self,
        title: &str,
        description: &str,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<TaskId> {
        let title = required_text("title", title)?;
        let mut task = self.board.new_task(title, description);
        task.set_deadline(deadline);
        let id = task.id();
        let data = json!({
            "task_id": id.get(),
            "title": task.title(),
            "status": task.status(),
        });
        self.board.add_task(task)?;
        tracing::debug!(task_id = %id, "task added");
        self.push(EventKind::TaskCreated, data);
        Ok(id)
    }

    /// Apply an edit. Returns the history actions it recorded; an edit that
    /// changes nothing records nothing and queues no event.
    pub fn edit_task(&mut self, id: TaskId, edit: TaskEdit) -> Result<Vec<String>> {
        let title = edit
            .title
            .as_deref()
            .map(|title| required_text("title", title))
            .transpose()?;
        if let Some(Some(developer)) = edit.assignee {
            self.require_developer(developer)?;
        }

        let task = self.task_mut(id)?;
        let before = task.history().len();
        if let Some(title) = title {
            task.set_title(title);
        }
        if let Some(description) = edit.description {
            task.set_description(description);
        }
        if let Some(status) = edit.status {
            task.set_status(status);
        }
        if let Some(deadline) = edit.deadline {
            task.set_deadline(deadline);
        }
        match edit.assignee {
            Some(Some(developer)) => task.assign_to_developer(developer),
            Some(None) => task.unassign(),
            None => {}
        }
        let changes: Vec<String> = task.history()[before..]
            .iter()
            .map(|entry| entry.action().to_string())
            .collect();

        if !changes.is_empty() {
            tracing::debug!(task_id = %id, changes = changes.len(), "task edited");
            self.push(
                EventKind::TaskEdited,
                json!({ "task_id": id.get(), "changes": changes }),
            );
        }
        Ok(changes)
    }

    /// Put a task in a status column. Returns false when it was already there.
    pub fn move_task(&mut self, id: TaskId, status: TaskStatus) -> Result<bool> {
        let task = self.task_mut(id)?;
        let from = task.status();
        if from == status {
            return Ok(false);
        }
        task.set_status(status);
        tracing::debug!(task_id = %id, %from, to = %status, "task moved");
        self.push(
            EventKind::TaskMoved,
            json!({ "task_id": id.get(), "from": from, "to": status }),
        );
        Ok(true)
    }

    /// Move a task one step along Backlog → Assigned → InProgress → Review →
    /// Done. A done task stays done and `None` is returned.
    pub fn advance_task(&mut self, id: TaskId) -> Result<Option<TaskStatus>> {
        let current = self.task(id)?.status();
        match current.next() {
            Some(next) => {
                self.move_task(id, next)?;
                Ok(Some(next))
            }
            None => Ok(None),
        }
    }

    pub fn assign_task(&mut self, id: TaskId, developer: DeveloperId) -> Result<bool> {
        self.require_developer(developer)?;
        let task = self.task_mut(id)?;
        if task.assigned_developer() == Some(developer) {
            return Ok(false);
        }
        task.assign_to_developer(developer);
        self.push(
            EventKind::TaskAssigned,
            json!({ "task_id": id.get(), "developer_id": developer.get() }),
        );
        Ok(true)
    }

    pub fn unassign_task(&mut self, id: TaskId) -> Result<bool> {
        let task = self.task_mut(id)?;
        let Some(previous) = task.assigned_developer() else {
            return Ok(false);
        };
        task.unassign();
        self.push(
            EventKind::TaskUnassigned,
            json!({ "task_id": id.get(), "developer_id": previous.get() }),
        );
        Ok(true)
    }

    pub fn delete_task(&mut self, id: TaskId) -> Result<()> {
        let title = self.task(id)?.title().to_string();
        self.board.remove_task(id);
        tracing::debug!(task_id = %id, "task deleted");
        self.push(
            EventKind::TaskDeleted,
            json!({ "task_id": id.get(), "title": title }),
        );
        Ok(())
    }

    pub fn task(&self, id: TaskId) -> Result<&Task> {
        self.board.task(id).ok_or(Error::TaskNotFound(id))
    }

    // =========================================================================
    // Developers
    // =========================================================================

    pub fn add_developer(&mut self, name: &str, position: &str) -> Result<DeveloperId> {
        let name = required_text("name", name)?;
        let developer = self.board.new_developer(name, position.trim());
        let id = developer.id();
        let data = json!({
            "developer_id": id.get(),
            "name": developer.name(),
            "position": developer.position(),
        });
        self.board.add_developer(developer)?;
        self.push(EventKind::DeveloperAdded, data);
        Ok(id)
    }

    /// Returns false when neither field actually changed.
    pub fn edit_developer(
        &mut self,
        id: DeveloperId,
        name: Option<&str>,
        position: Option<&str>,
    ) -> Result<bool> {
        let name = name.map(|name| required_text("name", name)).transpose()?;
        let developer = self
            .board
            .developer_mut(id)
            .ok_or(Error::DeveloperNotFound(id))?;

        let mut changed = false;
        if let Some(name) = name {
            if developer.name() != name {
                developer.set_name(name);
                changed = true;
            }
        }
        if let Some(position) = position.map(str::trim) {
            if developer.position() != position {
                developer.set_position(position);
                changed = true;
            }
        }
        if changed {
            let data = json!({
                "developer_id": id.get(),
                "name": developer.name(),
                "position": developer.position(),
            });
            self.push(EventKind::DeveloperEdited, data);
        }
        Ok(changed)
    }

    /// Remove a developer. Returns the tasks that lost their assignee.
    pub fn remove_developer(&mut self, id: DeveloperId) -> Result<Vec<TaskId>> {
        self.require_developer(id)?;
        let unassigned: Vec<TaskId> = self.board.tasks_by_developer(id).map(Task::id).collect();
        self.board.remove_developer(id);
        let task_ids: Vec<i64> = unassigned.iter().map(|task| task.get()).collect();
        self.push(
            EventKind::DeveloperRemoved,
            json!({ "developer_id": id.get(), "unassigned_tasks": task_ids }),
        );
        Ok(unassigned)
    }

    fn require_developer(&self, id: DeveloperId) -> Result<()> {
        match self.board.developer(id) {
            Some(_) => Ok(()),
            None => Err(Error::DeveloperNotFound(id)),
        }
    }

    fn task_mut(&mut self, id: TaskId) -> Result<&mut Task> {
        self.board.task_mut(id).ok_or(Error::TaskNotFound(id))
    }

    fn push(&mut self, kind: EventKind, data: serde_json::Value) {
        let mut event = Event::new(kind);
        event.data = Some(data);
        self.events.push(event);
    }
}

fn required_text<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument(format!("{field} cannot be empty")));
    }
    Ok(trimmed)
}

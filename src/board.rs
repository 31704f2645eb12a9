//! The board aggregate.
//!
//! A [`Board`] exclusively owns its tasks and developers and the
//! [`IdAllocator`] that numbers them. Both collections keep insertion order,
//! which is the canonical iteration order for every query.
//!
//! Lookups hand out borrows of the live collections. A `&mut Task` obtained
//! from [`Board::task_mut`] or [`Board::tasks_by_status_mut`] edits the task
//! stored in the board, so later queries observe the change; the borrow
//! checker keeps such handles from outliving a structural change such as
//! [`Board::remove_task`].

use std::path::Path;

use crate::codec;
use crate::developer::{Developer, DeveloperId};
use crate::error::{Error, Result};
use crate::ids::{self, IdAllocator};
use crate::task::{Task, TaskId, TaskStatus};

#[derive(Debug, Clone, Default)]
pub struct Board {
    developers: Vec<Developer>,
    tasks: Vec<Task>,
    ids: IdAllocator,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator used by [`Task::create`] and [`Developer::create`].
    pub fn ids(&mut self) -> &mut IdAllocator {
        &mut self.ids
    }

    /// Create a task with the next id. The task is not added to the board.
    pub fn new_task(&mut self, title: impl Into<String>, description: impl Into<String>) -> Task {
        Task::create(&mut self.ids, title, description)
    }

    /// Create a developer with the next id. The developer is not added to
    /// the board.
    pub fn new_developer(
        &mut self,
        name: impl Into<String>,
        position: impl Into<String>,
    ) -> Developer {
        Developer::create(&mut self.ids, name, position)
    }

    // =========================================================================
    // Developers
    // =========================================================================

    /// Append a developer. A developer whose id is already on the board, or is
    /// past [`ids::MAX_ID`], is rejected and the board is left unchanged.
    pub fn add_developer(&mut self, developer: Developer) -> Result<()> {
        if !ids::in_range(developer.id().get()) {
            return Err(Error::IdOutOfRange {
                kind: "developer",
                id: developer.id().get(),
            });
        }
        if self.developer(developer.id()).is_some() {
            tracing::warn!(id = %developer.id(), "rejected duplicate developer id");
            return Err(Error::DuplicateId {
                kind: "developer",
                id: developer.id().get(),
            });
        }
        self.ids.observe_developer_id(developer.id());
        tracing::debug!(id = %developer.id(), name = developer.name(), "developer added");
        self.developers.push(developer);
        Ok(())
    }

    /// Remove a developer and unassign every task that pointed at it.
    /// Returns false, changing nothing, when the id is unknown.
    pub fn remove_developer(&mut self, id: DeveloperId) -> bool {
        let Some(index) = self.developers.iter().position(|dev| dev.id() == id) else {
            return false;
        };
        for task in self.tasks_by_developer_mut(id) {
            task.unassign();
        }
        self.developers.remove(index);
        tracing::debug!(%id, "developer removed");
        true
    }

    pub fn developer(&self, id: DeveloperId) -> Option<&Developer> {
        self.developers.iter().find(|dev| dev.id() == id)
    }

    pub fn developer_mut(&mut self, id: DeveloperId) -> Option<&mut Developer> {
        self.developers.iter_mut().find(|dev| dev.id() == id)
    }

    pub fn developers(&self) -> &[Developer] {
        &self.developers
    }

    pub fn developer_count(&self) -> usize {
        self.developers.len()
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    /// Append a task. A task whose id is already on the board, or is past
    /// [`ids::MAX_ID`], is rejected and the board is left unchanged.
    pub fn add_task(&mut self, task: Task) -> Result<()> {
        if !ids::in_range(task.id().get()) {
            return Err(Error::IdOutOfRange {
                kind: "task",
                id: task.id().get(),
            });
        }
        if self.task(task.id()).is_some() {
            tracing::warn!(id = %task.id(), "rejected duplicate task id");
            return Err(Error::DuplicateId {
                kind: "task",
                id: task.id().get(),
            });
        }
        self.ids.observe_task_id(task.id());
        tracing::debug!(id = %task.id(), title = task.title(), "task added");
        self.tasks.push(task);
        Ok(())
    }

    /// Remove a task. Returns false when the id is unknown.
    pub fn remove_task(&mut self, id: TaskId) -> bool {
        let Some(index) = self.tasks.iter().position(|task| task.id() == id) else {
            return false;
        };
        self.tasks.remove(index);
        tracing::debug!(%id, "task removed");
        true
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id() == id)
    }

    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id() == id)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn tasks_by_status(&self, status: TaskStatus) -> impl Iterator<Item = &Task> + '_ {
        self.tasks.iter().filter(move |task| task.status() == status)
    }

    pub fn tasks_by_status_mut(
        &mut self,
        status: TaskStatus,
    ) -> impl Iterator<Item = &mut Task> + '_ {
        self.tasks.iter_mut().filter(move |task| task.status() == status)
    }

    pub fn tasks_by_developer(&self, id: DeveloperId) -> impl Iterator<Item = &Task> + '_ {
        self.tasks
            .iter()
            .filter(move |task| task.assigned_developer() == Some(id))
    }

    pub fn tasks_by_developer_mut(
        &mut self,
        id: DeveloperId,
    ) -> impl Iterator<Item = &mut Task> + '_ {
        self.tasks
            .iter_mut()
            .filter(move |task| task.assigned_developer() == Some(id))
    }

    /// Tasks whose title contains `query`, ignoring case.
    pub fn search_tasks<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a Task> + 'a {
        self.tasks.iter().filter(move |task| task.matches_search(query))
    }

    /// True if some task outside the backlog has nobody assigned.
    pub fn has_unassigned_tasks(&self) -> bool {
        self.tasks
            .iter()
            .any(|task| !task.is_assigned() && task.status() != TaskStatus::Backlog)
    }

    /// Drop every task and developer. Id counters keep their values.
    pub fn clear(&mut self) {
        self.developers.clear();
        self.tasks.clear();
    }

    /// Swap in freshly decoded collections. Callers must have validated
    /// id uniqueness.
    pub(crate) fn replace_contents(&mut self, developers: Vec<Developer>, tasks: Vec<Task>) {
        self.clear();
        for developer in &developers {
            self.ids.observe_developer_id(developer.id());
        }
        for task in &tasks {
            self.ids.observe_task_id(task.id());
        }
        self.developers = developers;
        self.tasks = tasks;
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Write the board to `path` as JSON.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        codec::save_to_file(path, self)
    }

    /// Replace the board's contents with the board stored at `path`. On
    /// failure the board is unchanged.
    pub fn load_from_file(&mut self, path: &Path) -> Result<()> {
        codec::load_from_file(path, self)
    }
}

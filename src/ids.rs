//! Per-board identity allocation.
//!
//! Every board owns one [`IdAllocator`]. Task and developer ids are drawn from
//! separate counters that only ever move forward; loading a board advances
//! them past every id seen so new entities never collide with loaded ones.
//!
//! `i64::MAX` is never a valid id. Boards reject it on add and on load, so a
//! counter that reaches it has run out and every id it issues is refused.

use crate::developer::DeveloperId;
use crate::task::TaskId;

const FIRST_ID: i64 = 1;

/// Largest id a board accepts.
pub const MAX_ID: i64 = i64::MAX - 1;

/// True if `id` can be stored on a board.
pub fn in_range(id: i64) -> bool {
    id <= MAX_ID
}

/// Monotonic id counters for tasks and developers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    next_task: i64,
    next_developer: i64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            next_task: FIRST_ID,
            next_developer: FIRST_ID,
        }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next task id. Once the counter has run out this keeps
    /// returning `i64::MAX`, which no board accepts.
    pub fn next_task_id(&mut self) -> TaskId {
        TaskId::new(issue(&mut self.next_task))
    }

    /// Issue the next developer id. Runs out the same way as task ids.
    pub fn next_developer_id(&mut self) -> DeveloperId {
        DeveloperId::new(issue(&mut self.next_developer))
    }

    pub fn tasks_exhausted(&self) -> bool {
        !in_range(self.next_task)
    }

    pub fn developers_exhausted(&self) -> bool {
        !in_range(self.next_developer)
    }

    /// Make sure future task ids are greater than `id`.
    pub fn observe_task_id(&mut self, id: TaskId) {
        self.next_task = advance(self.next_task, id.get());
    }

    /// Make sure future developer ids are greater than `id`.
    pub fn observe_developer_id(&mut self, id: DeveloperId) {
        self.next_developer = advance(self.next_developer, id.get());
    }

    /// The value the next task id will take.
    pub fn peek_task_id(&self) -> TaskId {
        TaskId::new(self.next_task)
    }

    /// The value the next developer id will take.
    pub fn peek_developer_id(&self) -> DeveloperId {
        DeveloperId::new(self.next_developer)
    }
}

fn issue(counter: &mut i64) -> i64 {
    let id = *counter;
    if let Some(next) = id.checked_add(1) {
        *counter = next;
    }
    id
}

fn advance(current: i64, seen: i64) -> i64 {
    match seen.checked_add(1) {
        Some(next) => current.max(next),
        None => i64::MAX,
    }
}

//! Board statistics: status counts, completion and deadline urgency.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::board::Board;
use crate::developer::DeveloperId;
use crate::task::TaskStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopDeveloper {
    pub id: DeveloperId,
    pub name: String,
    pub task_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardStats {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub backlog: usize,
    pub assigned: usize,
    pub in_progress: usize,
    pub review: usize,
    pub done: usize,
    pub percent_done: usize,
    pub overdue: usize,
    pub due_today: usize,
    pub due_soon: usize,
    pub soon_days: i64,
    pub developers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_developer: Option<TopDeveloper>,
    pub has_unassigned_tasks: bool,
}

impl BoardStats {
    pub fn compute(board: &Board, soon_days: i64) -> Self {
        Self::compute_at(board, Utc::now(), soon_days)
    }

    /// Statistics as seen at `now`. Deadline buckets only count tasks that
    /// have a deadline and are not done; each such task lands in at most one
    /// bucket.
    pub fn compute_at(board: &Board, now: DateTime<Utc>, soon_days: i64) -> Self {
        let mut stats = BoardStats {
            generated_at: now,
            total: board.task_count(),
            backlog: 0,
            assigned: 0,
            in_progress: 0,
            review: 0,
            done: 0,
            percent_done: 0,
            overdue: 0,
            due_today: 0,
            due_soon: 0,
            soon_days,
            developers: board.developer_count(),
            top_developer: top_developer(board),
            has_unassigned_tasks: board.has_unassigned_tasks(),
        };

        for task in board.tasks() {
            match task.status() {
                TaskStatus::Backlog => stats.backlog += 1,
                TaskStatus::Assigned => stats.assigned += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Review => stats.review += 1,
                TaskStatus::Done => stats.done += 1,
            }

            if !task.has_deadline() || task.status() == TaskStatus::Done {
                continue;
            }
            if task.is_overdue_at(now) {
                stats.overdue += 1;
                continue;
            }
            match task.days_until_deadline_at(now) {
                0 => stats.due_today += 1,
                days if (1..=soon_days).contains(&days) => stats.due_soon += 1,
                _ => {}
            }
        }

        if stats.total > 0 {
            stats.percent_done = stats.done * 100 / stats.total;
        }
        stats
    }

    /// `(status, count)` pairs in workflow order.
    pub fn status_counts(&self) -> [(TaskStatus, usize); 5] {
        [
            (TaskStatus::Backlog, self.backlog),
            (TaskStatus::Assigned, self.assigned),
            (TaskStatus::InProgress, self.in_progress),
            (TaskStatus::Review, self.review),
            (TaskStatus::Done, self.done),
        ]
    }
}

/// First developer with the strictly highest number of assigned tasks.
fn top_developer(board: &Board) -> Option<TopDeveloper> {
    let mut best: Option<TopDeveloper> = None;
    for developer in board.developers() {
        let task_count = board.tasks_by_developer(developer.id()).count();
        let beats = match &best {
            Some(current) => task_count > current.task_count,
            None => task_count > 0,
        };
        if beats {
            best = Some(TopDeveloper {
                id: developer.id(),
                name: developer.name().to_string(),
                task_count,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn add_task(board: &mut Board, title: &str, status: TaskStatus, deadline: Option<DateTime<Utc>>) {
        let mut task = board.new_task(title, "");
        task.set_status(status);
        task.set_deadline(deadline);
        board.add_task(task).unwrap();
    }

    #[test]
    fn empty_board_has_zero_percent() {
        let stats = BoardStats::compute_at(&Board::new(), noon(), 3);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.percent_done, 0);
        assert!(stats.top_developer.is_none());
        assert!(!stats.has_unassigned_tasks);
    }

    #[test]
    fn counts_statuses_and_floors_percent() {
        let mut board = Board::new();
        add_task(&mut board, "a", TaskStatus::Backlog, None);
        add_task(&mut board, "b", TaskStatus::InProgress, None);
        add_task(&mut board, "c", TaskStatus::Done, None);

        let stats = BoardStats::compute_at(&board, noon(), 3);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.backlog, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.done, 1);
        assert_eq!(stats.percent_done, 33);
        assert!(stats.has_unassigned_tasks);
    }

    #[test]
    fn deadline_buckets_skip_done_tasks() {
        let now = noon();
        let mut board = Board::new();
        add_task(&mut board, "late", TaskStatus::InProgress, Some(now - Duration::days(2)));
        add_task(&mut board, "earlier today", TaskStatus::Backlog, Some(now - Duration::hours(1)));
        add_task(&mut board, "tonight", TaskStatus::Backlog, Some(now + Duration::hours(6)));
        add_task(&mut board, "soon", TaskStatus::Review, Some(now + Duration::days(3)));
        add_task(&mut board, "later", TaskStatus::Review, Some(now + Duration::days(4)));
        add_task(&mut board, "finished late", TaskStatus::Done, Some(now - Duration::days(5)));

        let stats = BoardStats::compute_at(&board, now, 3);
        assert_eq!(stats.overdue, 2);
        assert_eq!(stats.due_today, 1);
        assert_eq!(stats.due_soon, 1);
    }

    #[test]
    fn top_developer_is_first_with_strict_maximum() {
        let mut board = Board::new();
        let alice = board.new_developer("Alice", "Dev");
        let bob = board.new_developer("Bob", "QA");
        let (alice_id, bob_id) = (alice.id(), bob.id());
        board.add_developer(alice).unwrap();
        board.add_developer(bob).unwrap();

        for (title, dev) in [("one", alice_id), ("two", bob_id)] {
            let mut task = board.new_task(title, "");
            task.assign_to_developer(dev);
            board.add_task(task).unwrap();
        }

        let stats = BoardStats::compute_at(&board, noon(), 3);
        let top = stats.top_developer.clone().unwrap();
        assert_eq!(top.name, "Alice");
        assert_eq!(top.task_count, 1);

        let mut task = board.new_task("three", "");
        task.assign_to_developer(bob_id);
        board.add_task(task).unwrap();
        let stats = BoardStats::compute_at(&board, noon(), 3);
        assert_eq!(stats.top_developer.unwrap().id, bob_id);
        assert_eq!(stats.developers, 2);
    }

    #[test]
    fn status_counts_follow_workflow_order() {
        let mut board = Board::new();
        add_task(&mut board, "a", TaskStatus::Review, None);
        let stats = BoardStats::compute_at(&board, noon(), 3);
        let counts = stats.status_counts();
        assert_eq!(counts[0], (TaskStatus::Backlog, 0));
        assert_eq!(counts[3], (TaskStatus::Review, 1));
    }
}

//! Tasks, their workflow status and their audit history.
//!
//! A task records its own history: every mutator that actually changes a
//! field appends exactly one [`TaskHistoryEntry`]. Writing the current value
//! back is a no-op and leaves the history alone. The history is never
//! truncated or reordered.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::developer::DeveloperId;
use crate::error::{Error, Result};
use crate::ids::IdAllocator;

/// Returned by [`Task::days_until_deadline`] when no deadline is set.
pub const NO_DEADLINE_DAYS: i64 = 999;

/// Deadline rendering used in history details.
const DEADLINE_DETAIL_FORMAT: &str = "%d.%m.%Y";

/// History action labels.
pub mod actions {
    pub const CREATED: &str = "Created";
    pub const TITLE_CHANGED: &str = "Title changed";
    pub const DESCRIPTION_CHANGED: &str = "Description changed";
    pub const STATUS_CHANGED: &str = "Status changed";
    pub const ASSIGNED: &str = "Assigned";
    pub const UNASSIGNED: &str = "Unassigned";
    pub const DEADLINE_CHANGED: &str = "Deadline changed";
}

/// Identifier of a task within a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Workflow stage of a task.
///
/// The variants are ordered along the usual path
/// Backlog → Assigned → InProgress → Review → Done, but any transition is
/// allowed; the order is a convention for display and [`TaskStatus::next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaskStatus {
    Backlog,
    Assigned,
    InProgress,
    Review,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Backlog,
        TaskStatus::Assigned,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Done,
    ];

    /// Name used in board files.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Backlog => "Backlog",
            TaskStatus::Assigned => "Assigned",
            TaskStatus::InProgress => "InProgress",
            TaskStatus::Review => "Review",
            TaskStatus::Done => "Done",
        }
    }

    /// Decode a stored status name. Unknown names fall back to `Backlog`.
    pub fn from_stored(raw: &str) -> Self {
        Self::parse_exact(raw).unwrap_or(TaskStatus::Backlog)
    }

    /// The following stage on the usual path, `None` for `Done`.
    pub fn next(self) -> Option<Self> {
        match self {
            TaskStatus::Backlog => Some(TaskStatus::Assigned),
            TaskStatus::Assigned => Some(TaskStatus::InProgress),
            TaskStatus::InProgress => Some(TaskStatus::Review),
            TaskStatus::Review => Some(TaskStatus::Done),
            TaskStatus::Done => None,
        }
    }

    fn parse_exact(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == raw)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict, case-insensitive parse for user input (`in_progress`, `InProgress`
/// and `in-progress` are all accepted).
impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, '_' | '-' | ' '))
            .collect();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "unknown status '{raw}' (expected one of: backlog, assigned, in_progress, review, done)"
                ))
            })
    }
}

/// One immutable audit record on a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHistoryEntry {
    timestamp: Option<DateTime<Utc>>,
    action: String,
    details: String,
}

impl TaskHistoryEntry {
    fn now(action: &str, details: String) -> Self {
        Self {
            timestamp: Some(Utc::now()),
            action: action.to_string(),
            details,
        }
    }

    /// Rebuild an entry read from storage. A missing timestamp is kept as
    /// `None`, not treated as an error.
    pub fn restored(
        timestamp: Option<DateTime<Utc>>,
        action: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            action: action.into(),
            details: details.into(),
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn details(&self) -> &str {
        &self.details
    }
}

/// A unit of work on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    title: String,
    description: String,
    status: TaskStatus,
    assigned_developer: Option<DeveloperId>,
    deadline: Option<DateTime<Utc>>,
    history: Vec<TaskHistoryEntry>,
}

impl Task {
    /// Create a backlog task with a freshly allocated id and a single
    /// "Created" history entry.
    pub fn create(
        ids: &mut IdAllocator,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let created = TaskHistoryEntry::now(actions::CREATED, format!("Task '{title}' created"));
        Self {
            id: ids.next_task_id(),
            title,
            description: description.into(),
            status: TaskStatus::Backlog,
            assigned_developer: None,
            deadline: None,
            history: vec![created],
        }
    }

    /// Rebuild a task exactly as it was stored, history included.
    pub(crate) fn restore(
        id: TaskId,
        title: String,
        description: String,
        status: TaskStatus,
        assigned_developer: Option<DeveloperId>,
        deadline: Option<DateTime<Utc>>,
        history: Vec<TaskHistoryEntry>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            status,
            assigned_developer,
            deadline,
            history,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn assigned_developer(&self) -> Option<DeveloperId> {
        self.assigned_developer
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn history(&self) -> &[TaskHistoryEntry] {
        &self.history
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned_developer.is_some()
    }

    pub fn has_deadline(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        if self.title == title {
            return;
        }
        let details = format!("'{}' → '{}'", self.title, title);
        self.record(actions::TITLE_CHANGED, details);
        self.title = title;
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        let description = description.into();
        if self.description == description {
            return;
        }
        self.record(actions::DESCRIPTION_CHANGED, "Description updated".to_string());
        self.description = description;
    }

    pub fn set_status(&mut self, status: TaskStatus) {
        if self.status == status {
            return;
        }
        let details = format!("{} → {}", self.status, status);
        self.record(actions::STATUS_CHANGED, details);
        self.status = status;
    }

    /// Point the task at a developer. The id is not checked against any
    /// board; callers that care must look it up first.
    pub fn assign_to_developer(&mut self, developer: DeveloperId) {
        if self.assigned_developer == Some(developer) {
            return;
        }
        self.record(
            actions::ASSIGNED,
            format!("Assigned developer ID: {developer}"),
        );
        self.assigned_developer = Some(developer);
    }

    pub fn unassign(&mut self) {
        if self.assigned_developer.is_none() {
            return;
        }
        self.record(actions::UNASSIGNED, "Developer removed from task".to_string());
        self.assigned_developer = None;
    }

    pub fn set_deadline(&mut self, deadline: Option<DateTime<Utc>>) {
        if self.deadline == deadline {
            return;
        }
        let details = match deadline {
            Some(at) => format!("Deadline set: {}", at.format(DEADLINE_DETAIL_FORMAT)),
            None => "Deadline removed".to_string(),
        };
        self.record(actions::DEADLINE_CHANGED, details);
        self.deadline = deadline;
    }

    /// True when the deadline has passed and the task is not done.
    pub fn is_overdue(&self) -> bool {
        self.is_overdue_at(Utc::now())
    }

    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        match self.deadline {
            Some(deadline) => now > deadline && self.status != TaskStatus::Done,
            None => false,
        }
    }

    /// Calendar days (UTC) from today to the deadline date; negative once the
    /// deadline date is behind us, [`NO_DEADLINE_DAYS`] without a deadline.
    pub fn days_until_deadline(&self) -> i64 {
        self.days_until_deadline_at(Utc::now())
    }

    pub fn days_until_deadline_at(&self, now: DateTime<Utc>) -> i64 {
        match self.deadline {
            Some(deadline) => (deadline.date_naive() - now.date_naive()).num_days(),
            None => NO_DEADLINE_DAYS,
        }
    }

    /// Description cut to `max_chars` characters, with `...` when shortened.
    pub fn description_preview(&self, max_chars: usize) -> String {
        if self.description.chars().count() <= max_chars {
            return self.description.clone();
        }
        let mut preview: String = self.description.chars().take(max_chars).collect();
        preview.push_str("...");
        preview
    }

    /// Case-insensitive title match; an empty query matches every task.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&query.to_lowercase())
    }

    fn record(&mut self, action: &str, details: String) {
        tracing::debug!(task = %self.id, action, %details, "task history entry");
        self.history.push(TaskHistoryEntry::now(action, details));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn new_task(title: &str) -> Task {
        let mut ids = IdAllocator::new();
        Task::create(&mut ids, title, "")
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).single().expect("valid date")
    }

    #[test]
    fn create_starts_in_backlog_with_one_entry() {
        let mut ids = IdAllocator::new();
        let task = Task::create(&mut ids, "Test task", "Task description");

        assert_eq!(task.id().get(), 1);
        assert_eq!(task.title(), "Test task");
        assert_eq!(task.description(), "Task description");
        assert_eq!(task.status(), TaskStatus::Backlog);
        assert!(!task.is_assigned());
        assert!(!task.has_deadline());
        assert_eq!(task.history().len(), 1);
        assert_eq!(task.history()[0].action(), actions::CREATED);
        assert!(task.history()[0].details().contains("Test task"));
        assert!(task.history()[0].timestamp().is_some());
    }

    #[test]
    fn setters_record_changes_once() {
        let mut task = new_task("Old");
        task.set_title("New");
        task.set_description("Details");
        task.set_status(TaskStatus::Review);
        task.assign_to_developer(DeveloperId::new(3));
        task.unassign();

        let history = task.history();
        assert_eq!(history.len(), 6);
        assert_eq!(history[1].action(), actions::TITLE_CHANGED);
        assert_eq!(history[1].details(), "'Old' → 'New'");
        assert_eq!(history[2].action(), actions::DESCRIPTION_CHANGED);
        assert_eq!(history[3].details(), "Backlog → Review");
        assert_eq!(history[4].details(), "Assigned developer ID: 3");
        assert_eq!(history[5].action(), actions::UNASSIGNED);
    }

    #[test]
    fn no_op_writes_do_not_touch_history() {
        let mut task = new_task("Same");
        task.set_title("Same");
        task.set_description("");
        task.set_status(TaskStatus::Backlog);
        task.unassign();
        task.set_deadline(None);
        assert_eq!(task.history().len(), 1);

        task.assign_to_developer(DeveloperId::new(1));
        task.assign_to_developer(DeveloperId::new(1));
        assert_eq!(task.history().len(), 2);
    }

    #[test]
    fn repeated_status_change_appends_once() {
        let mut ids = IdAllocator::new();
        let mut a = Task::create(&mut ids, "A", "");
        let _b = Task::create(&mut ids, "B", "");

        let before = a.history().len();
        a.set_status(TaskStatus::InProgress);
        a.set_status(TaskStatus::InProgress);
        assert_eq!(a.history().len(), before + 1);
    }

    #[test]
    fn backward_transitions_are_allowed() {
        let mut task = new_task("Loop");
        task.set_status(TaskStatus::Done);
        task.set_status(TaskStatus::Backlog);
        assert_eq!(task.status(), TaskStatus::Backlog);
        assert_eq!(task.history()[2].details(), "Done → Backlog");
    }

    #[test]
    fn reassigning_to_other_developer_records_entry() {
        let mut task = new_task("Swap");
        task.assign_to_developer(DeveloperId::new(1));
        task.assign_to_developer(DeveloperId::new(2));
        assert_eq!(task.assigned_developer(), Some(DeveloperId::new(2)));
        assert_eq!(task.history().len(), 3);
    }

    #[test]
    fn deadline_scenario() {
        let mut task = new_task("Fix bug");
        assert_eq!(task.days_until_deadline(), NO_DEADLINE_DAYS);
        assert!(!task.is_overdue());

        task.set_deadline(Some(Utc::now() + Duration::days(7)));
        assert!(task.has_deadline());
        assert!(!task.is_overdue());

        task.set_deadline(Some(Utc::now() - Duration::days(2)));
        assert!(task.is_overdue());

        task.set_status(TaskStatus::Done);
        assert!(!task.is_overdue());
    }

    #[test]
    fn deadline_history_details() {
        let mut task = new_task("Ship");
        let at = Utc.with_ymd_and_hms(2026, 5, 1, 23, 59, 59).single().expect("valid date");
        task.set_deadline(Some(at));
        task.set_deadline(Some(at));
        task.set_deadline(None);

        let history = task.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[1].details(), "Deadline set: 01.05.2026");
        assert_eq!(history[2].details(), "Deadline removed");
    }

    #[test]
    fn days_until_deadline_counts_calendar_days() {
        let now = fixed_now();
        let mut task = new_task("Plan");

        task.set_deadline(Some(now + Duration::days(7)));
        assert_eq!(task.days_until_deadline_at(now), 7);

        task.set_deadline(Some(now + Duration::hours(2)));
        assert_eq!(task.days_until_deadline_at(now), 0);

        task.set_deadline(Some(now - Duration::days(2)));
        assert_eq!(task.days_until_deadline_at(now), -2);
    }

    #[test]
    fn overdue_requires_deadline_in_the_past() {
        let now = fixed_now();
        let mut task = new_task("Check");
        assert!(!task.is_overdue_at(now));

        task.set_deadline(Some(now + Duration::minutes(1)));
        assert!(!task.is_overdue_at(now));

        task.set_deadline(Some(now - Duration::minutes(1)));
        assert!(task.is_overdue_at(now));

        task.set_status(TaskStatus::Done);
        assert!(!task.is_overdue_at(now));
    }

    #[test]
    fn status_names_round_trip_and_default_to_backlog() {
        for status in TaskStatus::ALL {
            assert_eq!(TaskStatus::from_stored(status.as_str()), status);
        }
        assert_eq!(TaskStatus::from_stored("Blocked"), TaskStatus::Backlog);
        assert_eq!(TaskStatus::from_stored(""), TaskStatus::Backlog);
    }

    #[test]
    fn status_parse_accepts_user_spellings() {
        assert_eq!("in_progress".parse::<TaskStatus>().expect("parse"), TaskStatus::InProgress);
        assert_eq!("In-Progress".parse::<TaskStatus>().expect("parse"), TaskStatus::InProgress);
        assert_eq!("DONE".parse::<TaskStatus>().expect("parse"), TaskStatus::Done);
        let err = "later".parse::<TaskStatus>().expect_err("unknown status");
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn next_follows_the_usual_path() {
        assert_eq!(TaskStatus::Backlog.next(), Some(TaskStatus::Assigned));
        assert_eq!(TaskStatus::Review.next(), Some(TaskStatus::Done));
        assert_eq!(TaskStatus::Done.next(), None);
    }

    #[test]
    fn description_preview_is_char_safe() {
        let mut ids = IdAllocator::new();
        let task = Task::create(&mut ids, "Long", "ééééé");
        assert_eq!(task.description_preview(3), "ééé...");
        assert_eq!(task.description_preview(5), "ééééé");
    }

    #[test]
    fn search_is_case_insensitive_on_title() {
        let task = new_task("Fix Login Bug");
        assert!(task.matches_search("login"));
        assert!(task.matches_search(""));
        assert!(!task.matches_search("signup"));
    }
}

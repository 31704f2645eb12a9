//! JSON persistence for boards.
//!
//! # Document layout
//!
//! ```text
//! {
//!   "developers": [ { "id": 1, "name": "...", "position": "..." } ],
//!   "tasks": [
//!     {
//!       "id": 1, "title": "...", "description": "...",
//!       "status": "Backlog" | "Assigned" | "InProgress" | "Review" | "Done",
//!       "assignedDeveloperId": -1,
//!       "deadline": "2026-05-01T23:59:59Z" | "",
//!       "history": [ { "timestamp": "...", "action": "...", "details": "..." } ]
//!     }
//!   ]
//! }
//! ```
//!
//! Decoding is forgiving about content: missing collections and fields take
//! defaults, unknown statuses become `Backlog`, empty or unparsable
//! timestamps become "no timestamp". It is strict about structure: the top
//! level must be an object, ids must be unique per kind and below
//! `i64::MAX`.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::board::Board;
use crate::developer::{Developer, DeveloperId};
use crate::error::{Error, Result};
use crate::ids;
use crate::storage;
use crate::task::{Task, TaskHistoryEntry, TaskId, TaskStatus};

/// Stored value of `assignedDeveloperId` for an unassigned task.
pub const UNASSIGNED_DEVELOPER_ID: i64 = -1;

const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// RFC 3339 with an optional sign and more than four year digits, which is
/// how chrono writes years outside 0000..=9999.
const OFFSET_TIMESTAMP_FORMAT: &str = "%+";

fn unassigned() -> i64 {
    UNASSIGNED_DEVELOPER_ID
}

/// Whole-board document as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardDocument {
    #[serde(default)]
    pub developers: Vec<DeveloperRecord>,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeveloperRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default = "unassigned")]
    pub assigned_developer_id: i64,
    #[serde(default)]
    pub deadline: String,
    #[serde(default)]
    pub history: Vec<HistoryRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub details: String,
}

/// Field-for-field document of a board.
pub fn serialize(board: &Board) -> BoardDocument {
    BoardDocument {
        developers: board.developers().iter().map(developer_record).collect(),
        tasks: board.tasks().iter().map(task_record).collect(),
    }
}

/// Replace the board's contents with `document`.
///
/// The document is decoded completely before the board is touched, so an
/// error leaves the board as it was. Id counters are advanced past every
/// loaded id and never move backwards.
pub fn deserialize(board: &mut Board, document: BoardDocument) -> Result<()> {
    let mut developer_ids = HashSet::new();
    let mut developers = Vec::with_capacity(document.developers.len());
    for record in document.developers {
        if !ids::in_range(record.id) {
            return Err(Error::IdOutOfRange {
                kind: "developer",
                id: record.id,
            });
        }
        if !developer_ids.insert(record.id) {
            return Err(Error::DuplicateId {
                kind: "developer",
                id: record.id,
            });
        }
        developers.push(Developer::with_id(
            DeveloperId::new(record.id),
            record.name,
            record.position,
        ));
    }

    let mut task_ids = HashSet::new();
    let mut tasks = Vec::with_capacity(document.tasks.len());
    for record in document.tasks {
        if !ids::in_range(record.id) {
            return Err(Error::IdOutOfRange {
                kind: "task",
                id: record.id,
            });
        }
        if !task_ids.insert(record.id) {
            return Err(Error::DuplicateId {
                kind: "task",
                id: record.id,
            });
        }
        tasks.push(task_from_record(record));
    }

    board.replace_contents(developers, tasks);
    Ok(())
}

/// Pretty JSON text of the board.
pub fn to_json(board: &Board) -> Result<String> {
    Ok(serde_json::to_string_pretty(&serialize(board))?)
}

/// Replace the board's contents with the board in `json`.
pub fn from_json(board: &mut Board, json: &str) -> Result<()> {
    let document: BoardDocument = serde_json::from_str(json)?;
    deserialize(board, document)
}

/// Save the board to `path`.
pub fn save_to_file(path: &Path, board: &Board) -> Result<()> {
    storage::write_json(path, &serialize(board))?;
    tracing::info!(
        path = %path.display(),
        tasks = board.task_count(),
        developers = board.developer_count(),
        "board saved"
    );
    Ok(())
}

/// Load the board stored at `path` into `board`. Unreadable files, invalid
/// JSON, non-object documents and bad ids all fail without touching
/// `board`.
pub fn load_from_file(path: &Path, board: &mut Board) -> Result<()> {
    let object = storage::read_json_object(path)?;
    let document: BoardDocument = serde_json::from_value(Value::Object(object))?;
    deserialize(board, document).map_err(|err| match err {
        Error::DuplicateId { kind, id } => Error::MalformedDocument {
            path: path.to_path_buf(),
            reason: format!("duplicate {kind} id {id}"),
        },
        Error::IdOutOfRange { kind, id } => Error::MalformedDocument {
            path: path.to_path_buf(),
            reason: format!("{kind} id {id} is out of range"),
        },
        other => other,
    })?;
    tracing::info!(
        path = %path.display(),
        tasks = board.task_count(),
        developers = board.developer_count(),
        "board loaded"
    );
    Ok(())
}

/// ISO-8601 text for a timestamp, empty when there is none.
pub fn format_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp
        .map(|at| at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        .unwrap_or_default()
}

/// Parse an ISO-8601 timestamp. Date-times without an offset are read as
/// UTC. Empty or unparsable text yields `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(at) = DateTime::parse_from_str(raw, OFFSET_TIMESTAMP_FORMAT) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, NAIVE_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn developer_record(developer: &Developer) -> DeveloperRecord {
    DeveloperRecord {
        id: developer.id().get(),
        name: developer.name().to_string(),
        position: developer.position().to_string(),
    }
}

fn task_record(task: &Task) -> TaskRecord {
    TaskRecord {
        id: task.id().get(),
        title: task.title().to_string(),
        description: task.description().to_string(),
        status: task.status().as_str().to_string(),
        assigned_developer_id: task
            .assigned_developer()
            .map_or(UNASSIGNED_DEVELOPER_ID, DeveloperId::get),
        deadline: format_timestamp(task.deadline()),
        history: task
            .history()
            .iter()
            .map(|entry| HistoryRecord {
                timestamp: format_timestamp(entry.timestamp()),
                action: entry.action().to_string(),
                details: entry.details().to_string(),
            })
            .collect(),
    }
}

fn task_from_record(record: TaskRecord) -> Task {
    let assigned = (record.assigned_developer_id >= 0)
        .then_some(DeveloperId::new(record.assigned_developer_id));
    let history = record
        .history
        .into_iter()
        .map(|entry| {
            TaskHistoryEntry::restored(
                parse_timestamp(&entry.timestamp),
                entry.action,
                entry.details,
            )
        })
        .collect();
    Task::restore(
        TaskId::new(record.id),
        record.title,
        record.description,
        TaskStatus::from_stored(&record.status),
        assigned,
        parse_timestamp(&record.deadline),
        history,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::fs;
    use tempfile::TempDir;

    fn sample_board() -> Board {
        let mut board = Board::new();
        let dev = board.new_developer("Ivan", "Developer");
        let dev_id = dev.id();
        board.add_developer(dev).expect("add developer");
        let qa = board.new_developer("Anna", "");
        board.add_developer(qa).expect("add developer");

        let mut task = board.new_task("With deadline", "Long description");
        task.set_status(TaskStatus::InProgress);
        task.assign_to_developer(dev_id);
        task.set_deadline(Some(Utc::now() + Duration::days(7)));
        board.add_task(task).expect("add task");

        let plain = board.new_task("Without deadline", "");
        board.add_task(plain).expect("add task");
        board
    }

    #[test]
    fn round_trip_preserves_everything() {
        let board = sample_board();
        let mut loaded = Board::new();
        deserialize(&mut loaded, serialize(&board)).expect("deserialize");

        assert_eq!(loaded.developers(), board.developers());
        assert_eq!(loaded.tasks(), board.tasks());
    }

    #[test]
    fn wire_format_uses_expected_names() {
        let board = sample_board();
        let value = serde_json::to_value(serialize(&board)).expect("to value");

        let first = &value["tasks"][0];
        assert_eq!(first["status"], "InProgress");
        assert_eq!(first["assignedDeveloperId"], 1);
        assert!(first["deadline"].as_str().is_some_and(|s| !s.is_empty()));
        assert_eq!(first["history"][0]["action"], "Created");

        let second = &value["tasks"][1];
        assert_eq!(second["assignedDeveloperId"], UNASSIGNED_DEVELOPER_ID);
        assert_eq!(second["deadline"], "");
        assert_eq!(value["developers"][1]["position"], "");
    }

    #[test]
    fn lenient_content_defaults() {
        let json = r#"{
            "tasks": [
                {
                    "id": 4,
                    "title": "Odd",
                    "status": "Blocked",
                    "deadline": "",
                    "history": [ { "timestamp": "not a date", "action": "Created", "details": "x" } ]
                },
                { "id": 5, "title": "Qt style", "deadline": "2026-05-01T23:59:59", "assignedDeveloperId": 2 }
            ]
        }"#;
        let mut board = Board::new();
        from_json(&mut board, json).expect("from json");

        assert_eq!(board.developer_count(), 0);
        let odd = board.task(TaskId::new(4)).expect("task 4");
        assert_eq!(odd.status(), TaskStatus::Backlog);
        assert!(!odd.is_assigned());
        assert!(!odd.has_deadline());
        assert_eq!(odd.history()[0].timestamp(), None);
        assert_eq!(odd.description(), "");

        let qt = board.task(TaskId::new(5)).expect("task 5");
        let expected = Utc.with_ymd_and_hms(2026, 5, 1, 23, 59, 59).single();
        assert_eq!(qt.deadline(), expected);
        assert_eq!(qt.assigned_developer(), Some(DeveloperId::new(2)));

        let back = serialize(&board);
        assert_eq!(back.tasks[0].history[0].timestamp, "");
    }

    #[test]
    fn load_reconciles_allocator() {
        let mut board = Board::new();
        from_json(
            &mut board,
            r#"{"developers":[{"id":7,"name":"A","position":""}],"tasks":[{"id":10,"title":"T"}]}"#,
        )
        .expect("from json");
        assert_eq!(board.new_task("Next", "").id().get(), 11);
        assert_eq!(board.new_developer("Next", "").id().get(), 8);

        from_json(&mut board, r#"{"tasks":[{"id":3,"title":"Low"}]}"#).expect("from json");
        assert_eq!(board.task_count(), 1);
        assert_eq!(board.new_task("Still higher", "").id().get(), 12);
    }

    #[test]
    fn duplicate_ids_leave_board_untouched() {
        let mut board = sample_board();
        let before = board.tasks().to_vec();
        let err = from_json(&mut board, r#"{"tasks":[{"id":1},{"id":1}]}"#).expect_err("dup");
        assert!(matches!(err, Error::DuplicateId { kind: "task", id: 1 }));
        assert_eq!(board.tasks(), before.as_slice());
    }

    #[test]
    fn reserved_id_fails_to_load() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("max.json");
        fs::write(&path, r#"{"tasks":[{"id":9223372036854775807}]}"#).expect("write");

        let mut board = sample_board();
        let err = load_from_file(&path, &mut board).expect_err("reserved id");
        assert!(matches!(err, Error::MalformedDocument { .. }));
        assert_eq!(board.task_count(), 2);

        let mut board = Board::new();
        from_json(&mut board, &format!(r#"{{"tasks":[{{"id":{}}}]}}"#, ids::MAX_ID))
            .expect("largest valid id");
        let next = board.new_task("After", "");
        assert!(board.add_task(next).is_err());
        assert_eq!(board.task_count(), 1);
    }

    #[test]
    fn save_and_load_file() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("board.json");
        let board = sample_board();
        save_to_file(&path, &board).expect("save");

        let mut loaded = Board::new();
        load_from_file(&path, &mut loaded).expect("load");
        assert_eq!(loaded.tasks(), board.tasks());
        assert_eq!(loaded.developers(), board.developers());
    }

    #[test]
    fn save_to_missing_directory_fails() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("nonexistent_directory").join("board.json");
        let err = save_to_file(&path, &sample_board()).expect_err("missing dir");
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn failed_loads_keep_prior_content() {
        let dir = TempDir::new().expect("tempdir");
        let mut board = sample_board();
        let before = board.tasks().to_vec();

        let missing = dir.path().join("missing.json");
        assert!(matches!(load_from_file(&missing, &mut board), Err(Error::Io(_))));

        let empty = dir.path().join("empty.json");
        fs::write(&empty, "").expect("write");
        assert!(load_from_file(&empty, &mut board).is_err());

        let array = dir.path().join("array.json");
        fs::write(&array, "[]").expect("write");
        assert!(matches!(
            load_from_file(&array, &mut board),
            Err(Error::MalformedDocument { .. })
        ));

        let dup = dir.path().join("dup.json");
        fs::write(&dup, r#"{"developers":[{"id":2},{"id":2}]}"#).expect("write");
        assert!(matches!(
            load_from_file(&dup, &mut board),
            Err(Error::MalformedDocument { .. })
        ));

        assert_eq!(board.tasks(), before.as_slice());
        assert_eq!(board.developer_count(), 2);
    }

    #[test]
    fn timestamps_keep_sub_second_precision() {
        let at = Utc
            .with_ymd_and_hms(2026, 1, 2, 3, 4, 5)
            .single()
            .expect("valid date")
            + Duration::nanoseconds(123_456_789);
        let text = format_timestamp(Some(at));
        assert_eq!(text, "2026-01-02T03:04:05.123456789Z");
        assert_eq!(parse_timestamp(&text), Some(at));
        assert_eq!(format_timestamp(None), "");
        assert_eq!(parse_timestamp("  "), None);
    }

    #[test]
    fn timestamps_beyond_year_9999_survive() {
        let far = Utc
            .with_ymd_and_hms(10000, 1, 1, 23, 59, 59)
            .single()
            .expect("valid date");
        let text = format_timestamp(Some(far));
        assert_eq!(text, "+10000-01-01T23:59:59Z");
        assert_eq!(parse_timestamp(&text), Some(far));

        let mut board = Board::new();
        let mut task = board.new_task("Long haul", "");
        task.set_deadline(Some(far));
        board.add_task(task).expect("add task");

        let mut restored = Board::new();
        from_json(&mut restored, &to_json(&board).expect("to json")).expect("from json");
        assert_eq!(restored.tasks(), board.tasks());
    }

    #[test]
    fn offset_timestamps_convert_to_utc() {
        let expected = Utc.with_ymd_and_hms(2026, 5, 1, 7, 30, 0).single();
        assert_eq!(parse_timestamp("2026-05-01T09:30:00+02:00"), expected);
    }
}

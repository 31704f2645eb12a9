use std::fs;

use chrono::{TimeZone, Utc};
use taskboard::codec;
use taskboard::{Board, BoardSession, DeveloperId, Error, TaskId, TaskStatus};

const LEGACY_BOARD: &str = r#"{
    "developers": [
        { "id": 3, "name": "Ivan", "position": "Backend" },
        { "id": 9, "name": "Olga" }
    ],
    "tasks": [
        {
            "id": 5,
            "title": "Import",
            "description": "From the old board",
            "status": "Review",
            "assignedDeveloperId": 3,
            "deadline": "2024-03-01T18:00:00",
            "history": [
                { "timestamp": "2024-02-01T09:15:00.250", "action": "Created", "details": "Task 'Import' created" },
                { "timestamp": "", "action": "Status changed", "details": "Backlog → Review" }
            ]
        },
        {
            "id": 12,
            "title": "Mystery",
            "status": "Blocked",
            "assignedDeveloperId": -7
        }
    ]
}"#;

#[test]
fn loads_documents_written_by_older_versions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.json");
    fs::write(&path, LEGACY_BOARD).unwrap();

    let mut board = Board::new();
    board.load_from_file(&path).unwrap();

    assert_eq!(board.developer_count(), 2);
    assert_eq!(board.developer(DeveloperId::new(9)).unwrap().position(), "");

    let import = board.task(TaskId::new(5)).unwrap();
    assert_eq!(import.status(), TaskStatus::Review);
    assert_eq!(import.assigned_developer(), Some(DeveloperId::new(3)));
    assert_eq!(
        import.deadline(),
        Some(Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap())
    );
    assert_eq!(import.history().len(), 2);
    assert!(import.history()[0].timestamp().is_some());
    assert!(import.history()[1].timestamp().is_none());

    let mystery = board.task(TaskId::new(12)).unwrap();
    assert_eq!(mystery.status(), TaskStatus::Backlog);
    assert_eq!(mystery.assigned_developer(), None);
    assert!(mystery.history().is_empty());

    // New ids continue after the highest loaded ones.
    assert_eq!(board.new_task("next", "").id(), TaskId::new(13));
    assert_eq!(board.new_developer("next", "").id(), DeveloperId::new(10));
}

#[test]
fn save_writes_unassigned_as_minus_one_and_empty_deadline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.json");

    let mut board = Board::new();
    let task = board.new_task("Plain", "");
    board.add_task(task).unwrap();
    board.save_to_file(&path).unwrap();

    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(doc["tasks"][0]["assignedDeveloperId"], -1);
    assert_eq!(doc["tasks"][0]["deadline"], "");
    assert_eq!(doc["tasks"][0]["status"], "Backlog");
    assert_eq!(doc["tasks"][0]["history"][0]["action"], "Created");
}

#[test]
fn failed_loads_leave_the_board_alone() {
    let dir = tempfile::tempdir().unwrap();
    let mut board = Board::new();
    let task = board.new_task("Keep me", "");
    board.add_task(task).unwrap();

    let duplicate = dir.path().join("duplicate.json");
    fs::write(
        &duplicate,
        r#"{"developers": [], "tasks": [{"id": 1}, {"id": 1}]}"#,
    )
    .unwrap();
    let err = board.load_from_file(&duplicate).unwrap_err();
    assert!(matches!(err, Error::MalformedDocument { .. }));

    let reserved = dir.path().join("reserved.json");
    fs::write(&reserved, r#"{"tasks": [{"id": 9223372036854775807}]}"#).unwrap();
    assert!(matches!(
        board.load_from_file(&reserved),
        Err(Error::MalformedDocument { .. })
    ));

    let array = dir.path().join("array.json");
    fs::write(&array, "[]").unwrap();
    assert!(matches!(
        board.load_from_file(&array),
        Err(Error::MalformedDocument { .. })
    ));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{ not json").unwrap();
    assert!(matches!(board.load_from_file(&broken), Err(Error::Json(_))));

    assert!(board.load_from_file(&dir.path().join("missing.json")).is_err());

    assert_eq!(board.task_count(), 1);
    assert_eq!(board.tasks()[0].title(), "Keep me");
}

#[test]
fn saving_into_a_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope").join("board.json");
    let err = Board::new().save_to_file(&path).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert!(!dir.path().join("nope").exists());
}

#[test]
fn loading_replaces_previous_contents() {
    let mut source = Board::new();
    let dev = source.new_developer("Ann", "QA");
    source.add_developer(dev).unwrap();
    let json = codec::to_json(&source).unwrap();

    let mut target = Board::new();
    for title in ["a", "b", "c"] {
        let task = target.new_task(title, "");
        target.add_task(task).unwrap();
    }
    codec::from_json(&mut target, &json).unwrap();

    assert_eq!(target.task_count(), 0);
    assert_eq!(target.developer_count(), 1);
    // Counters never move backwards across loads.
    assert_eq!(target.new_task("d", "").id(), TaskId::new(4));
}

#[test]
fn session_changes_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.json");

    let mut session = BoardSession::create(&path);
    let dev = session.add_developer("Ivan", "Dev").unwrap();
    let task = session.add_task("Ship", "notes", None).unwrap();
    session.assign_task(task, dev).unwrap();
    session.move_task(task, TaskStatus::InProgress).unwrap();
    session.save().unwrap();
    session.close();

    let reopened = BoardSession::open(&path).unwrap();
    let stored = reopened.task(task).unwrap();
    assert_eq!(stored.status(), TaskStatus::InProgress);
    assert_eq!(stored.assigned_developer(), Some(dev));
    let actions: Vec<&str> = stored.history().iter().map(|entry| entry.action()).collect();
    assert_eq!(actions, vec!["Created", "Assigned", "Status changed"]);
}

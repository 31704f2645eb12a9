#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// A scratch directory that `tb` runs in, with its default `board.json`.
pub struct TestBoard {
    dir: TempDir,
}

impl TestBoard {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    /// A directory with an initialized, empty board.
    pub fn init() -> Self {
        let board = Self::new();
        board.cmd().arg("init").assert().success();
        board
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn board_file(&self) -> PathBuf {
        self.dir.path().join("board.json")
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = tb_cmd();
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Run a command with `--json` and return the envelope's `data`.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(args)
            .arg("--json")
            .output()
            .expect("run tb");
        assert!(
            output.status.success(),
            "tb {:?} failed: {}{}",
            args,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let envelope: Value = serde_json::from_slice(&output.stdout).expect("json envelope");
        assert_eq!(envelope["status"], "success");
        envelope["data"].clone()
    }

    pub fn read_board(&self) -> Value {
        let content = fs::read_to_string(self.board_file()).expect("read board file");
        serde_json::from_str(&content).expect("board file is json")
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(rel_path);
        fs::write(&path, contents).expect("write file");
        path
    }
}

pub fn tb_cmd() -> Command {
    let mut cmd = Command::cargo_bin("tb").expect("binary");
    cmd.env_remove("TASKBOARD_FILE").env_remove("RUST_LOG");
    cmd
}

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// A throwaway working directory with a board data dir inside it.
pub struct TestBoard {
    dir: TempDir,
}

impl TestBoard {
    /// Board that starts with the sample tasks on first use
    pub fn seeded() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        fs::create_dir_all(dir.path().join("data")).expect("create data dir");
        Self { dir }
    }

    /// Board with seeding disabled in its config
    pub fn empty() -> Self {
        let board = Self::seeded();
        board.write_config("[seed]\nenabled = false\n");
        board
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn write_config(&self, contents: &str) -> PathBuf {
        self.write_data("kanban.toml", contents)
    }

    pub fn write_data(&self, key: &str, contents: &str) -> PathBuf {
        let path = self.data_dir().join(key);
        fs::write(&path, contents).expect("write data file");
        path
    }

    pub fn read_data(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.data_dir().join(key)).ok()
    }

    /// `kanban` pointed at this board, run from its working directory
    pub fn cmd(&self) -> Command {
        let mut cmd = kanban_cmd();
        cmd.current_dir(self.path());
        cmd.env("KANBAN_DATA_DIR", self.data_dir());
        cmd
    }

    /// Run with `--json` and return the parsed envelope of a successful run
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .arg("--json")
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).expect("json envelope")
    }

    /// Create a task and return its id
    pub fn add(&self, title: &str, extra: &[&str]) -> String {
        let mut args = vec!["add", title];
        args.extend_from_slice(extra);
        let value = self.json(&args);
        value["data"]["id"].as_str().expect("task id").to_string()
    }

    pub fn titles(&self, args: &[&str]) -> Vec<String> {
        let mut full = vec!["list"];
        full.extend_from_slice(args);
        self.json(&full)["data"]["tasks"]
            .as_array()
            .expect("tasks array")
            .iter()
            .map(|task| task["title"].as_str().expect("title").to_string())
            .collect()
    }
}

pub fn kanban_cmd() -> Command {
    let mut cmd = Command::cargo_bin("kanban").expect("binary");
    cmd.env_remove("RUST_LOG");
    cmd.env_remove("KANBAN_DATA_DIR");
    cmd
}

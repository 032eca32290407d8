#![allow(deprecated)]

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn write_env(&self, content: &str) {
        fs::write(self.root.path().join(".env"), content).unwrap();
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    /// `almanac-infra --root <project>` with an empty environment
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("almanac-infra").unwrap();
        cmd.env_clear().env("NO_COLOR", "1").arg("--root").arg(self.path());
        cmd
    }
}

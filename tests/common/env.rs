//! Test environment for running stagehand against local directories.
//!
//! Source and destination are plain directories reached through the
//! `windows_share` backend, so scenarios run without SSH or a database.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{Duration, UNIX_EPOCH};

use serde_json::{json, Value};
use tempfile::TempDir;

/// Result of running the stagehand binary
#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TestResult {
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Combine stdout and stderr
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Isolated deployment environment.
///
/// Layout under one temp dir: `src/`, `dst/` and `deploy.json`.
pub struct TestEnv {
    pub root: TempDir,
    bin: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("Failed to create temp dir");
        fs::create_dir_all(root.path().join("src")).expect("Failed to create src");
        fs::create_dir_all(root.path().join("dst")).expect("Failed to create dst");
        Self {
            root,
            bin: PathBuf::from(env!("CARGO_BIN_EXE_stagehand")),
        }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.path().join(relative)
    }

    pub fn source_path(&self, relative: &str) -> PathBuf {
        self.path("src").join(relative)
    }

    pub fn destination_path(&self, relative: &str) -> PathBuf {
        self.path("dst").join(relative)
    }

    pub fn config_path(&self) -> PathBuf {
        self.path("deploy.json")
    }

    /// Cache written next to `deploy.json`.
    pub fn cache_path(&self) -> PathBuf {
        self.path(".deploy_cache_deploy.json")
    }

    /// Write a file with a fixed modification time.
    pub fn write(&self, relative: &str, content: &str, mtime: u64) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write file");
        set_mtime(&path, mtime);
        path
    }

    pub fn write_source(&self, relative: &str, content: &str, mtime: u64) -> PathBuf {
        self.write(&format!("src/{}", relative), content, mtime)
    }

    pub fn write_destination(&self, relative: &str, content: &str, mtime: u64) -> PathBuf {
        self.write(&format!("dst/{}", relative), content, mtime)
    }

    pub fn read_destination(&self, relative: &str) -> Option<String> {
        fs::read_to_string(self.destination_path(relative)).ok()
    }

    pub fn remove_source(&self, relative: &str) {
        fs::remove_file(self.source_path(relative)).expect("Failed to remove source file");
    }

    /// Base config: local source and destination, no database.
    pub fn base_config(&self) -> Value {
        json!({
            "application_name": "shop",
            "source": {"type": "windows_share", "path": self.path("src")},
            "destination": {"type": "windows_share", "path": self.path("dst")},
        })
    }

    /// Write `deploy.json` as the base config with `extra` merged on top.
    pub fn write_config(&self, extra: Value) {
        let mut document = self.base_config();
        if let (Some(base), Some(extra)) = (document.as_object_mut(), extra.as_object()) {
            for (key, value) in extra {
                base.insert(key.clone(), value.clone());
            }
        }
        fs::write(
            self.config_path(),
            serde_json::to_string_pretty(&document).expect("config serializes"),
        )
        .expect("Failed to write config");
    }

    pub fn read_cache(&self) -> Value {
        let content = fs::read_to_string(self.cache_path()).expect("cache file exists");
        serde_json::from_str(&content).expect("cache is valid JSON")
    }

    /// Run the binary with the config path followed by `args`.
    pub fn run(&self, args: &[&str]) -> TestResult {
        let output = Command::new(&self.bin)
            .arg(self.config_path())
            .args(args)
            .current_dir(self.root.path())
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute stagehand");
        to_result(output)
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

pub fn set_mtime(path: &Path, seconds: u64) {
    let file = fs::File::options()
        .write(true)
        .open(path)
        .expect("Failed to open file for mtime");
    file.set_modified(UNIX_EPOCH + Duration::from_secs(seconds))
        .expect("Failed to set mtime");
}

fn to_result(output: Output) -> TestResult {
    TestResult {
        success: output.status.success(),
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}

//! SSH sessions over the system `ssh` client.
//!
//! `connect` authenticates once and leaves a ControlMaster process running;
//! every later command is multiplexed over it, so authentication (including
//! `sshpass` for passwords) happens exactly once per session.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::sync::Mutex;

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::config::{expand_home, DatabaseConfig, SshLocationConfig};
use crate::domain::ports::{LocationError, LocationResult};

const CONNECT_TIMEOUT_SECS: u32 = 15;

/// How to reach and authenticate against an SSH host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Option<String>,
    pub key_file: Option<PathBuf>,
    pub passphrase: Option<String>,
}

impl SshTarget {
    pub fn from_location(config: &SshLocationConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            password: config.password.clone().filter(|p| !p.is_empty()),
            key_file: config.key_file.as_ref().map(|k| expand_home(k)),
            passphrase: config.passphrase.clone().filter(|p| !p.is_empty()),
        }
    }

    pub fn from_database(config: &DatabaseConfig) -> Self {
        Self {
            host: config.ssh_host.clone(),
            port: config.ssh_port,
            username: config.ssh_username.clone(),
            password: config.ssh_password.clone().filter(|p| !p.is_empty()),
            key_file: config.ssh_key_file.as_ref().map(|k| expand_home(k)),
            passphrase: config.ssh_passphrase.clone().filter(|p| !p.is_empty()),
        }
    }

    /// `user@host`
    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.host)
    }
}

impl std::fmt::Display for SshTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}:{}", self.username, self.host, self.port)
    }
}

/// One authenticated SSH connection.
#[derive(Debug)]
pub struct SshSession {
    target: SshTarget,
    control_dir: Mutex<Option<TempDir>>,
}

impl SshSession {
    pub fn new(target: SshTarget) -> Self {
        Self {
            target,
            control_dir: Mutex::new(None),
        }
    }

    pub fn target(&self) -> &SshTarget {
        &self.target
    }

    pub fn is_connected(&self) -> bool {
        self.control_dir
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    fn control_path(&self) -> LocationResult<PathBuf> {
        let guard = self
            .control_dir
            .lock()
            .map_err(|_| LocationError::Connection("session state poisoned".to_string()))?;
        guard
            .as_ref()
            .map(|dir| dir.path().join("master.sock"))
            .ok_or(LocationError::NotConnected)
    }

    /// Base `ssh` invocation, wrapped in `sshpass -e` for password auth.
    fn base_command(&self, control_path: &Path) -> Command {
        let mut cmd = match &self.target.password {
            Some(password) => {
                let mut cmd = Command::new("sshpass");
                cmd.arg("-e").arg("ssh").env("SSHPASS", password);
                cmd
            }
            None => {
                let mut cmd = Command::new("ssh");
                cmd.arg("-o").arg("BatchMode=yes");
                cmd
            }
        };
        cmd.arg("-p")
            .arg(self.target.port.to_string())
            .arg("-o")
            .arg("StrictHostKeyChecking=accept-new")
            .arg("-o")
            .arg(format!("ConnectTimeout={}", CONNECT_TIMEOUT_SECS))
            .arg("-o")
            .arg(format!("ControlPath={}", control_path.display()));
        if let Some(key) = &self.target.key_file {
            cmd.arg("-i").arg(key);
        }
        cmd
    }

    /// Authenticate and start the ControlMaster.
    pub fn connect(&self) -> LocationResult<()> {
        if self.is_connected() {
            return Ok(());
        }
        if self.target.passphrase.is_some() && self.target.password.is_none() {
            // ssh reads key passphrases from a tty only; an agent must hold the key.
            debug!(target = %self.target, "key passphrase set; relying on ssh-agent");
        }

        let dir = tempfile::Builder::new()
            .prefix("stagehand-ssh-")
            .tempdir()
            .map_err(|e| LocationError::Connection(e.to_string()))?;
        let control_path = dir.path().join("master.sock");

        let output = self
            .base_command(&control_path)
            .arg("-o")
            .arg("ControlMaster=yes")
            .arg("-o")
            .arg("ControlPersist=yes")
            .arg("-f")
            .arg("-N")
            .arg(self.target.destination())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| LocationError::Connection(format!("cannot start ssh: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(LocationError::Connection(format!(
                "{}: {}",
                self.target, stderr
            )));
        }

        let mut guard = self
            .control_dir
            .lock()
            .map_err(|_| LocationError::Connection("session state poisoned".to_string()))?;
        *guard = Some(dir);
        debug!(target = %self.target, "ssh session established");
        Ok(())
    }

    /// Stop the ControlMaster. Safe to call more than once.
    pub fn disconnect(&self) {
        let Ok(mut guard) = self.control_dir.lock() else {
            return;
        };
        let Some(dir) = guard.take() else {
            return;
        };
        let control_path = dir.path().join("master.sock");
        let result = self
            .base_command(&control_path)
            .arg("-O")
            .arg("exit")
            .arg(self.target.destination())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if let Err(e) = result {
            warn!(target = %self.target, "failed to close ssh session: {}", e);
        }
    }

    /// Run a command and return its raw output, whatever the exit status.
    pub fn output(&self, command: &str, input: Option<&[u8]>) -> LocationResult<Output> {
        let control_path = self.control_path()?;

        let mut child = self
            .base_command(&control_path)
            .arg(self.target.destination())
            .arg(command)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| LocationError::Io(format!("cannot start ssh: {}", e)))?;

        Ok(feed_and_collect(child, input)?)
    }

    /// Run a command, optionally feeding `input` through stdin.
    pub fn run(&self, command: &str, input: Option<&[u8]>) -> LocationResult<Vec<u8>> {
        let output = self.output(command, input)?;
        if !output.status.success() {
            return Err(LocationError::CommandFailed {
                command: command.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(output.stdout)
    }

    /// Run a command and return trimmed stdout as text.
    pub fn run_text(&self, command: &str) -> LocationResult<String> {
        let stdout = self.run(command, None)?;
        Ok(String::from_utf8_lossy(&stdout).trim_end().to_string())
    }
}

/// Write `input` to the child's stdin and collect its output. A child whose
/// stdin cannot be written is killed and reaped before the error returns.
fn feed_and_collect(mut child: Child, input: Option<&[u8]>) -> io::Result<Output> {
    if let (Some(data), Some(mut stdin)) = (input, child.stdin.take()) {
        if let Err(e) = stdin.write_all(data) {
            drop(stdin);
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }
    }
    child.wait_with_output()
}

impl Drop for SshSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}

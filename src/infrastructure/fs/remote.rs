//! Remote Location
//!
//! A file tree on an SSH host. Each instance owns one session; commands on
//! one session must not overlap, so the scheduler either serializes access
//! or draws extra sessions from a pool built with `SshSessionFactory`.

use tracing::debug;

use crate::domain::entities::FileRecord;
use crate::domain::ports::{Location, LocationError, LocationResult, SessionFactory};
use crate::domain::value_objects::RelativePath;
use crate::infrastructure::ssh::{remote_join, shell_quote, RemoteCommand, SshSession, SshTarget};

#[derive(Debug)]
pub struct SshLocation {
    session: SshSession,
    base: String,
}

impl SshLocation {
    pub fn new(target: SshTarget, base: impl Into<String>) -> Self {
        let base = base.into().replace('\\', "/");
        Self {
            session: SshSession::new(target),
            base,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn resolve(&self, path: &str) -> LocationResult<String> {
        let relative = RelativePath::parse(path)?;
        Ok(remote_join(&self.base, relative.as_str()))
    }

    /// `mkdir -p`, accepting a directory created concurrently by another session.
    fn ensure_directory(&self, dir: &str) -> LocationResult<()> {
        let mkdir = RemoteCommand::new("mkdir").raw("-p").arg(dir);
        if self.session.run(&mkdir.build(), None).is_ok() {
            return Ok(());
        }
        let check = RemoteCommand::new("test").raw("-d").arg(dir);
        self.session.run(&check.build(), None).map(|_| ())
    }
}

/// Parse `find -printf '%y\t%P\t%s\t%T@\n'` output.
fn parse_listing(output: &str) -> Vec<FileRecord> {
    let mut records: Vec<FileRecord> = output
        .lines()
        .filter_map(|line| {
            let mut fields = line.splitn(4, '\t');
            let kind = fields.next()?;
            let path = fields.next()?;
            let size = fields.next()?.trim().parse().unwrap_or(0);
            let mtime = fields.next()?.trim().parse().unwrap_or(0.0);
            if path.is_empty() {
                return None;
            }
            Some(if kind == "d" {
                FileRecord::directory(path, mtime)
            } else {
                FileRecord::file(path, size, mtime)
            })
        })
        .collect();
    records.sort_by(|a, b| a.path.cmp(&b.path));
    records
}

impl Location for SshLocation {
    fn display_name(&self) -> String {
        format!("ssh {}{}", self.session.target(), self.base)
    }

    fn connect(&self) -> LocationResult<()> {
        self.session.connect()?;
        let check = RemoteCommand::new("test").raw("-d").arg(&self.base);
        self.session.run(&check.build(), None).map_err(|_| {
            LocationError::Connection(format!("remote directory {} does not exist", self.base))
        })?;
        Ok(())
    }

    fn disconnect(&self) {
        self.session.disconnect();
    }

    fn list_files(&self, recursive: bool) -> LocationResult<Vec<FileRecord>> {
        let mut find = RemoteCommand::new("find").arg(&self.base).raw("-mindepth 1");
        if !recursive {
            find = find.raw("-maxdepth 1");
        }
        let find = find
            .raw("\\( -type f -o -type d \\)")
            .raw("-printf")
            .arg("%y\\t%P\\t%s\\t%T@\\n");
        let output = self.session.run_text(&find.build())?;
        let records = parse_listing(&output);
        debug!(count = records.len(), base = %self.base, "remote listing");
        Ok(records)
    }

    fn read_file(&self, path: &str) -> LocationResult<Vec<u8>> {
        let full = self.resolve(path)?;
        let cat = RemoteCommand::new("cat").arg(&full);
        self.session.run(&cat.build(), None).map_err(|e| match e {
            LocationError::CommandFailed { stderr, .. }
                if stderr.contains("No such file") =>
            {
                LocationError::NotFound(full.clone())
            }
            other => other,
        })
    }

    fn write_file(&self, path: &str, content: &[u8]) -> LocationResult<()> {
        let full = self.resolve(path)?;
        if let Some((parent, _)) = full.rsplit_once('/') {
            if !parent.is_empty() {
                self.ensure_directory(parent)?;
            }
        }

        let tmp = format!("{}.stagehand.tmp", full);
        let write = RemoteCommand::new("cat")
            .raw(">")
            .arg(&tmp)
            .and(RemoteCommand::new("mv").raw("-f").arg(&tmp).arg(&full));
        self.session.run(&write.build(), Some(content))?;
        Ok(())
    }

    fn delete_file(&self, path: &str) -> LocationResult<()> {
        let full = self.resolve(path)?;
        let rm = RemoteCommand::new("rm").raw("-f").arg(&full);
        self.session.run(&rm.build(), None).map(|_| ())
    }

    fn delete_directory(&self, path: &str) -> LocationResult<()> {
        let full = self.resolve(path)?;
        let rm = RemoteCommand::new("rm").raw("-rf").arg(&full);
        self.session.run(&rm.build(), None).map(|_| ())
    }

    fn requires_serialization(&self) -> bool {
        true
    }

    fn run_command(&self, command: &str) -> LocationResult<String> {
        let full = format!("cd {} && {}", shell_quote(&self.base), command);
        self.session.run_text(&full)
    }
}

/// Opens extra connected `SshLocation`s for the connection pool.
#[derive(Debug, Clone)]
pub struct SshSessionFactory {
    target: SshTarget,
    base: String,
}

impl SshSessionFactory {
    pub fn new(target: SshTarget, base: impl Into<String>) -> Self {
        Self {
            target,
            base: base.into(),
        }
    }
}

impl SessionFactory for SshSessionFactory {
    fn open_session(&self) -> LocationResult<Box<dyn Location>> {
        let location = SshLocation::new(self.target.clone(), self.base.clone());
        location.connect()?;
        Ok(Box::new(location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> SshLocation {
        SshLocation::new(
            SshTarget {
                host: "web01".to_string(),
                port: 22,
                username: "deploy".to_string(),
                password: None,
                key_file: None,
                passphrase: None,
            },
            "/var/www/site",
        )
    }

    #[test]
    fn parse_listing_reads_find_output() {
        let output = "f\tindex.php\t120\t1700000000.5\nd\tcss\t4096\t1700000001.0\nf\tcss/site.css\t42\t1700000002.25\n";
        let records = parse_listing(output);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].path, "css");
        assert!(records[0].is_directory);
        assert_eq!(records[1], FileRecord::file("css/site.css", 42, 1_700_000_002.25));
        assert_eq!(records[2].size, 120);
    }

    #[test]
    fn parse_listing_skips_malformed_lines() {
        let records = parse_listing("garbage\nf\t\t1\t1\nf\ta.txt\t1\t2\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, "a.txt");
    }

    #[test]
    fn paths_are_validated_before_any_command() {
        let location = location();
        assert!(matches!(
            location.read_file("../etc/shadow"),
            Err(LocationError::InvalidPath(_))
        ));
        assert!(matches!(
            location.delete_directory("/"),
            Err(LocationError::InvalidPath(_))
        ));
    }

    #[test]
    fn ssh_location_serializes_and_names_itself() {
        let location = location();
        assert!(location.requires_serialization());
        assert_eq!(location.display_name(), "ssh deploy@web01:22/var/www/site");
    }

    #[test]
    fn commands_need_a_connection() {
        let location = location();
        assert_eq!(
            location.write_file("a.txt", b"x"),
            Err(LocationError::NotConnected)
        );
    }
}

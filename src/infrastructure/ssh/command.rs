//! Shell command construction for remote execution.
//!
//! Every argument goes through `shell_quote`, so paths with spaces or quotes
//! never change the meaning of a command.

/// Quote a value for a POSIX shell.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Join a remote base directory and a validated relative path.
pub fn remote_join(base: &str, relative: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        format!("/{}", relative)
    } else {
        format!("{}/{}", base, relative)
    }
}

/// A shell command assembled from quoted arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteCommand {
    parts: Vec<String>,
}

impl RemoteCommand {
    pub fn new(program: &str) -> Self {
        Self {
            parts: vec![program.to_string()],
        }
    }

    /// Raw token, used for flags and operators. Never pass user data here.
    pub fn raw(mut self, token: &str) -> Self {
        self.parts.push(token.to_string());
        self
    }

    /// Quoted argument.
    pub fn arg(mut self, value: &str) -> Self {
        self.parts.push(shell_quote(value));
        self
    }

    /// Chain another command with `&&`.
    pub fn and(mut self, next: RemoteCommand) -> Self {
        self.parts.push("&&".to_string());
        self.parts.extend(next.parts);
        self
    }

    /// Chain another command with `||`.
    pub fn or(mut self, next: RemoteCommand) -> Self {
        self.parts.push("||".to_string());
        self.parts.extend(next.parts);
        self
    }

    pub fn build(&self) -> String {
        self.parts.join(" ")
    }
}

impl std::fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("plain"), "'plain'");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
        assert_eq!(shell_quote("a b; rm -rf /"), "'a b; rm -rf /'");
    }

    #[test]
    fn remote_join_handles_trailing_slash_and_root() {
        assert_eq!(remote_join("/var/www/", "a/b.txt"), "/var/www/a/b.txt");
        assert_eq!(remote_join("/var/www", "a.txt"), "/var/www/a.txt");
        assert_eq!(remote_join("/", "a.txt"), "/a.txt");
    }

    #[test]
    fn builder_quotes_arguments_and_chains() {
        let cmd = RemoteCommand::new("mkdir")
            .raw("-p")
            .arg("/srv/my site")
            .or(RemoteCommand::new("test").raw("-d").arg("/srv/my site"));
        assert_eq!(
            cmd.build(),
            "mkdir -p '/srv/my site' || test -d '/srv/my site'"
        );
    }
}

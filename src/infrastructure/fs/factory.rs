//! Location construction from configuration.

use std::path::Path;

use crate::config::{expand_home, ConfigError, LocationConfig};
use crate::domain::ports::{Location, SessionFactory};
use crate::infrastructure::ssh::SshTarget;

use super::{LocalLocation, SshLocation, SshSessionFactory};

/// A configured location plus, for SSH, a factory for extra sessions.
pub struct LocationHandle {
    pub location: Box<dyn Location>,
    pub sessions: Option<Box<dyn SessionFactory>>,
}

/// Build the backend for `config` rooted at `root`. `field` names the
/// config key in errors.
pub fn build_location(
    config: &LocationConfig,
    root: Option<&str>,
    field: &str,
) -> Result<LocationHandle, ConfigError> {
    let root = root
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| ConfigError::Invalid {
            field: field.to_string(),
            message: "path is required".to_string(),
        })?;

    Ok(match config {
        LocationConfig::WindowsShare(_) => LocationHandle {
            location: Box::new(LocalLocation::new(expand_home(Path::new(root)))),
            sessions: None,
        },
        LocationConfig::Ssh(ssh) => {
            let target = SshTarget::from_location(ssh);
            LocationHandle {
                location: Box::new(SshLocation::new(target.clone(), root)),
                sessions: Some(Box::new(SshSessionFactory::new(target, root))),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ShareConfig, SshLocationConfig};

    #[test]
    fn share_builds_local_location() {
        let config = LocationConfig::WindowsShare(ShareConfig { path: None });
        let handle = build_location(&config, Some("/srv/www"), "destination.path").unwrap();
        assert_eq!(handle.location.display_name(), "share /srv/www");
        assert!(handle.sessions.is_none());
        assert!(!handle.location.requires_serialization());
    }

    #[test]
    fn ssh_builds_session_factory() {
        let config = LocationConfig::Ssh(SshLocationConfig {
            host: "web01".to_string(),
            port: 22,
            username: "deploy".to_string(),
            password: None,
            key_file: None,
            passphrase: None,
            path: Some("/var/www".to_string()),
        });
        let handle = build_location(&config, config.path(), "destination.path").unwrap();
        assert!(handle.sessions.is_some());
        assert!(handle.location.requires_serialization());
    }

    #[test]
    fn missing_root_is_a_config_error() {
        let config = LocationConfig::WindowsShare(ShareConfig { path: None });
        let err = build_location(&config, None, "source.path").err().unwrap();
        assert!(err.to_string().contains("source.path"));
    }
}

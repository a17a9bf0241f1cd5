//! Location backends
//!
//! - `LocalLocation` - local directories and mounted network shares
//! - `SshLocation` - file trees on SSH hosts
//! - `walk` - local tree walking and atomic writes
//! - `build_location` - backend selection from config

mod factory;
mod local;
mod remote;
mod walk;

pub use factory::{build_location, LocationHandle};
pub use local::LocalLocation;
pub use remote::{SshLocation, SshSessionFactory};
pub use walk::{atomic_write, list_dir_files, modified_seconds, path_mtime, walk_files, WalkedFile};

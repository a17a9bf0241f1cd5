//! Assertion macros with descriptive failure messages.

use std::path::Path;

/// List all files in a directory recursively (for debugging)
pub fn list_all_files(dir: &Path) -> Vec<String> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(list_all_files(&path));
            } else {
                files.push(path.display().to_string());
            }
        }
    }
    files
}

/// Assert that a file exists in the destination tree.
///
/// # Example
/// ```ignore
/// assert_deployed!(env, "a.txt");
/// ```
#[macro_export]
macro_rules! assert_deployed {
    ($env:expr, $path:expr) => {
        let full_path = $env.destination_path($path);
        assert!(
            full_path.exists(),
            "Expected '{}' in the destination, but it doesn't exist.\n\
             Files found:\n  {}",
            $path,
            $crate::common::list_all_files(&$env.destination_path("")).join("\n  ")
        );
    };
}

/// Assert that a file is absent from the destination tree.
#[macro_export]
macro_rules! assert_not_deployed {
    ($env:expr, $path:expr) => {
        let full_path = $env.destination_path($path);
        assert!(
            !full_path.exists(),
            "Expected '{}' to NOT exist in the destination, but it does.",
            $path
        );
    };
}

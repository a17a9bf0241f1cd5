#![no_main]

use libfuzzer_sys::fuzz_target;
use stagehand::domain::value_objects::RelativePath;

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        if let Ok(path) = RelativePath::parse(raw) {
            assert!(!path.as_str().starts_with('/'));
            assert!(!path.as_str().split('/').any(|s| s == ".."));
        }
    }
});

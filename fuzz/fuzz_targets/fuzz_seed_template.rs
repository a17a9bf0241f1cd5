#![no_main]

use libfuzzer_sys::fuzz_target;
use stagehand::domain::ports::PasswordHasher;
use stagehand::domain::services::{bind_template, extract_template, BindSource};
use stagehand::domain::value_objects::VariableBinding;

struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, plain: &str) -> Result<String, String> {
        Ok(plain.to_string())
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };
    let (script, document) = content.split_once('\0').unwrap_or((content, "{}"));
    let Some(template) = extract_template(script, "-- BEGIN", "-- END") else {
        return;
    };
    let Ok(document) = serde_json::from_str::<serde_json::Value>(document) else {
        return;
    };
    let bindings = [
        VariableBinding::new("{{NAME}}", "name"),
        VariableBinding::new("{{PASSWORD}}", "password"),
        VariableBinding::new("{{ITEM}}", "."),
    ];
    let _ = bind_template(&template, &bindings, BindSource::document(&document), &PlainHasher);
});

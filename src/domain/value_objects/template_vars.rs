//! `{{KEY}}` placeholder substitution for SQL scripts.

use std::collections::BTreeMap;

/// Variables substituted into SQL scripts before execution.
///
/// Placeholders without a value are left untouched so a misconfiguration is
/// visible in the executed SQL rather than silently replaced by nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVars {
    values: BTreeMap<String, String>,
}

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable. `None` values are skipped.
    pub fn with(mut self, key: &str, value: Option<&str>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.values.insert(key.to_string(), value.to_string());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replace every `{{KEY}}` with its value.
    pub fn render(&self, content: &str) -> String {
        let mut rendered = content.to_string();
        for (key, value) in &self.values {
            let placeholder = format!("{{{{{}}}}}", key);
            if rendered.contains(&placeholder) {
                rendered = rendered.replace(&placeholder, value);
            }
        }
        rendered
    }
}

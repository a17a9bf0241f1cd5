//! Declarative seed table definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which database kind a seed table belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedDatabase {
    #[default]
    Main,
    Tenant,
}

/// Binds one SQL placeholder to a field of the JSON seed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableBinding {
    /// Placeholder as written in the template, e.g. `{{NAME}}`
    pub sql_var: String,
    /// Dot path into the JSON element; `.` or empty binds a primitive element itself
    #[serde(default)]
    pub json_field: String,
    /// Read from the parent context instead of the current element
    #[serde(default)]
    pub from_parent: bool,
    /// Used when the field is missing or null
    #[serde(default)]
    pub default_value: Option<Value>,
}

impl VariableBinding {
    pub fn new(sql_var: impl Into<String>, json_field: impl Into<String>) -> Self {
        Self {
            sql_var: sql_var.into(),
            json_field: json_field.into(),
            from_parent: false,
            default_value: None,
        }
    }

    pub fn from_parent(mut self) -> Self {
        self.from_parent = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Password placeholders are hashed before binding.
    pub fn is_password(&self) -> bool {
        let upper = self.sql_var.to_uppercase();
        upper.contains("PASSWORD_HASH") || upper == "{{PASSWORD}}"
    }
}

/// One table seeded from JSON documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedTableDefinition {
    pub table_name: String,
    /// SQL file holding the marked INSERT template
    pub table_script_file: PathBuf,
    pub begin_mark: String,
    pub end_mark: String,
    /// Count query; a positive result skips the table
    #[serde(default)]
    pub check_exists_query: Option<String>,
    #[serde(default)]
    pub variables: Vec<VariableBinding>,
    /// Dot path to a list; one INSERT per element
    #[serde(default)]
    pub array_field: Option<String>,
    /// Dot path to a list inside each `array_field` element
    #[serde(default)]
    pub nested_array_field: Option<String>,
    #[serde(default)]
    pub database: SeedDatabase,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_convention() {
        assert!(VariableBinding::new("{{PASSWORD}}", "password").is_password());
        assert!(VariableBinding::new("{{password}}", "password").is_password());
        assert!(VariableBinding::new("{{ADMIN_PASSWORD_HASH}}", "pw").is_password());
        assert!(!VariableBinding::new("{{PASSWORD_HINT}}", "hint").is_password());
        assert!(!VariableBinding::new("{{USER_PASSWORD}}", "pw").is_password());
    }

    #[test]
    fn definition_defaults_from_json() {
        let json = r#"{
            "table_name": "users",
            "table_script_file": "db/tables/users.sql",
            "begin_mark": "-- BEGIN INSERT",
            "end_mark": "-- END INSERT",
            "variables": [{"sql_var": "{{NAME}}", "json_field": "name"}]
        }"#;
        let table: SeedTableDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(table.database, SeedDatabase::Main);
        assert!(table.check_exists_query.is_none());
        assert!(table.array_field.is_none());
        assert!(!table.variables[0].from_parent);
        assert!(table.variables[0].default_value.is_none());
    }
}

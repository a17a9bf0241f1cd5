//! SQL seed templates
//!
//! Seed SQL files carry an INSERT statement between two marker comments.
//! This module extracts that template and binds JSON values into it as
//! typed SQL literals.

use regex::Regex;
use serde_json::Value;

use crate::domain::ports::PasswordHasher;
use crate::domain::value_objects::VariableBinding;

/// Extract the first region between `begin` and `end`, trimmed.
///
/// Markers are literal text; the region may span lines.
pub fn extract_template(content: &str, begin: &str, end: &str) -> Option<String> {
    let pattern = format!("(?s){}(.*?){}", regex::escape(begin), regex::escape(end));
    let re = Regex::new(&pattern).ok()?;
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Resolve a dot path (`terminology.employee`) inside a JSON value.
///
/// Missing keys, non-object steps and JSON `null` all resolve to `None`.
pub fn lookup<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    let mut current = value;
    for key in path.split('.') {
        current = current.as_object()?.get(key)?;
    }
    (!current.is_null()).then_some(current)
}

/// A JSON value converted for splicing into SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    /// Binds as `NULL`; template quotes are stripped
    Null,
    /// Number or boolean literal
    Number(String),
    /// Quote-escaped text; the template supplies the quotes
    Text(String),
    /// Expression such as `UNHEX('..')` or `NOW()`; template quotes are stripped
    Expression(String),
}

impl SqlValue {
    fn rendered(&self) -> &str {
        match self {
            SqlValue::Null => "NULL",
            SqlValue::Number(s) | SqlValue::Text(s) | SqlValue::Expression(s) => s,
        }
    }

    fn strips_quotes(&self) -> bool {
        matches!(self, SqlValue::Null | SqlValue::Expression(_))
    }
}

/// Errors raised while binding a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    PasswordHash { sql_var: String, message: String },
}

impl std::fmt::Display for BindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindError::PasswordHash { sql_var, message } => {
                write!(f, "cannot hash value for {}: {}", sql_var, message)
            }
        }
    }
}

impl std::error::Error for BindError {}

/// A binding whose field was absent, bound as `NULL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingField {
    pub json_field: String,
    pub sql_var: String,
}

/// Output of `bind_template`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundStatement {
    pub sql: String,
    pub missing: Vec<MissingField>,
}

fn escape_quotes(text: &str) -> String {
    text.replace('\'', "''")
}

fn hash_password(
    plain: &str,
    binding: &VariableBinding,
    hasher: &dyn PasswordHasher,
) -> Result<SqlValue, BindError> {
    let hashed = hasher
        .hash(plain)
        .map_err(|message| BindError::PasswordHash {
            sql_var: binding.sql_var.clone(),
            message,
        })?;
    Ok(SqlValue::Expression(format!(
        "UNHEX('{}')",
        hex::encode(hashed.as_bytes())
    )))
}

/// Convert one resolved value to its SQL form.
///
/// Priority: null, password scalar, number/boolean, object/array, function
/// call string, plain string. Password numbers and booleans are hashed in
/// their JSON text form.
pub fn coerce(
    value: Option<&Value>,
    binding: &VariableBinding,
    hasher: &dyn PasswordHasher,
) -> Result<SqlValue, BindError> {
    let Some(value) = value else {
        return Ok(SqlValue::Null);
    };

    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::String(text) if binding.is_password() => hash_password(text, binding, hasher)?,
        Value::Bool(_) | Value::Number(_) if binding.is_password() => {
            hash_password(&value.to_string(), binding, hasher)?
        }
        Value::Bool(flag) => SqlValue::Number(if *flag { "1" } else { "0" }.to_string()),
        Value::Number(number) => SqlValue::Number(number.to_string()),
        Value::Object(_) | Value::Array(_) => SqlValue::Text(escape_quotes(&value.to_string())),
        Value::String(text) if text.trim().to_uppercase().ends_with("()") => {
            SqlValue::Expression(text.trim().to_string())
        }
        Value::String(text) => SqlValue::Text(escape_quotes(text)),
    })
}

/// Where a binding reads its values from.
#[derive(Debug, Clone, Copy)]
pub struct BindSource<'a> {
    /// Current element (an array entry, or the whole document)
    pub element: &'a Value,
    /// Enclosing context for `from_parent` bindings
    pub parent: Option<&'a Value>,
}

impl<'a> BindSource<'a> {
    pub fn document(document: &'a Value) -> Self {
        Self {
            element: document,
            parent: None,
        }
    }

    fn resolve(&self, binding: &VariableBinding) -> Option<&'a Value> {
        let source = match (binding.from_parent, self.parent) {
            (true, Some(parent)) => parent,
            _ => self.element,
        };

        let field = binding.json_field.trim();
        if (field.is_empty() || field == ".") && !source.is_object() {
            return (!source.is_null()).then_some(source);
        }
        lookup(source, field)
    }
}

/// Substitute every binding into `template`.
///
/// `'{{VAR}}'` loses its quotes when the value is `NULL`, a password hash or
/// a function call; otherwise only the placeholder is replaced and the
/// template's quotes stay.
pub fn bind_template(
    template: &str,
    bindings: &[VariableBinding],
    source: BindSource<'_>,
    hasher: &dyn PasswordHasher,
) -> Result<BoundStatement, BindError> {
    let mut sql = template.to_string();
    let mut missing = Vec::new();

    for binding in bindings {
        let resolved = source.resolve(binding);
        let value = resolved.or(binding.default_value.as_ref().filter(|v| !v.is_null()));

        if value.is_none() {
            missing.push(MissingField {
                json_field: binding.json_field.clone(),
                sql_var: binding.sql_var.clone(),
            });
        }

        let sql_value = coerce(value, binding, hasher)?;
        let quoted = format!("'{}'", binding.sql_var);

        if sql_value.strips_quotes() && sql.contains(&quoted) {
            sql = sql.replace(&quoted, sql_value.rendered());
        }
        sql = sql.replace(&binding.sql_var, sql_value.rendered());
    }

    Ok(BoundStatement { sql, missing })
}

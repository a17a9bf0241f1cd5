//! Property tests for seed value binding.

use proptest::prelude::*;
use serde_json::json;

use stagehand::domain::ports::PasswordHasher;
use stagehand::domain::services::{bind_template, BindSource};
use stagehand::domain::value_objects::VariableBinding;

struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, plain: &str) -> Result<String, String> {
        Ok(plain.to_string())
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: bound text literals never leave a lone single quote.
    #[test]
    fn property_text_is_quote_escaped(text in "[^(){}]{0,64}") {
        let bindings = [VariableBinding::new("{{NAME}}", "name")];
        let document = json!({"name": text});
        let bound = bind_template(
            "'{{NAME}}'",
            &bindings,
            BindSource::document(&document),
            &PlainHasher,
        )
        .unwrap();

        let inner = &bound.sql[1..bound.sql.len() - 1];
        prop_assert_eq!(inner.replace("''", ""), text.replace('\'', ""));
        prop_assert!(bound.missing.is_empty());
    }

    /// PROPERTY: numbers are bound verbatim.
    #[test]
    fn property_numbers_bind_verbatim(n in any::<i64>()) {
        let bindings = [VariableBinding::new("{{QTY}}", "qty")];
        let document = json!({"qty": n});
        let bound = bind_template(
            "VALUES ({{QTY}})",
            &bindings,
            BindSource::document(&document),
            &PlainHasher,
        )
        .unwrap();
        prop_assert_eq!(bound.sql, format!("VALUES ({})", n));
    }
}

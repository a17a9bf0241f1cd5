//! Property tests for relative path validation.

use proptest::prelude::*;

use stagehand::domain::value_objects::RelativePath;

fn segment() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9_-][A-Za-z0-9._-]{0,12}")
        .unwrap()
        .prop_filter("not a dot segment", |s| s != "." && s != "..")
}

fn relative_path() -> impl Strategy<Value = String> {
    proptest::collection::vec(segment(), 1..=5).prop_map(|segments| segments.join("/"))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: validation never panics on arbitrary input.
    #[test]
    fn property_parse_never_panics(s in "(?s).{0,256}") {
        let _ = RelativePath::parse(&s);
    }

    /// PROPERTY: an accepted path never climbs out of the root or is absolute.
    #[test]
    fn property_accepted_paths_stay_inside(s in "[a-z./\\\\:]{0,48}") {
        if let Ok(path) = RelativePath::parse(&s) {
            let normalized = path.as_str();
            prop_assert!(!normalized.starts_with('/'));
            prop_assert!(!normalized.contains('\\'));
            prop_assert!(normalized.split('/').all(|seg| !seg.is_empty() && seg != "." && seg != ".."));
        }
    }

    /// PROPERTY: plain relative paths are accepted unchanged.
    #[test]
    fn property_plain_paths_round_trip(s in relative_path()) {
        let parsed = RelativePath::parse(&s).unwrap();
        prop_assert_eq!(parsed.as_str(), s.as_str());
        prop_assert_eq!(parsed.depth(), s.split('/').count());
    }

    /// PROPERTY: a leading `..` is always rejected.
    #[test]
    fn property_parent_prefix_rejected(s in relative_path()) {
        let escaping = format!("../{}", s);
        prop_assert!(RelativePath::parse(&escaping).is_err());
        let windows = escaping.replace('/', "\\");
        prop_assert!(RelativePath::parse(&windows).is_err());
    }
}

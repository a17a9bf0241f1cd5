//! Property tests for change detection.

use std::collections::{BTreeMap, HashSet};

use proptest::prelude::*;

use stagehand::domain::entities::{ChangeCache, FileRecord};
use stagehand::domain::services::Differ;
use stagehand::domain::value_objects::IgnorePatterns;

fn listing() -> impl Strategy<Value = Vec<FileRecord>> {
    let path = proptest::string::string_regex("[a-c]{1,2}(/[a-c]{1,2}){0,2}\\.txt").unwrap();
    proptest::collection::btree_map(path, (0u64..64, 0u32..1_000), 0..24).prop_map(
        |entries: BTreeMap<String, (u64, u32)>| {
            entries
                .into_iter()
                .map(|(path, (size, mtime))| FileRecord::file(&path, size, f64::from(mtime)))
                .collect()
        },
    )
}

fn settled_cache(source: &[FileRecord]) -> ChangeCache {
    let mut cache = ChangeCache::new();
    cache.record_sync(source, &IgnorePatterns::empty(), &HashSet::new(), "2026-01-01T00:00:00Z");
    cache
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: every path lands in at most one bucket, and every source path
    /// absent from the destination is new.
    #[test]
    fn property_buckets_are_disjoint(source in listing(), destination in listing()) {
        let patterns = IgnorePatterns::empty();
        let changes = Differ::new(&patterns).diff(&source, &destination, &ChangeCache::new());

        let new: HashSet<_> = changes.new_paths().into_iter().collect();
        let modified: HashSet<_> = changes.modified_paths().into_iter().collect();
        let deleted: HashSet<_> = changes.deleted.iter().map(String::as_str).collect();
        prop_assert!(new.is_disjoint(&modified));
        prop_assert!(new.is_disjoint(&deleted));
        prop_assert!(modified.is_disjoint(&deleted));

        let destination_paths: HashSet<_> = destination.iter().map(|r| r.path.as_str()).collect();
        for record in &source {
            prop_assert_eq!(
                new.contains(record.path.as_str()),
                !destination_paths.contains(record.path.as_str())
            );
        }
    }

    /// PROPERTY: after a sync is recorded, diffing the same trees is empty.
    #[test]
    fn property_settled_tree_diffs_empty(source in listing()) {
        let patterns = IgnorePatterns::empty();
        let cache = settled_cache(&source);
        let changes = Differ::new(&patterns).diff(&source, &source, &cache);
        prop_assert!(changes.is_empty(), "{:?}", changes);
    }

    /// PROPERTY: cache-only mode never reports deletions.
    #[test]
    fn property_cache_only_never_deletes(previous in listing(), source in listing()) {
        prop_assume!(!previous.is_empty());
        let patterns = IgnorePatterns::empty();
        let cache = settled_cache(&previous);
        let differ = Differ::new(&patterns).with_cache_only(true);
        prop_assert!(differ.is_cache_only(&cache));
        let changes = differ.diff(&source, &[], &cache);
        prop_assert!(changes.deleted.is_empty());
    }
}

#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use resx_core::{MemoryStore, Resource, ResourceMutation, SchemaRegistry, SystemStore, TransactionProcessor};

proptest! {
    #[test]
    fn prop_response_has_one_record_per_entry_plus_report(count in 0usize..24) {
        let registry = SchemaRegistry::builtin();
        let mut store = MemoryStore::new();
        let batch = (0..count)
            .map(|_| ResourceMutation::create(Resource::new("Organization")))
            .collect();

        let outcome = TransactionProcessor::new(&registry)
            .process(store.begin(&registry), batch)
            .unwrap();

        prop_assert_eq!(outcome.record_count(), count + 1);
        prop_assert_eq!(outcome.report.creations, count);
        let total: u64 = store.resource_counts().unwrap().values().sum();
        prop_assert_eq!(total, count as u64);
    }
}

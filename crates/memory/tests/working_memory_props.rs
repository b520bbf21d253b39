//! Property tests for the working-memory capacity and freshness invariants.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use tessera_memory::{MemoryItem, WorkingMemoryStore};

proptest! {
    #[test]
    fn size_never_exceeds_capacity(
        capacity in 1usize..12,
        adds in prop::collection::vec((0.0f64..=1.0, 0i64..240, "[a-z]{1,8}( [a-z]{1,8}){0,4}"), 1..60),
    ) {
        let mut store = WorkingMemoryStore::new(capacity, 60).unwrap();
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();

        // Clock advances monotonically; each item is stamped some minutes in the past.
        for (step, (importance, age_minutes, content)) in adds.into_iter().enumerate() {
            let now = base + Duration::minutes(step as i64);
            let item = MemoryItem::with_id(
                format!("m{step}"),
                content,
                importance,
                now - Duration::minutes(age_minutes),
            )
            .unwrap();
            store.add_at(item, now);
            prop_assert!(store.len() <= capacity);
            prop_assert!(store.items().all(|i| now - i.timestamp() <= Duration::minutes(60)));
        }
    }

    #[test]
    fn expired_items_never_retrieved(
        max_age in 1i64..120,
        ages in prop::collection::vec(0i64..240, 1..30),
    ) {
        let mut store = WorkingMemoryStore::new(64, max_age).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();

        for (i, age) in ages.iter().enumerate() {
            let stamped = now - Duration::minutes(*age);
            let item = MemoryItem::with_id(format!("m{i}"), "shared keyword", 0.5, stamped).unwrap();
            // Inserted at its own timestamp so nothing is expired on the way in.
            store.add_at(item, stamped);
        }

        let hits = store.retrieve_at("keyword", 64, now);
        for hit in &hits {
            prop_assert!(now - hit.item.timestamp() <= Duration::minutes(max_age));
        }
        let fresh = ages.iter().filter(|a| **a <= max_age).count();
        prop_assert_eq!(hits.len(), fresh);
    }
}

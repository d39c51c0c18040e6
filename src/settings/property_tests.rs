//! Property-based tests for snapshot merge invariants.
//!
//! # Tested Invariants
//!
//! - A read with nothing stored yields exactly the defaults for the keys
//! - A present, non-null stored value always wins over the default
//! - Snapshots hold exactly the requested keys, never more
//! - Key order and duplicates do not change the result
//!
//! # Running Tests
//!
//! ```bash
//! cargo test settings::property_tests
//! ```

use super::snapshot::{Defaults, KeySet};
use proptest::prelude::*;
use serde_json::{Map, Value};

// ============================================================================
// Test Strategies - Input Generation
// ============================================================================

/// Strategy for generating key names.
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

/// Strategy for generating non-null JSON scalars, falsy ones included.
fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::from(0)),
        Just(Value::from(false)),
        Just(Value::from("")),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-z ]{0,12}".prop_map(Value::from),
    ]
}

fn map_strategy() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map(key_strategy(), value_strategy(), 0..8)
        .prop_map(|entries| entries.into_iter().collect())
}

fn keys_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(key_strategy(), 0..10)
}

proptest! {
    #[test]
    fn empty_storage_yields_defaults(defaults in map_strategy(), keys in keys_strategy()) {
        let key_set = KeySet::new(keys.clone());
        let snapshot = Defaults::from_map(defaults.clone()).resolve(&key_set, &Map::new());

        for key in &keys {
            let expected = defaults.get(key).cloned().unwrap_or(Value::Null);
            prop_assert_eq!(snapshot.value(key), Some(&expected));
        }
    }

    #[test]
    fn stored_values_always_win(
        defaults in map_strategy(),
        stored in map_strategy(),
        keys in keys_strategy(),
    ) {
        let key_set = KeySet::new(keys.clone());
        let snapshot = Defaults::from_map(defaults).resolve(&key_set, &stored);

        for key in &keys {
            if let Some(value) = stored.get(key) {
                prop_assert_eq!(snapshot.value(key), Some(value));
            }
        }
    }

    #[test]
    fn snapshot_holds_exactly_requested_keys(
        defaults in map_strategy(),
        stored in map_strategy(),
        keys in keys_strategy(),
    ) {
        let key_set = KeySet::new(keys.clone());
        let snapshot = Defaults::from_map(defaults).resolve(&key_set, &stored);

        let mut expected: Vec<&str> = keys.iter().map(String::as_str).collect();
        expected.sort_unstable();
        expected.dedup();
        let mut actual: Vec<&str> = snapshot.keys().collect();
        actual.sort_unstable();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn key_order_and_duplicates_are_irrelevant(
        defaults in map_strategy(),
        stored in map_strategy(),
        keys in keys_strategy(),
    ) {
        let defaults = Defaults::from_map(defaults);
        let forward = defaults.resolve(&KeySet::new(keys.clone()), &stored);

        let mut shuffled = keys.clone();
        shuffled.reverse();
        shuffled.extend(keys);
        let backward = defaults.resolve(&KeySet::new(shuffled), &stored);

        prop_assert_eq!(forward, backward);
    }
}

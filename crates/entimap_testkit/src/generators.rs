//! Property-based test generators using proptest.
//!
//! Provides strategies for generating native values, keys, and entities
//! that stay within the mappable subset, plus bounded fixture instances.

use crate::fixtures::User;
use entimap_value::{Entity, Key, KeyId, Timestamp, Value};
use proptest::prelude::*;

/// Strategy for generating entity kind names.
pub fn kind_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][a-zA-Z0-9]{0,15}").expect("Invalid regex")
}

/// Strategy for generating stored property names.
pub fn property_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,23}").expect("Invalid regex")
}

/// Strategy for generating timestamps that stay within the
/// chrono-convertible range.
pub fn timestamp_strategy() -> impl Strategy<Value = Timestamp> {
    (-62_000_000_000_000_000i64..62_000_000_000_000_000i64).prop_map(Timestamp::from_micros)
}

/// Strategy for generating key id components.
pub fn key_id_strategy() -> impl Strategy<Value = KeyId> {
    prop_oneof![
        any::<i64>().prop_map(KeyId::Numeric),
        prop::string::string_regex("[a-z0-9-]{1,12}")
            .expect("Invalid regex")
            .prop_map(KeyId::Text),
    ]
}

/// Strategy for generating complete keys with up to one ancestor.
pub fn key_strategy() -> impl Strategy<Value = Key> {
    (
        kind_strategy(),
        key_id_strategy(),
        prop::option::of((kind_strategy(), key_id_strategy())),
    )
        .prop_map(|(kind, id, parent)| {
            let key = Key::incomplete(kind).with_id(id);
            match parent {
                Some((parent_kind, parent_id)) => {
                    key.with_parent(Key::incomplete(parent_kind).with_id(parent_id))
                }
                None => key,
            }
        })
}

/// Strategy for generating scalar native values.
///
/// Doubles are restricted to comparable floats so round-trip assertions
/// can use equality.
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        (prop::num::f64::NORMAL | prop::num::f64::ZERO).prop_map(Value::Double),
        prop::string::string_regex("[ -~]{0,24}")
            .expect("Invalid regex")
            .prop_map(Value::Text),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(Value::Bytes),
        timestamp_strategy().prop_map(Value::Timestamp),
        key_strategy().prop_map(Value::KeyRef),
    ]
}

/// Strategy for generating native values, including lists and nested
/// entities up to a small depth.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_value_strategy().prop_recursive(2, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::vec((property_name_strategy(), inner), 0..4).prop_map(|pairs| {
                let mut builder = Entity::builder();
                for (name, value) in pairs {
                    builder = builder.set(name, value);
                }
                Value::Entity(builder.build())
            }),
        ]
    })
}

/// Strategy for generating keyless native entities.
pub fn entity_strategy() -> impl Strategy<Value = Entity> {
    prop::collection::vec((property_name_strategy(), value_strategy()), 0..6).prop_map(|pairs| {
        let mut builder = Entity::builder();
        for (name, value) in pairs {
            builder = builder.set(name, value);
        }
        builder.build()
    })
}

/// Strategy for generating populated [`User`] instances.
pub fn user_strategy() -> impl Strategy<Value = User> {
    (
        prop::option::of(1i64..1_000_000),
        prop::string::string_regex("[A-Za-z ]{0,16}").expect("Invalid regex"),
        prop::string::string_regex("[A-Za-z]{1,8}@[a-z]{1,8}\\.com").expect("Invalid regex"),
        0i32..120,
        any::<bool>(),
        prop::option::of(prop::string::string_regex("[a-z ]{0,32}").expect("Invalid regex")),
        prop::collection::hash_set(
            prop::string::string_regex("[a-z]{1,8}").expect("Invalid regex"),
            0..4,
        ),
        prop::collection::btree_set(
            prop::string::string_regex("[a-z]{1,8}").expect("Invalid regex"),
            0..4,
        ),
        prop::collection::vec(any::<i64>(), 0..4),
        0i64..1_000,
    )
        .prop_map(
            |(id, name, email, age, active, bio, roles, bookmarks, logins, revision)| User {
                id,
                name,
                email,
                age,
                active,
                bio,
                roles,
                bookmarks,
                logins,
                revision,
            },
        )
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn generated_keys_are_complete(key in key_strategy()) {
            prop_assert!(key.is_complete());
            if let Some(parent) = key.parent() {
                prop_assert!(parent.is_complete());
            }
        }

        #[test]
        fn generated_timestamps_convert(ts in timestamp_strategy()) {
            prop_assert!(ts.to_utc().is_ok());
        }

        #[test]
        fn generated_entities_stay_bounded(entity in entity_strategy()) {
            prop_assert!(entity.len() < 6);
            for name in entity.names() {
                prop_assert!(!name.is_empty());
            }
        }

        #[test]
        fn generated_users_have_plausible_emails(user in user_strategy()) {
            prop_assert!(user.email.contains('@'));
            prop_assert!(user.age < 120);
        }
    }
}

//! Cross-type mapping test helpers.
//!
//! Drives model instances through a shared [`Mapper`] in both directions
//! and provides layout and versioning assertions for the results.

use entimap_core::{Mapper, MappingError, Persistable};
use entimap_value::Entity;
use std::fmt::Debug;

/// A test harness wrapping a mapper with round-trip assertions.
pub struct MappingHarness {
    /// The mapper under test.
    pub mapper: Mapper,
}

impl MappingHarness {
    /// Creates a harness over a fresh mapper and registry.
    pub fn new() -> Self {
        Self {
            mapper: Mapper::default(),
        }
    }

    /// Marshals and unmarshals `instance`, asserting the reconstruction
    /// equals the input, and returns the native form for further checks.
    pub fn assert_round_trip<E>(&self, instance: &E) -> Entity
    where
        E: Persistable + PartialEq + Debug,
    {
        let native = self.mapper.marshal(instance).expect("Failed to marshal");
        let back: E = self.mapper.unmarshal(&native).expect("Failed to unmarshal");
        assert_eq!(&back, instance, "Round trip should reproduce the instance");
        native
    }

    /// Unmarshals `native` as `E`, expecting the mapping to be refused.
    pub fn assert_unmarshal_fails<E: Persistable>(&self, native: &Entity) -> MappingError {
        match self.mapper.unmarshal::<E>(native) {
            Ok(_) => panic!("Expected unmarshalling to fail"),
            Err(err) => err,
        }
    }
}

impl Default for MappingHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Embedded layout checks.
pub mod layout {
    use entimap_value::{Entity, Value};

    /// Asserts the flattened layout: every nested name is a direct property
    /// and nothing is stored under the field name itself.
    pub fn assert_exploded(native: &Entity, field: &str, nested: &[&str]) {
        assert!(
            !native.contains(field),
            "Exploded field {:?} should not appear as a property",
            field
        );
        for name in nested {
            assert!(
                native.contains(name),
                "Exploded field {:?} should surface property {:?}",
                field,
                name
            );
        }
    }

    /// Asserts the nested layout: one entity-valued property under `field`
    /// containing every nested name.
    pub fn assert_imploded(native: &Entity, field: &str, nested: &[&str]) {
        match native.get(field) {
            Some(Value::Entity(inner)) => {
                for name in nested {
                    assert!(
                        inner.contains(name),
                        "Imploded field {:?} should contain property {:?}",
                        field,
                        name
                    );
                }
            }
            other => panic!("Expected an entity under {:?}, got {:?}", field, other),
        }
    }
}

/// Version property checks.
pub mod versioning {
    use entimap_core::{Mapper, Persistable};
    use entimap_value::{Entity, Value};

    /// Bumps the version property of `native` through the mapper and
    /// asserts copy semantics: the result carries the next version while the
    /// input, key, and property set are preserved.
    pub fn assert_increment<E: Persistable>(
        mapper: &Mapper,
        native: &Entity,
        property: &str,
    ) -> Entity {
        let old = match native.get(property) {
            Some(Value::Integer(n)) => *n,
            other => panic!("Expected an integer version, got {:?}", other),
        };
        let bumped = mapper
            .increment_version::<E>(native)
            .expect("Failed to increment version");
        assert_eq!(
            bumped.get(property),
            Some(&Value::Integer(old + 1)),
            "Version should increase by one"
        );
        assert_eq!(
            native.get(property),
            Some(&Value::Integer(old)),
            "Input should keep its version"
        );
        assert_eq!(
            bumped.len(),
            native.len(),
            "Increment should preserve the property set"
        );
        assert_eq!(
            bumped.key(),
            native.key(),
            "Increment should preserve the key"
        );
        bumped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{scenarios, Account, Order, User};
    use crate::generators::{entity_strategy, user_strategy, PropTestConfig};
    use chrono::DateTime;
    use entimap_core::{EntityDescriptor, IdField, PropertyField};
    use entimap_value::{Key, Timestamp, Value};
    use proptest::prelude::*;

    #[test]
    fn round_trips_direct_model() {
        let harness = MappingHarness::new();
        let native = harness.assert_round_trip(&scenarios::sample_user());
        assert_eq!(native.key().map(|k| k.kind()), Some("User"));
    }

    #[test]
    fn round_trips_builder_model_with_parent() {
        let harness = MappingHarness::new();
        let native = harness.assert_round_trip(&scenarios::sample_account());
        assert_eq!(native.key().map(|k| k.kind()), Some("Account"));
        assert_eq!(
            native.key().and_then(|k| k.parent()).map(|p| p.kind()),
            Some("User")
        );
    }

    #[test]
    fn round_trips_wrapper_identifier() {
        let harness = MappingHarness::new();
        let native = harness.assert_round_trip(&scenarios::sample_order());
        let id = native
            .key()
            .and_then(|k| k.id())
            .and_then(|id| id.as_numeric());
        assert_eq!(id, Some(401));
    }

    #[test]
    fn round_trips_embedded_layouts() {
        let harness = MappingHarness::new();
        let native = harness.assert_round_trip(&scenarios::sample_customer());
        layout::assert_exploded(&native, "home", &["street", "city", "zip", "geo"]);
        layout::assert_imploded(&native, "office", &["street", "city", "zip", "geo"]);
    }

    #[test]
    fn builder_product_from_stored_entity() {
        #[derive(Debug, PartialEq)]
        struct Person {
            id: Option<i64>,
            name: String,
            age: i32,
        }

        #[derive(Default)]
        struct PersonBuilder {
            id: Option<i64>,
            name: String,
            age: i32,
        }

        impl Persistable for Person {
            fn descriptor() -> EntityDescriptor {
                EntityDescriptor::with_builder::<Person, PersonBuilder, _, _>(
                    "Person",
                    PersonBuilder::default,
                    |b| Person {
                        id: b.id,
                        name: b.name,
                        age: b.age,
                    },
                )
                .id(IdField::new(
                    |p: &Person| p.id,
                    |b: &mut PersonBuilder, id: i64| b.id = Some(id),
                )
                .auto_generated())
                .property(PropertyField::new(
                    "name",
                    |p: &Person| p.name.clone(),
                    |b: &mut PersonBuilder, v: String| b.name = v,
                ))
                .property(PropertyField::new(
                    "age",
                    |p: &Person| p.age,
                    |b: &mut PersonBuilder, v: i32| b.age = v,
                ))
            }
        }

        let stored = Entity::builder()
            .key(Key::numeric("Person", 1))
            .set("name", "Ada")
            .set("age", 30i64)
            .build();

        let harness = MappingHarness::new();
        let person: Person = harness
            .mapper
            .unmarshal(&stored)
            .expect("Failed to unmarshal");
        assert_eq!(
            person,
            Person {
                id: Some(1),
                name: "Ada".to_string(),
                age: 30,
            }
        );
    }

    #[test]
    fn ordered_set_marshals_sorted() {
        let harness = MappingHarness::new();
        let native = harness.assert_round_trip(&scenarios::sample_user());
        let expected: Vec<Value> = ["a", "b", "c"]
            .iter()
            .map(|s| Value::Text((*s).to_string()))
            .collect();
        assert_eq!(native.get("bookmarks"), Some(&Value::List(expected)));
    }

    #[test]
    fn timestamp_truncates_to_microseconds() {
        let precise = DateTime::from_timestamp(1_700_000_000, 123_456_789)
            .expect("In-range timestamp");
        let account = Account::new("acct-ts", 1.0, precise);

        let harness = MappingHarness::new();
        let native = harness.mapper.marshal(&account).expect("Failed to marshal");
        assert_eq!(
            native.get("opened_at"),
            Some(&Value::Timestamp(Timestamp::from_micros(
                1_700_000_000_123_456
            )))
        );

        let back: Account = harness
            .mapper
            .unmarshal(&native)
            .expect("Failed to unmarshal");
        let truncated =
            DateTime::from_timestamp(1_700_000_000, 123_456_000).expect("In-range timestamp");
        assert_eq!(back.opened_at(), truncated);
        assert_ne!(back.opened_at(), precise);
    }

    #[test]
    fn custom_converter_rejects_out_of_range() {
        let stored = Entity::builder()
            .key(Key::numeric("Order", 1))
            .set("progress", 250i64)
            .build();

        let harness = MappingHarness::new();
        let err = harness.assert_unmarshal_fails::<Order>(&stored);
        match &err {
            MappingError::Property {
                property, source, ..
            } => {
                assert_eq!(property, "progress");
                assert!(source.to_string().contains("out of range"));
            }
            other => panic!("Expected a property error, got {:?}", other),
        }
    }

    #[test]
    fn secondary_index_is_derived_and_ignored() {
        let harness = MappingHarness::new();
        let native = harness
            .mapper
            .marshal(&scenarios::sample_user())
            .expect("Failed to marshal");
        assert_eq!(
            native.get("$email"),
            Some(&Value::Text("ada@example.com".to_string()))
        );

        // Derived data never flows back; a stale index value is ignored.
        let stale = native.to_builder().set("$email", "STALE").build();
        let back: User = harness
            .mapper
            .unmarshal(&stale)
            .expect("Failed to unmarshal");
        assert_eq!(back.email, "Ada@Example.com");
    }

    #[test]
    fn optional_none_is_absent_and_stored_null_reads_back() {
        let harness = MappingHarness::new();
        let native = harness
            .mapper
            .marshal(&scenarios::sample_user())
            .expect("Failed to marshal");
        assert!(!native.contains("bio"));

        let with_null = native.to_builder().set("bio", Value::Null).build();
        let back: User = harness
            .mapper
            .unmarshal(&with_null)
            .expect("Failed to unmarshal");
        assert_eq!(back.bio, None);

        let with_bio = native.to_builder().set("bio", "polymath").build();
        let back: User = harness
            .mapper
            .unmarshal(&with_bio)
            .expect("Failed to unmarshal");
        assert_eq!(back.bio, Some("polymath".to_string()));
    }

    #[test]
    fn unmarshal_tolerates_missing_properties() {
        let stored = Entity::builder()
            .key(Key::numeric("User", 9))
            .set("name", "Min")
            .build();

        let harness = MappingHarness::new();
        let user: User = harness
            .mapper
            .unmarshal(&stored)
            .expect("Failed to unmarshal");
        assert_eq!(user.id, Some(9));
        assert_eq!(user.name, "Min");
        assert_eq!(user.email, "");
        assert_eq!(user.age, 0);
        assert!(user.roles.is_empty());
    }

    #[test]
    fn deferred_allocation_depends_on_id_kind() {
        let harness = MappingHarness::new();
        harness
            .mapper
            .validate_deferred_id_allocation::<User>()
            .expect("Numeric identifiers should pass");

        let err = harness
            .mapper
            .validate_deferred_id_allocation::<Account>()
            .expect_err("Text identifiers should be refused");
        assert!(err.to_string().contains("deferred id allocation"));
    }

    #[test]
    fn maps_batches() {
        let mut other = scenarios::sample_user();
        other.id = Some(8);
        other.email = "Other@Example.com".to_string();
        let users = vec![scenarios::sample_user(), other];

        let harness = MappingHarness::new();
        let natives = harness
            .mapper
            .marshal_all(&users)
            .expect("Failed to marshal batch");
        assert_eq!(natives.len(), 2);

        let back: Vec<User> = harness
            .mapper
            .unmarshal_all(&natives)
            .expect("Failed to unmarshal batch");
        assert_eq!(back, users);
    }

    #[test]
    fn incremented_version_is_a_fresh_copy() {
        let harness = MappingHarness::new();
        let native = harness
            .mapper
            .marshal(&scenarios::sample_user())
            .expect("Failed to marshal");
        let bumped = versioning::assert_increment::<User>(&harness.mapper, &native, "revision");

        let back: User = harness
            .mapper
            .unmarshal(&bumped)
            .expect("Failed to unmarshal");
        assert_eq!(back.revision, 4);
    }

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn generated_users_round_trip(user in user_strategy()) {
            let mapper = Mapper::default();
            let native = mapper.marshal(&user).expect("Failed to marshal");
            let back: User = mapper.unmarshal(&native).expect("Failed to unmarshal");
            prop_assert_eq!(back, user);
        }

        #[test]
        fn entity_copies_preserve_shape(entity in entity_strategy()) {
            prop_assert_eq!(entity.to_builder().build(), entity);
        }

        #[test]
        fn generated_customers_keep_layouts(lat in -90.0f64..90.0, lng in -180.0f64..180.0) {
            let mut customer = scenarios::sample_customer();
            customer.home.geo.lat = lat;
            customer.home.geo.lng = lng;

            let harness = MappingHarness::new();
            let native = harness.assert_round_trip(&customer);
            layout::assert_exploded(&native, "home", &["street", "city", "zip", "geo"]);
        }
    }
}

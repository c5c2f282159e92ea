//! Benchmark utilities for EntiMap.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use entimap_core::Mapper;
use entimap_testkit::fixtures::{scenarios, User};
use entimap_value::Entity;
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Generate a random alphanumeric label of the given length.
pub fn random_text(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generate users derived from the sample fixture with randomized
/// identities, names, and versions.
pub fn random_users(count: usize) -> Vec<User> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let mut user = scenarios::sample_user();
            user.id = Some(rng.gen_range(1..1_000_000));
            user.name = random_text(12);
            user.email = format!("{}@example.com", random_text(8));
            user.revision = rng.gen_range(0..100);
            user
        })
        .collect()
}

/// Marshal a batch of random users for unmarshalling benchmarks.
pub fn stored_users(count: usize) -> Vec<Entity> {
    let mapper = Mapper::default();
    let users = random_users(count);
    mapper.marshal_all(&users).expect("Failed to marshal users")
}

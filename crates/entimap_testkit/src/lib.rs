//! # EntiMap Testkit
//!
//! Test utilities for EntiMap.
//!
//! This crate provides:
//! - Model fixtures covering the registration surface
//! - Property-based generators using proptest
//! - A round-trip harness with layout and versioning assertions
//! - Golden mapping vectors pinning marshalled shapes as JSON
//!
//! ## Usage
//!
//! ```rust,ignore
//! use entimap_testkit::prelude::*;
//!
//! #[test]
//! fn round_trips() {
//!     let harness = MappingHarness::new();
//!     harness.assert_round_trip(&scenarios::sample_user());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use vectors::*;

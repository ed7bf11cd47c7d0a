//! # OXMAPI Testkit
//!
//! Test utilities for the OXMAPI crates:
//! - [`TestStore`] and [`with_test_store`] for facade-level tests
//! - proptest strategies for values, rows and tag lists
//! - golden binary vectors for the blob decoders

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{named_row, with_test_store, StaticNameResolver, TestStore};

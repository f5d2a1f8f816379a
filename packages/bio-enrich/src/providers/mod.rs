//! Profile provider implementations.
//!
//! - `ApifyProvider` - one Apify actor per platform
//! - `MockProvider` (in [`crate::testing`]) - for tests

mod apify;

pub use apify::{apify_registry, ApifyProvider};

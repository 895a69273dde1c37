//! Shared test utilities for the todo crates
//!
//! - `TestDatabase`: PostgreSQL container with the todo schema applied (feature: "postgres")
//! - `TestDataBuilder`: deterministic names and deadlines per test
//!
//! ```rust,no_run
//! use test_utils::{TestDatabase, TestDataBuilder};
//!
//! # async fn example() {
//! let db = TestDatabase::new().await;
//! let data = TestDataBuilder::from_test_name("insert_then_select");
//!
//! let name = data.name("todo", 1);
//! let deadline = data.deadline(3);
//! # }
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::TestDatabase;

/// Deterministic data derived from a test name, so reruns produce the
/// same values and parallel tests do not collide.
#[derive(Debug, Clone)]
pub struct TestDataBuilder {
    seed: u64,
    test_name: String,
}

impl TestDataBuilder {
    pub fn from_test_name(test_name: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        test_name.hash(&mut hasher);
        Self {
            seed: hasher.finish(),
            test_name: test_name.to_string(),
        }
    }

    /// `"{prefix}-{test_name}-{index}"`
    pub fn name(&self, prefix: &str, index: usize) -> String {
        format!("{prefix}-{}-{index}", self.test_name)
    }

    /// Midnight UTC, `days` after a fixed per-test base date in 2030
    pub fn deadline(&self, days: i64) -> DateTime<Utc> {
        let base = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        base + Duration::days((self.seed % 365) as i64 + days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_is_deterministic() {
        let a = TestDataBuilder::from_test_name("same");
        let b = TestDataBuilder::from_test_name("same");
        assert_eq!(a.deadline(2), b.deadline(2));
        assert_eq!(a.name("todo", 1), "todo-same-1");
    }

    #[test]
    fn test_deadlines_are_ordered_by_offset() {
        let data = TestDataBuilder::from_test_name("ordering");
        assert!(data.deadline(1) < data.deadline(2));
        assert_eq!(data.deadline(1) + Duration::days(1), data.deadline(2));
    }
}

//! Ephemeral store adapter.
//!
//! The matchmaker keeps its queues, member snapshots, locks, and
//! match-ready notices in a shared ephemeral store. The [`Ephemeral`] trait
//! captures the three primitives the platform needs — sorted sets, KV with
//! TTL, and atomic set-if-absent — with a Redis implementation for
//! production and an in-memory implementation for tests and local runs.

mod memory;
mod store;

pub use memory::*;
pub use store::*;

use std::time::Duration;

/// Error surfaced by ephemeral store operations. Callers treat these as
/// transient and retry on the next tick.
#[derive(Debug)]
pub struct StoreError(pub String);

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ephemeral store: {}", self.0)
    }
}

impl std::error::Error for StoreError {}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        Self(e.to_string())
    }
}

/// Sorted sets, KV with TTL, and set-if-absent over string keys.
///
/// Scores are unix-millisecond timestamps; sorted-set reads come back in
/// ascending score order.
pub trait Ephemeral {
    /// Adds a member if absent; returns false when it already exists.
    fn zadd(
        &self,
        key: &str,
        member: &str,
        score: i64,
    ) -> impl std::future::Future<Output = Result<bool, StoreError>> + Send;
    /// Removes a member; returns whether it was present.
    fn zrem(
        &self,
        key: &str,
        member: &str,
    ) -> impl std::future::Future<Output = Result<bool, StoreError>> + Send;
    fn zscore(
        &self,
        key: &str,
        member: &str,
    ) -> impl std::future::Future<Output = Result<Option<i64>, StoreError>> + Send;
    /// The `limit` lowest-score members, ascending.
    fn zrange_head(
        &self,
        key: &str,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<String>, StoreError>> + Send;
    /// All members with score <= `max_score`, ascending.
    fn zrange_upto(
        &self,
        key: &str,
        max_score: i64,
    ) -> impl std::future::Future<Output = Result<Vec<String>, StoreError>> + Send;
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, StoreError>> + Send;
    fn put(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
    /// SET-IF-ABSENT with TTL; returns whether the key was taken.
    fn put_nx(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<bool, StoreError>> + Send;
    fn del(&self, key: &str) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}

//! Id generation capability
//!
//! Every write operation receives its ids from an [`IdSource`] instead of
//! minting them itself, so tests can run with deterministic ids.

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Source of opaque, globally unique, time-sortable identifiers
pub trait IdSource: Send + Sync {
    /// Produce the next identifier
    fn next_id(&self) -> String;
}

/// UUIDv7 ids (millisecond timestamp prefix, random tail)
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidV7Ids;

impl IdSource for UuidV7Ids {
    fn next_id(&self) -> String {
        Uuid::now_v7().to_string()
    }
}

/// Deterministic ids: `prefix` followed by a zero-padded counter
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl IdSource for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}{:012}", self.prefix, n)
    }
}

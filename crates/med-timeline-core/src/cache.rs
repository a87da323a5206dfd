//! Memoized view derivation.
//!
//! A view is fingerprinted by hashing the canonical JSON of its inputs and
//! `now`. Re-deriving with identical inputs returns the stored view.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::timeline::{TimelineEngine, TimelineInputs, TimelineView};

/// Compute SHA-256 hash of data.
pub fn hash_data(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

#[derive(Serialize)]
struct FingerprintInput<'a> {
    inputs: &'a TimelineInputs<'a>,
    now_millis: i64,
}

/// Fingerprint of a derivation's inputs.
pub fn fingerprint(
    inputs: &TimelineInputs<'_>,
    now: DateTime<Utc>,
) -> Result<String, serde_json::Error> {
    let payload = serde_json::to_vec(&FingerprintInput {
        inputs,
        now_millis: now.timestamp_millis(),
    })?;
    Ok(hash_data(&payload))
}

/// Single-slot cache holding the most recent view.
#[derive(Debug, Default)]
pub struct ViewCache {
    last: Option<(String, TimelineView)>,
    hits: u64,
    misses: u64,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached view if the inputs are unchanged, else derive and store.
    pub fn get_or_derive(
        &mut self,
        engine: &TimelineEngine,
        inputs: &TimelineInputs<'_>,
        now: DateTime<Utc>,
    ) -> Result<&TimelineView, serde_json::Error> {
        let key = fingerprint(inputs, now)?;

        if self.last.as_ref().is_some_and(|(cached, _)| *cached == key) {
            self.hits += 1;
            debug!(fingerprint = %key, "timeline cache hit");
        } else {
            self.misses += 1;
            debug!(fingerprint = %key, "timeline cache miss");
            self.last = None;
        }

        let (_, view) = self
            .last
            .get_or_insert_with(|| (key, engine.derive(inputs, now)));
        Ok(view)
    }

    pub fn invalidate(&mut self) {
        self.last = None;
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

//! Memoization of extraction outcomes by content hash.
//!
//! The cache guarantees at-most-one computed outcome per distinct input hash
//! for the lifetime of the owning pipeline instance. There is no size-based
//! eviction here; eviction policy, if any, belongs to an external cache
//! collaborator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use sha1::{Digest, Sha1};

use crate::extraction::Strategy;
use crate::instruction::Instruction;

/// SHA-1 digest of a script's text, used as the memoization key.
pub type ContentHash = [u8; 20];

/// Hashes script text for cache addressing.
#[must_use]
pub fn content_hash(text: &str) -> ContentHash {
    let mut hasher = Sha1::new();
    hasher.update(text.as_bytes());
    hasher.finalize().into()
}

/// The result of one full cascade run over one input text.
///
/// A total extraction failure is recorded as an outcome with an empty
/// instruction sequence and no producing strategy; caching failures too keeps
/// the "never re-run a strategy for identical text" guarantee unconditional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOutcome {
    /// The synthesized instruction sequence; empty when every strategy failed.
    pub instructions: Vec<Instruction>,
    /// The strategy that produced the sequence, if any succeeded.
    pub strategy: Option<Strategy>,
}

impl ExtractionOutcome {
    /// An outcome representing "no instructions available".
    #[must_use]
    pub fn empty() -> Self {
        Self {
            instructions: Vec::new(),
            strategy: None,
        }
    }

    /// Returns `true` if no strategy produced instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// Mapping from content hash to previously computed extraction outcome.
///
/// Writes are atomic per key through the map's entry API, so even a pipeline
/// shared across threads computes each distinct input at most once. Hit and
/// miss counters are exposed for tests and host telemetry.
#[derive(Debug, Default)]
pub struct AnalysisCache {
    entries: DashMap<ContentHash, Arc<ExtractionOutcome>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl AnalysisCache {
    /// Creates a new, empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached outcome for `hash`, or computes, stores and returns
    /// it via `compute`.
    ///
    /// `compute` runs at most once per distinct hash; concurrent callers for
    /// the same key observe the single stored value.
    pub fn get_or_compute<F>(&self, hash: ContentHash, compute: F) -> Arc<ExtractionOutcome>
    where
        F: FnOnce() -> ExtractionOutcome,
    {
        match self.entries.entry(hash) {
            Entry::Occupied(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Arc::clone(entry.get())
            }
            Entry::Vacant(entry) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                let outcome = Arc::new(compute());
                entry.insert(Arc::clone(&outcome));
                outcome
            }
        }
    }

    /// Looks up a previously computed outcome without computing.
    #[must_use]
    pub fn get(&self, hash: &ContentHash) -> Option<Arc<ExtractionOutcome>> {
        self.entries.get(hash).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns the number of distinct inputs cached so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns how many lookups were answered from the cache.
    #[must_use]
    pub fn hit_count(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Returns how many lookups required a fresh computation.
    #[must_use]
    pub fn miss_count(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

//! Content-addressed cache of stage outputs
//!
//! Re-running the pipeline with an unchanged recording and unchanged early
//! parameters (e.g. when only the training fraction changes) should not
//! refilter or re-window the stream. Each expensive stage owns a single-entry
//! [`StageSlot`] keyed by a [`CacheKey`]:
//!
//! ```text
//! recording key = hash(recording content)
//! stage key     = hash(previous stage key, stage name, stage parameters)
//! ```
//!
//! Chaining the keys means a change to any upstream input or parameter
//! changes every downstream key. A lookup with a different key replaces the
//! slot's entry, so the cache never holds more than one output per stage and
//! lives exactly as long as its owning [`Pipeline`](crate::pipeline::Pipeline).

use std::{
    hash::{DefaultHasher, Hash, Hasher as _},
    sync::Arc,
};

use serde::{Deserialize, Serialize};

use crate::{
    features::FeatureTable, filter::FilteredStream, recording::Recording,
    selection::FeatureSelection, timing::RegularizedRecording, window::WindowTable,
};

/// Identity of a stage output: its inputs and parameters, hashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(u64);

impl CacheKey {
    /// Key identifying a recording by content.
    #[must_use]
    pub fn for_recording(recording: &Recording) -> Self {
        Self(recording.fingerprint())
    }

    /// Start deriving the key of a stage that consumes this key's output.
    #[must_use]
    pub fn stage(self, name: &str) -> KeyBuilder {
        let mut hasher = DefaultHasher::new();
        self.0.hash(&mut hasher);
        name.hash(&mut hasher);
        KeyBuilder { hasher }
    }
}

/// Accumulates stage parameters into a [`CacheKey`].
#[derive(Debug)]
pub struct KeyBuilder {
    hasher: DefaultHasher,
}

impl KeyBuilder {
    #[must_use]
    pub fn param<T>(mut self, value: &T) -> Self
    where
        T: Hash + ?Sized,
    {
        value.hash(&mut self.hasher);
        self
    }

    /// Hash a float by its bit pattern.
    #[must_use]
    pub fn float(mut self, value: f64) -> Self {
        value.to_bits().hash(&mut self.hasher);
        self
    }

    #[must_use]
    pub fn finish(self) -> CacheKey {
        CacheKey(self.hasher.finish())
    }
}

/// Lookup counters across all slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// A single cached stage output.
#[derive(Debug)]
pub struct StageSlot<T> {
    entry: Option<(CacheKey, Arc<T>)>,
}

impl<T> Default for StageSlot<T> {
    fn default() -> Self {
        Self { entry: None }
    }
}

impl<T> StageSlot<T> {
    /// Return the cached value for `key`, or compute and store it.
    ///
    /// An entry under any other key is discarded. A failed computation
    /// leaves the slot empty.
    ///
    /// # Errors
    ///
    /// Returns the error of `compute`.
    pub fn get_or_try_insert_with<F, E>(
        &mut self,
        key: CacheKey,
        stats: &mut CacheStats,
        compute: F,
    ) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some((cached_key, value)) = &self.entry
            && *cached_key == key
        {
            stats.hits += 1;
            return Ok(Arc::clone(value));
        }

        stats.misses += 1;
        self.entry = None;
        let value = Arc::new(compute()?);
        self.entry = Some((key, Arc::clone(&value)));
        Ok(value)
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}

/// One slot per cacheable pipeline stage.
#[derive(Debug, Default)]
pub struct StageCache {
    pub regularized: StageSlot<RegularizedRecording>,
    pub filtered: StageSlot<FilteredStream>,
    pub selection: StageSlot<FeatureSelection>,
    pub windows: StageSlot<WindowTable>,
    pub features: StageSlot<FeatureTable>,
    pub stats: CacheStats,
}

impl StageCache {
    /// Drop every cached output. Counters are kept.
    pub fn clear(&mut self) {
        self.regularized.clear();
        self.filtered.clear();
        self.selection.clear();
        self.windows.clear();
        self.features.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u64) -> CacheKey {
        CacheKey(n).stage("test").finish()
    }

    fn cached_key<T>(slot: &StageSlot<T>) -> Option<CacheKey> {
        slot.entry.as_ref().map(|(key, _)| *key)
    }

    #[test]
    fn test_hit_and_invalidation() {
        let mut slot = StageSlot::<Vec<u32>>::default();
        let mut stats = CacheStats::default();
        let mut calls = 0;
        let mut compute = |value: u32| {
            calls += 1;
            Ok::<_, ()>(vec![value])
        };

        let first = slot
            .get_or_try_insert_with(key(1), &mut stats, || compute(1))
            .unwrap();
        let again = slot
            .get_or_try_insert_with(key(1), &mut stats, || compute(99))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(stats, CacheStats { hits: 1, misses: 1 });

        let other = slot
            .get_or_try_insert_with(key(2), &mut stats, || compute(2))
            .unwrap();
        assert_eq!(*other, vec![2]);
        assert_eq!(cached_key(&slot), Some(key(2)));
        assert_eq!(stats, CacheStats { hits: 1, misses: 2 });
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_failure_leaves_slot_empty() {
        let mut slot = StageSlot::<u32>::default();
        let mut stats = CacheStats::default();
        slot.get_or_try_insert_with(key(1), &mut stats, || Ok::<_, ()>(1))
            .unwrap();
        let result = slot.get_or_try_insert_with(key(2), &mut stats, || Err("boom"));
        assert_eq!(result, Err("boom"));
        assert_eq!(cached_key(&slot), None);
    }

    #[test]
    fn test_keys_chain() {
        let root = CacheKey(7);
        let a = root.stage("filter").param(&10_usize).finish();
        let b = root.stage("filter").param(&11_usize).finish();
        let c = CacheKey(8).stage("filter").param(&10_usize).finish();
        let d = root.stage("windows").param(&10_usize).finish();
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(a, root.stage("filter").param(&10_usize).finish());
        assert_ne!(
            root.stage("x").float(0.5).finish(),
            root.stage("x").float(0.25).finish()
        );
    }
}

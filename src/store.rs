//! Pre-registered, exhaustively keyed histogram storage
//!
//! A store is created with the full list of keys that will ever be filled.
//! Filling anything else is a bug in the caller, not a data condition.

use crate::histogram::{Binning, Histogram};

use std::{collections::HashMap, fmt::Display, hash::Hash};

/// Composite key of a histogram store
pub trait StoreKey: Copy + Eq + Hash + Display {
    /// Binning of the histogram associated with this key
    fn binning(&self) -> Binning;

    /// Axis title of the histogram associated with this key
    fn title(&self) -> &'static str;
}

/// Histograms for every key of a given key space
#[derive(Debug, Clone)]
pub struct HistogramStore<K: StoreKey> {
    /// Registered keys, in registration order
    keys: Vec<K>,

    /// Position of each key in the storage
    slots: HashMap<K, usize>,

    /// One histogram per registered key
    histograms: Vec<Histogram>,
}
//
impl<K: StoreKey> HistogramStore<K> {
    /// Register every key of the store and allocate their histograms
    pub fn new(keys: impl IntoIterator<Item = K>) -> Self {
        let keys = keys.into_iter().collect::<Vec<_>>();
        let mut slots = HashMap::with_capacity(keys.len());
        for (slot, key) in keys.iter().enumerate() {
            let previous = slots.insert(*key, slot);
            assert!(previous.is_none(), "Key {key} was registered twice");
        }
        let histograms = keys.iter().map(|key| Histogram::new(key.binning())).collect();
        Self {
            keys,
            slots,
            histograms,
        }
    }

    /// Number of registered keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Truth that no key was registered
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Truth that a key was registered
    pub fn contains(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    /// Record a weighted value into the histogram of a registered key
    pub fn fill(&mut self, key: K, value: f64, weight: f64) {
        let slot = *self
            .slots
            .get(&key)
            .unwrap_or_else(|| panic!("Histogram {key} was not registered"));
        self.histograms[slot].fill(value, weight);
    }

    /// Histogram of a key, if it was registered
    pub fn get(&self, key: &K) -> Option<&Histogram> {
        self.slots.get(key).map(|&slot| &self.histograms[slot])
    }

    /// Add the contents of another store with the same keys
    #[allow(clippy::needless_pass_by_value)]
    pub fn merge(&mut self, other: Self) {
        assert!(
            self.keys == other.keys,
            "Can only merge stores with identical key registrations"
        );
        for (dst, src) in self.histograms.iter_mut().zip(&other.histograms) {
            dst.merge(src);
        }
    }

    /// Read-only view of every histogram, in registration order
    pub fn export(&self) -> impl ExactSizeIterator<Item = (K, &Histogram)> + '_ {
        self.keys.iter().copied().zip(&self.histograms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct TestKey(u8, char);

    impl Display for TestKey {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "h{}_{}", self.0, self.1)
        }
    }

    impl StoreKey for TestKey {
        fn binning(&self) -> Binning {
            Binning::new(self.0 as usize, 0., 1.)
        }

        fn title(&self) -> &'static str {
            "x"
        }
    }

    fn keys() -> Vec<TestKey> {
        (1..=3)
            .flat_map(|n| ['a', 'b'].map(|c| TestKey(n, c)))
            .collect()
    }

    #[test]
    fn every_key_is_preallocated() {
        let store = HistogramStore::new(keys());
        assert_eq!(store.len(), 6);
        for key in keys() {
            let hist = store.get(&key).unwrap();
            assert_eq!(hist.binning().bins, key.0 as usize);
            assert_eq!(hist.total_entries(), 0);
        }
        assert!(!store.contains(&TestKey(4, 'a')));
    }

    #[test]
    fn fill_only_touches_its_key() {
        let mut store = HistogramStore::new(keys());
        store.fill(TestKey(2, 'b'), 0.7, 0.5);
        for (key, hist) in store.export() {
            let expected = if key == TestKey(2, 'b') { 0.5 } else { 0. };
            assert_eq!(hist.total_weight(), expected, "{key}");
        }
        assert_eq!(store.get(&TestKey(2, 'b')).unwrap().sum_weights(2), 0.5);
    }

    #[test]
    fn export_follows_registration_order() {
        let store = HistogramStore::new(keys());
        let names = store.export().map(|(k, _)| k.to_string()).collect::<Vec<_>>();
        assert_eq!(names, ["h1_a", "h1_b", "h2_a", "h2_b", "h3_a", "h3_b"]);
    }

    #[test]
    fn merge_adds_histograms() {
        let mut s1 = HistogramStore::new(keys());
        let mut s2 = HistogramStore::new(keys());
        s1.fill(TestKey(1, 'a'), 0.5, 1.);
        s2.fill(TestKey(1, 'a'), 0.5, 2.);
        s2.fill(TestKey(3, 'b'), 2., 4.);
        s1.merge(s2);
        assert_eq!(s1.get(&TestKey(1, 'a')).unwrap().total_weight(), 3.);
        assert_eq!(s1.get(&TestKey(3, 'b')).unwrap().overflow(), 4.);
    }

    #[test]
    #[should_panic(expected = "was not registered")]
    fn unregistered_keys_are_bugs() {
        let mut store = HistogramStore::new(keys());
        store.fill(TestKey(9, 'z'), 0., 1.);
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_registrations_are_bugs() {
        HistogramStore::new([TestKey(1, 'a'), TestKey(1, 'a')]);
    }
}

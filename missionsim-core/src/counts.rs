//! Insertion-ordered counter map.
//!
//! Keys keep the order in which they were first seeded, which is what the
//! summary rankings use to break ties. Serialized as a plain JSON object.
use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedCounts<K> {
    entries: Vec<(K, u64)>,
}

impl<K> Default for OrderedCounts<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: PartialEq> OrderedCounts<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `key` with a zero count unless it is already present.
    pub fn seed(&mut self, key: K) {
        if !self.contains(&key) {
            self.entries.push((key, 0));
        }
    }

    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<u64> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, c)| *c)
    }

    /// Add `by` to an existing key. Returns `false` when the key was never seeded.
    pub fn add(&mut self, key: &K, by: u64) -> bool {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, count)) => {
                *count += by;
                true
            }
            None => false,
        }
    }

    /// Add `by` to the entry at `index` (seed order). Returns `false` when out of range.
    pub fn add_at(&mut self, index: usize, by: u64) -> bool {
        match self.entries.get_mut(index) {
            Some((_, count)) => {
                *count += by;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.entries.iter().map(|(k, c)| (k, *c))
    }

    /// Entries sorted by descending count; equal counts keep seed order.
    #[must_use]
    pub fn ranked(&self) -> Vec<(K, u64)>
    where
        K: Clone,
    {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// Apply `f` to every count, keeping keys and order.
    #[must_use]
    pub fn map_values<V>(&self, mut f: impl FnMut(u64) -> V) -> Vec<(K, V)>
    where
        K: Clone,
    {
        self.entries.iter().map(|(k, c)| (k.clone(), f(*c))).collect()
    }
}

impl<K: PartialEq> FromIterator<(K, u64)> for OrderedCounts<K> {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        let mut counts = Self::new();
        for (key, count) in iter {
            if !counts.add(&key, count) {
                counts.entries.push((key, count));
            }
        }
        counts
    }
}

impl<K: Serialize> Serialize for OrderedCounts<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, count) in &self.entries {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

struct CountsVisitor<K>(PhantomData<K>);

impl<'de, K: Deserialize<'de> + PartialEq> Visitor<'de> for CountsVisitor<K> {
    type Value = OrderedCounts<K>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of counts")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, count)) = access.next_entry::<K, u64>()? {
            entries.push((key, count));
        }
        Ok(entries.into_iter().collect())
    }
}

impl<'de, K: Deserialize<'de> + PartialEq> Deserialize<'de> for OrderedCounts<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(CountsVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_is_idempotent_and_ordered() {
        let mut counts = OrderedCounts::new();
        counts.seed("b");
        counts.seed("a");
        counts.seed("b");
        let keys: Vec<_> = counts.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(counts.get(&"a"), Some(0));
    }

    #[test]
    fn add_refuses_unseeded_keys() {
        let mut counts = OrderedCounts::new();
        counts.seed("x");
        assert!(counts.add(&"x", 2));
        assert!(!counts.add(&"y", 1));
        assert!(counts.add_at(0, 1));
        assert!(!counts.add_at(4, 1));
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn ranking_is_stable_for_ties() {
        let counts: OrderedCounts<&str> =
            vec![("first", 2), ("second", 5), ("third", 2), ("fourth", 5)]
                .into_iter()
                .collect();
        let ranked = counts.ranked();
        assert_eq!(
            ranked,
            vec![("second", 5), ("fourth", 5), ("first", 2), ("third", 2)]
        );
    }

    #[test]
    fn serializes_as_ordered_object() {
        let counts: OrderedCounts<String> = vec![("zulu".to_string(), 1), ("alpha".to_string(), 0)]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"zulu":1,"alpha":0}"#);
        let back: OrderedCounts<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, counts);
    }
}

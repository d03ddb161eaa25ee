// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};

use super::value::Value;

/// A multiset of values.
///
/// Elements are compared by value equality and stored with a multiplicity.
/// Lookup is a linear scan: bags in pipelines are small collections of
/// tuples (heat map cells, plot points), not bulk storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bag {
    entries: Vec<(Value, u64)>,
}

impl Bag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one occurrence of `value`.
    pub fn insert(&mut self, value: impl Into<Value>) {
        self.insert_n(value, 1);
    }

    /// Add `n` occurrences of `value`.
    pub fn insert_n(&mut self, value: impl Into<Value>, n: u64) {
        if n == 0 {
            return;
        }
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(v, _)| *v == value) {
            entry.1 += n;
        } else {
            self.entries.push((value, n));
        }
    }

    /// Multiplicity of `value`, zero when absent.
    pub fn count(&self, value: &Value) -> u64 {
        self.entries
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    /// Number of distinct elements.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of occurrences across all elements.
    pub fn size(&self) -> u64 {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, u64)> {
        self.entries.iter().map(|(v, n)| (v, *n))
    }
}

impl PartialEq for Bag {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(v, n)| other.count(v) == n)
    }
}

impl FromIterator<Value> for Bag {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut bag = Bag::new();
        for value in iter {
            bag.insert(value);
        }
        bag
    }
}

//! Name lookup layer.
//!
//! The address book resolves event and target names through the
//! [`RouteTable`] trait so that lookups return an explicit
//! [`RouteResult::NotFound`] instead of failing. Callers decide whether
//! absence is fatal.

use std::{borrow::Borrow, collections::HashMap, hash::Hash};

/// Result of a table lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteResult<'a, V> {
    /// Key matched, contains the value.
    Matched(&'a V),
    /// No entry for the key.
    NotFound,
}

impl<'a, V> RouteResult<'a, V> {
    /// Returns true if the key was matched.
    pub fn is_matched(&self) -> bool {
        matches!(self, RouteResult::Matched(_))
    }

    /// Returns the matched value, if any.
    pub fn matched(self) -> Option<&'a V> {
        match self {
            RouteResult::Matched(v) => Some(v),
            RouteResult::NotFound => None,
        }
    }
}

/// A table that maps keys to values.
pub trait RouteTable<K: ?Sized, V>: Send + Sync + 'static {
    /// Look up a value by key.
    fn route(&self, key: &K) -> RouteResult<'_, V>;

    /// Check if a key exists in the table.
    fn contains(&self, key: &K) -> bool {
        self.route(key).is_matched()
    }
}

/// A table backed by `HashMap`.
#[derive(Debug, Clone)]
pub struct HashMapTable<K, V> {
    map: HashMap<K, V>,
}

impl<K, V> HashMapTable<K, V> {
    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K, V> Default for HashMapTable<K, V> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
        }
    }
}

impl<K, Q, V> RouteTable<Q, V> for HashMapTable<K, V>
where
    K: Borrow<Q> + Hash + Eq + Send + Sync + 'static,
    Q: Hash + Eq + ?Sized,
    V: Send + Sync + 'static,
{
    fn route(&self, key: &Q) -> RouteResult<'_, V> {
        match self.map.get(key) {
            Some(v) => RouteResult::Matched(v),
            None => RouteResult::NotFound,
        }
    }
}

/// Builder for [`HashMapTable`]. A later insertion under the same key
/// replaces the earlier one.
pub struct HashMapTableBuilder<K, V> {
    map: HashMap<K, V>,
}

impl<K, V> Default for HashMapTableBuilder<K, V> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
        }
    }
}

impl<K, V> HashMapTableBuilder<K, V>
where
    K: Hash + Eq,
{
    /// Insert a key-value pair, returning the value it replaced.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.map.insert(key, value)
    }

    /// Build the table, consuming the builder.
    pub fn build(self) -> HashMapTable<K, V> {
        HashMapTable { map: self.map }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_result_helpers() {
        let val = 42;
        let matched = RouteResult::Matched(&val);
        let not_found: RouteResult<i32> = RouteResult::NotFound;

        assert!(matched.is_matched());
        assert!(!not_found.is_matched());

        assert_eq!(matched.matched(), Some(&42));
        assert_eq!(not_found.matched(), None);
    }

    #[test]
    fn test_lookup_by_borrowed_key() {
        let mut builder: HashMapTableBuilder<String, i32> = HashMapTableBuilder::default();
        builder.insert("hello".to_string(), 1);
        builder.insert("world".to_string(), 2);

        let table = builder.build();

        assert_eq!(table.route("hello").matched(), Some(&1));
        assert_eq!(table.route("world").matched(), Some(&2));
        assert!(!table.contains("unknown"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_duplicate_key_last_write_wins() {
        let mut builder: HashMapTableBuilder<String, i32> = HashMapTableBuilder::default();
        assert_eq!(builder.insert("key".to_string(), 1), None);
        assert_eq!(builder.insert("key".to_string(), 2), Some(1));

        let table = builder.build();
        assert_eq!(table.route("key").matched(), Some(&2));
        assert_eq!(table.len(), 1);
    }
}

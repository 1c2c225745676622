//! Tags annotate measurements with key/value context for later grouping.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

/// A named dimension, such as `"method"` or `"status"`.
///
/// Keys are compared by name and are cheap to clone. Create each key once at
/// startup and reuse the handle; keys are never destroyed, which is an
/// accepted trade-off since tag cardinality is assumed to be bounded by the
/// application.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagKey(Arc<str>);

impl TagKey {
    /// Create a key for the dimension `name`.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// The dimension name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TagKey").field(&self.name()).finish()
    }
}

/// A `(key, value)` annotation attached to a measurement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    /// The dimension this tag sets.
    pub key: TagKey,
    /// The value recorded for the dimension.
    pub value: String,
}

/// An immutable set of tags with unique keys.
///
/// Built once per measurement (or shared across a batch) via
/// [`TagSet::builder`]. Storage is sorted by key, so two sets carrying the
/// same tags compare equal regardless of insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagSet {
    // sorted by key; at most one tag per key
    tags: SmallVec<[Tag; 4]>,
}

impl TagSet {
    /// A set containing no tags.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Start building a tag set.
    pub fn builder() -> TagSetBuilder {
        TagSetBuilder::default()
    }

    /// Look up the value recorded for `key`.
    pub fn get(&self, key: &TagKey) -> Option<&str> {
        self.tags
            .binary_search_by(|tag| tag.key.cmp(key))
            .ok()
            .map(|idx| self.tags[idx].value.as_str())
    }

    /// Returns `true` if the set carries a value for `key`.
    pub fn contains_key(&self, key: &TagKey) -> bool {
        self.get(key).is_some()
    }

    /// Iterate over the tags in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    /// Number of tags in the set.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns `true` if the set carries no tags.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}

/// Builder for [`TagSet`].
///
/// Inserting a key that is already present replaces its value, preserving the
/// unique-key invariant.
#[derive(Debug, Default)]
pub struct TagSetBuilder {
    tags: Vec<Tag>,
}

impl TagSetBuilder {
    /// Insert a tag; the last value inserted for a key wins.
    pub fn insert(mut self, key: TagKey, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.tags.iter_mut().find(|tag| tag.key == key) {
            Some(existing) => existing.value = value,
            None => self.tags.push(Tag { key, value }),
        }
        self
    }

    /// Finish building the set.
    pub fn build(mut self) -> TagSet {
        self.tags.sort_by(|a, b| a.key.cmp(&b.key));
        TagSet {
            tags: self.tags.into(),
        }
    }
}

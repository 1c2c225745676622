//! Signatures: the canonical aggregation grouping key.
//!
//! A signature is the byte encoding of a tag set projected onto a view's
//! ordered key list. Records that agree on every view key share a signature
//! (and therefore an aggregator), no matter which other tags they carry or in
//! what order their tags were supplied.
//!
//! The encoding is length-prefixed rather than delimiter-based so arbitrary
//! byte values round-trip exactly, and every signature for a view with `N`
//! keys has exactly `N` slots. A key absent from the record's tag set
//! occupies a slot with a distinct marker, so "absent" never collides with an
//! empty string value.

use std::borrow::Borrow;
use std::fmt;

use smallvec::SmallVec;

use crate::tag::{TagKey, TagSet};

const ABSENT: u8 = 0;
const PRESENT: u8 = 1;

/// Inline capacity for signature encoding buffers.
pub(crate) type SignatureBuf = SmallVec<[u8; 64]>;

/// Canonical encoded projection of a tag set onto a view's key list.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// Project `tags` onto the ordered `keys` of a view.
    ///
    /// Two tag sets that agree on every key in `keys` produce byte-identical
    /// signatures.
    pub fn project(tags: &TagSet, keys: &[TagKey]) -> Self {
        let mut buf = SignatureBuf::new();
        project_into(tags, keys, &mut buf);
        Self(buf.to_vec())
    }

    /// Decode this signature back into the tags it encodes.
    ///
    /// The inverse of [`Signature::project`] restricted to `keys`: keys that
    /// were absent from the projected tag set are absent from the result, not
    /// mapped to an empty string.
    pub fn decode(&self, keys: &[TagKey]) -> TagSet {
        let mut builder = TagSet::builder();
        let mut bytes = &self.0[..];
        for key in keys {
            match take_slot(&mut bytes) {
                Some(Some(value)) => builder = builder.insert(key.clone(), value),
                Some(None) => {}
                None => {
                    debug_assert!(false, "signature does not match the view's key list");
                    break;
                }
            }
        }
        builder.build()
    }

    /// The raw encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Borrow<[u8]> for Signature {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for Signature {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({} bytes)", self.0.len())
    }
}

/// Encode the projection of `tags` onto `keys` into `buf`.
///
/// One slot per key, in key-list order: `PRESENT`, a little-endian u32
/// length, and the value bytes, or a single `ABSENT` marker.
pub(crate) fn project_into(tags: &TagSet, keys: &[TagKey], buf: &mut SignatureBuf) {
    buf.clear();
    for key in keys {
        match tags.get(key) {
            Some(value) => {
                buf.push(PRESENT);
                buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
                buf.extend_from_slice(value.as_bytes());
            }
            None => buf.push(ABSENT),
        }
    }
}

// Returns None on a malformed slot, Some(None) for an absent key.
fn take_slot(bytes: &mut &[u8]) -> Option<Option<String>> {
    let (&marker, rest) = bytes.split_first()?;
    if marker == ABSENT {
        *bytes = rest;
        return Some(None);
    }
    let (len_bytes, rest) = rest.split_at_checked(4)?;
    let len = u32::from_le_bytes(len_bytes.try_into().ok()?) as usize;
    let (value, rest) = rest.split_at_checked(len)?;
    *bytes = rest;
    Some(Some(String::from_utf8_lossy(value).into_owned()))
}

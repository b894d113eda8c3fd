//! Per-target property store.
//!
//! Properties are byte strings keyed by name, exactly as a flattened device
//! tree stores them. They carry no type: readers assert a size when decoding,
//! and a size mismatch is a configuration error. A store is read-only unless it
//! was created writable.

use std::collections::BTreeMap;

use crate::common::{Error, Result};
use crate::config::PropertyValue;

/// Key/value attributes attached to one target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyStore {
    entries: BTreeMap<String, Vec<u8>>,
    writable: bool,
}

impl PropertyStore {
    /// Creates an empty, read-only store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that accepts writes after attach.
    pub fn writable() -> Self {
        Self {
            entries: BTreeMap::new(),
            writable: true,
        }
    }

    /// Builds a read-only store from a topology description.
    pub fn from_config(props: &BTreeMap<String, PropertyValue>) -> Self {
        Self {
            entries: props
                .iter()
                .map(|(k, v)| (k.clone(), v.to_bytes()))
                .collect(),
            writable: false,
        }
    }

    /// Returns `true` if the store accepts writes.
    pub const fn is_writable(&self) -> bool {
        self.writable
    }

    /// Returns the raw bytes of a property.
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Returns `true` if the property exists.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterates over property names in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the number of properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store holds no properties.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds or replaces a property, regardless of writability.
    ///
    /// Used while the topology is being built; callers after attach go through
    /// `Topology::set_property`, which honours the writable flag.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Option<Vec<u8>> {
        self.entries.insert(key.into(), value.into())
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        let _ = self.insert(key, value);
        self
    }

    /// Copies every property of `other` that this store does not define.
    pub fn overlay(&mut self, other: &Self) {
        for (key, value) in &other.entries {
            let _ = self
                .entries
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    /// Decodes a one-cell property.
    pub fn get_u32(&self, key: &str) -> Result<Option<u32>> {
        self.get(key).map(|raw| decode_u32(key, raw)).transpose()
    }

    /// Decodes a two-cell property as a 64-bit value.
    pub fn get_u64(&self, key: &str) -> Result<Option<u64>> {
        self.get(key)
            .map(|raw| {
                let cells = decode_cells(key, raw)?;
                match cells.as_slice() {
                    [hi, lo] => Ok(((*hi as u64) << 32) | *lo as u64),
                    _ => Err(Error::config(format!(
                        "property {key}: expected 8 bytes, found {}",
                        raw.len()
                    ))),
                }
            })
            .transpose()
    }

    /// Decodes a property as a list of 32-bit big-endian cells.
    pub fn get_cells(&self, key: &str) -> Result<Option<Vec<u32>>> {
        self.get(key).map(|raw| decode_cells(key, raw)).transpose()
    }

    /// Decodes a NUL-terminated string property.
    pub fn get_str(&self, key: &str) -> Result<Option<&str>> {
        self.get(key).map(|raw| decode_str(key, raw)).transpose()
    }
}

fn decode_u32(key: &str, raw: &[u8]) -> Result<u32> {
    let bytes: [u8; 4] = raw.try_into().map_err(|_| {
        Error::config(format!(
            "property {key}: expected 4 bytes, found {}",
            raw.len()
        ))
    })?;
    Ok(u32::from_be_bytes(bytes))
}

pub(crate) fn decode_cells(key: &str, raw: &[u8]) -> Result<Vec<u32>> {
    if raw.len() % 4 != 0 {
        return Err(Error::config(format!(
            "property {key}: length {} is not a whole number of cells",
            raw.len()
        )));
    }
    Ok(raw
        .chunks_exact(4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn decode_str<'a>(key: &str, raw: &'a [u8]) -> Result<&'a str> {
    let body = raw.strip_suffix(&[0]).unwrap_or(raw);
    std::str::from_utf8(body)
        .map_err(|e| Error::config(format!("property {key}: not a string: {e}")))
}

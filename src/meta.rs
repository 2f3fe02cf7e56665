//! Metalayer tables (part of C5/C6): fixed (size-frozen) and variable-length
//! named byte blobs attached to a super-chunk's trailer.
//!
//! Grounded on `examples/keller-mark-blusc/src/blosc/schunk.rs`'s
//! `metalayers`/`vlmetalayers` arrays, replacing the teacher's fixed-size
//! `[*mut Blosc2Metalayer; B2ND_MAX_METALAYERS]` with growable maps ordered
//! by insertion (spec §4.6's `set_meta`/`set_vlmeta`/`del_vlmeta`).

use crate::error::{Error, Result};
use std::collections::HashMap;

/// A named, fixed-size metalayer. Its length must not change once the
/// first chunk has been written (spec §4.6).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metalayer {
    pub name: String,
    pub content: Vec<u8>,
}

/// Fixed metalayers, keyed by name, preserving insertion order for
/// deterministic trailer serialization.
#[derive(Clone, Debug, Default)]
pub struct MetalayerTable {
    order: Vec<String>,
    entries: HashMap<String, Metalayer>,
}

impl MetalayerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new fixed metalayer. Errors if the name already exists.
    pub fn set(&mut self, name: &str, content: Vec<u8>) -> Result<()> {
        if self.entries.contains_key(name) {
            return Err(Error::AlreadyExists(format!("metalayer {name:?} already exists")));
        }
        self.order.push(name.to_string());
        self.entries.insert(
            name.to_string(),
            Metalayer {
                name: name.to_string(),
                content,
            },
        );
        Ok(())
    }

    /// Updates an existing fixed metalayer in place; the replacement must
    /// be the same length as the original (spec §4.6's size-freeze rule).
    pub fn update(&mut self, name: &str, content: Vec<u8>) -> Result<()> {
        let existing = self
            .entries
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(format!("metalayer {name:?} not found")))?;
        if existing.content.len() != content.len() {
            return Err(Error::InvalidArgument(format!(
                "fixed metalayer {name:?} cannot change size ({} -> {})",
                existing.content.len(),
                content.len()
            )));
        }
        existing.content = content;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries.get(name).map(|m| m.content.as_slice())
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &Metalayer> {
        self.order.iter().map(move |n| &self.entries[n])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Variable-length metalayers: freely add/update/delete, last writer wins.
#[derive(Clone, Debug, Default)]
pub struct VlMetalayerTable {
    order: Vec<String>,
    entries: HashMap<String, Vec<u8>>,
}

impl VlMetalayerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, content: Vec<u8>) {
        if !self.entries.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.entries.insert(name.to_string(), content);
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries.get(name).map(|v| v.as_slice())
    }

    pub fn del(&mut self, name: &str) -> Result<()> {
        if self.entries.remove(name).is_none() {
            return Err(Error::NotFound(format!("vlmetalayer {name:?} not found")));
        }
        self.order.retain(|n| n != name);
        Ok(())
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.order.iter().map(move |n| (n.as_str(), self.entries[n].as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_metalayer_rejects_duplicate_name() {
        let mut table = MetalayerTable::new();
        table.set("b2nd", vec![1, 2, 3]).unwrap();
        assert!(matches!(table.set("b2nd", vec![4, 5, 6]), Err(Error::AlreadyExists(_))));
    }

    #[test]
    fn fixed_metalayer_rejects_size_change() {
        let mut table = MetalayerTable::new();
        table.set("b2nd", vec![1, 2, 3]).unwrap();
        assert!(table.update("b2nd", vec![1, 2]).is_err());
        table.update("b2nd", vec![9, 9, 9]).unwrap();
        assert_eq!(table.get("b2nd"), Some(&[9u8, 9, 9][..]));
    }

    #[test]
    fn vlmetalayer_last_writer_wins() {
        let mut table = VlMetalayerTable::new();
        table.set("notes", b"first".to_vec());
        table.set("notes", b"second".to_vec());
        assert_eq!(table.get("notes"), Some(&b"second"[..]));
        assert_eq!(table.names(), &["notes".to_string()]);
    }

    #[test]
    fn vlmetalayer_delete_missing_errors() {
        let mut table = VlMetalayerTable::new();
        assert!(matches!(table.del("missing"), Err(Error::NotFound(_))));
    }
}

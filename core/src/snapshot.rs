//! Machine state snapshots.
//!
//! A snapshot is a labelled dictionary of named register values. Each chip
//! contributes its fields under stable names; loading re-applies every value
//! through the chip's normal write paths so derived state (priority tables,
//! colour slots, decoded positions) is rebuilt rather than restored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    fields: BTreeMap<String, u32>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a named field. Re-defining a name overwrites it.
    pub fn define(&mut self, name: &str, value: u32) {
        self.fields.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.fields.get(name).copied()
    }

    /// Field value with a fallback for snapshots from older versions.
    pub fn get_or(&self, name: &str, default: u32) -> u32 {
        self.get(name).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.fields.iter().map(|(name, &value)| (name.as_str(), value))
    }
}

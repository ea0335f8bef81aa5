//! Preset banks with value semantics.
//!
//! Mutations return a new bank and leave the input untouched, so a reader
//! holding the old bank keeps a consistent view while a writer builds the
//! next one.

use rsfx_engine::SavedState;

/// One named preset.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    /// Display name in the bank.
    pub name: String,
    /// Name embedded in the serialized blob when the preset was loaded;
    /// re-written from `name` on save.
    pub blob_name: String,
    /// The saved effect state.
    pub state: SavedState,
}

/// A named collection of presets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bank {
    /// Bank display name.
    pub name: String,
    /// Presets in bank order.
    pub presets: Vec<Preset>,
}

impl Bank {
    /// An empty bank.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            presets: Vec::new(),
        }
    }

    /// Position of the preset named `name` (exact match).
    pub fn find(&self, name: &str) -> Option<usize> {
        self.presets.iter().position(|p| p.name == name)
    }

    /// C-compat lookup: `1 + index` when present, 0 when absent.
    pub fn exists_index_plus_one(&self, name: &str) -> u32 {
        self.find(name).map_or(0, |i| i as u32 + 1)
    }

    /// A new bank with `state` stored under `name`, replacing any existing
    /// preset of that name and appending otherwise.
    pub fn with_preset_added(&self, name: impl Into<String>, state: SavedState) -> Bank {
        let name = name.into();
        let mut bank = self.clone();
        let preset = Preset {
            blob_name: name.clone(),
            name,
            state,
        };
        match bank.find(&preset.name) {
            Some(index) => bank.presets[index] = preset,
            None => bank.presets.push(preset),
        }
        bank
    }

    /// A new bank without the preset named `name`; identical to `self` if
    /// no such preset exists.
    pub fn with_preset_deleted(&self, name: &str) -> Bank {
        let mut bank = self.clone();
        if let Some(index) = bank.find(name) {
            bank.presets.remove(index);
        }
        bank
    }

    /// A new bank with the preset `old` renamed to `new`; identical to
    /// `self` if `old` does not exist.
    pub fn with_preset_renamed(&self, old: &str, new: impl Into<String>) -> Bank {
        let mut bank = self.clone();
        if let Some(index) = bank.find(old) {
            bank.presets[index].name = new.into();
        }
        bank
    }
}

//! Saved effect state.

/// One saved slider value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderValue {
    /// 0-based slider index.
    pub index: u32,
    /// Saved value.
    pub value: f64,
}

/// A snapshot of an effect's restorable state.
///
/// `sliders` holds every populated slider in ascending index order; `data`
/// is whatever the script's `@serialize` section wrote, opaque here.
/// Equality is slider-exact and byte-exact, so undo histories can dedupe
/// consecutive identical snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavedState {
    /// Populated slider values, ascending by index.
    pub sliders: Vec<SliderValue>,
    /// Raw `@serialize` bytes.
    pub data: Vec<u8>,
}

impl SavedState {
    /// The saved value of slider `index`, if present in the snapshot.
    pub fn slider(&self, index: u32) -> Option<f64> {
        self.sliders
            .iter()
            .find(|s| s.index == index)
            .map(|s| s.value)
    }
}

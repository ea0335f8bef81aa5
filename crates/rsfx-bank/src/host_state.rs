//! Versioned plugin-state container.
//!
//! Hosts persist a small JSON tree holding the originating script path, a
//! slider index→value map and the opaque serialize blob in base64. The
//! version field gates loading: anything but the current version is
//! treated as "no state" rather than guessed at.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use rsfx_engine::{SavedState, SliderValue};

use crate::base64;
use crate::error::BankError;

/// Current container version.
pub const STATE_VERSION: u32 = 1;

/// A deserialized plugin state.
#[derive(Debug, Clone, PartialEq)]
pub struct HostState {
    /// Path of the script the state was saved against.
    pub path: String,
    /// The saved effect state.
    pub state: SavedState,
}

#[derive(Serialize, Deserialize)]
struct Container {
    version: u32,
    path: String,
    // JSON object keys are strings; indices serialize as their decimal form.
    sliders: BTreeMap<String, f64>,
    data: String,
}

/// Serialize a plugin state to its JSON container.
pub fn serialize_host_state(path: &str, state: &SavedState) -> Result<Vec<u8>, BankError> {
    let container = Container {
        version: STATE_VERSION,
        path: path.to_string(),
        sliders: state
            .sliders
            .iter()
            .map(|s| (s.index.to_string(), s.value))
            .collect(),
        data: base64::encode(&state.data),
    };
    Ok(serde_json::to_vec(&container)?)
}

/// Parse a JSON container. Returns `None` on malformed JSON, a version
/// mismatch, or an undecodable blob.
pub fn parse_host_state(bytes: &[u8]) -> Option<HostState> {
    let container: Container = serde_json::from_slice(bytes).ok()?;
    if container.version != STATE_VERSION {
        tracing::debug!(version = container.version, "unsupported state version");
        return None;
    }

    let mut sliders: Vec<SliderValue> = Vec::with_capacity(container.sliders.len());
    for (key, value) in &container.sliders {
        let index = key.parse::<u32>().ok()?;
        sliders.push(SliderValue {
            index,
            value: *value,
        });
    }
    sliders.sort_by_key(|s| s.index);

    Some(HostState {
        path: container.path,
        state: SavedState {
            sliders,
            data: base64::decode(&container.data)?,
        },
    })
}

//! Preset bank and host state persistence for the rsfx host.
//!
//! Banks round-trip through the RPL text format used by the wider preset
//! ecosystem ([`rpl`]), mutate with value semantics ([`bank`]) and carry
//! serialized effect states from [`rsfx_engine`]. The [`host_state`]
//! module handles the versioned JSON container hosts embed in their own
//! save files.

pub mod bank;
pub mod base64;
pub mod error;
pub mod host_state;
pub mod rpl;

pub use bank::{Bank, Preset};
pub use error::BankError;
pub use host_state::{HostState, STATE_VERSION, parse_host_state, serialize_host_state};
pub use rpl::{format_bank, load_bank, parse_bank, save_bank};

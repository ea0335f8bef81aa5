//! Script loading and effect runtime for the rsfx host.
//!
//! Builds on [`rsfx_lang`]'s text front end: the [`loader`] walks a
//! script's import closure into a [`Program`](loader::Program), the
//! [`compiler`] seam hands it to an external JIT or interpreter, and the
//! resulting [`Effect`](effect::Effect) carries the runtime contract — the
//! per-block processing sequence, the 4×64-bit slider event bitmasks,
//! MIDI queues and save/restore state. The [`control`] module runs loads
//! on a background thread so the audio thread never blocks on file I/O or
//! compilation.

pub mod compiler;
pub mod control;
pub mod effect;
pub mod environment;
pub mod error;
pub mod fileid;
pub mod loader;
pub mod midi;
pub mod resolve;
pub mod sliders;
pub mod state;

pub use compiler::{
    CompileError, CompiledScript, RuntimeVars, ScriptCompiler, SerializeIo, SerializeMode,
};
pub use control::{LoadController, LoadRequest, RetryState};
pub use effect::{Effect, PlaybackState, TimeInfo, sibling_bank_path};
pub use environment::Environment;
pub use error::EngineError;
pub use fileid::FileId;
pub use loader::{LoadOptions, MAX_IMPORT_DEPTH, Program, SourceUnit, load_program};
pub use midi::{DEFAULT_MIDI_CAPACITY, MidiEvent, MidiQueue};
pub use resolve::{CaseResolution, case_resolve, resolve_import_path};
pub use sliders::{
    BitmaskChannel, GROUP_COUNT, SLIDER_COUNT, SliderFlags, SliderValues, slider_from_normalized,
    slider_group, slider_mask, slider_to_normalized,
};
pub use state::{SavedState, SliderValue};

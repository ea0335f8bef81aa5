//! The external compiler-service seam.
//!
//! Turning section text into native code is somebody else's job (a JIT or
//! interpreter living behind [`ScriptCompiler`]). The engine hands over the
//! loaded [`Program`](crate::loader::Program) and drives the resulting
//! [`CompiledScript`] through the per-block contract; variables flow both
//! ways through [`RuntimeVars`].

use std::collections::HashMap;

use thiserror::Error;

use crate::loader::Program;
use crate::midi::MidiQueue;
use crate::sliders::SLIDER_COUNT;

/// Compiler diagnostic for one section.
#[derive(Debug, Clone, Error)]
#[error("{section}: {message}")]
pub struct CompileError {
    /// Section name, e.g. `@init`.
    pub section: String,
    /// 0-based line within the section, when known.
    pub line: Option<u32>,
    /// Diagnostic text.
    pub message: String,
}

/// Compiles a loaded program into a runnable script.
pub trait ScriptCompiler {
    /// Compile every section of `program` into one callable unit.
    fn compile(&self, program: &Program) -> Result<Box<dyn CompiledScript>, CompileError>;
}

/// A compiled script's entry points, invoked by the effect runtime.
///
/// Implementations read and write script variables through the
/// [`RuntimeVars`] passed to each call.
pub trait CompiledScript: Send {
    /// Run the `@init` section.
    fn init(&mut self, vars: &mut RuntimeVars);

    /// Run the `@slider` section after slider values changed.
    fn slider(&mut self, vars: &mut RuntimeVars);

    /// Run the `@block` section at the start of an audio block.
    fn block(&mut self, vars: &mut RuntimeVars);

    /// Exchange MIDI with the script for the current block. Scripts that
    /// handle MIDI consume from `input` and push to `output`; the default
    /// passes nothing through.
    fn midi(&mut self, vars: &mut RuntimeVars, input: &mut MidiQueue, output: &mut MidiQueue) {
        let _ = (vars, input, output);
    }

    /// Run the `@sample` section over `frames` frames of non-interleaved
    /// audio. `inputs`/`outputs` hold one slice per channel.
    fn sample(
        &mut self,
        vars: &mut RuntimeVars,
        inputs: &[&[f64]],
        outputs: &mut [&mut [f64]],
        frames: usize,
    );

    /// Run the `@serialize` section against `io`, in whichever mode `io`
    /// was opened with.
    fn serialize(&mut self, vars: &mut RuntimeVars, io: &mut SerializeIo);
}

/// Variable store shared between the host and a compiled script.
#[derive(Debug, Clone)]
pub struct RuntimeVars {
    slider_values: Vec<f64>,
    named: HashMap<String, f64>,
}

impl Default for RuntimeVars {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeVars {
    /// A store with all sliders at zero and no named variables.
    pub fn new() -> Self {
        Self {
            slider_values: vec![0.0; SLIDER_COUNT],
            named: HashMap::new(),
        }
    }

    /// Script-visible value of slider `index`.
    pub fn slider(&self, index: usize) -> f64 {
        self.slider_values.get(index).copied().unwrap_or(0.0)
    }

    /// Set the script-visible value of slider `index`.
    pub fn set_slider(&mut self, index: usize, value: f64) {
        if let Some(slot) = self.slider_values.get_mut(index) {
            *slot = value;
        }
    }

    /// A named variable (`srate`, `tempo`, `pdc_delay`, ...), 0 when unset.
    pub fn get(&self, name: &str) -> f64 {
        self.named.get(name).copied().unwrap_or(0.0)
    }

    /// Set a named variable.
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.named.insert(name.into(), value);
    }
}

/// Direction of a `@serialize` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializeMode {
    /// Script reads previously saved values.
    Read,
    /// Script writes values to be saved.
    Write,
}

/// Byte stream exchanged with a script's `@serialize` section.
///
/// Values cross the boundary as little-endian f32, the scripting dialect's
/// on-disk number format. In write mode [`exchange`](Self::exchange)
/// appends; in read mode it consumes, yielding 0 past the end.
#[derive(Debug)]
pub struct SerializeIo {
    mode: SerializeMode,
    data: Vec<u8>,
    cursor: usize,
}

impl SerializeIo {
    /// A write-mode stream collecting into an empty buffer.
    pub fn for_writing() -> Self {
        Self {
            mode: SerializeMode::Write,
            data: Vec::new(),
            cursor: 0,
        }
    }

    /// A read-mode stream over previously saved bytes.
    pub fn for_reading(data: Vec<u8>) -> Self {
        Self {
            mode: SerializeMode::Read,
            data,
            cursor: 0,
        }
    }

    /// The stream direction.
    pub fn mode(&self) -> SerializeMode {
        self.mode
    }

    /// Write-mode: append `value` and return it. Read-mode: return the next
    /// stored value, or 0 when exhausted.
    pub fn exchange(&mut self, value: f64) -> f64 {
        match self.mode {
            SerializeMode::Write => {
                self.data.extend_from_slice(&(value as f32).to_le_bytes());
                value
            }
            SerializeMode::Read => {
                let end = self.cursor + 4;
                let Some(bytes) = self.data.get(self.cursor..end) else {
                    return 0.0;
                };
                self.cursor = end;
                let mut buf = [0u8; 4];
                buf.copy_from_slice(bytes);
                f64::from(f32::from_le_bytes(buf))
            }
        }
    }

    /// The accumulated bytes of a write-mode stream.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

//! Effect runtime state.
//!
//! An [`Effect`] models one loaded script version: its parsed program, the
//! compiled entry points, the slider table with its event bitmask channels,
//! MIDI queues and transport info. Replacing a script builds a fresh
//! `Effect` and swaps it in; the old one stays valid for anyone still
//! holding it.

use std::path::{Path, PathBuf};

use rsfx_lang::Slider;

use crate::compiler::{CompiledScript, RuntimeVars, ScriptCompiler, SerializeIo};
use crate::error::EngineError;
use crate::loader::Program;
use crate::midi::{MidiEvent, MidiQueue};
use crate::resolve::case_resolve;
use crate::sliders::{BitmaskChannel, SLIDER_COUNT, SliderFlags, SliderValues};
use crate::state::{SavedState, SliderValue};

/// Host transport state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Transport stopped.
    #[default]
    Stopped,
    /// Transport playing.
    Playing,
    /// Transport paused.
    Paused,
}

/// Transport and musical-time info pushed by the host before each block.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimeInfo {
    /// Tempo in beats per minute.
    pub tempo: f64,
    /// Transport state.
    pub playback_state: PlaybackState,
    /// Position in seconds.
    pub time_position: f64,
    /// Position in beats.
    pub beat_position: f64,
    /// Time signature numerator and denominator.
    pub time_signature: (u32, u32),
    /// Loop region in beats, when looping is active.
    pub loop_region: Option<(f64, f64)>,
}

/// One loaded (and possibly compiled) effect instance.
pub struct Effect {
    program: Option<Program>,
    compiled: Option<Box<dyn CompiledScript>>,
    vars: RuntimeVars,
    values: SliderValues,
    /// Control-thread edits awaiting application on the audio thread.
    pending_edits: BitmaskChannel,
    flags: SliderFlags,
    midi_in: MidiQueue,
    midi_out: MidiQueue,
    time: TimeInfo,
    sample_rate: f64,
    block_size: u32,
    pdc_delay: f64,
}

impl Default for Effect {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect {
    /// An empty effect with nothing loaded.
    pub fn new() -> Self {
        Self {
            program: None,
            compiled: None,
            vars: RuntimeVars::new(),
            values: SliderValues::new(),
            pending_edits: BitmaskChannel::new(),
            flags: SliderFlags::new(),
            midi_in: MidiQueue::default(),
            midi_out: MidiQueue::default(),
            time: TimeInfo::default(),
            sample_rate: 44100.0,
            block_size: 0,
            pdc_delay: 0.0,
        }
    }

    /// Install a loaded program, seeding slider values and visibility from
    /// the declarations. Discards any previous compile.
    pub fn load(&mut self, program: Program) {
        self.compiled = None;
        self.vars = RuntimeVars::new();
        for (id, slider) in program.main().header.sliders_present() {
            let index = id as usize;
            self.values.set(index, slider.def);
            self.vars.set_slider(index, slider.def);
            if slider.initially_visible {
                self.flags.visible.set(index);
            } else {
                self.flags.visible.clear(index);
            }
        }
        self.program = Some(program);
    }

    /// Whether a program is loaded.
    pub fn is_loaded(&self) -> bool {
        self.program.is_some()
    }

    /// Whether the loaded program has been compiled.
    pub fn is_compiled(&self) -> bool {
        self.compiled.is_some()
    }

    /// The loaded program, if any.
    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    /// Compile the loaded program and run its `@init` and `@slider`
    /// sections.
    pub fn compile(&mut self, compiler: &dyn ScriptCompiler) -> Result<(), EngineError> {
        let Some(program) = &self.program else {
            return Err(EngineError::Compile {
                path: PathBuf::new(),
                section: String::new(),
                message: "no program loaded".to_string(),
            });
        };
        let mut compiled = compiler
            .compile(program)
            .map_err(|e| EngineError::Compile {
                path: program.main().path.clone(),
                section: e.section.clone(),
                message: e.message.clone(),
            })?;

        self.vars.set("srate", self.sample_rate);
        compiled.init(&mut self.vars);
        compiled.slider(&mut self.vars);
        self.compiled = Some(compiled);
        Ok(())
    }

    /// Declared slider `index`, if the header declared one.
    pub fn slider(&self, index: usize) -> Option<&Slider> {
        self.program
            .as_ref()?
            .main()
            .header
            .sliders
            .get(index)?
            .as_ref()
    }

    /// Current value of slider `index` (lock-free).
    pub fn slider_value(&self, index: usize) -> f64 {
        self.values.get(index)
    }

    /// Write slider `index` from the host or control thread.
    ///
    /// The value is applied to the script (with an `@slider` run) at the
    /// start of the next block. A changed value always marks the `changed`
    /// channel; with `notify` it also marks `automated`, indistinguishable
    /// from a script-triggered automation push by design.
    pub fn set_slider_value(&self, index: usize, value: f64, notify: bool) {
        if index >= SLIDER_COUNT {
            return;
        }
        if self.values.set(index, value) {
            self.pending_edits.set(index);
            self.flags.changed.set(index);
            if notify {
                self.flags.automated.set(index);
            }
        }
    }

    /// Mark or unmark slider `index` as mid-gesture.
    pub fn set_slider_touching(&self, index: usize, touching: bool) {
        if touching {
            self.flags.touching.set(index);
        } else {
            self.flags.touching.clear(index);
        }
    }

    /// Event bitmask channels.
    pub fn slider_flags(&self) -> &SliderFlags {
        &self.flags
    }

    /// Update transport info for the next block.
    pub fn set_time_info(&mut self, time: TimeInfo) {
        self.time = time;
    }

    /// Set the host sample rate.
    pub fn set_sample_rate(&mut self, rate: f64) {
        self.sample_rate = rate;
    }

    /// Reported processing latency in samples.
    pub fn pdc_delay(&self) -> f64 {
        self.pdc_delay
    }

    /// Queue an inbound MIDI event for the next block.
    pub fn send_midi(&mut self, event: MidiEvent) -> bool {
        self.midi_in.push(event)
    }

    /// Dequeue the next outbound MIDI event produced by the script.
    pub fn receive_midi(&mut self) -> Option<MidiEvent> {
        self.midi_out.pop()
    }

    /// Process one audio block.
    ///
    /// Against an uncompiled effect this zero-fills `outputs` and discards
    /// queued input MIDI; it never writes garbage.
    pub fn process(&mut self, inputs: &[&[f64]], outputs: &mut [&mut [f64]], frames: usize) {
        self.block_size = frames as u32;

        let Some(compiled) = &mut self.compiled else {
            for channel in outputs.iter_mut() {
                for sample in channel.iter_mut() {
                    *sample = 0.0;
                }
            }
            self.midi_in.clear();
            return;
        };

        // 1. pending control-thread slider edits
        let mut edited = false;
        for group in 0..crate::sliders::GROUP_COUNT {
            let mut bits = self.pending_edits.take(group);
            while bits != 0 {
                let bit = bits.trailing_zeros() as usize;
                let index = (group << 6) | bit;
                self.vars.set_slider(index, self.values.get(index));
                bits &= bits - 1;
                edited = true;
            }
        }
        if edited {
            compiled.slider(&mut self.vars);
        }

        // 2. transport
        self.vars.set("srate", self.sample_rate);
        self.vars.set("samplesblock", f64::from(self.block_size));
        self.vars.set("tempo", self.time.tempo);
        self.vars.set(
            "play_state",
            match self.time.playback_state {
                PlaybackState::Stopped => 0.0,
                PlaybackState::Playing => 1.0,
                PlaybackState::Paused => 2.0,
            },
        );
        self.vars.set("play_position", self.time.time_position);
        self.vars.set("beat_position", self.time.beat_position);
        self.vars.set("ts_num", f64::from(self.time.time_signature.0));
        self.vars.set("ts_denom", f64::from(self.time.time_signature.1));

        // 3. inbound MIDI, 4. script sections
        compiled.midi(&mut self.vars, &mut self.midi_in, &mut self.midi_out);
        compiled.block(&mut self.vars);
        compiled.sample(&mut self.vars, inputs, outputs, frames);
        self.midi_in.clear();

        // 5. script-side slider writes, diffed against the stored values
        for index in 0..SLIDER_COUNT {
            let script_value = self.vars.slider(index);
            if self.values.get(index) != script_value {
                self.values.set(index, script_value);
                self.flags.changed.set(index);
            }
        }

        // 6. latency
        self.pdc_delay = self.vars.get("pdc_delay");
    }

    /// Snapshot the current restorable state.
    ///
    /// Sliders appear in ascending index order; the byte blob is whatever
    /// `@serialize` wrote (empty when uncompiled or absent).
    pub fn save_state(&mut self) -> SavedState {
        let mut sliders = Vec::new();
        if let Some(program) = &self.program {
            for (id, _) in program.main().header.sliders_present() {
                sliders.push(SliderValue {
                    index: id,
                    value: self.values.get(id as usize),
                });
            }
        }

        let mut data = Vec::new();
        if let Some(compiled) = &mut self.compiled {
            let mut io = SerializeIo::for_writing();
            compiled.serialize(&mut self.vars, &mut io);
            data = io.into_bytes();
        }

        SavedState { sliders, data }
    }

    /// Restore a snapshot: sliders first, then an `@slider` run, then a
    /// read-mode `@serialize` replay over the stored bytes.
    pub fn load_state(&mut self, state: &SavedState) {
        for slider in &state.sliders {
            let index = slider.index as usize;
            if self.values.set(index, slider.value) {
                self.flags.changed.set(index);
            }
            self.vars.set_slider(index, slider.value);
        }
        if let Some(compiled) = &mut self.compiled {
            compiled.slider(&mut self.vars);
            let mut io = SerializeIo::for_reading(state.data.clone());
            compiled.serialize(&mut self.vars, &mut io);
        }
    }
}

/// Locate the preset bank conventionally shipped next to a script:
/// the script's file name with an `.rpl` extension, matched
/// case-insensitively in the script's directory.
pub fn sibling_bank_path(script: &Path) -> Option<PathBuf> {
    let dir = script.parent()?;
    let stem = script.file_stem()?.to_str()?;
    case_resolve(dir, &format!("{stem}.rpl")).into_path()
}

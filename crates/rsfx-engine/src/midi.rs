//! MIDI event queues.

use std::collections::VecDeque;

/// Default byte budget per queue direction.
pub const DEFAULT_MIDI_CAPACITY: usize = 64 * 1024;

/// One timestamped MIDI event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiEvent {
    /// MIDI bus number.
    pub bus: u32,
    /// Frame offset within the current block.
    pub offset: u32,
    /// Raw message bytes.
    pub data: Vec<u8>,
}

/// Bounded FIFO of MIDI events with a byte budget.
///
/// The budget counts message payload bytes. A full queue drops further
/// events unless marked extensible, in which case the budget grows.
#[derive(Debug)]
pub struct MidiQueue {
    events: VecDeque<MidiEvent>,
    used: usize,
    capacity: usize,
    extensible: bool,
}

impl Default for MidiQueue {
    fn default() -> Self {
        Self::new(DEFAULT_MIDI_CAPACITY, false)
    }
}

impl MidiQueue {
    /// An empty queue with the given byte budget.
    pub fn new(capacity: usize, extensible: bool) -> Self {
        Self {
            events: VecDeque::new(),
            used: 0,
            capacity,
            extensible,
        }
    }

    /// Enqueue an event; returns false if it was dropped for lack of space.
    pub fn push(&mut self, event: MidiEvent) -> bool {
        let size = event.data.len();
        if self.used + size > self.capacity {
            if !self.extensible {
                tracing::warn!(size, used = self.used, "midi queue full, dropping event");
                return false;
            }
            self.capacity = (self.used + size).max(self.capacity * 2);
        }
        self.used += size;
        self.events.push_back(event);
        true
    }

    /// Dequeue the oldest event.
    pub fn pop(&mut self) -> Option<MidiEvent> {
        let event = self.events.pop_front()?;
        self.used -= event.data.len();
        Some(event)
    }

    /// Drop all queued events.
    pub fn clear(&mut self) {
        self.events.clear();
        self.used = 0;
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

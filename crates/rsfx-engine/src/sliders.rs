//! Slider runtime state: atomic value cells, event bitmasks, curve mapping.
//!
//! The 256 sliders are sharded into 4 groups of 64 so event flags fit in
//! machine-word atomics. Producers set bits with `fetch_or`; consumers
//! drain a group with `swap(0)`, observing each event exactly once. The
//! group/mask math is a public contract hosts rely on.

use std::sync::atomic::{AtomicU64, Ordering};

use rsfx_lang::{Slider, SliderShape};

/// Number of slider slots per effect.
pub const SLIDER_COUNT: usize = 256;
/// Number of 64-bit bitmask groups.
pub const GROUP_COUNT: usize = SLIDER_COUNT / 64;

/// Bitmask group holding slider `index`.
#[inline]
pub fn slider_group(index: usize) -> usize {
    index >> 6
}

/// Bit for slider `index` within its group.
#[inline]
pub fn slider_mask(index: usize) -> u64 {
    1 << (index & 63)
}

/// One event channel across all four groups.
///
/// Follows the gesture-flag protocol: writer `fetch_or`, reader `swap(0)`.
/// The `visible` channel is stateful rather than drained, so bits can also
/// be cleared individually and read without consuming.
#[derive(Debug, Default)]
pub struct BitmaskChannel {
    groups: [AtomicU64; GROUP_COUNT],
}

impl BitmaskChannel {
    /// A channel with all bits clear.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bit for `index`. Out-of-range indices are ignored.
    pub fn set(&self, index: usize) {
        if let Some(group) = self.groups.get(slider_group(index)) {
            group.fetch_or(slider_mask(index), Ordering::AcqRel);
        }
    }

    /// Clear the bit for `index`.
    pub fn clear(&self, index: usize) {
        if let Some(group) = self.groups.get(slider_group(index)) {
            group.fetch_and(!slider_mask(index), Ordering::AcqRel);
        }
    }

    /// Whether the bit for `index` is set, without consuming it.
    pub fn is_set(&self, index: usize) -> bool {
        self.groups
            .get(slider_group(index))
            .is_some_and(|group| group.load(Ordering::Acquire) & slider_mask(index) != 0)
    }

    /// Atomically read and clear one group's accumulated bits.
    pub fn take(&self, group: usize) -> u64 {
        self.groups
            .get(group)
            .map_or(0, |g| g.swap(0, Ordering::AcqRel))
    }

    /// Read one group's bits without clearing.
    pub fn load(&self, group: usize) -> u64 {
        self.groups.get(group).map_or(0, |g| g.load(Ordering::Acquire))
    }
}

/// The four per-effect slider event channels.
#[derive(Debug, Default)]
pub struct SliderFlags {
    /// Value changed this block; consumer repaints.
    pub changed: BitmaskChannel,
    /// Value change must be pushed to host automation.
    pub automated: BitmaskChannel,
    /// Slider is mid-gesture.
    pub touching: BitmaskChannel,
    /// Slider is currently visible (stateful, not drained).
    pub visible: BitmaskChannel,
}

impl SliderFlags {
    /// Channels with all bits clear.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Lock-free slider value cells, f64 bit-cast into atomics.
#[derive(Debug)]
pub struct SliderValues {
    cells: Vec<AtomicU64>,
}

impl Default for SliderValues {
    fn default() -> Self {
        Self::new()
    }
}

impl SliderValues {
    /// All-zero values.
    pub fn new() -> Self {
        Self {
            cells: (0..SLIDER_COUNT).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    /// Current value of slider `index` (lock-free).
    pub fn get(&self, index: usize) -> f64 {
        self.cells
            .get(index)
            .map_or(0.0, |c| f64::from_bits(c.load(Ordering::Acquire)))
    }

    /// Write slider `index`; returns whether the stored value changed.
    pub fn set(&self, index: usize, value: f64) -> bool {
        self.cells.get(index).is_some_and(|c| {
            let old = c.swap(value.to_bits(), Ordering::AcqRel);
            f64::from_bits(old) != value
        })
    }
}

/// Map a slider value to its normalized 0..1 automation position.
///
/// Honors the declared shape. Square interpolates in the signed
/// `1/modifier`-root domain; log follows an exponential family whose
/// midpoint is the shape modifier, defaulting to the geometric mean of the
/// range when no modifier was given. Shapes that cannot produce a usable
/// curve for their range (a log range crossing zero, a midpoint at an
/// endpoint) degrade to linear. Degenerate ranges map to 0.
pub fn slider_to_normalized(slider: &Slider, value: f64) -> f64 {
    if slider.max == slider.min {
        return 0.0;
    }
    match slider.shape {
        SliderShape::Linear => linear_position(slider, value),
        SliderShape::Square => match root_span(slider) {
            Some((lo, hi)) => {
                let root = signed_pow(value, 1.0 / slider.shape_modifier);
                ((root - lo) / (hi - lo)).clamp(0.0, 1.0)
            }
            None => linear_position(slider, value),
        },
        SliderShape::Log => match log_base(slider) {
            Some(base) => {
                let frac = linear_position(slider, value);
                (1.0 + frac * (base - 1.0)).ln() / base.ln()
            }
            None => linear_position(slider, value),
        },
    }
}

/// Map a normalized 0..1 automation position back to a slider value.
///
/// Inverse of [`slider_to_normalized`]; degenerate ranges return `min`.
pub fn slider_from_normalized(slider: &Slider, t: f64) -> f64 {
    let span = slider.max - slider.min;
    if span == 0.0 {
        return slider.min;
    }
    let t = t.clamp(0.0, 1.0);
    match slider.shape {
        SliderShape::Linear => slider.min + span * t,
        SliderShape::Square => match root_span(slider) {
            Some((lo, hi)) => signed_pow(lo + t * (hi - lo), slider.shape_modifier),
            None => slider.min + span * t,
        },
        SliderShape::Log => match log_base(slider) {
            Some(base) => slider.min + span * (base.powf(t) - 1.0) / (base - 1.0),
            None => slider.min + span * t,
        },
    }
}

fn linear_position(slider: &Slider, value: f64) -> f64 {
    ((value - slider.min) / (slider.max - slider.min)).clamp(0.0, 1.0)
}

/// Sign-preserving power, so square curves survive zero-crossing ranges.
fn signed_pow(x: f64, exponent: f64) -> f64 {
    x.signum() * x.abs().powf(exponent)
}

/// Range endpoints mapped into the square shape's root domain.
fn root_span(slider: &Slider) -> Option<(f64, f64)> {
    if slider.shape_modifier == 0.0 {
        return None;
    }
    let root = 1.0 / slider.shape_modifier;
    let lo = signed_pow(slider.min, root);
    let hi = signed_pow(slider.max, root);
    (lo.is_finite() && hi.is_finite() && lo != hi).then_some((lo, hi))
}

/// Exponential base for a log curve: `value = min + span * (b^t - 1) / (b - 1)`
/// with `b = ((max - mid) / (mid - min))^2`, so the midpoint value lands at
/// normalized 0.5 exactly.
fn log_base(slider: &Slider) -> Option<f64> {
    let mid = if slider.shape_modifier == 0.0 {
        (slider.min * slider.max).sqrt()
    } else {
        slider.shape_modifier
    };
    let ratio = (slider.max - mid) / (mid - slider.min);
    let base = ratio * ratio;
    (base.is_finite() && base > 0.0 && (base - 1.0).abs() > 1e-12).then_some(base)
}

//! Lock-free parameters shared between a control thread and the audio thread.
//!
//! An [`AtomicParam`] holds one `f32` as raw bits in an `AtomicU32`. One
//! thread writes it, the audio thread polls it once per block.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// A single-writer / single-reader `f32` parameter.
///
/// # Example
///
/// ```ignore
/// let cutoff = Arc::new(AtomicParam::new(1000.0));
/// voice.bind_parameter(Identifier::new("Cutoff"), Arc::clone(&cutoff))?;
///
/// // Control thread
/// cutoff.store(2500.0);
/// ```
#[derive(Debug)]
pub struct AtomicParam {
    bits: AtomicU32,
    changed: AtomicBool,
}

impl AtomicParam {
    /// Creates a parameter holding `value`. It starts out unchanged.
    pub fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
            changed: AtomicBool::new(false),
        }
    }

    /// Stores a new value and marks the parameter changed.
    #[inline]
    pub fn store(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
        self.changed.store(true, Ordering::Release);
    }

    /// Loads the latest value.
    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Returns the latest value if it changed since the previous call.
    #[inline]
    pub fn take_if_changed(&self) -> Option<f32> {
        if self.changed.swap(false, Ordering::Acquire) {
            Some(f32::from_bits(self.bits.load(Ordering::Relaxed)))
        } else {
            None
        }
    }
}

impl Default for AtomicParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

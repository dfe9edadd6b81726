//! Smoothed values for click-free graph input changes.
//!
//! Provides linear ramps so that externally driven parameters can move to
//! a new value over a fixed number of ticks instead of jumping.

/// A value that moves linearly toward a target over a fixed number of steps.
///
/// # Example
///
/// ```ignore
/// let mut volume = SmoothedValue::new(0.0);
///
/// // Ramp to full volume over 480 ticks
/// volume.set_target(1.0, 480);
///
/// for _ in 0..block_size {
///     let v = volume.next();
///     // Use v...
/// }
/// ```
#[derive(Clone, Debug)]
pub struct SmoothedValue {
    /// Current value.
    current: f32,
    /// Target value we're ramping toward.
    target: f32,
    /// Amount added per step.
    increment: f32,
    /// Steps left until `current` reaches `target`.
    steps_remaining: u32,
}

impl SmoothedValue {
    /// Default ramp length in ticks (10ms at 48kHz).
    pub const DEFAULT_STEPS: u32 = 480;

    /// Creates a settled value.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            increment: 0.0,
            steps_remaining: 0,
        }
    }

    /// Starts a ramp to `target` lasting `steps` ticks.
    ///
    /// Zero steps or a non-finite target jump immediately.
    pub fn set_target(&mut self, target: f32, steps: u32) {
        if steps == 0 || !target.is_finite() {
            self.set_immediate(if target.is_finite() { target } else { self.current });
            return;
        }
        self.target = target;
        self.increment = (target - self.current) / steps as f32;
        self.steps_remaining = steps;
    }

    /// Gets the current target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Gets the current value without advancing.
    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Advances the ramp by one tick and returns the new value.
    ///
    /// The last step lands exactly on the target.
    #[inline]
    pub fn next(&mut self) -> f32 {
        match self.steps_remaining {
            0 => {}
            1 => {
                self.current = self.target;
                self.steps_remaining = 0;
            }
            _ => {
                self.current += self.increment;
                self.steps_remaining -= 1;
            }
        }
        self.current
    }

    /// Sets the value immediately without ramping.
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.increment = 0.0;
        self.steps_remaining = 0;
    }

    /// Returns true while a ramp is in progress.
    #[inline]
    pub fn is_smoothing(&self) -> bool {
        self.steps_remaining > 0
    }
}

impl Default for SmoothedValue {
    fn default() -> Self {
        Self::new(0.0)
    }
}

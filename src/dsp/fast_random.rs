//! Small deterministic random number generator for nodes.
//!
//! A 32-bit linear congruential generator: cheap enough for the audio
//! thread and fully reproducible from its seed.

use std::time::{SystemTime, UNIX_EPOCH};

/// Seed value meaning "derive the seed from the wall clock".
pub const TIME_SEED: i32 = -1;

/// Linear congruential generator with the Numerical Recipes constants.
#[derive(Clone, Debug)]
pub struct FastRandom {
    state: u32,
}

impl FastRandom {
    /// Creates a generator from an explicit seed, used verbatim.
    pub fn new(seed: i32) -> Self {
        Self { state: seed as u32 }
    }

    /// Creates a generator from a node seed input and discards the first
    /// output, which is a low-entropy function of the seed.
    ///
    /// [`TIME_SEED`] resolves to a seed derived from the current time.
    pub fn seeded(seed: i32) -> Self {
        let mut rng = Self::new(resolve_seed(seed));
        rng.next_u32();
        rng
    }

    /// Restarts the sequence from `seed` without the warm-up discard.
    pub fn set_seed(&mut self, seed: i32) {
        self.state = seed as u32;
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223);
        self.state
    }

    /// Returns a value in [0.0, 1.0).
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        // Upper 24 bits fit the f32 mantissa exactly.
        (self.next_u32() >> 8) as f32 / 16_777_216.0
    }

    /// Returns a value in [-1.0, 1.0).
    #[inline]
    pub fn next_bipolar(&mut self) -> f32 {
        self.next_f32() * 2.0 - 1.0
    }

    /// Returns a float between `min` and `max`. Reversed bounds are swapped.
    #[inline]
    pub fn f32_in_range(&mut self, min: f32, max: f32) -> f32 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        let value = lo + (hi - lo) * self.next_f32();
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }

    /// Returns an integer in `[min, max]`, both inclusive. Reversed bounds
    /// are swapped.
    #[inline]
    pub fn i32_in_range(&mut self, min: i32, max: i32) -> i32 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        let span = (hi as i64 - lo as i64 + 1) as u64;
        (lo as i64 + (self.next_u32() as u64 % span) as i64) as i32
    }

    /// Returns an index in `[0, len)`, or 0 when `len` is 0.
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.next_u32() as u64 % len as u64) as usize
    }
}

impl Default for FastRandom {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Replaces [`TIME_SEED`] with a seed taken from the wall clock.
pub fn resolve_seed(seed: i32) -> i32 {
    if seed == TIME_SEED {
        seed_from_time()
    } else {
        seed
    }
}

fn seed_from_time() -> i32 {
    let mixed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ (d.as_secs() as u32).rotate_left(16))
        .unwrap_or(0x5eed_1234);
    (mixed & 0x7fff_ffff) as i32
}

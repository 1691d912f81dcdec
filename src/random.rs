use rand::RngExt;

/// Uniform random source for the animation.
///
/// The circle field samples every stochastic value through this trait so a
/// test can substitute a pinned source and get a fully deterministic field.
pub trait Randomness {
    /// Next uniform sample in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Uniform sample in `[min, max)`.
    ///
    /// Computed as `min + unit * (max - min)` with no ordering check: callers
    /// that pass an inverted range get samples from the mirrored interval
    /// rather than a panic.
    fn range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_unit() * (max - min)
    }
}

/// Production source backed by the thread-local RNG.
pub struct ThreadRandomness {
    rng: rand::rngs::ThreadRng,
}

impl ThreadRandomness {
    pub fn new() -> Self {
        ThreadRandomness { rng: rand::rng() }
    }
}

impl Default for ThreadRandomness {
    fn default() -> Self {
        Self::new()
    }
}

impl Randomness for ThreadRandomness {
    fn next_unit(&mut self) -> f64 {
        self.rng.random_range(0.0..1.0)
    }
}

/// Source that returns the same value forever. Every `range(min, max)` call
/// then lands at the same fraction of its interval, which makes sprite
/// populations fully reproducible.
#[cfg(test)]
pub struct FixedRandomness {
    value: f64,
}

#[cfg(test)]
impl FixedRandomness {
    /// `value` must lie in `[0, 1)`.
    pub fn new(value: f64) -> Self {
        debug_assert!((0.0..1.0).contains(&value));
        FixedRandomness { value }
    }
}

#[cfg(test)]
impl Randomness for FixedRandomness {
    fn next_unit(&mut self) -> f64 {
        self.value
    }
}

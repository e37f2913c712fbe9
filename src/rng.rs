use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng};

/// Source of uniform floats in `[0, 1)` for the stochastic pursuer policy.
pub trait RandomSource {
    fn next_f32(&mut self) -> f32;

    fn bool(&mut self, probability: f32) -> bool {
        self.next_f32() < probability
    }

    fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        (self.next_f32() * len as f32).floor().min((len - 1) as f32) as usize
    }
}

/// Small seedable generator (mulberry32). Same seed, same sequence on every platform.
#[derive(Clone, Debug)]
pub struct Rng {
    seed: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }
}

impl RandomSource for Rng {
    fn next_f32(&mut self) -> f32 {
        self.seed = self.seed.wrapping_add(0x6d2b79f5);
        let mut t = self.seed;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        let out = t ^ (t >> 14);
        // 24 high bits so the result is exactly representable and never rounds up to 1.0
        (out >> 8) as f32 / 16_777_216.0
    }
}

/// Adapter over the `rand` standard generator for hosts that prefer it.
#[derive(Clone, Debug)]
pub struct StdRandom(StdRng);

impl StdRandom {
    pub fn seed_from_u64(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }

    pub fn from_os_rng() -> Self {
        Self(StdRng::from_os_rng())
    }
}

impl RandomSource for StdRandom {
    fn next_f32(&mut self) -> f32 {
        self.0.random::<f32>()
    }
}

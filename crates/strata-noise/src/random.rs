//! Seeded generators used by carvers and biome blending.

use strata_geom::V3i;

pub const PSEUDORANDOM_MAX: i32 = 32767;

/// 15-bit linear congruential generator.
#[derive(Clone, Debug, Default)]
pub struct PseudoRandom {
    next: i32,
}

impl PseudoRandom {
    pub fn new(seed: i32) -> Self {
        Self { next: seed }
    }

    pub fn seed(&mut self, seed: i32) {
        self.next = seed;
    }

    /// Next value in `0..=32767`.
    pub fn next(&mut self) -> i32 {
        self.next = self.next.wrapping_mul(1_103_515_245).wrapping_add(12345);
        ((self.next / 65536) as u32 % 32768) as i32
    }

    /// Uniform-ish value in `min..=max`. The span must stay well below the generator
    /// range for the result to be usefully distributed.
    pub fn range(&mut self, min: i32, max: i32) -> i32 {
        assert!(max >= min, "PseudoRandom::range: max < min ({max} < {min})");
        debug_assert!(
            max - min <= (PSEUDORANDOM_MAX + 1) / 10,
            "PseudoRandom::range: span {} too large",
            max - min
        );
        self.next() % (max - min + 1) + min
    }
}

/// PCG32 (XSH-RR) with a 64-bit state and an odd stream increment.
#[derive(Clone, Debug)]
pub struct PcgRandom {
    state: u64,
    inc: u64,
}

impl PcgRandom {
    pub const DEFAULT_STATE: u64 = 0x853c_49e6_748f_ea9b;
    pub const DEFAULT_INC: u64 = 0xda3e_39cb_94b9_5bdb;

    pub fn new(state: u64) -> Self {
        Self::with_stream(state, Self::DEFAULT_INC)
    }

    pub fn with_stream(state: u64, seq: u64) -> Self {
        let mut r = Self { state: 0, inc: 0 };
        r.seed(state, seq);
        r
    }

    pub fn seed(&mut self, state: u64, seq: u64) {
        self.state = 0;
        self.inc = (seq << 1) | 1;
        self.next();
        self.state = self.state.wrapping_add(state);
        self.next();
    }

    pub fn next(&mut self) -> u32 {
        let old = self.state;
        self.state = old
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(self.inc);
        let xorshifted = (((old >> 18) ^ old) >> 27) as u32;
        let rot = (old >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Unbiased value in `0..bound`; a zero bound yields a raw draw.
    pub fn range_bound(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return self.next();
        }
        let threshold = bound.wrapping_neg() % bound;
        loop {
            let r = self.next();
            if r >= threshold {
                return r % bound;
            }
        }
    }

    /// Unbiased value in `min..=max`.
    pub fn range(&mut self, min: i32, max: i32) -> i32 {
        assert!(max >= min, "PcgRandom::range: max < min ({max} < {min})");
        let bound = (max as i64 - min as i64 + 1) as u32;
        (self.range_bound(bound) as i64 + min as i64) as i32
    }

    /// Approximately normal value in `min..=max`: the rounded mean of `num_trials`
    /// uniform draws.
    pub fn rand_normal_dist(&mut self, min: i32, max: i32, num_trials: u32) -> i32 {
        let trials = num_trials.max(1);
        let mut accum = 0i64;
        for _ in 0..trials {
            accum += i64::from(self.range(min, max));
        }
        (accum as f64 / f64::from(trials)).round() as i32
    }
}

/// Seed for per-block (or per-chunk) RNGs, keyed by the block's minimum node.
pub fn block_seed(p: V3i, seed: i32) -> i32 {
    seed.wrapping_add(p.z.wrapping_mul(38_134_234))
        .wrapping_add(p.y.wrapping_mul(42_123))
        .wrapping_add(p.x.wrapping_mul(23))
}

/// Better-mixed variant of [`block_seed`] based on the lattice hash.
pub fn block_seed2(p: V3i, seed: u64) -> u32 {
    let mut n = 1619u32
        .wrapping_mul(p.x as u32)
        .wrapping_add(31337u32.wrapping_mul(p.y as u32))
        .wrapping_add(52591u32.wrapping_mul(p.z as u32))
        .wrapping_add(1013u32.wrapping_mul(seed as u32));
    n ^= n >> 13;
    n.wrapping_mul(n.wrapping_mul(n).wrapping_mul(60493).wrapping_add(19_990_303))
        .wrapping_add(1_376_312_589)
}

//! Randomness seam for block generation.

pub trait RandomSource {
    /// Uniform value in `0..bound`. `bound` of 0 or 1 yields 0.
    fn next_below(&mut self, bound: usize) -> usize;
}

/// Draws from the OS (native) or `crypto.getRandomValues` (browser).
#[derive(Debug, Default)]
pub struct OsRandom {
    // Seeded from the clock the first time getrandom fails.
    fallback: Option<Xorshift>,
}

impl OsRandom {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        match getrandom::getrandom(&mut buf) {
            Ok(()) => u32::from_le_bytes(buf),
            Err(err) => self
                .fallback
                .get_or_insert_with(|| {
                    console_warn!("getrandom failed, seeding from the clock", err.to_string());
                    Xorshift::seeded(clock_seed())
                })
                .next_u32(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Xorshift(u64);

impl Xorshift {
    fn seeded(seed: u64) -> Self {
        // Zero is a fixed point.
        Self(seed.max(1))
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        (x >> 32) as u32
    }
}

/// Milliseconds since the epoch, spread over the high bits.
fn clock_seed() -> u64 {
    #[cfg(target_arch = "wasm32")]
    let millis = js_sys::Date::now() as u64;
    #[cfg(not(target_arch = "wasm32"))]
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as u64);
    millis.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

impl RandomSource for OsRandom {
    fn next_below(&mut self, bound: usize) -> usize {
        if bound <= 1 {
            return 0;
        }
        let bound = u32::try_from(bound).unwrap_or(u32::MAX);
        // Reject the tail so every residue is equally likely.
        let zone = u32::MAX - (u32::MAX % bound);
        loop {
            let v = self.next_u32();
            if v < zone {
                return (v % bound) as usize;
            }
        }
    }
}

/// Replays a fixed list of draws (each reduced modulo the bound), cycling
/// when exhausted. Handy for deterministic layouts.
#[derive(Clone, Debug)]
pub struct SequenceRandom {
    values: Vec<usize>,
    pos: usize,
}

impl SequenceRandom {
    pub fn new(values: impl Into<Vec<usize>>) -> Self {
        Self {
            values: values.into(),
            pos: 0,
        }
    }
}

impl RandomSource for SequenceRandom {
    fn next_below(&mut self, bound: usize) -> usize {
        if bound <= 1 || self.values.is_empty() {
            return 0;
        }
        let v = self.values[self.pos % self.values.len()];
        self.pos += 1;
        v % bound
    }
}

/// Fisher–Yates.
pub fn shuffle<T>(items: &mut [T], rng: &mut impl RandomSource) {
    for i in (1..items.len()).rev() {
        let j = rng.next_below(i + 1);
        items.swap(i, j);
    }
}

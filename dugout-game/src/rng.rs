//! Deterministic random sources for the simulation.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use sha2::Sha256;
use std::cell::{RefCell, RefMut};
use std::collections::VecDeque;

/// Deterministic bundle of RNG streams segregated by simulation domain.
///
/// Plate appearances, runner advancement and bullpen fatigue draw from
/// separate streams so a change in one domain does not shift the others.
#[derive(Debug, Clone)]
pub struct RngBundle {
    seed: u64,
    plate: RefCell<CountingRng<SmallRng>>,
    basepaths: RefCell<CountingRng<SmallRng>>,
    bullpen: RefCell<CountingRng<SmallRng>>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            seed,
            plate: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"plate"))),
            basepaths: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"basepaths"))),
            bullpen: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"bullpen"))),
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Access the plate-appearance RNG stream.
    #[must_use]
    pub fn plate(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.plate.borrow_mut()
    }

    /// Access the baserunning RNG stream.
    #[must_use]
    pub fn basepaths(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.basepaths.borrow_mut()
    }

    /// Access the stamina drain RNG stream.
    #[must_use]
    pub fn bullpen(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.bullpen.borrow_mut()
    }

    /// Total draws across every stream.
    #[must_use]
    pub fn total_draws(&self) -> u64 {
        self.plate
            .borrow()
            .draws()
            .saturating_add(self.basepaths.borrow().draws())
            .saturating_add(self.bullpen.borrow().draws())
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: rand::RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

/// Derive a per-domain seed as the first eight bytes of `HMAC-SHA256(seed, tag)`.
#[must_use]
pub fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

/// Replays a fixed queue of unit-interval rolls.
///
/// Each `gen::<f64>()` on this source returns the next queued value, which
/// makes a specific sequence of plays reproducible. Once the queue is empty
/// every further roll is `0.0`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRolls {
    rolls: VecDeque<f64>,
    consumed: usize,
}

impl ScriptedRolls {
    #[must_use]
    pub fn new<I>(rolls: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        Self {
            rolls: rolls.into_iter().collect(),
            consumed: 0,
        }
    }

    /// Queue another roll at the end of the script.
    pub fn push(&mut self, roll: f64) {
        self.rolls.push_back(roll);
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }

    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.consumed
    }

    fn next_roll(&mut self) -> f64 {
        match self.rolls.pop_front() {
            Some(roll) => {
                self.consumed += 1;
                roll.clamp(0.0, 1.0 - f64::EPSILON)
            }
            None => 0.0,
        }
    }
}

// `Rng::gen::<f64>()` takes the top 53 bits of `next_u64`; encode the roll so it
// decodes back exactly.
const F64_MANTISSA_SCALE: f64 = (1_u64 << 53) as f64;

impl rand::RngCore for ScriptedRolls {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let roll = self.next_roll();
        ((roll * F64_MANTISSA_SCALE) as u64) << 11
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

//! Stimulus: deterministic plans, constrained random fill and guaranteed misses.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;

use crate::model::{Action, MatchVector, SLOTS};
use crate::seamap::SeaCounter;
use crate::TbError;

/// Intended CAM contents, tracked independently of [`crate::model::CamModel`].
pub struct ShadowMemory {
    slots: [u8; SLOTS],
    wp: usize,
    held: SeaCounter<u8>,
}

impl Default for ShadowMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl ShadowMemory {
    pub fn new() -> Self {
        let mut held = SeaCounter::new();
        held.add(0, SLOTS);
        Self {
            slots: [0; SLOTS],
            wp: 0,
            held,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn record_write(&mut self, value: u8) {
        let evicted = self.slots[self.wp];
        self.held.remove_one(evicted);
        self.held.add(value, 1);
        self.slots[self.wp] = value;
        self.wp = (self.wp + 1) % SLOTS;
    }

    pub fn contains(&self, value: u8) -> bool {
        self.held.contains(&value)
    }

    /// How many slots hold `value`.
    pub fn occurrences(&self, value: u8) -> usize {
        self.held.count(&value)
    }

    pub fn distinct_values(&self) -> usize {
        self.held.distinct()
    }

    /// Match computed slot by slot, as a cross-check of the model's compare.
    pub fn expected(&self, value: u8) -> MatchVector {
        MatchVector::from_slots((0..SLOTS).filter(|i| self.slots[*i] == value))
    }

    pub fn slots(&self) -> &[u8; SLOTS] {
        &self.slots
    }

    pub fn write_pointer(&self) -> usize {
        self.wp
    }
}

/// Seeded generator of write/query values, keeping the shadow memory.
pub struct StimulusGen {
    rng: StdRng,
    seed: u64,
    range: RangeInclusive<u8>,
    retry_limit: u32,
    shadow: ShadowMemory,
}

impl StimulusGen {
    /// Fails on an empty `range`, which leaves nothing to draw from.
    pub fn new(seed: u64, range: RangeInclusive<u8>, retry_limit: u32) -> Result<Self, TbError> {
        if range.is_empty() {
            return Err(TbError::Config(format!(
                "empty value range {:#04x}..={:#04x}",
                range.start(),
                range.end()
            )));
        }
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
            range,
            retry_limit,
            shadow: ShadowMemory::new(),
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn shadow(&self) -> &ShadowMemory {
        &self.shadow
    }

    /// Reset and writes applied to the DUT have to be mirrored here.
    pub fn record(&mut self, action: Action) {
        match action {
            Action::Reset => self.shadow.reset(),
            Action::Write(v) => self.shadow.record_write(v),
            Action::Query(_) => {}
        }
    }

    fn range_size(&self) -> usize {
        (*self.range.end() - *self.range.start()) as usize + 1
    }

    pub fn rand_value(&mut self) -> u8 {
        self.rng.gen_range(self.range.clone())
    }

    /// One random value per slot, in write order. Values are not recorded
    /// until the writes are applied.
    pub fn random_fill(&mut self) -> Vec<u8> {
        (0..SLOTS).map(|_| self.rand_value()).collect()
    }

    /// A value from the range that no slot holds right now.
    pub fn absent_value(&mut self) -> Result<u8, TbError> {
        let lo = *self.range.start();
        let hi = *self.range.end();
        let held_in_range = self.range.clone().filter(|v| self.shadow.contains(*v)).count();
        if held_in_range >= self.range_size() {
            return Err(TbError::Exhaustion {
                lo,
                hi,
                occupied: self.shadow.distinct_values(),
                retries: 0,
            });
        }
        for _ in 0..self.retry_limit {
            let v = self.rand_value();
            if !self.shadow.contains(v) {
                return Ok(v);
            }
        }
        Err(TbError::Exhaustion {
            lo,
            hi,
            occupied: self.shadow.distinct_values(),
            retries: self.retry_limit,
        })
    }
}

/// Write 1..=16, querying each value right after its write.
pub fn exact_fill() -> Vec<Action> {
    (1..=SLOTS as u8)
        .flat_map(|v| [Action::Write(v), Action::Query(v)])
        .collect()
}

/// 17 distinct writes; the last one overwrites slot 0.
pub fn wraparound() -> Vec<Action> {
    let mut plan: Vec<Action> = (1..=SLOTS as u8 + 1).map(Action::Write).collect();
    plan.extend([Action::Query(1), Action::Query(SLOTS as u8 + 1), Action::Query(2)]);
    plan
}

/// Same value in slots 0 and 2.
pub fn collision() -> Vec<Action> {
    vec![
        Action::Write(0x55),
        Action::Write(0x33),
        Action::Write(0x55),
        Action::Query(0x55),
        Action::Query(0x33),
    ]
}

/// Four writes, two of them colliding, then a miss and three hits.
pub fn concrete_writes() -> Vec<Action> {
    vec![
        Action::Write(0x01),
        Action::Write(0x7a),
        Action::Write(0x0a),
        Action::Write(0x7a),
        Action::Query(0x0b),
        Action::Query(0x7a),
        Action::Query(0x01),
        Action::Query(0x0a),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn shadow_counts_overwrites() {
        let mut shadow = ShadowMemory::new();
        assert_eq!(shadow.occurrences(0), SLOTS);
        for v in 1..=16 {
            shadow.record_write(v);
        }
        assert!(!shadow.contains(0));
        assert_eq!(shadow.write_pointer(), 0);
        shadow.record_write(16);
        // slot 0 (value 1) evicted, 16 now twice
        assert!(!shadow.contains(1));
        assert_eq!(shadow.occurrences(16), 2);
        assert_eq!(shadow.expected(16), MatchVector::from_slots([0, 15]));
    }

    #[test]
    fn same_seed_same_stimulus() {
        let mut a = StimulusGen::new(42, 0..=127, 64).unwrap();
        let mut b = StimulusGen::new(42, 0..=127, 64).unwrap();
        assert_eq!(a.random_fill(), b.random_fill());
        let mut c = StimulusGen::new(43, 0..=127, 64).unwrap();
        assert_ne!(a.random_fill(), c.random_fill());
    }

    #[test]
    fn random_values_stay_in_range() {
        let mut g = StimulusGen::new(7, 0..=127, 64).unwrap();
        for _ in 0..1000 {
            assert!(g.rand_value() <= 127);
        }
    }

    #[test]
    fn absent_value_avoids_contents() {
        let mut g = StimulusGen::new(1, 0..=127, 64).unwrap();
        for v in g.random_fill() {
            g.record(Action::Write(v));
        }
        for _ in 0..100 {
            let v = g.absent_value().unwrap();
            assert!(!g.shadow().contains(v));
            assert!(g.shadow().expected(v).is_miss());
        }
    }

    #[test]
    fn reset_contents_count_as_occupied() {
        // only 0 and 1 to choose from, 0 held by every slot after reset
        let mut g = StimulusGen::new(3, 0..=1, 64).unwrap();
        assert_eq!(g.absent_value(), Ok(1));
    }

    #[test]
    fn fully_occupied_range_exhausts() {
        let mut g = StimulusGen::new(5, 0..=15, 1000).unwrap();
        for v in 0..16 {
            g.record(Action::Write(v));
        }
        assert_eq!(
            g.absent_value(),
            Err(TbError::Exhaustion {
                lo: 0,
                hi: 15,
                occupied: 16,
                retries: 0,
            })
        );
    }

    #[test]
    fn retry_bound_is_honored() {
        // plenty of free values, but no draws allowed
        let mut g = StimulusGen::new(11, 0..=127, 0).unwrap();
        assert!(matches!(
            g.absent_value(),
            Err(TbError::Exhaustion { retries: 0, .. })
        ));
    }

    #[test]
    #[allow(clippy::reversed_empty_ranges)]
    fn empty_range_is_rejected() {
        assert!(matches!(
            StimulusGen::new(1, 9..=3, 64),
            Err(TbError::Config(_))
        ));
        assert!(StimulusGen::new(1, 3..=3, 64).is_ok());
    }

    #[test]
    fn plans_have_expected_shape() {
        let fill = exact_fill();
        assert_eq!(fill.len(), 32);
        assert_eq!(fill[30], Action::Write(16));
        assert_eq!(wraparound()[16], Action::Write(17));
        assert_eq!(concrete_writes()[4], Action::Query(0x0b));
    }
}

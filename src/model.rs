//! Reference model of the 16-entry CAM.
//!
//! Slot/bit mapping used throughout the crate: bit `i` of a [`MatchVector`] is
//! slot `i`, with slot 0 the least significant bit. Simulators print vectors
//! MSB first, so in a binary string slot 15 is the leftmost character and slot
//! 0 the rightmost (`0000000000001010` is slots 1 and 3).

use std::fmt;

/// Number of CAM entries.
pub const SLOTS: usize = 16;

/// Match vector reported while reset is asserted.
///
/// This is the DUT's convention and must stay all-ones. It is not a "no match"
/// value; a real miss is `0x0000`.
pub const RESET_MATCH: MatchVector = MatchVector(0xffff);

/// Output-enable value once reset is released.
pub const OE_DRIVEN: u8 = 0xff;

/// One testbench action, issued once per clock cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Reset,
    Write(u8),
    Query(u8),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Reset => write!(f, "reset"),
            Action::Write(v) => write!(f, "write {:#04x}", v),
            Action::Query(v) => write!(f, "query {:#04x}", v),
        }
    }
}

/// Per-slot match mask. See the module docs for the bit ordering.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MatchVector(u16);

impl MatchVector {
    pub const NONE: MatchVector = MatchVector(0);

    pub const fn from_bits(bits: u16) -> Self {
        MatchVector(bits)
    }

    /// Vector with only `slot` set.
    pub fn one_hot(slot: usize) -> Self {
        debug_assert!(slot < SLOTS);
        MatchVector(1 << slot)
    }

    /// Vector with the given slots set. Indices past the last slot are ignored.
    pub fn from_slots(slots: impl IntoIterator<Item = usize>) -> Self {
        slots
            .into_iter()
            .filter(|s| *s < SLOTS)
            .fold(MatchVector::NONE, |acc, s| MatchVector(acc.0 | 1 << s))
    }

    /// Parses an MSB-first binary string as sampled from a simulator. `_` and a
    /// leading `0b` are ignored. Returns `None` for anything but 16 `0`/`1`.
    pub fn from_bin_str(s: &str) -> Option<Self> {
        let stripped: String = s.trim_start_matches("0b").chars().filter(|c| *c != '_').collect();
        if stripped.len() != SLOTS || !stripped.chars().all(|c| c == '0' || c == '1') {
            return None;
        }
        u16::from_str_radix(&stripped, 2).ok().map(MatchVector)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub fn is_set(self, slot: usize) -> bool {
        slot < SLOTS && self.0 & (1 << slot) != 0
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    pub fn is_miss(self) -> bool {
        self.0 == 0
    }

    /// More than one slot matched.
    pub fn is_collision(self) -> bool {
        self.count() > 1
    }

    /// Matching slot indices, lowest first.
    pub fn slots(self) -> impl Iterator<Item = usize> {
        (0..SLOTS).filter(move |s| self.is_set(*s))
    }
}

impl fmt::Display for MatchVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016b}", self.0)
    }
}

impl fmt::Debug for MatchVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MatchVector({:#06x} = {:016b})", self.0, self.0)
    }
}

/// Software mirror of the intended DUT behavior.
#[derive(Debug, Clone)]
pub struct CamModel {
    slots: [u8; SLOTS],
    wp: usize,
    writes: u64,
    in_reset: bool,
}

impl Default for CamModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CamModel {
    /// A freshly reset model with the reset token released.
    pub fn new() -> Self {
        Self {
            slots: [0; SLOTS],
            wp: 0,
            writes: 0,
            in_reset: false,
        }
    }

    pub fn reset(&mut self) {
        self.slots = [0; SLOTS];
        self.wp = 0;
        self.writes = 0;
    }

    /// Asserts the reset token. State is cleared and held until release.
    pub fn assert_reset(&mut self) {
        self.reset();
        self.in_reset = true;
    }

    pub fn release_reset(&mut self) {
        self.in_reset = false;
    }

    pub fn is_in_reset(&self) -> bool {
        self.in_reset
    }

    /// Stores `value` at the write pointer and advances it round-robin.
    /// Returns the slot written, or `None` if reset is asserted.
    pub fn write(&mut self, value: u8) -> Option<usize> {
        if self.in_reset {
            return None;
        }
        let slot = self.wp;
        self.slots[slot] = value;
        self.wp = (self.wp + 1) % SLOTS;
        self.writes += 1;
        debug_assert_eq!(self.wp as u64, self.writes % SLOTS as u64);
        Some(slot)
    }

    /// Parallel compare of all slots against `value`.
    pub fn query(&self, value: u8) -> MatchVector {
        let bits = self
            .slots
            .iter()
            .enumerate()
            .fold(0u16, |acc, (i, s)| acc | (((*s == value) as u16) << i));
        MatchVector(bits)
    }

    /// What the DUT has to report for a query of `value` right now.
    pub fn expected_match(&self, value: u8) -> MatchVector {
        if self.in_reset {
            RESET_MATCH
        } else {
            self.query(value)
        }
    }

    pub fn slots(&self) -> &[u8; SLOTS] {
        &self.slots
    }

    pub fn write_pointer(&self) -> usize {
        self.wp
    }

    pub fn writes_since_reset(&self) -> u64 {
        self.writes
    }

    /// Write pointer must equal accepted writes since reset, mod 16.
    pub fn check_invariants(&self) -> Result<(), String> {
        let expected = (self.writes % SLOTS as u64) as usize;
        if self.wp != expected {
            return Err(format!(
                "write pointer {} after {} writes, expected {}",
                self.wp, self.writes, expected
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reset_state_matches_zero_everywhere() {
        let m = CamModel::new();
        assert_eq!(m.query(0), MatchVector::from_bits(0xffff));
        assert_eq!(m.query(1), MatchVector::NONE);
        assert_eq!(m.write_pointer(), 0);
    }

    #[test]
    fn sentinel_while_reset_asserted() {
        let mut m = CamModel::new();
        m.write(0x42);
        m.assert_reset();
        // all-ones, regardless of the queried value
        assert_eq!(m.expected_match(0x42), RESET_MATCH);
        assert_eq!(m.expected_match(0x99), RESET_MATCH);
        assert_eq!(RESET_MATCH.bits(), 0xffff);
        assert_eq!(m.write(0x10), None);
        m.release_reset();
        assert_eq!(m.expected_match(0x42), MatchVector::NONE);
        assert_eq!(m.write(0x10), Some(0));
    }

    #[test]
    fn concrete_write_sequence() {
        let mut m = CamModel::new();
        for v in [0x01, 0x7a, 0x0a, 0x7a] {
            m.write(v);
        }
        assert_eq!(m.write_pointer(), 4);
        assert_eq!(m.query(0x0b), MatchVector::NONE);
        assert_eq!(m.query(0x7a), MatchVector::from_bin_str("0000000000001010").unwrap());
        assert_eq!(m.query(0x01), MatchVector::from_bin_str("0000000000000001").unwrap());
        assert_eq!(m.query(0x0a), MatchVector::from_bin_str("0000000000000100").unwrap());
    }

    #[test]
    fn seventeenth_write_lands_in_slot_zero() {
        let mut m = CamModel::new();
        for v in 1..=16u8 {
            assert_eq!(m.write(v), Some(v as usize - 1));
        }
        assert_eq!(m.write_pointer(), 0);
        assert_eq!(m.write(17), Some(0));
        assert_eq!(m.query(1), MatchVector::NONE);
        assert_eq!(m.query(17), MatchVector::one_hot(0));
        assert_eq!(m.query(2), MatchVector::one_hot(1));
        assert!(m.check_invariants().is_ok());
    }

    #[test]
    fn two_slots_collide() {
        let mut m = CamModel::new();
        m.write(0x55);
        m.write(0x33);
        m.write(0x55);
        let mv = m.query(0x55);
        assert!(mv.is_collision());
        assert_eq!(mv.slots().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(mv, MatchVector::from_slots([0, 2]));
    }

    #[test]
    fn slots_past_the_end_are_dropped() {
        assert_eq!(MatchVector::from_slots([3, 16, 40]), MatchVector::one_hot(3));
        assert_eq!(MatchVector::from_slots(14..20).bits(), 0xc000);
    }

    #[test]
    fn bin_str_is_msb_first() {
        let mv = MatchVector::one_hot(15);
        assert_eq!(mv.to_string(), "1000000000000000");
        assert_eq!(MatchVector::from_bin_str("0b1000_0000_0000_0000"), Some(mv));
        assert_eq!(MatchVector::from_bin_str("10"), None);
        assert_eq!(MatchVector::from_bin_str("000000000000000x"), None);
    }

    #[test]
    fn reset_clears_after_wrap() {
        let mut m = CamModel::new();
        for v in 0..20u8 {
            m.write(v);
        }
        m.reset();
        assert_eq!(m.writes_since_reset(), 0);
        assert_eq!(m.slots(), &[0; SLOTS]);
    }
}

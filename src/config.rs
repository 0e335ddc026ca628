use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;

use crate::sim::time_scale;
use crate::TbError;

/// Testbench parameters shared by every scenario of a suite.
#[derive(Debug, Clone, PartialEq)]
pub struct TbConfig {
    /// Base seed. `None` derives one from the wall clock; it is logged either way.
    pub seed: Option<u64>,
    pub clock_period: u64,
    pub clock_unit: String,
    /// Rising edges with reset asserted.
    pub reset_cycles: u32,
    /// Rising edges to wait after reset release before the first action.
    pub post_reset_cycles: u32,
    /// Values drawn by the constrained random generator.
    pub value_range: RangeInclusive<u8>,
    /// Draws before miss generation gives up.
    pub miss_retry_limit: u32,
    pub random_rounds: u32,
    pub misses_per_round: u32,
    /// Watchdog per scenario.
    pub max_sim_time_ns: u64,
    pub junit_path: Option<PathBuf>,
}

impl Default for TbConfig {
    fn default() -> Self {
        Self {
            seed: None,
            clock_period: 10,
            clock_unit: "ns".to_string(),
            reset_cycles: 10,
            post_reset_cycles: 2,
            value_range: 0..=127,
            miss_retry_limit: 64,
            random_rounds: 4,
            misses_per_round: 8,
            max_sim_time_ns: 10_000_000,
            junit_path: None,
        }
    }
}

impl TbConfig {
    /// Defaults overridden by `CAMTB_SEED`, `CAMTB_RANDOM_ROUNDS` and `CAMTB_JUNIT`.
    pub fn from_env() -> Result<Self, TbError> {
        let mut config = Self::default();
        if let Some(seed) = env_parse::<u64>("CAMTB_SEED")? {
            config.seed = Some(seed);
        }
        if let Some(rounds) = env_parse::<u32>("CAMTB_RANDOM_ROUNDS")? {
            config.random_rounds = rounds;
        }
        if let Ok(path) = std::env::var("CAMTB_JUNIT") {
            config.junit_path = Some(PathBuf::from(path));
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), TbError> {
        if self.clock_period == 0 {
            return Err(TbError::Config("clock period must be non-zero".into()));
        }
        time_scale(&self.clock_unit)?;
        if self.reset_cycles < 10 {
            return Err(TbError::Config(format!(
                "reset must be held for at least 10 cycles, got {}",
                self.reset_cycles
            )));
        }
        if self.post_reset_cycles < 2 {
            return Err(TbError::Config(format!(
                "at least 2 cycles are required after reset release, got {}",
                self.post_reset_cycles
            )));
        }
        if self.value_range.is_empty() {
            return Err(TbError::Config(format!(
                "empty value range {:?}",
                self.value_range
            )));
        }
        Ok(())
    }

    /// Number of distinct values the random generator can produce.
    pub fn range_size(&self) -> usize {
        if self.value_range.is_empty() {
            0
        } else {
            (*self.value_range.end() - *self.value_range.start()) as usize + 1
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, TbError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| TbError::Config(format!("can't parse {}={:?}", key, raw))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = TbConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.range_size(), 128);
    }

    #[test]
    fn short_reset_rejected() {
        let c = TbConfig {
            reset_cycles: 9,
            ..TbConfig::default()
        };
        assert!(matches!(c.validate(), Err(TbError::Config(_))));
        let c = TbConfig {
            post_reset_cycles: 1,
            ..TbConfig::default()
        };
        assert!(matches!(c.validate(), Err(TbError::Config(_))));
    }

    #[test]
    fn unknown_unit_rejected() {
        let c = TbConfig {
            clock_unit: "parsec".into(),
            ..TbConfig::default()
        };
        assert_eq!(c.validate(), Err(TbError::InvalidTimeUnit("parsec".into())));
    }

    #[test]
    #[allow(clippy::reversed_empty_ranges)]
    fn empty_range_rejected() {
        let c = TbConfig {
            value_range: 5..=4,
            ..TbConfig::default()
        };
        assert!(c.validate().is_err());
        assert_eq!(c.range_size(), 0);
    }
}

//! Built-in CAM verification scenarios.

use crate::model::{MatchVector, RESET_MATCH, SLOTS};
use crate::prelude::*;
use crate::sequencer::CamTb;
use crate::stimulus;
use crate::test::TestSuite;

pub async fn test_reset(sim: Sim) -> TbResult {
    let mut tb = CamTb::new(&sim)?;
    tb.reset().await?;
    // all slots hold 0 after reset
    tb.expect_query(0, RESET_MATCH).await?;
    tb.expect_query(0x5a, MatchVector::NONE).await?;
    // and a second reset still gives the sentinel
    tb.write(0x5a).await?;
    tb.reset().await?;
    tb.expect_query(0x5a, MatchVector::NONE).await?;
    tb.finish()
}

pub async fn test_write(sim: Sim) -> TbResult {
    let mut tb = CamTb::new(&sim)?;
    tb.reset().await?;
    for v in [0x01, 0x7a, 0x0a, 0x7a] {
        tb.write(v).await?;
    }
    tb.expect_query(0x0b, MatchVector::NONE).await?;
    tb.expect_query(0x7a, MatchVector::from_bits(0b0000_0000_0000_1010)).await?;
    tb.expect_query(0x01, MatchVector::from_bits(0b0000_0000_0000_0001)).await?;
    tb.expect_query(0x0a, MatchVector::from_bits(0b0000_0000_0000_0100)).await?;
    tb.finish()
}

pub async fn test_fill(sim: Sim) -> TbResult {
    let mut tb = CamTb::new(&sim)?;
    tb.reset().await?;
    for i in 1..=SLOTS as u8 {
        tb.write(i).await?;
        tb.expect_query(i, MatchVector::from_bits(1 << (i - 1))).await?;
    }
    tb.finish()
}

pub async fn test_wraparound(sim: Sim) -> TbResult {
    let mut tb = CamTb::new(&sim)?;
    tb.reset().await?;
    for v in 1..=SLOTS as u8 + 1 {
        tb.write(v).await?;
    }
    // 17th write replaced the 1st in slot 0
    tb.expect_query(1, MatchVector::NONE).await?;
    tb.expect_query(SLOTS as u8 + 1, MatchVector::one_hot(0)).await?;
    tb.expect_query(2, MatchVector::one_hot(1)).await?;
    tb.expect_query(SLOTS as u8, MatchVector::one_hot(SLOTS - 1)).await?;
    tb.finish()
}

pub async fn test_collision(sim: Sim) -> TbResult {
    let mut tb = CamTb::new(&sim)?;
    tb.reset().await?;
    tb.run_plan(&stimulus::collision()).await?;
    tb.expect_query(0x55, MatchVector::from_slots([0, 2])).await?;
    // wrap around and rewrite slot 0 with the value it already holds
    for _ in 3..SLOTS {
        tb.write(0x11).await?;
    }
    tb.write(0x55).await?;
    tb.expect_query(0x55, MatchVector::from_slots([0, 2])).await?;
    tb.expect_query(0x11, MatchVector::from_slots(3..SLOTS)).await?;
    tb.finish()
}

/// Random fills from the configured range, each followed by a query of every
/// written value. Duplicated draws show up as collisions.
pub async fn test_random_fill(sim: Sim) -> TbResult {
    let mut tb = CamTb::new(&sim)?;
    sim.log(&format!("Using seed {}", tb.stim.seed()));
    tb.reset().await?;
    for _ in 0..sim.config().random_rounds {
        let values = tb.stim.random_fill();
        for v in &values {
            tb.write(*v).await?;
        }
        for v in &values {
            let observed = tb.query(*v).await?;
            let occurrences = tb.stim.shadow().occurrences(*v);
            if observed.count() as usize != occurrences {
                return Err(TbError::ModelDefect {
                    index: tb.oracle.action_index(),
                    action: tb.oracle.current_action(),
                    detail: format!(
                        "{} matches for {:#04x} but {} copies written",
                        observed.count(),
                        v,
                        occurrences
                    ),
                });
            }
        }
    }
    sim.log(&tb.oracle.summary());
    tb.finish()
}

/// Queries of values provably absent from the CAM must miss.
pub async fn test_guaranteed_miss(sim: Sim) -> TbResult {
    let mut tb = CamTb::new(&sim)?;
    sim.log(&format!("Using seed {}", tb.stim.seed()));
    tb.reset().await?;
    for _ in 0..sim.config().random_rounds {
        for v in tb.stim.random_fill() {
            tb.write(v).await?;
        }
        for _ in 0..sim.config().misses_per_round {
            let v = tb.stim.absent_value()?;
            tb.expect_query(v, MatchVector::NONE).await?;
        }
    }
    tb.finish()
}

/// Suite with every built-in scenario.
pub fn cam_suite(config: TbConfig) -> TestSuite {
    crate::scenarios!(
        TestSuite::new("cam", config),
        test_reset,
        test_write,
        test_fill,
        test_wraparound,
        test_collision,
        test_random_fill,
        test_guaranteed_miss,
    )
}

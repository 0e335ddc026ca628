//! Drives the CAM's clocked protocol against the DUT and the model in lockstep.
//!
//! Every action starts right after a falling edge and takes one clock cycle:
//! inputs are driven there, the DUT commits on the following rising edge (the
//! model is updated at that same edge) and outputs are sampled in the
//! read-only phase after the next falling edge. Inputs can't be driven in the
//! read-only phase, so an action following a sample waits one time step first.

use crate::model::{Action, CamModel, MatchVector, RESET_MATCH};
use crate::oracle::Oracle;
use crate::prelude::*;
use crate::stimulus::StimulusGen;

pub struct CamTb {
    sim: Sim,
    clk: SimObject,
    rst_n: SimObject,
    we: SimObject,
    content: SimObject,
    found_addr: SimObject,
    oe: SimObject,
    pub model: CamModel,
    pub oracle: Oracle,
    pub stim: StimulusGen,
    clock: JoinHandle,
}

impl CamTb {
    /// Binds the DUT pins and starts the clock.
    pub fn new(sim: &Sim) -> TbResult<Self> {
        let config = sim.config();
        config.validate()?;
        let clk = sim.signal("clk")?;
        let clock = sim.spawn(
            utils::clock(clk.clone(), config.clock_period, config.clock_unit.clone()),
            "clock",
        );
        Ok(Self {
            sim: sim.clone(),
            rst_n: sim.signal("rst_n")?,
            we: sim.signal("we")?,
            content: sim.signal("content")?,
            found_addr: sim.signal("found_addr")?,
            oe: sim.signal("oe")?,
            model: CamModel::new(),
            oracle: Oracle::new(),
            stim: StimulusGen::new(
                sim.seed(),
                config.value_range.clone(),
                config.miss_retry_limit,
            )?,
            clk,
            clock,
        })
    }

    pub fn sim(&self) -> &Sim {
        &self.sim
    }

    fn sample_match(&self) -> MatchVector {
        MatchVector::from_bits(self.found_addr.u32() as u16)
    }

    async fn leave_read_only(&self) {
        if self.sim.in_read_only() {
            Trigger::timer_steps(&self.sim, 1).await;
        }
    }

    /// Reset sequence: all inputs low with reset asserted for the configured
    /// number of cycles, then release and wait before the first action.
    pub async fn reset(&mut self) -> TbResult<()> {
        self.oracle.begin(Action::Reset)?;
        self.leave_read_only().await;
        self.we.set(0)?;
        self.content.set(0)?;
        self.rst_n.set(0)?;
        self.model.assert_reset();
        self.stim.record(Action::Reset);

        for _ in 0..self.sim.config().reset_cycles {
            self.clk.rising_edge_ro().await;
            // forced all-ones while reset is held, see RESET_MATCH
            let expected = self.oracle.predict(&self.model, self.stim.shadow(), 0)?;
            self.oracle.compare_match(expected, self.sample_match())?;
        }

        self.leave_read_only().await;
        self.rst_n.set(1)?;
        self.model.release_reset();
        utils::clock_cycles(&self.clk, self.sim.config().post_reset_cycles).await;
        self.clk.falling_edge_ro().await;

        self.oracle.check_model(&self.model, self.stim.shadow())?;
        // content is 0 and so is every slot: the live match is all-ones too
        let expected = self.oracle.predict(&self.model, self.stim.shadow(), 0)?;
        self.oracle.check_literal(expected, RESET_MATCH)?;
        self.oracle.compare_match(expected, self.sample_match())?;
        self.oracle.compare_output_enable(self.oe.u32() as u8)?;
        self.sim.log("Reset done");
        Ok(())
    }

    /// One-cycle write pulse. Leaves write-enable deasserted.
    pub async fn write(&mut self, value: u8) -> TbResult<()> {
        self.oracle.begin(Action::Write(value))?;
        self.leave_read_only().await;
        self.we.set(1)?;
        self.content.set(value as u32)?;

        self.clk.rising_edge().await;
        // commit instant
        self.model.write(value);
        self.stim.record(Action::Write(value));
        self.oracle.check_model(&self.model, self.stim.shadow())?;

        self.clk.falling_edge().await;
        self.we.set(0)?;
        Ok(())
    }

    /// Presents `value` for one cycle and checks the sampled match vector
    /// and output enable.
    pub async fn query(&mut self, value: u8) -> TbResult<MatchVector> {
        self.checked_query(value, None).await
    }

    /// Like [`CamTb::query`], but the model's prediction must also equal `literal`.
    pub async fn expect_query(
        &mut self,
        value: u8,
        literal: MatchVector,
    ) -> TbResult<MatchVector> {
        self.checked_query(value, Some(literal)).await
    }

    async fn checked_query(
        &mut self,
        value: u8,
        literal: Option<MatchVector>,
    ) -> TbResult<MatchVector> {
        self.oracle.begin(Action::Query(value))?;
        if let Some(literal) = literal {
            self.oracle.check_literal(self.model.expected_match(value), literal)?;
        }
        self.leave_read_only().await;
        self.we.set(0)?;
        self.content.set(value as u32)?;

        self.clk.rising_edge().await;
        let expected = self.oracle.predict(&self.model, self.stim.shadow(), value)?;

        self.clk.falling_edge_ro().await;
        let observed = self.sample_match();
        self.oracle.compare_match(expected, observed)?;
        self.oracle.compare_output_enable(self.oe.u32() as u8)?;
        Ok(observed)
    }

    pub async fn apply(&mut self, action: Action) -> TbResult<()> {
        match action {
            Action::Reset => self.reset().await,
            Action::Write(v) => self.write(v).await,
            Action::Query(v) => self.query(v).await.map(|_| ()),
        }
    }

    pub async fn run_plan(&mut self, plan: &[Action]) -> TbResult<()> {
        for action in plan {
            self.apply(*action).await?;
        }
        Ok(())
    }

    /// Pass message with the oracle's counters.
    pub fn finish(mut self) -> TbResult {
        self.clock.cancel();
        Ok(Val::String(self.oracle.summary()))
    }
}

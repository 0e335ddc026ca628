//! Comparator between DUT observations and the reference model.

use crate::model::{Action, CamModel, MatchVector, OE_DRIVEN};
use crate::stimulus::ShadowMemory;
use crate::{TbError, TbResult};

/// Run-scoped counters. Reporting only, never part of pass/fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OracleStats {
    pub actions: u64,
    pub resets: u64,
    pub writes: u64,
    pub queries: u64,
    pub hits: u64,
    pub misses: u64,
    pub collisions: u64,
    pub max_matches: u32,
    pub checks: u64,
}

/// Fail-fast checker. After the first divergence every further check is refused.
#[derive(Debug, Default)]
pub struct Oracle {
    index: u64,
    action: Option<Action>,
    diverged: bool,
    stats: OracleStats,
}

impl Oracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new action; later checks are attributed to it.
    pub fn begin(&mut self, action: Action) -> TbResult<u64> {
        if self.diverged {
            return Err(TbError::AlreadyDiverged(self.index + 1));
        }
        self.index += 1;
        self.action = Some(action);
        self.stats.actions += 1;
        match action {
            Action::Reset => self.stats.resets += 1,
            Action::Write(_) => self.stats.writes += 1,
            Action::Query(_) => self.stats.queries += 1,
        }
        Ok(self.index)
    }

    /// Index of the current action, starting at 1.
    pub fn action_index(&self) -> u64 {
        self.index
    }

    pub fn current_action(&self) -> Action {
        self.action.unwrap_or(Action::Reset)
    }

    pub fn stats(&self) -> OracleStats {
        self.stats
    }

    pub fn has_diverged(&self) -> bool {
        self.diverged
    }

    fn guard(&self) -> TbResult<()> {
        match self.diverged {
            true => Err(TbError::AlreadyDiverged(self.index)),
            false => Ok(()),
        }
    }

    fn model_defect(&self, detail: String) -> TbError {
        TbError::ModelDefect {
            index: self.index,
            action: self.current_action(),
            detail,
        }
    }

    fn diverge(&mut self, signal: &'static str, expected: String, observed: String) -> TbError {
        self.diverged = true;
        TbError::Divergence {
            index: self.index,
            action: self.current_action(),
            signal,
            expected,
            observed,
        }
    }

    /// Model against shadow memory: order, pointer and pointer invariant.
    pub fn check_model(&self, model: &CamModel, shadow: &ShadowMemory) -> TbResult<()> {
        self.guard()?;
        model.check_invariants().map_err(|d| self.model_defect(d))?;
        if model.write_pointer() != shadow.write_pointer() {
            return Err(self.model_defect(format!(
                "write pointer {} but shadow memory at {}",
                model.write_pointer(),
                shadow.write_pointer()
            )));
        }
        if model.slots() != shadow.slots() {
            return Err(self.model_defect(format!(
                "slots {:02x?} but shadow memory holds {:02x?}",
                model.slots(),
                shadow.slots()
            )));
        }
        Ok(())
    }

    /// Prediction for a query of `value`, cross-checked against shadow memory.
    pub fn predict(
        &self,
        model: &CamModel,
        shadow: &ShadowMemory,
        value: u8,
    ) -> TbResult<MatchVector> {
        self.guard()?;
        let expected = model.expected_match(value);
        if !model.is_in_reset() {
            let scanned = shadow.expected(value);
            if scanned != expected {
                return Err(self.model_defect(format!(
                    "model predicts {} for {:#04x}, shadow memory scan gives {}",
                    expected, value, scanned
                )));
            }
        }
        Ok(expected)
    }

    /// A scenario's literal expectation must agree with the model before the
    /// DUT is consulted.
    pub fn check_literal(&self, predicted: MatchVector, literal: MatchVector) -> TbResult<()> {
        self.guard()?;
        if predicted != literal {
            return Err(self.model_defect(format!(
                "model predicts {} where the scenario expects {}",
                predicted, literal
            )));
        }
        Ok(())
    }

    pub fn compare_match(&mut self, expected: MatchVector, observed: MatchVector) -> TbResult<()> {
        self.guard()?;
        self.stats.checks += 1;
        if expected != observed {
            return Err(self.diverge(
                "found_addr",
                format!("{} ({:#06x})", expected, expected.bits()),
                format!("{} ({:#06x})", observed, observed.bits()),
            ));
        }
        if matches!(self.action, Some(Action::Query(_))) {
            match observed.count() {
                0 => self.stats.misses += 1,
                n => {
                    self.stats.hits += 1;
                    if n > 1 {
                        self.stats.collisions += 1;
                    }
                    self.stats.max_matches = self.stats.max_matches.max(n);
                }
            }
        }
        Ok(())
    }

    pub fn compare_output_enable(&mut self, observed: u8) -> TbResult<()> {
        self.guard()?;
        self.stats.checks += 1;
        if observed != OE_DRIVEN {
            return Err(self.diverge(
                "oe",
                format!("{:#04x}", OE_DRIVEN),
                format!("{:#04x}", observed),
            ));
        }
        Ok(())
    }

    pub fn summary(&self) -> String {
        let s = &self.stats;
        format!(
            "actions={}, resets={}, writes={}, queries={}, hits={}, misses={}, \
             collisions={}, max_matches={}, checks={}",
            s.actions,
            s.resets,
            s.writes,
            s.queries,
            s.hits,
            s.misses,
            s.collisions,
            s.max_matches,
            s.checks
        )
    }
}

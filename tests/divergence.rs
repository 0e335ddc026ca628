use std::sync::Arc;

use camtb::dut::{CamInputs, CamOutputs};
use camtb::model::{Action, MatchVector};
use camtb::prelude::*;
use camtb::scenarios;
use camtb::sequencer::CamTb;
use camtb::test::ScenarioFn;
use camtb::ErrorKind;
use pretty_assertions::assert_eq;

#[derive(Clone, Copy, Debug)]
enum Fault {
    /// write pointer wraps after 15 slots
    WrapAt15,
    /// reports "no match" instead of the all-ones sentinel during reset
    ZeroSentinel,
    /// output-enable never driven
    OeUndriven,
    /// output-enable released once the first write has landed
    OeDropsAfterWrite,
    /// match bits stuck at 1 once out of reset
    StuckHigh(u16),
}

struct FaultyCam {
    fault: Fault,
    mem: [u8; 16],
    wp: usize,
    found: u16,
    rst_n: bool,
    written: bool,
}

impl FaultyCam {
    fn new(fault: Fault) -> Self {
        Self {
            fault,
            mem: [0; 16],
            wp: 0,
            found: 0xffff,
            rst_n: false,
            written: false,
        }
    }
}

impl Dut for FaultyCam {
    fn eval(&mut self, inputs: &CamInputs) {
        self.rst_n = inputs.rst_n;
        if !inputs.rst_n {
            self.mem = [0; 16];
            self.wp = 0;
            self.written = false;
            self.found = match self.fault {
                Fault::ZeroSentinel => 0,
                _ => 0xffff,
            };
        }
    }

    fn rising_edge(&mut self, inputs: &CamInputs) {
        if !inputs.rst_n {
            return;
        }
        self.found = (0..16)
            .filter(|i| self.mem[*i] == inputs.content)
            .fold(0, |acc, i| acc | 1 << i);
        if inputs.we {
            self.mem[self.wp] = inputs.content;
            let depth = match self.fault {
                Fault::WrapAt15 => 15,
                _ => 16,
            };
            self.wp = (self.wp + 1) % depth;
            self.written = true;
        }
    }

    fn outputs(&self) -> CamOutputs {
        let found_addr = match (self.fault, self.rst_n) {
            (Fault::StuckHigh(mask), true) => self.found | mask,
            _ => self.found,
        };
        let oe = match (self.fault, self.rst_n) {
            (Fault::OeUndriven, _) | (_, false) => 0x00,
            (Fault::OeDropsAfterWrite, _) if self.written => 0x00,
            _ => 0xff,
        };
        CamOutputs { found_addr, oe }
    }
}

fn run_on(fault: Fault, scenario: ScenarioFn) -> TbResult {
    let sim = Sim::new(
        Box::new(FaultyCam::new(fault)),
        Arc::new(TbConfig::default()),
        0x5eed,
    );
    sim.run(scenario(sim.clone()))
}

#[test]
fn wrong_wrap_diverges_on_first_wrapped_query() {
    let result = run_on(Fault::WrapAt15, |sim| scenarios::test_wraparound(sim).boxed());
    // reset, 17 writes, query 1, then query 17 sees slot 1 instead of slot 0
    assert_eq!(
        result,
        Err(TbError::Divergence {
            index: 20,
            action: Action::Query(17),
            signal: "found_addr",
            expected: "0000000000000001 (0x0001)".into(),
            observed: "0000000000000010 (0x0002)".into(),
        })
    );
}

#[test]
fn zero_sentinel_is_caught_during_reset() {
    let err = run_on(Fault::ZeroSentinel, |sim| scenarios::test_reset(sim).boxed()).unwrap_err();
    assert_eq!(
        err,
        TbError::Divergence {
            index: 1,
            action: Action::Reset,
            signal: "found_addr",
            expected: "1111111111111111 (0xffff)".into(),
            observed: "0000000000000000 (0x0000)".into(),
        }
    );
    assert!(err.is_dut_failure());
}

#[test]
fn undriven_output_enable_is_caught_after_release() {
    let err = run_on(Fault::OeUndriven, |sim| scenarios::test_reset(sim).boxed()).unwrap_err();
    assert!(matches!(
        err,
        TbError::Divergence {
            index: 1,
            signal: "oe",
            ..
        }
    ));
}

#[test]
fn output_enable_is_checked_on_every_query() {
    let err = run_on(Fault::OeDropsAfterWrite, |sim| {
        scenarios::test_write(sim).boxed()
    })
    .unwrap_err();
    // found_addr still matches, oe went low after the first write
    assert_eq!(
        err,
        TbError::Divergence {
            index: 6,
            action: Action::Query(0x0b),
            signal: "oe",
            expected: "0xff".into(),
            observed: "0x00".into(),
        }
    );
}

#[test]
fn stuck_bit_breaks_the_first_miss() {
    let err = run_on(Fault::StuckHigh(1 << 5), |sim| {
        scenarios::test_write(sim).boxed()
    })
    .unwrap_err();
    // reset, four writes, then the query of 0x0b
    assert_eq!(
        err,
        TbError::Divergence {
            index: 6,
            action: Action::Query(0x0b),
            signal: "found_addr",
            expected: "0000000000000000 (0x0000)".into(),
            observed: "0000000000100000 (0x0020)".into(),
        }
    );
}

#[test]
fn suite_reports_each_scenario_separately() {
    let mut suite = scenarios::cam_suite(TbConfig::default().with_seed(9));
    let passed = suite.run(|| Box::new(FaultyCam::new(Fault::WrapAt15)));
    assert!(!passed);
    // the random scenarios depend on the drawn values, the directed ones don't
    let results: Vec<(&str, bool)> = suite
        .tests()
        .iter()
        .take(5)
        .map(|t| (t.name.as_str(), t.passed()))
        .collect();
    assert_eq!(
        results,
        vec![
            ("test_reset", true),
            ("test_write", true),
            ("test_fill", false),
            ("test_wraparound", false),
            ("test_collision", false),
        ]
    );
    assert!(suite.tests().iter().all(|t| t.result.is_some()));
}

async fn wrong_literal(sim: Sim) -> TbResult {
    let mut tb = CamTb::new(&sim)?;
    tb.reset().await?;
    tb.write(0x42).await?;
    // slot 0 holds 0x42, not slot 1
    tb.expect_query(0x42, MatchVector::one_hot(1)).await?;
    tb.finish()
}

#[test]
fn wrong_expectation_is_a_model_defect_not_a_dut_failure() {
    let sim = Sim::new(Box::new(BehavioralCam::new()), Arc::new(TbConfig::default()), 1);
    let err = sim.run(wrong_literal(sim.clone())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ModelDefect);
    // attributed to the query, not to the write before it
    assert!(matches!(
        err,
        TbError::ModelDefect {
            index: 3,
            action: Action::Query(0x42),
            ..
        }
    ));
    assert!(!err.is_dut_failure());
}

#[test]
fn exhausted_range_is_a_setup_failure() {
    let config = TbConfig {
        value_range: 0..=0,
        ..TbConfig::default()
    };
    let sim = Sim::new(Box::new(BehavioralCam::new()), Arc::new(config), 1);
    let err = sim.run(scenarios::test_guaranteed_miss(sim.clone())).unwrap_err();
    assert!(matches!(err, TbError::Exhaustion { lo: 0, hi: 0, .. }));
    assert_eq!(err.kind(), ErrorKind::Setup);
}

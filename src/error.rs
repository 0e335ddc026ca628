use thiserror::Error;

use crate::model::Action;

/// Coarse classification of a [`TbError`], used for reporting and to tell DUT
/// bugs apart from testbench bugs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The reference model or shadow state is inconsistent: the oracle is wrong.
    ModelDefect,
    /// The DUT disagrees with the reference model.
    Divergence,
    /// The scenario could not be set up (stimulus exhaustion, bad configuration).
    Setup,
    /// The simulation kernel or a testbench task misbehaved.
    Simulation,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TbError {
    #[error("model defect at action {index} ({action}): {detail}")]
    ModelDefect {
        index: u64,
        action: Action,
        detail: String,
    },

    #[error("DUT divergence at action {index} ({action}) on `{signal}`: expected {expected}, observed {observed}")]
    Divergence {
        index: u64,
        action: Action,
        signal: &'static str,
        expected: String,
        observed: String,
    },

    #[error("stimulus exhausted: no value in {lo:#04x}..={hi:#04x} absent from the CAM after {retries} draws ({occupied} distinct values held)")]
    Exhaustion {
        lo: u8,
        hi: u8,
        occupied: usize,
        retries: u32,
    },

    #[error("oracle already diverged, refusing to check action {0}")]
    AlreadyDiverged(u64),

    #[error("signal `{0}` not found")]
    UnknownSignal(String),

    #[error("signal `{0}` is an output and can't be driven")]
    ReadOnlySignal(&'static str),

    #[error("value {value:#x} does not fit into {width}-bit signal `{name}`")]
    ValueOutOfRange {
        name: &'static str,
        value: u32,
        width: u32,
    },

    #[error("signal `{0}` driven during the read-only phase")]
    WriteInReadOnly(&'static str),

    #[error("unknown time unit `{0}`")]
    InvalidTimeUnit(String),

    #[error("can't convert time {time} {unit} to sim steps without rounding")]
    TimeRounding { time: f64, unit: String },

    #[error("simulation stalled at {0} steps while the scenario was still pending")]
    Stalled(u64),

    #[error("scenario exceeded the simulation time limit of {0} ns")]
    Timeout(u64),

    #[error("task `{0}` was cancelled before completing")]
    Cancelled(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to write report: {0}")]
    Report(String),
}

impl TbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TbError::ModelDefect { .. } => ErrorKind::ModelDefect,
            TbError::Divergence { .. } | TbError::AlreadyDiverged(_) => ErrorKind::Divergence,
            TbError::Exhaustion { .. } | TbError::Config(_) => ErrorKind::Setup,
            _ => ErrorKind::Simulation,
        }
    }

    /// True if the failure points at the DUT rather than at the testbench.
    pub fn is_dut_failure(&self) -> bool {
        self.kind() == ErrorKind::Divergence
    }
}

impl From<std::io::Error> for TbError {
    fn from(e: std::io::Error) -> Self {
        TbError::Report(e.to_string())
    }
}

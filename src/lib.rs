//! Verification of a 16-entry content-addressable memory.
//!
//! A [`model::CamModel`] predicts the match vector for any sequence of writes
//! and queries; [`sequencer::CamTb`] drives the DUT's clocked protocol in
//! lockstep with it and the [`oracle::Oracle`] fails on the first divergence.
//! DUTs plug in through [`dut::Dut`] and run on a per-scenario [`sim::Sim`].
//!
//! ```no_run
//! use camtb::prelude::*;
//! use camtb::scenarios::cam_suite;
//!
//! let mut suite = cam_suite(TbConfig::from_env().unwrap());
//! assert!(suite.run(|| Box::new(BehavioralCam::new())));
//! ```

pub mod config;
pub mod dut;
mod error;
mod executor;
mod junit;
pub mod model;
pub mod oracle;
pub mod prelude;
pub mod report;
mod seamap;
pub mod scenarios;
pub mod sequencer;
mod signal;
pub mod sim;
pub mod stimulus;
mod tb_obj;
mod trigger;
pub mod utils;
mod value;

pub use error::{ErrorKind, TbError};
pub use executor::JoinHandle;
pub use junit::write_junit_xml;
pub use signal::SimObject;
pub use trigger::{TrigKind, Trigger};
pub use value::Val;

pub type TbResult<T = Val> = Result<T, TbError>;

pub use crate::config::TbConfig;
pub use crate::dut::{BehavioralCam, Dut};
pub use crate::executor::JoinHandle;
pub use crate::signal::SimObject;
pub use crate::sim::{sim_steps, Sim};
pub use crate::trigger::Trigger;
pub use crate::utils;
pub use crate::value::Val;
pub use crate::{TbError, TbResult};
pub use futures::future::FutureExt;

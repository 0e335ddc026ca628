//! In-process simulation kernel hosting one [`Dut`] per scenario.
//!
//! Time advances in steps of [`PRECISION`]. Each time step runs in phases:
//! tasks woken by a timer or edge run until they all wait again, then the
//! read-only phase wakes samplers, then time advances to the next timer.

use intmap::IntMap;
use num_format::{Locale, ToFormattedString};
use once_cell::sync::Lazy;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::Waker;

use crate::config::TbConfig;
use crate::dut::{CamInputs, Dut, Pin};
use crate::executor::{Executor, JoinHandle};
use crate::seamap::SeaMap;
use crate::signal::SimObject;
use crate::tb_obj::TbObj;
use crate::{TbError, TbResult};

/// Kernel time resolution as a power of ten seconds (ps).
pub const PRECISION: i8 = -12;

// short and hierarchical names ("clk", "cam.clk")
static PIN_NAMES: Lazy<SeaMap<String, Pin>> = Lazy::new(|| {
    let mut map = SeaMap::new();
    for pin in Pin::ALL {
        map.insert(pin.name().to_string(), pin);
        map.insert(format!("cam.{}", pin.name()), pin);
    }
    map
});

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum EdgeKind {
    Any,
    Rising,
    Falling,
}

/// A registered trigger: the waker of the awaiting task and the flag its
/// future checks, so that stale wake-ups don't complete it.
pub(crate) struct Waiter {
    waker: Waker,
    fired: Arc<AtomicBool>,
}

impl Waiter {
    pub fn new(waker: Waker, fired: Arc<AtomicBool>) -> Self {
        Self { waker, fired }
    }

    fn fire(self) {
        self.fired.store(true, Ordering::Release);
        self.waker.wake();
    }
}

pub(crate) struct Kernel {
    dut: Box<dyn Dut>,
    inputs: CamInputs,
    time: u64,
    edges: Vec<(Pin, EdgeKind, Waiter)>,
    timers: IntMap<Vec<Waiter>>,
    read_only: Vec<Waiter>,
    in_read_only: bool,
}

impl Kernel {
    fn new(mut dut: Box<dyn Dut>) -> Self {
        let inputs = CamInputs::default();
        dut.eval(&inputs);
        Self {
            dut,
            inputs,
            time: 0,
            edges: Vec::new(),
            timers: IntMap::new(),
            read_only: Vec::new(),
            in_read_only: false,
        }
    }

    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn get_value(&self, pin: Pin) -> u32 {
        let outputs = self.dut.outputs();
        match pin {
            Pin::Clk => self.inputs.clk as u32,
            Pin::RstN => self.inputs.rst_n as u32,
            Pin::We => self.inputs.we as u32,
            Pin::Content => self.inputs.content as u32,
            Pin::FoundAddr => outputs.found_addr as u32,
            Pin::Oe => outputs.oe as u32,
        }
    }

    pub fn set_value(&mut self, pin: Pin, value: u32) -> TbResult<()> {
        if !pin.is_input() {
            return Err(TbError::ReadOnlySignal(pin.name()));
        }
        if self.in_read_only {
            return Err(TbError::WriteInReadOnly(pin.name()));
        }
        if value >> pin.width() != 0 {
            return Err(TbError::ValueOutOfRange {
                name: pin.name(),
                value,
                width: pin.width(),
            });
        }
        let old = self.get_value(pin);
        match pin {
            Pin::Clk => self.inputs.clk = value != 0,
            Pin::RstN => self.inputs.rst_n = value != 0,
            Pin::We => self.inputs.we = value != 0,
            Pin::Content => self.inputs.content = value as u8,
            Pin::FoundAddr | Pin::Oe => unreachable!("outputs rejected above"),
        }
        self.dut.eval(&self.inputs);
        if old != value {
            let edge = if value > old {
                EdgeKind::Rising
            } else {
                EdgeKind::Falling
            };
            if pin == Pin::Clk && edge == EdgeKind::Rising {
                self.dut.rising_edge(&self.inputs);
            }
            self.fire_edge(pin, edge);
        }
        Ok(())
    }

    fn fire_edge(&mut self, pin: Pin, edge: EdgeKind) {
        let (hit, keep): (Vec<_>, Vec<_>) = self
            .edges
            .drain(..)
            .partition(|(p, kind, _)| *p == pin && (*kind == EdgeKind::Any || *kind == edge));
        self.edges = keep;
        for (_, _, waiter) in hit {
            waiter.fire();
        }
    }

    pub fn add_edge(&mut self, pin: Pin, kind: EdgeKind, waiter: Waiter) {
        self.edges.push((pin, kind, waiter));
    }

    pub fn add_timer(&mut self, steps: u64, waiter: Waiter) {
        // timers are keyed by absolute time
        let abs_time = self.time + steps;
        if let Some(waiters) = self.timers.get_mut(abs_time) {
            waiters.push(waiter);
        } else {
            self.timers.insert(abs_time, vec![waiter]);
        }
    }

    pub fn add_read_only(&mut self, waiter: Waiter) {
        self.read_only.push(waiter);
    }

    fn fire_read_only(&mut self) -> bool {
        if self.read_only.is_empty() {
            return false;
        }
        // lasts until time advances
        self.in_read_only = true;
        for waiter in std::mem::take(&mut self.read_only) {
            waiter.fire();
        }
        true
    }

    /// Moves time to the earliest pending timer. False if there is none.
    fn advance(&mut self) -> bool {
        let Some(next) = self.timers.keys().copied().min() else {
            return false;
        };
        self.time = next;
        self.in_read_only = false;
        if let Some(waiters) = self.timers.remove(next) {
            for waiter in waiters {
                waiter.fire();
            }
        }
        true
    }

    fn clear_triggers(&mut self) {
        self.edges.clear();
        self.timers.clear();
        self.read_only.clear();
    }
}

/// Handle to one scenario's simulation: kernel, executor and configuration.
/// Cloning is cheap; all clones drive the same kernel.
#[derive(Clone)]
pub struct Sim {
    kernel: TbObj<Kernel>,
    exec: Executor,
    config: Arc<TbConfig>,
    seed: u64,
    dut_name: Arc<str>,
}

impl Sim {
    pub fn new(dut: Box<dyn Dut>, config: Arc<TbConfig>, seed: u64) -> Self {
        let dut_name: Arc<str> = Arc::from(dut.name());
        Self {
            kernel: TbObj::new(Kernel::new(dut)),
            exec: Executor::new(),
            config,
            seed,
            dut_name,
        }
    }

    pub fn config(&self) -> &TbConfig {
        &self.config
    }

    /// Scenario-local seed for stimulus generation.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn dut_name(&self) -> &str {
        &self.dut_name
    }

    pub(crate) fn kernel(&self) -> &TbObj<Kernel> {
        &self.kernel
    }

    /// Looks up a DUT signal by name, e.g. `found_addr` or `cam.found_addr`.
    pub fn signal(&self, name: &str) -> TbResult<SimObject> {
        match PIN_NAMES.get(name) {
            Some(pin) => Ok(SimObject::new(self.clone(), *pin)),
            None => Err(TbError::UnknownSignal(name.to_string())),
        }
    }

    /// Runs `future` concurrently with the calling task.
    pub fn fork(&self, future: impl Future<Output = TbResult> + Send + 'static) -> JoinHandle {
        self.exec.spawn(future, "forked")
    }

    pub fn spawn(
        &self,
        future: impl Future<Output = TbResult> + Send + 'static,
        name: &str,
    ) -> JoinHandle {
        self.exec.spawn(future, name)
    }

    /// True between the read-only phase of a time step and the next advance
    /// of time. Signals can't be driven then.
    pub fn in_read_only(&self) -> bool {
        self.kernel.get().in_read_only
    }

    pub fn sim_time_steps(&self) -> u64 {
        self.kernel.get().time()
    }

    pub fn sim_time(&self, unit: &str) -> TbResult<f64> {
        let t = self.sim_time_steps() as f64;
        Ok(ldexp10(t, PRECISION - time_scale(unit)?))
    }

    pub fn log(&self, msg: &str) {
        let t = self.sim_time_steps() as f64 / 1000.0;
        let int = t.floor() as u64;
        let mut frac_str = format!("{:.3}", t % 1.0);
        frac_str.remove(0);
        println!(
            "{}{}ns {}",
            int.to_formatted_string(&Locale::en),
            frac_str,
            msg
        );
    }

    /// Drives the scenario `main` to completion, then tears the simulation
    /// down. Forked tasks still pending at that point are dropped.
    pub fn run(&self, main: impl Future<Output = TbResult> + Send + 'static) -> TbResult {
        let limit = sim_steps(self.config.max_sim_time_ns as f64, "ns")?;
        let mut handle = self.exec.spawn(main, "main");
        let result = loop {
            self.exec.run_until_stalled();
            if let Some(result) = handle.try_result() {
                break result;
            }
            let (progressed, now) = self
                .kernel
                .with_mut(|k| (k.fire_read_only() || k.advance(), k.time()));
            if !progressed {
                break Err(TbError::Stalled(now));
            }
            if now > limit {
                break Err(TbError::Timeout(self.config.max_sim_time_ns));
            }
        };
        handle.cancel();
        self.teardown();
        result
    }

    fn teardown(&self) {
        // waiters hold wakers, which hold tasks, which hold clones of this Sim
        self.kernel.with_mut(|k| k.clear_triggers());
        self.exec.clear();
    }
}

pub(crate) fn time_scale(unit: &str) -> TbResult<i8> {
    match unit {
        "fs" => Ok(-15),
        "ps" => Ok(-12),
        "ns" => Ok(-9),
        "us" => Ok(-6),
        "ms" => Ok(-3),
        "sec" => Ok(0),
        _ => Err(TbError::InvalidTimeUnit(unit.to_string())),
    }
}

/// Converts `time` in `unit` to kernel steps. Fails if that needs rounding.
pub fn sim_steps(time: f64, unit: &str) -> TbResult<u64> {
    let steps = ldexp10(time, time_scale(unit)? - PRECISION);
    if steps % 1.0 == 0.0 && steps >= 0.0 {
        Ok(steps as u64)
    } else {
        Err(TbError::TimeRounding {
            time,
            unit: unit.to_string(),
        })
    }
}

fn ldexp10(frac: f64, exp: i8) -> f64 {
    // math.ldexp, base 10
    if exp >= 0 {
        frac * 10_u64.pow(exp as u32) as f64
    } else {
        let div = 10_u64.pow(-exp as u32) as f64;
        frac / div
    }
}

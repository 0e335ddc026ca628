use std::future::Future;
use std::pin::Pin as StdPin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::dut::Pin;
use crate::signal::SimObject;
use crate::sim::{sim_steps, EdgeKind, Sim, Waiter};
use crate::TbResult;

#[derive(Clone, Copy, Debug)]
pub enum TrigKind {
    Edge(Pin, EdgeKind),
    Timer(u64),
    ReadOnly,
}

/// Future that completes when the kernel reaches the awaited event.
///
/// The trigger registers itself on first poll and completes only once the
/// kernel has fired it; spurious wake-ups leave it pending.
pub struct Trigger {
    sim: Sim,
    kind: TrigKind,
    fired: Option<Arc<AtomicBool>>,
}

impl Trigger {
    fn new(sim: &Sim, kind: TrigKind) -> Self {
        Trigger {
            sim: sim.clone(),
            kind,
            fired: None,
        }
    }

    pub fn timer(sim: &Sim, time: u64, unit: &str) -> TbResult<Self> {
        Ok(Trigger::timer_steps(sim, sim_steps(time as f64, unit)?))
    }
    pub fn timer_steps(sim: &Sim, steps: u64) -> Self {
        Trigger::new(sim, TrigKind::Timer(steps))
    }
    pub fn edge(signal: &SimObject) -> Self {
        Trigger::new(signal.sim(), TrigKind::Edge(signal.pin(), EdgeKind::Any))
    }
    pub fn rising_edge(signal: &SimObject) -> Self {
        Trigger::new(signal.sim(), TrigKind::Edge(signal.pin(), EdgeKind::Rising))
    }
    pub fn falling_edge(signal: &SimObject) -> Self {
        Trigger::new(signal.sim(), TrigKind::Edge(signal.pin(), EdgeKind::Falling))
    }
    /// Fires once every task of the current time step has settled.
    pub fn read_only(sim: &Sim) -> Self {
        Trigger::new(sim, TrigKind::ReadOnly)
    }
    pub fn kind(&self) -> TrigKind {
        self.kind
    }
}

impl Future for Trigger {
    type Output = ();

    fn poll(self: StdPin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let Some(fired) = &this.fired {
            return match fired.load(Ordering::Acquire) {
                true => Poll::Ready(()),
                false => Poll::Pending,
            };
        }

        let fired = Arc::new(AtomicBool::new(false));
        let waiter = Waiter::new(cx.waker().clone(), fired.clone());
        this.sim.kernel().with_mut(|k| match this.kind {
            TrigKind::Edge(pin, edge) => k.add_edge(pin, edge, waiter),
            TrigKind::Timer(steps) => k.add_timer(steps, waiter),
            TrigKind::ReadOnly => k.add_read_only(waiter),
        });
        this.fired = Some(fired);
        Poll::Pending
    }
}

use crate::dut::Pin;
use crate::sim::Sim;
use crate::trigger::Trigger;
use crate::TbResult;

/// Handle to one DUT signal within a scenario's simulation.
#[derive(Clone)]
pub struct SimObject {
    sim: Sim,
    pin: Pin,
}

impl SimObject {
    pub(crate) fn new(sim: Sim, pin: Pin) -> Self {
        Self { sim, pin }
    }

    pub fn pin(&self) -> Pin {
        self.pin
    }

    pub fn sim(&self) -> &Sim {
        &self.sim
    }

    pub fn name(&self) -> &'static str {
        self.pin.name()
    }

    pub fn full_name(&self) -> String {
        format!("{}.{}", self.sim.dut_name(), self.pin.name())
    }

    pub fn size(&self) -> u32 {
        self.pin.width()
    }

    pub fn is_modifiable(&self) -> bool {
        self.pin.is_input()
    }

    pub fn u32(&self) -> u32 {
        self.sim.kernel().get().get_value(self.pin)
    }

    /// Value as an MSB-first binary string of the signal's width.
    pub fn bin(&self) -> String {
        format!("{:0width$b}", self.u32(), width = self.size() as usize)
    }

    pub fn set(&self, val: u32) -> TbResult<()> {
        self.sim.kernel().with_mut(|k| k.set_value(self.pin, val))
    }

    pub fn set_bool(&self, val: bool) -> TbResult<()> {
        self.set(val as u32)
    }

    // convenience functions to get edge triggers for this signal
    pub fn rising_edge(&self) -> Trigger {
        Trigger::rising_edge(self)
    }
    pub fn falling_edge(&self) -> Trigger {
        Trigger::falling_edge(self)
    }
    pub fn edge(&self) -> Trigger {
        Trigger::edge(self)
    }
    pub async fn rising_edge_ro(&self) {
        self.rising_edge().await;
        Trigger::read_only(&self.sim).await;
    }
    pub async fn falling_edge_ro(&self) {
        self.falling_edge().await;
        Trigger::read_only(&self.sim).await;
    }
}

impl std::fmt::Debug for SimObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimObject")
            .field("name", &self.full_name())
            .field("width", &self.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::TbConfig;
    use crate::dut::BehavioralCam;
    use crate::sim::Sim;
    use std::sync::Arc;

    #[test]
    fn bin_is_width_padded() {
        let sim = Sim::new(Box::new(BehavioralCam::new()), Arc::new(TbConfig::default()), 0);
        let content = sim.signal("content").unwrap();
        content.set(0x0a).unwrap();
        assert_eq!(content.bin(), "00001010");
        // held in reset at power-up
        assert_eq!(sim.signal("found_addr").unwrap().bin(), "1111111111111111");
        assert_eq!(content.full_name(), "cam.content");
    }
}

use crate::prelude::*;

pub async fn clock_cycles(clk: &SimObject, n_cycles: u32) {
    for _ in 0..n_cycles {
        clk.rising_edge().await;
    }
}

/// Free-running clock on `clk`. Never returns unless driving `clk` fails.
pub async fn clock(clk: SimObject, period: u64, unit: String) -> TbResult {
    let sim = clk.sim().clone();
    let steps = sim_steps(period as f64, &unit)?;
    let high_t = steps / 2;
    let low_t = steps - high_t;
    if steps % 2 != 0 {
        sim.log(&format!(
            "Warning: Clock period {}{} not dividable by 2. High time will be {} steps; low time will be {} steps.",
            period, unit, high_t, low_t
        ));
    }
    loop {
        clk.set(0)?;
        Trigger::timer_steps(&sim, low_t).await;
        clk.set(1)?;
        Trigger::timer_steps(&sim, high_t).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dut::BehavioralCam;
    use std::sync::Arc;

    #[test]
    fn clock_edges_follow_period() {
        let sim = Sim::new(Box::new(BehavioralCam::new()), Arc::new(TbConfig::default()), 0);
        let clk = sim.signal("clk").unwrap();
        sim.fork(clock(clk.clone(), 10, "ns".into()));
        let probe = sim.clone();
        let result = sim.run(async move {
            clock_cycles(&clk, 3).await;
            let rise = probe.sim_time_steps();
            clk.falling_edge().await;
            Ok(Val::String(format!("{} {}", rise, probe.sim_time_steps())))
        });
        // third rising edge at 25 ns, falling edge 5 ns later
        assert_eq!(result, Ok(Val::String("25000 30000".into())));
    }
}

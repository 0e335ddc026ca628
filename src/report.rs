use num_format::{Locale, ToFormattedString};
use prettytable::{format, Cell, Row, Table};

use crate::test::Test;

/// Suite-level log line, outside of any simulation.
pub fn log(msg: &str) {
    println!("{}", msg);
}

pub fn summary_table(tests: &[Test]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(Row::new(
        ["Test", "Result", "Seed", "Time (s)", "SimTime (ns)", "SimSpeed (ns/s)", "Detail"]
            .iter()
            .map(|t| Cell::new(t))
            .collect(),
    ));
    for t in tests {
        let (result, detail) = match &t.result {
            Some(Ok(val)) => ("passed", val.to_string()),
            Some(Err(e)) => ("failed", e.to_string()),
            None => ("not run", String::new()),
        };
        let sim_speed = match t.time_secs > 0.0 {
            true => t.sim_time_ns / t.time_secs,
            false => 0.0,
        };
        table.add_row(Row::new(vec![
            Cell::new(&t.name),
            Cell::new(result),
            Cell::new(&t.seed.to_string()),
            Cell::new(&format!("{:.3}", t.time_secs)),
            Cell::new(&(t.sim_time_ns as u64).to_formatted_string(&Locale::en)),
            Cell::new(&format!("{:.3}", sim_speed)),
            Cell::new(&detail),
        ]));
    }
    table
}

pub(crate) fn log_summary(suite: &str, tests: &[Test]) {
    let passed = tests.iter().filter(|t| t.passed()).count();
    log(&format!("SUITE {}", suite));
    for line in summary_table(tests).to_string().lines() {
        log(line);
    }
    log(&format!("{} of {} tests passed", passed, tests.len()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TbError, Val};
    use futures::future::FutureExt;

    #[test]
    fn summary_renders_every_outcome() {
        let scenario: crate::test::ScenarioFn = |_| async { Ok::<_, TbError>(Val::None) }.boxed();
        let mut passed = Test::new("test_fill".into(), scenario);
        passed.set_result(Ok(Val::String("actions=33".into())));
        passed.time_secs = 0.5;
        passed.sim_time_ns = 12_345.0;
        let mut failed = Test::new("test_reset".into(), scenario);
        failed.set_result(Err(TbError::Stalled(7)));
        let skipped = Test::new("test_write".into(), scenario);

        let rendered = summary_table(&[passed, failed, skipped]).to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines.iter().any(|l| l.contains("test_fill") && l.contains("12,345")));
        assert!(lines.iter().any(|l| l.contains("test_reset") && l.contains("failed")));
        assert!(lines.iter().any(|l| l.contains("test_write") && l.contains("not run")));
        assert!(rendered.contains("SimSpeed (ns/s)"));
    }
}

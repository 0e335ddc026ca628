use junit_report::{Duration, ReportBuilder, TestCaseBuilder, TestSuiteBuilder};
use std::path::Path;

use crate::error::ErrorKind;
use crate::test::Test;
use crate::{TbError, TbResult};

/// DUT divergences become JUnit failures; testbench problems become errors.
pub fn write_junit_xml(suite: &str, tests: &[Test], path: &Path) -> TbResult<()> {
    let mut test_cases = Vec::new();

    for t in tests {
        let time = Duration::seconds_f64(t.time_secs);
        let tc = match &t.result {
            Some(Ok(_)) => TestCaseBuilder::success(&t.name, time),
            Some(Err(e)) if e.kind() == ErrorKind::Divergence => {
                TestCaseBuilder::failure(&t.name, time, "divergence", &e.to_string())
            }
            Some(Err(e)) => {
                TestCaseBuilder::error(&t.name, time, &format!("{:?}", e.kind()), &e.to_string())
            }
            None => TestCaseBuilder::skipped(&t.name),
        }
        .build();
        test_cases.push(tc);
    }

    let test_suite = TestSuiteBuilder::new(suite)
        .add_testcases(test_cases)
        .build();
    let report = ReportBuilder::new().add_testsuite(test_suite).build();
    let file = std::fs::File::create(path)?;
    report
        .write_xml(file)
        .map_err(|e| TbError::Report(format!("{:?}", e)))
}

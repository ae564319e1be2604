use crate::collectors::checks::ProbeError;
use crate::collectors::ResourceSnapshot;
use crate::config::ServiceSpec;

#[derive(Debug)]
pub struct CheckResult {
    pub spec: ServiceSpec,
    pub outcome: Result<(), ProbeError>,
    pub latency_ms: u64,
}

impl CheckResult {
    pub fn up(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Everything one run observed, in service-table order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub resources: ResourceSnapshot,
    pub checks: Vec<CheckResult>,
}

impl RunReport {
    pub fn all_up(&self) -> bool {
        self.checks.iter().all(CheckResult::up)
    }

    pub fn exit_status(&self) -> u8 {
        if self.all_up() {
            0
        } else {
            1
        }
    }

    pub fn down(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.up())
    }
}

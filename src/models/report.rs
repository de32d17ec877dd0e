use serde::Serialize;

/// Canonical step result values
pub mod step_result {
    pub const PASSED: &str = "passed";
    pub const FAILED: &str = "failed";
}

/// StepResult records the outcome of one named step of a device migration
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub name: String,
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StepResult {
    pub fn passed(&self) -> bool {
        self.result == step_result::PASSED
    }
}

/// DeviceReport summarises one device's migration
#[derive(Debug, Clone, Serialize)]
pub struct DeviceReport {
    pub alias: String,
    pub access_interfaces: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_vlan: Option<u32>,
    pub steps: Vec<StepResult>,
}

impl DeviceReport {
    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|s| !s.passed()).count()
    }
}

/// RunReport is written once at the end of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub timestamp: String,
    pub mode: super::MigrationMode,
    pub devices: Vec<DeviceReport>,
}

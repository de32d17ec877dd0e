use anyhow::Result;

use crate::models::{step_result, StepResult};

/// Records the outcome of each named step for one device
#[derive(Debug, Default)]
pub struct Steps {
    alias: String,
    results: Vec<StepResult>,
}

impl Steps {
    pub fn new(alias: &str) -> Self {
        Self {
            alias: alias.to_string(),
            results: Vec::new(),
        }
    }

    /// Record a step whose failure must abort the device
    pub fn required<T>(&mut self, name: &str, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.passed(name);
                Ok(value)
            }
            Err(e) => {
                tracing::error!("{}: step '{}' errored: {:#}", self.alias, name, e);
                self.push(name, step_result::FAILED, Some(format!("{:#}", e)));
                Err(e)
            }
        }
    }

    /// Record a step whose failure is reported and then skipped over
    pub fn continue_on_failure<T>(&mut self, name: &str, result: Result<T>, failure: &str) -> Option<T> {
        match result {
            Ok(value) => {
                self.passed(name);
                Some(value)
            }
            Err(e) => {
                let message = format!("{}\n{:#}", failure, e);
                tracing::warn!("{}: step '{}' failed: {}", self.alias, name, message);
                self.push(name, step_result::FAILED, Some(message));
                None
            }
        }
    }

    pub fn passed(&mut self, name: &str) {
        tracing::info!("{}: step '{}' passed", self.alias, name);
        self.push(name, step_result::PASSED, None);
    }

    fn push(&mut self, name: &str, result: &str, message: Option<String>) {
        self.results.push(StepResult {
            name: name.to_string(),
            result: result.to_string(),
            message,
        });
    }

    pub fn into_results(self) -> Vec<StepResult> {
        self.results
    }
}

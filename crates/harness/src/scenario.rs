//! Scenario assembly and run reports

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::step::Step;
use crate::views::Viewport;

/// A named, ordered list of browser steps plus the session parameters the
/// driver needs to replay them (viewport, extra browser launch args).
///
/// A scenario runs in a single browser session; page state carries across
/// steps, which is what the tests assert on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub viewport: Viewport,
    /// Extra chromium launch arguments, e.g. `--disable-webgl`.
    #[serde(default)]
    pub launch_args: Vec<String>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, viewport: Viewport) -> Self {
        Self {
            name: name.into(),
            viewport,
            launch_args: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn add_launch_arg(&mut self, arg: impl Into<String>) {
        self.launch_args.push(arg.into());
    }

    /// Names of all screenshots the scenario will capture, in order.
    pub fn screenshot_names(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                Step::Screenshot { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Outcome of a successful scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub scenario: String,
    pub duration_ms: u64,
    /// Paths of the screenshots captured during the run.
    pub screenshots: Vec<PathBuf>,
}

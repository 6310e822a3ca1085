// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::Path;

use serde::Deserialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::fsrs::DEFAULT_WEIGHTS;
use crate::fsrs::WEIGHT_COUNT;
use crate::fsrs::Weights;

/// Scheduler settings, read from an optional TOML file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// The recall probability the scheduler aims for.
    pub desired_retention: f64,
    /// Learning steps, in seconds.
    pub learning_steps: Vec<u64>,
    /// Relearning steps, in seconds.
    pub relearning_steps: Vec<u64>,
    /// The longest interval the scheduler will produce, in days.
    pub maximum_interval: u32,
    /// The FSRS model weights.
    pub parameters: Vec<f64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            desired_retention: 0.9,
            learning_steps: vec![60, 600],
            relearning_steps: vec![600],
            maximum_interval: 36500,
            parameters: DEFAULT_WEIGHTS.to_vec(),
        }
    }
}

impl SchedulerConfig {
    pub fn parse(content: &str) -> Fallible<Self> {
        let config: SchedulerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config at `path`, or the defaults if no path is given.
    pub fn load(path: Option<&Path>) -> Fallible<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return fail(format!("config file {} does not exist.", path.display()));
                }
                log::debug!("Loading config from {}", path.display());
                let content = std::fs::read_to_string(path)?;
                Self::parse(&content)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn weights(&self) -> Fallible<Weights> {
        match Weights::try_from(self.parameters.as_slice()) {
            Ok(w) => Ok(w),
            Err(_) => fail(format!(
                "expected {WEIGHT_COUNT} parameters, got {}.",
                self.parameters.len()
            )),
        }
    }

    fn validate(&self) -> Fallible<()> {
        if !(self.desired_retention > 0.0 && self.desired_retention < 1.0) {
            return fail("desired_retention must be between 0 and 1.");
        }
        if self.maximum_interval < 1 {
            return fail("maximum_interval must be at least one day.");
        }
        if self.learning_steps.contains(&0) || self.relearning_steps.contains(&0) {
            return fail("learning and relearning steps must be positive.");
        }
        let longest = self.maximum_interval as u64 * 86_400;
        let mut steps = self.learning_steps.iter().chain(&self.relearning_steps);
        if steps.any(|s| *s > longest) {
            return fail("steps cannot be longer than maximum_interval.");
        }
        if self.parameters.iter().any(|w| !w.is_finite()) {
            return fail("parameters must be finite.");
        }
        self.weights()?;
        Ok(())
    }
}

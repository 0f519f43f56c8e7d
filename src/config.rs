// Copyright 2025 chrona contributors
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

//! Scheduler configuration, including the compatibility switches for two
//! historical behaviors that look like bugs but are load-bearing for
//! drop-in parity: the tick driver's delta-time argument being ignored, and
//! the mixed-unit arithmetic in `next_trigger_time`.

use serde::{Deserialize, Serialize};

/// Behavioral configuration for a [`TimerScheduler`](crate::TimerScheduler).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// When `false` (default, historical behavior), `next_trigger_time`
    /// returns `last_trigger_ms + interval_secs` — milliseconds plus
    /// seconds, as the original system computed it. When `true`, the result
    /// is consistently in seconds.
    #[serde(default)]
    pub consistent_next_trigger_units: bool,

    /// When `false` (default, historical behavior), `update` ignores the
    /// driver-supplied delta time entirely and computes due-ness from
    /// absolute time-source readings. When `true`, the scheduler keeps its
    /// own clock advanced by the per-tick delta, making replays
    /// deterministic regardless of the time source.
    #[serde(default)]
    pub drive_by_delta: bool,

    /// Records preallocated in the recycle pool at construction.
    #[serde(default)]
    pub initial_pool_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            consistent_next_trigger_units: false,
            drive_by_delta: false,
            initial_pool_capacity: 0,
        }
    }
}

impl SchedulerConfig {
    /// Load configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    /// Save configuration to a JSON file.
    pub fn to_file(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_keeps_historical_behavior() {
        let config = SchedulerConfig::default();
        assert!(!config.consistent_next_trigger_units);
        assert!(!config.drive_by_delta);
        assert_eq!(config.initial_pool_capacity, 0);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = SchedulerConfig::from_json("{}").unwrap();
        assert!(!config.consistent_next_trigger_units);
        assert!(!config.drive_by_delta);
    }

    #[test]
    fn json_round_trip() {
        let config = SchedulerConfig {
            consistent_next_trigger_units: true,
            drive_by_delta: true,
            initial_pool_capacity: 64,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back = SchedulerConfig::from_json(&json).unwrap();
        assert!(back.consistent_next_trigger_units);
        assert!(back.drive_by_delta);
        assert_eq!(back.initial_pool_capacity, 64);
    }
}

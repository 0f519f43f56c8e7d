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

//! Wall-clock abstraction for the scheduler.
//!
//! The scheduler never reads time directly; it goes through a [`TimeSource`]
//! so that ticks can be driven under real wall-clock time in production and
//! under simulated time in tests and deterministic replays.

use std::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time in milliseconds.
///
/// Due-ness comparisons only require that readings are monotonically
/// non-decreasing and expressed in a single consistent timeline.
pub trait TimeSource {
    /// Current time in milliseconds.
    fn now_ms(&self) -> f64;

    /// Current time in seconds.
    #[inline]
    fn seconds(&self) -> f64 {
        self.now_ms() * 0.001
    }
}

/// System wall clock, read as milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
}

/// Manually driven clock for tests and simulations.
///
/// Time only moves when the owner calls [`advance_ms`](Self::advance_ms) or
/// [`set_ms`](Self::set_ms); readings through [`TimeSource`] use interior
/// mutability so a shared `Rc<ManualTimeSource>` can be handed to the
/// scheduler while the driver keeps advancing it.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    now_ms: Cell<f64>,
}

impl ManualTimeSource {
    /// Creates a clock positioned at `start_ms`.
    pub fn new(start_ms: f64) -> Self {
        Self {
            now_ms: Cell::new(start_ms),
        }
    }

    /// Moves the clock forward by `delta_ms`.
    pub fn advance_ms(&self, delta_ms: f64) {
        self.now_ms.set(self.now_ms.get() + delta_ms);
    }

    /// Jumps the clock to an absolute reading.
    pub fn set_ms(&self, now_ms: f64) {
        self.now_ms.set(now_ms);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ms(&self) -> f64 {
        self.now_ms.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_source_moves_forward() {
        let clock = SystemTimeSource;
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a, "system clock must not run backwards");
        assert!(a > 0.0, "epoch milliseconds should be positive");
    }

    #[test]
    fn manual_source_only_moves_when_driven() {
        let clock = ManualTimeSource::new(100.0);
        assert_eq!(clock.now_ms(), 100.0);
        assert_eq!(clock.now_ms(), 100.0);

        clock.advance_ms(250.0);
        assert_eq!(clock.now_ms(), 350.0);

        clock.set_ms(42.0);
        assert_eq!(clock.now_ms(), 42.0);
        assert_eq!(clock.seconds(), 0.042);
    }
}

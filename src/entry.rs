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

//! The mutable record describing one scheduled callback.
//!
//! Records are pooled: a reclaimed entry keeps its allocation (notably the
//! argument vector's capacity) and is overwritten wholesale on the next
//! schedule call. The id is logically distinct from the record's storage and
//! is never reused.

use crate::args::{TimerArg, TimerCallback, TimerContext};

/// Identity of a scheduled timer. Strictly increasing per scheduler
/// instance, starting at 1; never reused.
pub type TimerId = u64;

/// The id returned when a schedule request is rejected; never matches a
/// live timer.
pub const INVALID_TIMER_ID: TimerId = 0;

/// Sentinel loop count meaning "repeat forever".
pub const INFINITE_LOOPS: u32 = u32::MAX;

pub(crate) struct TimerEntry {
    pub id: TimerId,
    /// Period between triggers, milliseconds, non-negative.
    pub interval_ms: f64,
    /// Loops left; 0 means exhausted and pending reclamation.
    pub loops_left: u32,
    /// Time of creation or last trigger, milliseconds on the scheduler's
    /// time source.
    pub last_trigger_ms: f64,
    pub callback: Option<TimerCallback>,
    pub context: Option<TimerContext>,
    /// Original caller-supplied arguments; the id is appended at invocation
    /// time, not stored here.
    pub args: Vec<TimerArg>,
}

impl TimerEntry {
    /// A cleared record, as popped from an empty pool.
    pub fn blank() -> Self {
        Self {
            id: INVALID_TIMER_ID,
            interval_ms: 0.0,
            loops_left: 0,
            last_trigger_ms: 0.0,
            callback: None,
            context: None,
            args: Vec::new(),
        }
    }

    /// Overwrites every field for a fresh schedule call.
    #[allow(clippy::too_many_arguments)]
    pub fn reset(
        &mut self,
        id: TimerId,
        interval_secs: f64,
        loops: i32,
        now_ms: f64,
        callback: TimerCallback,
        context: Option<TimerContext>,
        args: Vec<TimerArg>,
    ) {
        self.id = id;
        self.interval_ms = interval_secs * 1000.0;
        self.loops_left = normalize_loops(loops);
        self.last_trigger_ms = now_ms;
        self.callback = Some(callback);
        self.context = context;
        self.args = args;
    }

    /// Clears the callable state before the record returns to the pool.
    /// The argument vector keeps its capacity for reuse.
    pub fn clear(&mut self) {
        self.callback = None;
        self.context = None;
        self.args.clear();
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.loops_left == 0
    }

    #[inline]
    pub fn interval_secs(&self) -> f64 {
        self.interval_ms * 0.001
    }

    /// Whether the entry is due at `now_ms`; reaching the interval exactly
    /// counts as due.
    #[inline]
    pub fn due(&self, now_ms: f64) -> bool {
        self.last_trigger_ms + self.interval_ms <= now_ms
    }
}

/// Normalizes a requested loop count: negative means repeat forever, zero
/// fires exactly once, positive counts are used as-is.
pub(crate) fn normalize_loops(loops: i32) -> u32 {
    if loops < 0 {
        INFINITE_LOOPS
    } else if loops == 0 {
        1
    } else {
        loops as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn noop_callback() -> TimerCallback {
        Rc::new(|_, _, _| {})
    }

    #[test]
    fn loop_count_normalization() {
        assert_eq!(normalize_loops(-1), INFINITE_LOOPS);
        assert_eq!(normalize_loops(i32::MIN), INFINITE_LOOPS);
        assert_eq!(normalize_loops(0), 1);
        assert_eq!(normalize_loops(1), 1);
        assert_eq!(normalize_loops(42), 42);
    }

    #[test]
    fn reaching_the_interval_exactly_is_due() {
        let mut entry = TimerEntry::blank();
        entry.reset(1, 1.0, 1, 500.0, noop_callback(), None, Vec::new());

        assert!(!entry.due(1499.9));
        assert!(entry.due(1500.0));
        assert!(entry.due(2000.0));
    }

    #[test]
    fn zero_interval_is_always_due() {
        let mut entry = TimerEntry::blank();
        entry.reset(1, 0.0, 1, 500.0, noop_callback(), None, Vec::new());
        assert!(entry.due(500.0));
    }

    #[test]
    fn clear_keeps_argument_capacity() {
        let mut entry = TimerEntry::blank();
        let args: Vec<TimerArg> = (0..16).map(|i| Rc::new(i) as TimerArg).collect();
        entry.reset(1, 1.0, 1, 0.0, noop_callback(), None, args);

        let cap = entry.args.capacity();
        entry.clear();
        assert!(entry.callback.is_none());
        assert!(entry.context.is_none());
        assert!(entry.args.is_empty());
        assert_eq!(entry.args.capacity(), cap);
    }

    #[test]
    fn complete_tracks_loops_left() {
        let mut entry = TimerEntry::blank();
        entry.reset(1, 1.0, 2, 0.0, noop_callback(), None, Vec::new());
        assert!(!entry.is_complete());
        entry.loops_left = 0;
        assert!(entry.is_complete());
    }
}

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

//! Per-owner grouping of timer ids for bulk cancellation.

use crate::args::{TimerArg, TimerCallback, TimerContext};
use crate::entry::{TimerId, INVALID_TIMER_ID};
use crate::scheduler::TimerScheduler;

/// Records every timer id created through it so the whole group can be
/// cancelled when the owner is torn down. After [`dispose`](Self::dispose)
/// the handle is permanently inert: schedule attempts log a warning and
/// return `None`. The scheduler itself is unaffected.
///
/// A handle belongs to one scheduler instance: the first scheduler it is
/// used with. Timer ids are per-scheduler, so feeding the handle a
/// different scheduler would cancel unrelated timers; that misuse is caught
/// by a debug assertion.
#[derive(Debug, Default)]
pub struct OwnerTimers {
    ids: Vec<TimerId>,
    bound_to: Option<u64>,
    disposed: bool,
}

impl OwnerTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the handle can still create timers.
    pub fn is_valid(&self) -> bool {
        !self.disposed
    }

    /// Ids created through this handle that have not been disposed yet.
    pub fn recorded_count(&self) -> usize {
        self.ids.len()
    }

    /// Binds the handle to the first scheduler it sees and verifies every
    /// later call targets the same instance.
    fn bind(&mut self, scheduler: &TimerScheduler) {
        let tag = scheduler.instance_tag();
        match self.bound_to {
            None => self.bound_to = Some(tag),
            Some(bound) => debug_assert_eq!(
                bound, tag,
                "owner handle used with a different scheduler than it was bound to"
            ),
        }
    }

    /// Delegates to [`TimerScheduler::schedule`] and records the id.
    pub fn schedule(
        &mut self,
        scheduler: &mut TimerScheduler,
        interval_secs: f64,
        loops: i32,
        callback: TimerCallback,
        context: Option<TimerContext>,
        args: Vec<TimerArg>,
    ) -> Option<TimerId> {
        if self.disposed {
            log::warn!("owner handle is disposed, cannot add timer");
            return None;
        }
        self.bind(scheduler);
        let id = scheduler.schedule(interval_secs, loops, callback, context, args);
        if id == INVALID_TIMER_ID {
            return None;
        }
        self.ids.push(id);
        Some(id)
    }

    /// One-shot timer after `delay_secs`, recorded for teardown.
    pub fn delay(
        &mut self,
        scheduler: &mut TimerScheduler,
        delay_secs: f64,
        callback: TimerCallback,
        context: Option<TimerContext>,
        args: Vec<TimerArg>,
    ) -> Option<TimerId> {
        self.schedule(scheduler, delay_secs, 1, callback, context, args)
    }

    /// Fires once on the next tick, recorded for teardown.
    pub fn next_frame(
        &mut self,
        scheduler: &mut TimerScheduler,
        callback: TimerCallback,
        context: Option<TimerContext>,
        args: Vec<TimerArg>,
    ) -> Option<TimerId> {
        self.schedule(scheduler, 0.0, 1, callback, context, args)
    }

    /// Cancels one recorded timer early.
    pub fn cancel(&mut self, scheduler: &mut TimerScheduler, id: TimerId) {
        self.bind(scheduler);
        self.ids.retain(|&recorded| recorded != id);
        scheduler.cancel(id);
    }

    /// Cancels every recorded timer and makes the handle inert.
    pub fn dispose(&mut self, scheduler: &mut TimerScheduler) {
        if !self.ids.is_empty() {
            self.bind(scheduler);
        }
        for id in self.ids.drain(..) {
            scheduler.cancel(id);
        }
        self.disposed = true;
    }
}

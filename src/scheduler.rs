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

//! The timer scheduler: a registry of delayed and repeating callbacks,
//! advanced once per host tick, backed by a recycle pool of timer records.
//!
//! Single-threaded and synchronous: every operation completes before it
//! returns, and callbacks fired during [`update`](TimerScheduler::update)
//! run to completion before the next entry of the same tick is visited.
//! Callbacks receive the scheduler itself and may schedule or cancel timers
//! mid-tick; entries inserted mid-tick first run on the following tick.
//!
//! Callback panics are not caught here: a panicking callback unwinds into
//! the tick driver and aborts the remainder of that tick's traversal.

use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::args::{invocation_args, TimerArg, TimerCallback, TimerContext};
use crate::config::SchedulerConfig;
use crate::entry::{TimerEntry, TimerId, INFINITE_LOOPS, INVALID_TIMER_ID};
use crate::slot_list::SlotList;
use crate::time::{SystemTimeSource, TimeSource};

/// Distinguishes scheduler instances, so an owner handle can verify it is
/// talking to the scheduler it was bound to. Identity only; timer id
/// sequences stay per-instance.
static NEXT_INSTANCE_TAG: AtomicU64 = AtomicU64::new(1);

/// Frame-driven timer scheduler.
///
/// Owns its id counter, active registry and recycle pool; separate instances
/// never share id sequences. Record storage is reused indefinitely across
/// schedule calls, but ids are strictly increasing and never reused.
pub struct TimerScheduler {
    time: Rc<dyn TimeSource>,
    timers: SlotList<TimerEntry>,
    pool: Vec<TimerEntry>,
    next_id: TimerId,
    config: SchedulerConfig,
    /// Internal clock, only advanced and consulted in `drive_by_delta` mode.
    sim_now_ms: f64,
    disposed: bool,
    instance_tag: u64,
}

impl Default for TimerScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerScheduler {
    /// Scheduler on the system wall clock with default configuration.
    pub fn new() -> Self {
        Self::with_time_source(Rc::new(SystemTimeSource))
    }

    /// Scheduler on a caller-provided clock.
    pub fn with_time_source(time: Rc<dyn TimeSource>) -> Self {
        Self::with_config(time, SchedulerConfig::default())
    }

    /// Scheduler on a caller-provided clock and configuration.
    pub fn with_config(time: Rc<dyn TimeSource>, config: SchedulerConfig) -> Self {
        Self {
            time,
            timers: SlotList::new(),
            pool: Vec::with_capacity(config.initial_pool_capacity),
            next_id: 1,
            config,
            sim_now_ms: 0.0,
            disposed: false,
            instance_tag: NEXT_INSTANCE_TAG.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub(crate) fn instance_tag(&self) -> u64 {
        self.instance_tag
    }

    /// Releases the registry and pool. Live timers are dropped without
    /// being triggered or individually cancelled; callers who want
    /// auto-cancellation group their timers in an
    /// [`OwnerTimers`](crate::OwnerTimers) handle instead. Subsequent
    /// schedule attempts are rejected with a warning.
    pub fn dispose(&mut self) {
        log::debug!("timer scheduler disposed ({} live timers dropped)", self.timers.len());
        self.timers = SlotList::new();
        self.pool = Vec::new();
        self.disposed = true;
    }

    /// Current time-source reading in milliseconds (or the delta-driven
    /// internal clock when so configured).
    fn now_ms(&self) -> f64 {
        if self.config.drive_by_delta {
            self.sim_now_ms
        } else {
            self.time.now_ms()
        }
    }

    /// Current time in seconds, independent of tick cadence.
    pub fn seconds(&self) -> f64 {
        self.now_ms() * 0.001
    }

    /// Advances the scheduler by one tick: fires every due entry and sweeps
    /// entries that exhausted their loops on a *previous* tick. An entry
    /// finishing its last loop on tick T therefore stays resident, inert,
    /// through tick T and is only reclaimed on tick T+1; `timer_count`
    /// includes it until then.
    ///
    /// `dt_secs` is the host's elapsed time since the previous tick. In the
    /// default configuration it is ignored and due-ness is computed from
    /// absolute time-source readings, matching the historical behavior; see
    /// [`SchedulerConfig::drive_by_delta`].
    pub fn update(&mut self, dt_secs: f64) {
        enum Step {
            Fire(TimerCallback, Option<TimerContext>, Vec<TimerArg>),
            Sweep,
            Idle,
        }

        if self.disposed {
            return;
        }
        if self.config.drive_by_delta {
            self.sim_now_ms += dt_secs * 1000.0;
        }
        let now_ms = self.now_ms();

        let mut pass = self.timers.pass();
        while let Some(key) = pass.next(&self.timers) {
            let step = match self.timers.get_mut(key) {
                Some(entry) if entry.loops_left > 0 => {
                    if entry.due(now_ms) {
                        // Decrement before invoking: a callback that asks
                        // about its own timer observes the post-trigger
                        // state. The infinite sentinel never counts down.
                        if entry.loops_left != INFINITE_LOOPS {
                            entry.loops_left -= 1;
                        }
                        entry.last_trigger_ms = now_ms;
                        match entry.callback.clone() {
                            Some(cb) => Step::Fire(
                                cb,
                                entry.context.clone(),
                                invocation_args(&entry.args, entry.id),
                            ),
                            None => Step::Idle,
                        }
                    } else {
                        Step::Idle
                    }
                }
                Some(_) => Step::Sweep,
                None => Step::Idle,
            };
            match step {
                Step::Fire(cb, context, call_args) => {
                    cb(self, context.as_ref(), &call_args);
                }
                Step::Sweep => {
                    if let Some(entry) = self.timers.remove(key) {
                        log::trace!("timer {} reclaimed", entry.id);
                        self.reclaim(entry);
                    }
                }
                Step::Idle => {}
            }
        }
    }

    /// Registers a timer and returns its id.
    ///
    /// `interval_secs` is the period between triggers. `loops < 0` repeats
    /// forever, `loops == 0` fires exactly once, a positive count is used
    /// as-is. `args` is the sequence the callback receives on every
    /// trigger, with the timer's id appended as the last element.
    pub fn schedule(
        &mut self,
        interval_secs: f64,
        loops: i32,
        callback: TimerCallback,
        context: Option<TimerContext>,
        args: Vec<TimerArg>,
    ) -> TimerId {
        if self.disposed {
            log::warn!("scheduler is disposed, schedule request ignored");
            return INVALID_TIMER_ID;
        }
        let mut entry = self.pool.pop().unwrap_or_else(TimerEntry::blank);
        let id = self.next_id;
        self.next_id += 1;
        entry.reset(id, interval_secs, loops, self.now_ms(), callback, context, args);
        self.timers.push(entry);
        log::trace!("timer {id} scheduled (interval {interval_secs}s, loops {loops})");
        id
    }

    /// One-shot timer after `delay_secs`.
    pub fn delay(
        &mut self,
        delay_secs: f64,
        callback: TimerCallback,
        context: Option<TimerContext>,
        args: Vec<TimerArg>,
    ) -> TimerId {
        self.schedule(delay_secs, 1, callback, context, args)
    }

    /// Per-frame timer: fires on every tick, `loops` times (negative
    /// repeats forever).
    pub fn frame(
        &mut self,
        loops: i32,
        callback: TimerCallback,
        context: Option<TimerContext>,
        args: Vec<TimerArg>,
    ) -> TimerId {
        self.schedule(0.0, loops, callback, context, args)
    }

    /// Fires once on the next tick.
    pub fn next_frame(
        &mut self,
        callback: TimerCallback,
        context: Option<TimerContext>,
        args: Vec<TimerArg>,
    ) -> TimerId {
        self.schedule(0.0, 1, callback, context, args)
    }

    /// Cancels a timer. Unknown or invalid ids are a no-op.
    pub fn cancel(&mut self, id: TimerId) {
        if id == INVALID_TIMER_ID {
            return;
        }
        match self.timers.remove_first_if(|t| t.id == id) {
            Some(entry) => self.reclaim(entry),
            None => log::trace!("cancel: no timer with id {id}"),
        }
    }

    /// Whether a timer has fired its last loop. Unknown ids are vacuously
    /// complete.
    pub fn is_complete(&self, id: TimerId) -> bool {
        self.lookup(id).map_or(true, |t| t.is_complete())
    }

    /// A timer's interval in seconds, or `-1.0` if unknown.
    pub fn interval(&self, id: TimerId) -> f64 {
        self.lookup(id).map_or(-1.0, |t| t.interval_secs())
    }

    /// A timer's callback, if the timer is live.
    pub fn callback(&self, id: TimerId) -> Option<TimerCallback> {
        self.lookup(id).and_then(|t| t.callback.clone())
    }

    /// A timer's context, if the timer is live and has one.
    pub fn context(&self, id: TimerId) -> Option<TimerContext> {
        self.lookup(id).and_then(|t| t.context.clone())
    }

    /// A timer's stored original arguments (without the appended id), if
    /// the timer is live.
    pub fn args(&self, id: TimerId) -> Option<&[TimerArg]> {
        self.lookup(id).map(|t| t.args.as_slice())
    }

    /// When the timer next fires, or `0.0` if unknown.
    ///
    /// In the default configuration this reproduces the historical
    /// mixed-unit arithmetic (millisecond timestamp plus second interval);
    /// with [`SchedulerConfig::consistent_next_trigger_units`] set the
    /// result is consistently in seconds.
    pub fn next_trigger_time(&self, id: TimerId) -> f64 {
        let Some(t) = self.lookup(id) else { return 0.0 };
        if self.config.consistent_next_trigger_units {
            t.last_trigger_ms * 0.001 + t.interval_secs()
        } else {
            t.last_trigger_ms + t.interval_secs()
        }
    }

    /// Manually replays a timer's callback with its stored arguments (id
    /// appended, as always). Scheduling state is untouched: loops left and
    /// the last trigger time do not change, and the call works even on an
    /// exhausted entry awaiting reclamation.
    pub fn trigger_now(&mut self, id: TimerId) {
        let fire = self.lookup(id).and_then(|t| {
            t.callback
                .clone()
                .map(|cb| (cb, t.context.clone(), invocation_args(&t.args, t.id)))
        });
        if let Some((cb, context, call_args)) = fire {
            cb(self, context.as_ref(), &call_args);
        }
    }

    /// Live entries in the registry, including exhausted entries not yet
    /// swept (see [`update`](Self::update) for the one-tick lag).
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Records currently sitting in the recycle pool.
    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    fn lookup(&self, id: TimerId) -> Option<&TimerEntry> {
        if id == INVALID_TIMER_ID {
            return None;
        }
        self.timers.find_first_if(|t| t.id == id)
    }

    fn reclaim(&mut self, mut entry: TimerEntry) {
        entry.clear();
        self.pool.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualTimeSource;
    use approx::assert_relative_eq;
    use std::cell::Cell;

    fn manual_scheduler(config: SchedulerConfig) -> (Rc<ManualTimeSource>, TimerScheduler) {
        let clock = Rc::new(ManualTimeSource::new(0.0));
        let scheduler = TimerScheduler::with_config(clock.clone(), config);
        (clock, scheduler)
    }

    fn noop() -> TimerCallback {
        Rc::new(|_, _, _| {})
    }

    #[test]
    fn ids_start_at_one_and_increase() {
        let (_clock, mut s) = manual_scheduler(SchedulerConfig::default());
        assert_eq!(s.schedule(1.0, 1, noop(), None, Vec::new()), 1);
        assert_eq!(s.schedule(1.0, 1, noop(), None, Vec::new()), 2);
        s.cancel(1);
        assert_eq!(s.schedule(1.0, 1, noop(), None, Vec::new()), 3);
    }

    #[test]
    fn separate_instances_do_not_share_id_sequences() {
        let (_c1, mut a) = manual_scheduler(SchedulerConfig::default());
        let (_c2, mut b) = manual_scheduler(SchedulerConfig::default());
        assert_eq!(a.schedule(1.0, 1, noop(), None, Vec::new()), 1);
        assert_eq!(b.schedule(1.0, 1, noop(), None, Vec::new()), 1);
    }

    #[test]
    fn queries_on_unknown_ids_return_neutral_defaults() {
        let (_clock, mut s) = manual_scheduler(SchedulerConfig::default());
        assert!(s.is_complete(0));
        assert!(s.is_complete(999));
        assert_eq!(s.interval(999), -1.0);
        assert!(s.callback(999).is_none());
        assert!(s.context(999).is_none());
        assert!(s.args(999).is_none());
        assert_eq!(s.next_trigger_time(999), 0.0);
        s.cancel(0);
        s.cancel(999);
        s.trigger_now(999);
    }

    #[test]
    fn next_trigger_time_reproduces_mixed_units_by_default() {
        let (clock, mut s) = manual_scheduler(SchedulerConfig::default());
        clock.set_ms(5000.0);
        let id = s.schedule(2.0, 1, noop(), None, Vec::new());
        // 5000 ms timestamp plus 2.0 s interval, added as-is.
        assert_relative_eq!(s.next_trigger_time(id), 5002.0);
    }

    #[test]
    fn next_trigger_time_in_seconds_when_configured() {
        let config = SchedulerConfig {
            consistent_next_trigger_units: true,
            ..SchedulerConfig::default()
        };
        let (clock, mut s) = manual_scheduler(config);
        clock.set_ms(5000.0);
        let id = s.schedule(2.0, 1, noop(), None, Vec::new());
        assert_relative_eq!(s.next_trigger_time(id), 7.0);
    }

    #[test]
    fn delta_driven_mode_ignores_the_time_source() {
        let config = SchedulerConfig {
            drive_by_delta: true,
            ..SchedulerConfig::default()
        };
        let (clock, mut s) = manual_scheduler(config);
        clock.set_ms(1_000_000.0); // must have no effect

        let fired = Rc::new(Cell::new(0));
        let fired_in = fired.clone();
        let cb: TimerCallback = Rc::new(move |_, _, _| fired_in.set(fired_in.get() + 1));
        s.schedule(1.0, 1, cb, None, Vec::new());

        s.update(0.5);
        assert_eq!(fired.get(), 0);
        s.update(0.5);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn infinite_loop_sentinel_survives_triggers() {
        let (clock, mut s) = manual_scheduler(SchedulerConfig::default());
        let count = Rc::new(Cell::new(0));
        let counting: TimerCallback = {
            let count = count.clone();
            Rc::new(move |_, _, _| count.set(count.get() + 1))
        };
        let id = s.frame(-1, counting, None, Vec::new());

        for _ in 0..5 {
            clock.advance_ms(16.0);
            s.update(0.016);
        }
        assert_eq!(count.get(), 5);
        // The sentinel must not count down: a negative loop count means
        // "repeat forever", not "repeat u32::MAX times".
        let entry = s.timers.find_first_if(|t| t.id == id).unwrap();
        assert_eq!(entry.loops_left, INFINITE_LOOPS);
        assert!(!s.is_complete(id));
    }

    #[test]
    fn disposed_scheduler_rejects_schedule_requests() {
        let (_clock, mut s) = manual_scheduler(SchedulerConfig::default());
        s.schedule(1.0, 1, noop(), None, Vec::new());
        s.dispose();
        assert_eq!(s.schedule(1.0, 1, noop(), None, Vec::new()), INVALID_TIMER_ID);
        assert_eq!(s.timer_count(), 0);
        s.update(0.016); // must be inert, not crash
    }

    #[test]
    fn pool_capacity_can_be_preallocated() {
        let config = SchedulerConfig {
            initial_pool_capacity: 32,
            ..SchedulerConfig::default()
        };
        let (_clock, s) = manual_scheduler(config);
        assert_eq!(s.pool_size(), 0);
        assert!(s.pool.capacity() >= 32);
    }
}

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

//! `chrona` – frame-driven timer scheduling engine.
//!
//! A registry of delayed and repeating callbacks advanced once per host
//! tick, backed by a recycle pool so steady-state scheduling allocates
//! nothing. Contents:
//! * [`scheduler`]: the [`TimerScheduler`] facade (schedule, cancel, query,
//!   manual trigger, per-tick update)
//! * [`slot_list`]: unordered container that tolerates removal and
//!   insertion during traversal
//! * [`owner`]: per-owner timer grouping with bulk cancellation on teardown
//! * [`time`]: wall-clock abstraction (system and manually driven sources)
//! * [`args`]: opaque callback arguments and the id-append convention
//! * [`config`]: behavioral switches, including compat quirks kept for
//!   drop-in parity
//!
//! The scheduler is single-threaded and cooperative: the host calls
//! [`TimerScheduler::update`] once per frame and every callback runs to
//! completion synchronously. To embed it in a multi-threaded host, wrap the
//! scheduler in a mutex held for the duration of each public call and keep
//! callbacks outside that lock.

pub mod args;
pub mod config;
pub mod entry;
pub mod owner;
pub mod scheduler;
pub mod slot_list;
pub mod time;

pub use args::{arg, arg_as, invocation_args, timer_id_arg, TimerArg, TimerCallback, TimerContext};
pub use config::SchedulerConfig;
pub use entry::{TimerId, INFINITE_LOOPS, INVALID_TIMER_ID};
pub use owner::OwnerTimers;
pub use scheduler::TimerScheduler;
pub use slot_list::{Pass, SlotKey, SlotList};
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};

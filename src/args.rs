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

//! Opaque callback arguments and the invocation-argument convention.
//!
//! Callers hand the scheduler an ordered sequence of opaque values; on every
//! trigger the callback receives that sequence with the timer's id appended
//! as the last element. The append happens here, in one place, so scheduled
//! triggers and manual replays cannot drift apart.

use std::any::Any;
use std::rc::Rc;

use crate::entry::TimerId;
use crate::scheduler::TimerScheduler;

/// One opaque caller-supplied argument.
pub type TimerArg = Rc<dyn Any>;

/// Opaque receiver/context passed through to the callback, never interpreted.
pub type TimerContext = Rc<dyn Any>;

/// Timer callback.
///
/// The scheduler passes itself in so a callback may schedule or cancel
/// timers (including its own) while it runs; execution is single-threaded
/// and synchronous. The argument slice is the caller's original sequence
/// with the timer id appended as the last element.
pub type TimerCallback = Rc<dyn Fn(&mut TimerScheduler, Option<&TimerContext>, &[TimerArg])>;

/// Wraps a value as an opaque timer argument.
pub fn arg<T: Any>(value: T) -> TimerArg {
    Rc::new(value)
}

/// Downcasts an opaque argument back to a concrete type.
pub fn arg_as<T: Any>(a: &TimerArg) -> Option<&T> {
    a.downcast_ref::<T>()
}

/// Reads the timer id out of an invocation's last argument.
pub fn timer_id_arg(a: &TimerArg) -> Option<TimerId> {
    a.downcast_ref::<TimerId>().copied()
}

/// Builds the argument sequence a callback is invoked with: the original
/// caller-supplied arguments followed by the timer's id. With no original
/// arguments the result is a single-element sequence holding just the id.
pub fn invocation_args(original: &[TimerArg], id: TimerId) -> Vec<TimerArg> {
    let mut out = Vec::with_capacity(original.len() + 1);
    out.extend_from_slice(original);
    out.push(Rc::new(id));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_original_args_yield_only_the_id() {
        let built = invocation_args(&[], 7);
        assert_eq!(built.len(), 1);
        assert_eq!(timer_id_arg(&built[0]), Some(7));
    }

    #[test]
    fn id_is_appended_after_original_args_in_order() {
        let original = vec![arg(10_i32), arg("hello"), arg(2.5_f64)];
        let built = invocation_args(&original, 99);

        assert_eq!(built.len(), 4);
        assert_eq!(arg_as::<i32>(&built[0]), Some(&10));
        assert_eq!(arg_as::<&str>(&built[1]), Some(&"hello"));
        assert_eq!(arg_as::<f64>(&built[2]), Some(&2.5));
        assert_eq!(timer_id_arg(&built[3]), Some(99));
    }

    #[test]
    fn original_sequence_is_not_mutated() {
        let original = vec![arg(1_u8)];
        let _ = invocation_args(&original, 3);
        let _ = invocation_args(&original, 4);
        assert_eq!(original.len(), 1);
    }

    #[test]
    fn downcast_to_wrong_type_is_none() {
        let a = arg(5_i32);
        assert!(arg_as::<u64>(&a).is_none());
        assert!(timer_id_arg(&a).is_none());
    }
}

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

//! Unordered slot-indexed container that stays safe to mutate while it is
//! being traversed.
//!
//! Values live in stable slots (they never move); freed slots go on a LIFO
//! stack and are reused by later insertions. Every insertion gets a
//! monotonically increasing stamp, and a traversal snapshots the stamp
//! counter when it starts: values inserted mid-pass carry a newer stamp and
//! are deferred to the next pass, values removed mid-pass leave an empty
//! slot and are simply skipped. Since slots never move, a pass can neither
//! skip nor double-visit a value that was present when it started.

/// Handle to one occupied slot. The stamp makes handles stale once the slot
/// is freed and reused, so a stale handle can never reach a different value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotKey {
    index: usize,
    stamp: u64,
}

#[derive(Debug)]
struct Slot<T> {
    stamp: u64,
    value: Option<T>,
}

/// Mutation-safe unordered container (see module docs).
#[derive(Debug)]
pub struct SlotList<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    next_stamp: u64,
    len: usize,
}

impl<T> Default for SlotList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SlotList<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            next_stamp: 1,
            len: 0,
        }
    }

    /// Number of live values.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts a value; O(1) amortized, no ordering guarantee.
    pub fn push(&mut self, value: T) -> SlotKey {
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Slot {
                    stamp,
                    value: Some(value),
                };
                index
            }
            None => {
                self.slots.push(Slot {
                    stamp,
                    value: Some(value),
                });
                self.slots.len() - 1
            }
        };
        self.len += 1;
        SlotKey { index, stamp }
    }

    pub fn get(&self, key: SlotKey) -> Option<&T> {
        self.slots
            .get(key.index)
            .filter(|slot| slot.stamp == key.stamp)
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, key: SlotKey) -> Option<&mut T> {
        self.slots
            .get_mut(key.index)
            .filter(|slot| slot.stamp == key.stamp)
            .and_then(|slot| slot.value.as_mut())
    }

    /// Point removal; stale keys are a no-op.
    pub fn remove(&mut self, key: SlotKey) -> Option<T> {
        let slot = self.slots.get_mut(key.index)?;
        if slot.stamp != key.stamp {
            return None;
        }
        let value = slot.value.take()?;
        self.free.push(key.index);
        self.len -= 1;
        Some(value)
    }

    /// First value matching the predicate; scan order is not stable across
    /// mutations.
    pub fn find_first_if(&self, mut pred: impl FnMut(&T) -> bool) -> Option<&T> {
        self.slots
            .iter()
            .filter_map(|slot| slot.value.as_ref())
            .find(|value| pred(*value))
    }

    /// Key of the first value matching the predicate.
    pub fn find_key_if(&self, mut pred: impl FnMut(&T) -> bool) -> Option<SlotKey> {
        self.slots.iter().enumerate().find_map(|(index, slot)| {
            slot.value
                .as_ref()
                .filter(|value| pred(*value))
                .map(|_| SlotKey {
                    index,
                    stamp: slot.stamp,
                })
        })
    }

    /// Find-and-remove in one step.
    pub fn remove_first_if(&mut self, pred: impl FnMut(&T) -> bool) -> Option<T> {
        let key = self.find_key_if(pred)?;
        self.remove(key)
    }

    /// Starts a traversal over the values present right now. The list may be
    /// mutated freely between [`Pass::next`] calls.
    pub fn pass(&self) -> Pass {
        Pass {
            cursor: 0,
            end: self.slots.len(),
            stamp_limit: self.next_stamp,
        }
    }

    /// Visits every value present at call start. The visitor receives the
    /// list itself and may remove or insert values mid-traversal. The
    /// visitor's return value is reserved for truncation; the traversal
    /// always continues regardless.
    pub fn for_each_safe(&mut self, mut visitor: impl FnMut(&mut Self, SlotKey) -> bool) {
        let mut pass = self.pass();
        while let Some(key) = pass.next(self) {
            let _ = visitor(self, key);
        }
    }
}

/// Cursor for one mutation-safe traversal. Holds no borrow on the list, so
/// the caller may mutate it between `next` calls.
#[derive(Debug)]
pub struct Pass {
    cursor: usize,
    end: usize,
    stamp_limit: u64,
}

impl Pass {
    /// Next slot that is still occupied and predates this pass, or `None`
    /// when the traversal is finished.
    ///
    /// A pass is only meaningful for the list it was created from; fed any
    /// other list it yields unspecified (but memory-safe) visits and ends
    /// early if that list has fewer slots.
    pub fn next<T>(&mut self, list: &SlotList<T>) -> Option<SlotKey> {
        while self.cursor < self.end {
            let index = self.cursor;
            self.cursor += 1;
            let slot = list.slots.get(index)?;
            if slot.value.is_some() && slot.stamp < self.stamp_limit {
                return Some(SlotKey {
                    index,
                    stamp: slot.stamp,
                });
            }
        }
        None
    }
}

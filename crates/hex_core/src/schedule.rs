//! Time-ordered turn queue.
//!
//! Every scheduled entity has one entry `(time, id)`. Popping yields the
//! earliest entry, lowest id first on ties, and moves the clock forward to
//! that entry's time. The clock never runs backwards because entries are
//! always pushed relative to it.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::error::{GameError, Result};

/// What an entity wants after taking its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Delay {
    /// Act again this many time units from now.
    After(u32),
    /// Stop the loop until external input arrives.
    AwaitInput,
    /// Leave the schedule for good.
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    time: u64,
    id: EntityId,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the earliest entry pops first.
        match other.time.cmp(&self.time) {
            Ordering::Equal => other.id.cmp(&self.id),
            ord => ord,
        }
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Serialized form: the clock and the entries in pop order.
#[derive(Serialize, Deserialize)]
struct ScheduleState {
    time: u64,
    entries: Vec<(u64, EntityId)>,
}

/// Priority queue of upcoming turns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "ScheduleState", into = "ScheduleState")]
pub struct Schedule {
    time: u64,
    queue: BinaryHeap<Entry>,
}

impl Schedule {
    /// Create an empty schedule at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current clock.
    #[must_use]
    pub const fn time(&self) -> u64 {
        self.time
    }

    /// Queue `id` to act `delay` units after the current clock.
    pub fn push(&mut self, id: EntityId, delay: u32) {
        self.queue.push(Entry {
            time: self.time + u64::from(delay),
            id,
        });
    }

    /// Apply a behaviour's [`Delay`]. Returns whether `id` was queued.
    pub fn schedule(&mut self, id: EntityId, delay: Delay) -> bool {
        match delay {
            Delay::After(units) => {
                self.push(id, units);
                true
            }
            Delay::AwaitInput | Delay::Never => false,
        }
    }

    /// Remove and return the earliest entry, advancing the clock to it.
    pub fn pop(&mut self) -> Option<(u64, EntityId)> {
        let entry = self.queue.pop()?;
        self.time = entry.time;
        Some((entry.time, entry.id))
    }

    /// Like [`Schedule::pop`], but an empty queue is an error.
    pub fn pop_next(&mut self) -> Result<(u64, EntityId)> {
        self.pop().ok_or(GameError::ScheduleUnderflow)
    }

    /// The earliest entry without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<(u64, EntityId)> {
        self.queue.peek().map(|e| (e.time, e.id))
    }

    /// Drop every entry for `id`. Returns whether any was removed.
    pub fn unschedule(&mut self, id: EntityId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|e| e.id != id);
        self.queue.len() != before
    }

    /// Whether `id` has a pending entry.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.queue.iter().any(|e| e.id == id)
    }

    /// Number of pending entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Pending entries in pop order.
    #[must_use]
    pub fn entries(&self) -> Vec<(u64, EntityId)> {
        let mut entries: Vec<_> = self.queue.iter().map(|e| (e.time, e.id)).collect();
        entries.sort_unstable();
        entries
    }
}

impl From<ScheduleState> for Schedule {
    fn from(state: ScheduleState) -> Self {
        Self {
            time: state.time,
            queue: state
                .entries
                .into_iter()
                .map(|(time, id)| Entry { time, id })
                .collect(),
        }
    }
}

impl From<Schedule> for ScheduleState {
    fn from(schedule: Schedule) -> Self {
        Self {
            time: schedule.time,
            entries: schedule.entries(),
        }
    }
}

//! Command scheduler for polling work on the UI thread.
//!
//! The scheduler keeps a min-heap of commands ordered by their next run time.
//! The host drives it by calling [`Scheduler::process_ready`] from its event
//! loop; tests drive it deterministically with [`Scheduler::process_ready_at`].
//!
//! Commands are not required to be `Send`: the drag machinery lives on a single
//! UI thread and shares the scheduler through an `Rc`.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use std::time::{Duration, Instant};
//! use horizon_dnd_core::Scheduler;
//!
//! let scheduler = Scheduler::new();
//! let polls = Rc::new(Cell::new(0));
//! let counter = polls.clone();
//! let start = Instant::now();
//!
//! // Poll every 30ms until three polls have happened.
//! scheduler.schedule_fixed_delay_at(start, Duration::from_millis(30), move || {
//!     counter.set(counter.get() + 1);
//!     counter.get() < 3
//! });
//!
//! for step in 1..=5 {
//!     scheduler.process_ready_at(start + Duration::from_millis(30 * step));
//! }
//! assert_eq!(polls.get(), 3);
//! assert_eq!(scheduler.active_count(), 0);
//! ```

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::error::SchedulerError;

new_key_type! {
    /// A unique identifier for a scheduled command.
    pub struct ScheduledCommandId;
}

/// A repeating command. Returning `false` stops the repetition.
type RepeatingCommand = Box<dyn FnMut() -> bool + 'static>;

struct ScheduledCommand {
    next_run: Instant,
    interval: Duration,
    /// `None` while the command is executing.
    command: Option<RepeatingCommand>,
}

/// An entry in the scheduler queue (min-heap by execution time).
#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    id: ScheduledCommandId,
    run_time: Instant,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.run_time == other.run_time
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default).
        other.run_time.cmp(&self.run_time)
    }
}

#[derive(Default)]
struct SchedulerState {
    commands: SlotMap<ScheduledCommandId, ScheduledCommand>,
    queue: BinaryHeap<QueueEntry>,
}

impl SchedulerState {
    fn insert(
        &mut self,
        next_run: Instant,
        interval: Duration,
        command: RepeatingCommand,
    ) -> ScheduledCommandId {
        let id = self.commands.insert(ScheduledCommand {
            next_run,
            interval,
            command: Some(command),
        });
        self.queue.push(QueueEntry {
            id,
            run_time: next_run,
        });
        id
    }

    fn discard_stale_front(&mut self) {
        while let Some(entry) = self.queue.peek() {
            let live = self
                .commands
                .get(entry.id)
                .is_some_and(|c| c.next_run == entry.run_time);
            if live {
                break;
            }
            self.queue.pop();
        }
    }
}

/// Schedules commands to run repeatedly at a fixed interval.
///
/// The scheduler lock is never held while a command runs, so commands may
/// schedule or cancel other commands.
pub struct Scheduler {
    state: Mutex<SchedulerState>,
}

impl Scheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SchedulerState::default()),
        }
    }

    /// Schedules a command to run every `interval` for as long as it returns `true`.
    ///
    /// The first run happens one interval from now.
    pub fn schedule_fixed_delay<F>(&self, interval: Duration, command: F) -> ScheduledCommandId
    where
        F: FnMut() -> bool + 'static,
    {
        self.schedule_fixed_delay_at(Instant::now(), interval, command)
    }

    /// Like [`schedule_fixed_delay`](Self::schedule_fixed_delay) with an explicit
    /// base instant.
    pub fn schedule_fixed_delay_at<F>(
        &self,
        now: Instant,
        interval: Duration,
        command: F,
    ) -> ScheduledCommandId
    where
        F: FnMut() -> bool + 'static,
    {
        let id = self
            .state
            .lock()
            .insert(now + interval, interval, Box::new(command));
        tracing::trace!(target: "horizon_dnd_core::scheduler", ?id, ?interval, "scheduled command");
        id
    }

    /// Cancels a scheduled command.
    pub fn cancel(&self, id: ScheduledCommandId) -> Result<(), SchedulerError> {
        self.state
            .lock()
            .commands
            .remove(id)
            .map(|_| ())
            .ok_or(SchedulerError::InvalidTaskId)
    }

    /// Returns true if the command is still scheduled.
    pub fn is_active(&self, id: ScheduledCommandId) -> bool {
        self.state.lock().commands.contains_key(id)
    }

    /// Returns the number of scheduled commands.
    pub fn active_count(&self) -> usize {
        self.state.lock().commands.len()
    }

    /// Runs every command due now.
    pub fn process_ready(&self) -> usize {
        self.process_ready_at(Instant::now())
    }

    /// Runs every command due at or before `now`.
    ///
    /// Returns the number of commands executed. A repeating command runs at
    /// most once per call.
    #[tracing::instrument(skip(self), target = "horizon_dnd_core::scheduler", level = "trace")]
    pub fn process_ready_at(&self, now: Instant) -> usize {
        let mut executed = 0;
        let mut rescheduled = Vec::new();

        loop {
            let (id, run_time, interval, mut command) = {
                let mut state = self.state.lock();
                state.discard_stale_front();
                let Some(entry) = state.queue.peek().copied() else {
                    break;
                };
                if entry.run_time > now {
                    break;
                }
                state.queue.pop();
                let Some(slot) = state.commands.get_mut(entry.id) else {
                    continue;
                };
                let Some(command) = slot.command.take() else {
                    continue;
                };
                (entry.id, entry.run_time, slot.interval, command)
            };

            tracing::trace!(
                target: "horizon_dnd_core::scheduler",
                ?id,
                "executing scheduled command"
            );
            executed += 1;
            let repeat = command();
            let mut state = self.state.lock();
            if !repeat {
                state.commands.remove(id);
            } else if let Some(slot) = state.commands.get_mut(id) {
                // Use the scheduled time as base to avoid drift.
                let next_run = run_time + interval;
                slot.next_run = next_run;
                slot.command = Some(command);
                rescheduled.push(QueueEntry {
                    id,
                    run_time: next_run,
                });
            }
        }

        if !rescheduled.is_empty() {
            self.state.lock().queue.extend(rescheduled);
        }
        executed
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("active", &self.active_count())
            .finish()
    }
}

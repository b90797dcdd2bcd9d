//! One-shot timers.
//!
//! A cooperative timer queue the host pumps from its event loop. A
//! cancelled timer never fires, including when the cancel happens from
//! another timer's callback in the same pump.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

/// Handle for cancelling a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

struct TimerEntry {
    serial: u64,
    due_ms: f64,
    callback: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct TimerInner {
    entries: Vec<TimerEntry>,
    next_serial: u64,
}

/// Shared timer queue; clones address the same entries.
#[derive(Clone, Default)]
pub struct Timers {
    inner: Rc<RefCell<TimerInner>>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `callback` to run once `now` reaches `due_ms`.
    pub fn schedule(&self, due_ms: f64, callback: impl FnOnce() + 'static) -> TimerId {
        let mut inner = self.inner.borrow_mut();
        inner.next_serial += 1;
        let serial = inner.next_serial;
        inner.entries.push(TimerEntry {
            serial,
            due_ms,
            callback: Box::new(callback),
        });
        trace!("timer {serial} scheduled for {due_ms}ms");
        TimerId(serial)
    }

    /// Cancels a pending timer; returns false when it already fired or
    /// was never scheduled.
    pub fn cancel(&self, id: TimerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.entries.len();
        inner.entries.retain(|entry| entry.serial != id.0);
        inner.entries.len() != before
    }

    /// Runs every timer due at `now_ms`, earliest first. Timers
    /// scheduled by a firing callback wait for the next pump.
    pub fn run_due(&self, now_ms: f64) -> usize {
        let ceiling = self.inner.borrow().next_serial;
        let mut fired = 0;
        loop {
            let entry = {
                let mut inner = self.inner.borrow_mut();
                let mut earliest: Option<usize> = None;
                for (index, entry) in inner.entries.iter().enumerate() {
                    if entry.due_ms > now_ms || entry.serial > ceiling {
                        continue;
                    }
                    let better = match earliest {
                        None => true,
                        Some(current) => {
                            let current = &inner.entries[current];
                            (entry.due_ms, entry.serial) < (current.due_ms, current.serial)
                        }
                    };
                    if better {
                        earliest = Some(index);
                    }
                }
                earliest.map(|index| inner.entries.remove(index))
            };
            match entry {
                Some(entry) => {
                    trace!("timer {} firing", entry.serial);
                    (entry.callback)();
                    fired += 1;
                }
                None => break,
            }
        }
        fired
    }

    pub fn pending(&self) -> usize {
        self.inner.borrow().entries.len()
    }
}

impl std::fmt::Debug for Timers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timers")
            .field("pending", &self.pending())
            .finish()
    }
}

//! Virtual-clock timer queue
//!
//! Replaces `setTimeout`/`setInterval` with an explicit queue the host drains on
//! every tick. Time is in milliseconds since page start (the `performance.now()`
//! convention). Entries fire in `(due, insertion)` order, so two timers with the
//! same due time always run in the order they were scheduled.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Entry<T> {
    id: TimerId,
    due: f64,
    seq: u64,
    /// Re-arm period for intervals
    period: Option<f64>,
    task: T,
}

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now: f64,
    next_id: u64,
    next_seq: u64,
    entries: Vec<Entry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            next_id: 1,
            next_seq: 0,
            entries: Vec::new(),
        }
    }

    /// Current virtual time
    #[inline]
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Move the clock forward; it never runs backwards
    pub fn advance_to(&mut self, now: f64) {
        if now > self.now {
            self.now = now;
        }
    }

    pub fn set_timeout(&mut self, delay_ms: f64, task: T) -> TimerId {
        self.push(delay_ms.max(0.0), None, task)
    }

    /// A zero period is bumped to 1ms so an interval cannot starve the queue
    pub fn set_interval(&mut self, period_ms: f64, task: T) -> TimerId {
        let period = period_ms.max(1.0);
        self.push(period, Some(period), task)
    }

    fn push(&mut self, delay: f64, period: Option<f64>, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry {
            id,
            due: self.now + delay,
            seq,
            period,
            task,
        });
        id
    }

    /// Returns false if the timer already fired or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Cancel every timer whose task matches; returns how many were removed
    pub fn cancel_where(&mut self, pred: impl Fn(&T) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !pred(&e.task));
        before - self.entries.len()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    pub fn next_due(&self) -> Option<f64> {
        self.earliest().map(|idx| self.entries[idx].due)
    }

    fn earliest(&self) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)))
            .map(|(idx, _)| idx)
    }
}

impl<T: Clone> Scheduler<T> {
    /// Pop the earliest timer due at or before `now`
    ///
    /// The clock moves to the popped entry's due time, so work scheduled by its
    /// handler is relative to when the timer fired. Intervals are re-armed.
    pub fn pop_due(&mut self, now: f64) -> Option<(TimerId, T)> {
        let idx = self.earliest()?;
        if self.entries[idx].due > now {
            return None;
        }
        self.advance_to(self.entries[idx].due);

        match self.entries[idx].period {
            Some(period) => {
                let seq = self.next_seq;
                self.next_seq += 1;
                let entry = &mut self.entries[idx];
                entry.due += period;
                entry.seq = seq;
                Some((entry.id, entry.task.clone()))
            }
            None => {
                let entry = self.entries.remove(idx);
                Some((entry.id, entry.task))
            }
        }
    }
}

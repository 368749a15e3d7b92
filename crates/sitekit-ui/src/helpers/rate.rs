//! Debounce and throttle over the virtual clock
//!
//! Both wrappers own at most one pending timer. The owner forwards the fired
//! `TimerId` back through `fire`, which rejects timers that were superseded.

use sitekit_core::{Scheduler, TimerId};

/// Trailing-edge debounce
#[derive(Debug, Clone)]
pub struct Debounce {
    wait_ms: f64,
    pending: Option<TimerId>,
}

impl Debounce {
    pub fn new(wait_ms: f64) -> Self {
        Self {
            wait_ms: wait_ms.max(0.0),
            pending: None,
        }
    }

    pub fn wait_ms(&self) -> f64 {
        self.wait_ms
    }

    /// Restart the wait; any earlier pending call is dropped
    pub fn call<T>(&mut self, timers: &mut Scheduler<T>, task: T) -> TimerId {
        if let Some(id) = self.pending.take() {
            timers.cancel(id);
        }
        let id = timers.set_timeout(self.wait_ms, task);
        self.pending = Some(id);
        id
    }

    /// True when `id` is the call that should run now
    pub fn fire(&mut self, id: TimerId) -> bool {
        if self.pending == Some(id) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn cancel<T>(&mut self, timers: &mut Scheduler<T>) {
        if let Some(id) = self.pending.take() {
            timers.cancel(id);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Leading-edge throttle with a single trailing call
#[derive(Debug, Clone)]
pub struct Throttle {
    limit_ms: f64,
    last_run: Option<f64>,
    trailing: Option<TimerId>,
}

impl Throttle {
    pub fn new(limit_ms: f64) -> Self {
        Self {
            limit_ms: limit_ms.max(0.0),
            last_run: None,
            trailing: None,
        }
    }

    /// Returns true when the caller should run immediately
    ///
    /// A suppressed call replaces the pending trailing call, which is due at
    /// `last_run + limit`.
    pub fn call<T>(&mut self, timers: &mut Scheduler<T>, task: T) -> bool {
        let now = timers.now();
        match self.last_run {
            Some(last) if now - last < self.limit_ms => {
                if let Some(id) = self.trailing.take() {
                    timers.cancel(id);
                }
                let delay = last + self.limit_ms - now;
                self.trailing = Some(timers.set_timeout(delay, task));
                false
            }
            _ => {
                if let Some(id) = self.trailing.take() {
                    timers.cancel(id);
                }
                self.last_run = Some(now);
                true
            }
        }
    }

    /// True when `id` is the trailing call; marks it as a run at `now`
    pub fn fire(&mut self, id: TimerId, now: f64) -> bool {
        if self.trailing == Some(id) {
            self.trailing = None;
            self.last_run = Some(now);
            true
        } else {
            false
        }
    }

    pub fn cancel<T>(&mut self, timers: &mut Scheduler<T>) {
        if let Some(id) = self.trailing.take() {
            timers.cancel(id);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.trailing.is_some()
    }
}

//! Ordered `(delay, effect)` lists for staggered reveals

use sitekit_core::{NodeId, Scheduler, TimerId};

/// Fade/slide an element to its resting state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reveal {
    pub node: NodeId,
    pub duration_ms: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sequence {
    steps: Vec<(f64, Reveal)>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, delay_ms: f64, reveal: Reveal) -> Self {
        self.push(delay_ms, reveal);
        self
    }

    pub fn push(&mut self, delay_ms: f64, reveal: Reveal) {
        self.steps.push((delay_ms.max(0.0), reveal));
    }

    /// `count` steps starting at `start_ms`, `step_ms` apart
    pub fn stagger(
        mut self,
        start_ms: f64,
        step_ms: f64,
        nodes: impl IntoIterator<Item = NodeId>,
        duration_ms: f64,
    ) -> Self {
        for (i, node) in nodes.into_iter().enumerate() {
            self.push(start_ms + step_ms * i as f64, Reveal { node, duration_ms });
        }
        self
    }

    pub fn steps(&self) -> &[(f64, Reveal)] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Queue every step; delays are relative to the scheduler's current time
    pub fn schedule<T>(
        self,
        timers: &mut Scheduler<T>,
        wrap: impl Fn(Reveal) -> T,
    ) -> Vec<TimerId> {
        self.steps
            .into_iter()
            .map(|(delay, reveal)| timers.set_timeout(delay, wrap(reveal)))
            .collect()
    }
}

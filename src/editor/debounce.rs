//! Debounced input: the raw value updates on every keystroke, the settled
//! value only once input has been quiet for the configured delay.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Debounced<T> {
    input: T,
    settled: T,
    deadline: Option<Instant>,
    delay: Duration,
}

impl<T: Clone + PartialEq> Debounced<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            input: initial.clone(),
            settled: initial,
            deadline: None,
            delay,
        }
    }

    /// Value as typed.
    pub fn input(&self) -> &T {
        &self.input
    }

    /// Value that participates in filtering.
    pub fn settled(&self) -> &T {
        &self.settled
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Record new input and restart the quiet period.
    pub fn set(&mut self, value: T, now: Instant) {
        self.input = value;
        self.deadline = Some(now + self.delay);
    }

    /// Settle if the quiet period has elapsed. Returns whether the settled value changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => self.flush(),
            _ => false,
        }
    }

    /// Settle immediately. Returns whether the settled value changed.
    pub fn flush(&mut self) -> bool {
        self.deadline = None;
        if self.input == self.settled {
            return false;
        }
        self.settled = self.input.clone();
        true
    }
}

//! Linear undo/redo history of immutable snapshots.

/// Undo/redo stack. The displayed state is always `states[index]`.
///
/// Snapshots are compared with `PartialEq`, so every snapshot type states its
/// own structural equality instead of relying on serialization order.
#[derive(Debug, Clone)]
pub struct History<S> {
    states: Vec<S>,
    index: usize,
}

impl<S: Clone + PartialEq> History<S> {
    pub fn new(initial: S) -> Self {
        Self {
            states: vec![initial],
            index: 0,
        }
    }

    pub fn current(&self) -> &S {
        &self.states[self.index]
    }

    /// Push `next` unless it equals the current snapshot.
    ///
    /// Returns whether a new entry was recorded. Any redo entries are dropped
    /// only when something is recorded.
    pub fn commit(&mut self, next: S) -> bool {
        if next == *self.current() {
            return false;
        }
        self.states.truncate(self.index + 1);
        self.states.push(next);
        self.index += 1;
        true
    }

    /// Derive the next snapshot from the current one and commit it.
    pub fn commit_with<F>(&mut self, reducer: F) -> bool
    where
        F: FnOnce(&S) -> S,
    {
        let next = reducer(self.current());
        self.commit(next)
    }

    pub fn undo(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.index + 1 >= self.states.len() {
            return false;
        }
        self.index += 1;
        true
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.states.len()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The snapshot the session started from.
    pub fn baseline(&self) -> &S {
        &self.states[0]
    }

    /// Discard every entry and start over from `initial`.
    pub fn reset(&mut self, initial: S) {
        self.states = vec![initial];
        self.index = 0;
    }
}

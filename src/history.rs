use std::collections::VecDeque;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Bounded undo/redo stacks of whole-source snapshots.
///
/// Both stacks are ring buffers: once `capacity` entries are held, pushing
/// drops the oldest. Recording a new edit always clears redo.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentHistory {
    undo: VecDeque<String>,
    redo: VecDeque<String>,
    capacity: usize,
}

impl ContentHistory {
    pub fn new(capacity: usize) -> Self {
        ContentHistory {
            undo: VecDeque::with_capacity(capacity),
            redo: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record the text as it was before an edit.
    pub fn record(&mut self, previous: String) {
        push_bounded(&mut self.undo, previous, self.capacity);
        self.redo.clear();
    }

    /// Step back, parking `current` on the redo stack.
    pub fn undo(&mut self, current: String) -> Option<String> {
        let previous = self.undo.pop_back()?;
        push_bounded(&mut self.redo, current, self.capacity);
        Some(previous)
    }

    /// Step forward, parking `current` on the undo stack.
    pub fn redo(&mut self, current: String) -> Option<String> {
        let next = self.redo.pop_back()?;
        push_bounded(&mut self.undo, current, self.capacity);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }
}

impl Default for ContentHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

fn push_bounded(stack: &mut VecDeque<String>, entry: String, capacity: usize) {
    if capacity == 0 {
        return;
    }
    if stack.len() == capacity {
        stack.pop_front();
    }
    stack.push_back(entry);
}

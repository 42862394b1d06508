use std::collections::VecDeque;

use super::types::Frame;

/// Rolling window of the most recent frames, kept as lookback context for alerts.
#[derive(Debug, Clone)]
pub struct PreAlertBuffer {
    frames: VecDeque<Frame>,
    capacity: usize,
}

impl PreAlertBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, frame: Frame) {
        if self.capacity == 0 {
            return;
        }
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }

    /// Oldest first. Leaves the buffer untouched.
    pub fn snapshot(&self) -> Vec<Frame> {
        self.frames.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Movement directions and the per-player input queue.

use std::collections::VecDeque;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// (row, col) delta for one step.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

pub const INPUT_QUEUE_CAPACITY: usize = 16;

/// Ordered queue of requested turns, one consumed per tick.
///
/// A request equal to the most recent queued one is dropped. When full,
/// new requests are dropped too.
#[derive(Clone, Debug, Default)]
pub struct DirectionQueue {
    pending: VecDeque<Direction>,
}

impl DirectionQueue {
    pub fn new() -> Self {
        DirectionQueue { pending: VecDeque::with_capacity(INPUT_QUEUE_CAPACITY) }
    }

    pub fn push(&mut self, dir: Direction) {
        if self.pending.back() == Some(&dir) || self.pending.len() >= INPUT_QUEUE_CAPACITY {
            return;
        }
        self.pending.push_back(dir);
    }

    pub fn pop(&mut self) -> Option<Direction> {
        self.pending.pop_front()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

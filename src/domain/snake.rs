/// Snake entity: ring-buffered body, heading, lives and score.
///
/// The snake never checks collisions itself. The round controller decides
/// whether a move is fatal and only then calls `commit_step`.

use super::arena::Arena;
use super::color::Color;
use super::direction::Direction;
use super::surface::Surface;

pub const MAX_SNAKE_LENGTH: usize = 1000;
/// Growth stops this far short of the ring capacity.
pub const LENGTH_HEADROOM: usize = 30;
pub const MAX_GROWN_LENGTH: usize = MAX_SNAKE_LENGTH - LENGTH_HEADROOM;

pub const START_LENGTH: usize = 2;
pub const START_LIVES: u32 = 5;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SnakePiece {
    pub row: usize,
    pub col: usize,
}

/// Fixed-capacity circular buffer of body pieces, head at `head`.
#[derive(Clone, Debug)]
pub struct SnakeBody {
    slots: Box<[Option<SnakePiece>]>,
    head: usize,
    span: usize,
}

impl SnakeBody {
    pub fn new() -> Self {
        SnakeBody {
            slots: vec![None; MAX_SNAKE_LENGTH].into_boxed_slice(),
            head: 0,
            span: 0,
        }
    }

    pub fn push_head(&mut self, piece: SnakePiece) {
        self.head = (self.head + 1) % MAX_SNAKE_LENGTH;
        self.slots[self.head] = Some(piece);
        self.span = (self.span + 1).min(MAX_SNAKE_LENGTH);
    }

    pub fn pop_tail(&mut self) -> Option<SnakePiece> {
        if self.span == 0 {
            return None;
        }
        let tail = (self.head + MAX_SNAKE_LENGTH - (self.span - 1)) % MAX_SNAKE_LENGTH;
        self.span -= 1;
        self.slots[tail].take()
    }

    /// Piece `offset` places behind the head (0 = head).
    pub fn at_offset(&self, offset: usize) -> Option<SnakePiece> {
        if offset >= self.span {
            return None;
        }
        self.slots[(self.head + MAX_SNAKE_LENGTH - offset) % MAX_SNAKE_LENGTH]
    }

    pub fn len(&self) -> usize {
        self.span
    }

    pub fn clear(&mut self) {
        self.slots.fill(None);
        self.span = 0;
    }
}

#[derive(Clone, Debug)]
pub struct Snake {
    pub body: SnakeBody,
    pub length: usize,
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
    pub alive: bool,
    pub lives: u32,
    pub score: i32,
    pub color: Color,
}

impl Snake {
    pub fn new(color: Color) -> Self {
        Snake {
            body: SnakeBody::new(),
            length: START_LENGTH,
            row: 0,
            col: 0,
            direction: Direction::Right,
            alive: true,
            lives: START_LIVES,
            score: 0,
            color,
        }
    }

    /// Start a fresh life at a level placement. Lives and score are kept.
    pub fn reset(&mut self, row: usize, col: usize, direction: Direction) {
        self.body.clear();
        self.length = START_LENGTH;
        self.row = row;
        self.col = col;
        self.direction = direction;
        self.alive = true;
    }

    /// Turn (unless the request is a reversal) and move one cell.
    pub fn advance(&mut self, requested: Option<Direction>) {
        if let Some(dir) = requested {
            if dir != self.direction.opposite() {
                self.direction = dir;
            }
        }
        let (dr, dc) = self.direction.delta();
        self.row = self.row.saturating_add_signed(dr);
        self.col = self.col.saturating_add_signed(dc);
    }

    pub fn grow(&mut self, amount: usize) {
        self.length = (self.length + amount).min(MAX_GROWN_LENGTH);
    }

    /// Record the current position as the new head, trim the tail down to
    /// `length` and paint both ends.
    pub fn commit_step(&mut self, arena: &mut Arena, surface: &mut dyn Surface, background: Color) {
        self.body.push_head(SnakePiece { row: self.row, col: self.col });
        while self.body.len() > self.length {
            if let Some(tail) = self.body.pop_tail() {
                arena.set(surface, tail.row, tail.col, background);
            }
        }
        arena.set(surface, self.row, self.col, self.color);
    }

    /// Head offsets in derez order: ten interleaved passes, each walking
    /// from the tail end toward the head in strides of ten.
    pub fn erase_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.length + 1);
        for c in 0..=9 {
            let mut b = self.length as isize - c;
            while b >= 0 {
                order.push(b as usize);
                b -= 10;
            }
        }
        order
    }

    /// Derez animation: paint the body back to background, 2 ms per piece.
    pub fn erase(&self, arena: &mut Arena, surface: &mut dyn Surface, background: Color) {
        for offset in self.erase_order() {
            if let Some(piece) = self.body.at_offset(offset) {
                arena.set(surface, piece.row, piece.col, background);
                surface.hold(2);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::surface::testing::GridSurface;

    const BG: Color = Color::DarkBlue;

    fn snake_at(row: usize, col: usize, dir: Direction) -> Snake {
        let mut s = Snake::new(Color::Yellow);
        s.reset(row, col, dir);
        s
    }

    #[test]
    fn reversal_is_ignored() {
        let mut s = snake_at(25, 50, Direction::Right);
        s.advance(Some(Direction::Left));
        assert_eq!(s.direction, Direction::Right);
        assert_eq!((s.row, s.col), (25, 51));

        s.advance(Some(Direction::Up));
        assert_eq!(s.direction, Direction::Up);
        assert_eq!((s.row, s.col), (24, 51));
    }

    #[test]
    fn never_commits_consecutive_opposites() {
        let mut s = snake_at(25, 40, Direction::Up);
        let script = [
            Direction::Down, Direction::Left, Direction::Right, Direction::Up,
            Direction::Down, Direction::Right, Direction::Left, Direction::Down,
        ];
        let mut prev = s.direction;
        for d in script {
            s.advance(Some(d));
            assert_ne!(s.direction, prev.opposite());
            prev = s.direction;
        }
    }

    #[test]
    fn growth_is_bounded() {
        let mut s = snake_at(25, 40, Direction::Up);
        let mut last = s.length;
        for _ in 0..100 {
            s.grow(36);
            assert!(s.length >= last);
            assert!(s.length <= MAX_GROWN_LENGTH);
            last = s.length;
        }
        assert_eq!(s.length, MAX_GROWN_LENGTH);
    }

    #[test]
    fn commit_trims_tail_to_length() {
        let mut arena = Arena::new(BG);
        let mut surface = GridSurface::new();
        let mut s = snake_at(25, 40, Direction::Right);

        for _ in 0..5 {
            s.advance(None);
            s.commit_step(&mut arena, &mut surface, BG);
        }
        assert_eq!(s.body.len(), 2);
        assert!(arena.occupied(25, 45, BG));
        assert!(arena.occupied(25, 44, BG));
        assert!(!arena.occupied(25, 43, BG));
        assert!(!arena.occupied(25, 41, BG));
    }

    #[test]
    fn erase_order_strides_by_ten() {
        let mut s = snake_at(25, 40, Direction::Right);
        s.length = 12;
        let order = s.erase_order();
        assert_eq!(&order[..3], &[12, 2, 11]);
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..=12).collect::<Vec<_>>());
    }

    #[test]
    fn erase_clears_every_body_pixel() {
        let mut arena = Arena::new(BG);
        let mut surface = GridSurface::new();
        let mut s = snake_at(25, 20, Direction::Right);
        s.grow(10);
        for _ in 0..15 {
            s.advance(None);
            s.commit_step(&mut arena, &mut surface, BG);
        }
        s.erase(&mut arena, &mut surface, BG);
        for col in 1..=80 {
            assert!(!arena.occupied(25, col, BG));
        }
        assert_eq!(surface.held_ms, 2 * s.length as u64);
    }

    #[test]
    fn ring_wraps_around_capacity() {
        let mut body = SnakeBody::new();
        for i in 0..(MAX_SNAKE_LENGTH + 5) {
            body.push_head(SnakePiece { row: 1, col: i });
            if body.len() > 3 {
                body.pop_tail();
            }
        }
        assert_eq!(body.len(), 3);
        assert_eq!(body.at_offset(0).map(|p| p.col), Some(MAX_SNAKE_LENGTH + 4));
        assert_eq!(body.at_offset(2).map(|p| p.col), Some(MAX_SNAKE_LENGTH + 2));
        assert_eq!(body.at_offset(3), None);
    }
}

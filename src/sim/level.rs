/// Level geometry: border, obstacle walls and snake start placements.
///
/// Levels 1-9 are hand-authored. Level 10 and beyond repeat a staggered
/// column pattern. Generation is pure; the only level state is the index
/// held by the round controller.

use crate::domain::arena::{Arena, ARENA_COLS, ARENA_ROWS};
use crate::domain::direction::Direction;
use crate::domain::palette::ColorScheme;
use crate::domain::surface::{Surface, SCREEN_COLS, SCREEN_ROWS};

/// Where and how a snake enters the level.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Placement {
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
}

const fn at(row: usize, col: usize, direction: Direction) -> Placement {
    Placement { row, col, direction }
}

/// How the next level index is chosen.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LevelChoice {
    StartOver,
    SameLevel,
    NextLevel,
}

impl LevelChoice {
    pub fn apply(self, current: usize) -> usize {
        match self {
            LevelChoice::StartOver => 1,
            LevelChoice::SameLevel => current.max(1),
            LevelChoice::NextLevel => current + 1,
        }
    }
}

// ── Placements ──

pub fn starts(level: usize) -> [Placement; 2] {
    use Direction::*;
    match level {
        1 => [at(25, 50, Right), at(25, 30, Left)],
        2 | 4 => [at(7, 60, Left), at(43, 20, Right)],
        3 | 5 => [at(25, 50, Up), at(25, 30, Down)],
        9 => [at(40, 75, Up), at(15, 5, Down)],
        _ => [at(7, 65, Down), at(43, 15, Up)],
    }
}

// ── Walls ──

/// Level-specific walls as (row, col) pixels, border excluded.
pub fn obstacles(level: usize) -> Vec<(usize, usize)> {
    let mut walls = Vec::new();
    match level {
        1 => {}
        2 => {
            for i in 20..=60 {
                walls.push((25, i));
            }
        }
        3 => {
            for i in 10..=40 {
                walls.push((i, 20));
                walls.push((i, 60));
            }
        }
        4 => {
            for i in 4..=30 {
                walls.push((i, 20));
                walls.push((53 - i, 60));
            }
            for i in 2..=40 {
                walls.push((38, i));
                walls.push((15, 81 - i));
            }
        }
        5 => {
            for i in 13..=39 {
                walls.push((i, 21));
                walls.push((i, 59));
            }
            for i in 23..=57 {
                walls.push((11, i));
                walls.push((41, i));
            }
        }
        6 => {
            for i in (4..=49).filter(|i| !(23..=30).contains(i)) {
                for col in (10..=70).step_by(10) {
                    walls.push((i, col));
                }
            }
        }
        7 => {
            for i in (4..=49).step_by(2) {
                walls.push((i, 40));
            }
        }
        8 => {
            for i in 4..=40 {
                walls.push((i, 10));
                walls.push((53 - i, 20));
                walls.push((i, 30));
                walls.push((53 - i, 40));
                walls.push((i, 50));
                walls.push((53 - i, 60));
                walls.push((i, 70));
            }
        }
        9 => {
            for i in 6..=47 {
                walls.push((i, i));
                walls.push((i, i + 28));
            }
        }
        _ => {
            for i in (4..=49).step_by(2) {
                walls.push((i, 10));
                walls.push((i + 1, 20));
                walls.push((i, 30));
                walls.push((i + 1, 40));
                walls.push((i, 50));
                walls.push((i + 1, 60));
                walls.push((i, 70));
            }
        }
    }
    walls
}

fn border() -> impl Iterator<Item = (usize, usize)> {
    let horizontal = (1..=ARENA_COLS).flat_map(|col| [(3, col), (ARENA_ROWS, col)]);
    let vertical = (4..ARENA_ROWS).flat_map(|row| [(row, 1), (row, ARENA_COLS)]);
    horizontal.chain(vertical)
}

/// Reset the arena and screen, then draw the border and the level's walls.
pub fn build(
    level: usize,
    arena: &mut Arena,
    surface: &mut dyn Surface,
    scheme: &ColorScheme,
) -> [Placement; 2] {
    let bg = scheme.background;
    arena.clear(bg);
    surface.clear(bg);

    // The bottom-right text cell cannot go through `Arena::set`; paint it
    // directly and record its two pixels so they still block.
    surface.set_cell(SCREEN_COLS - 1, SCREEN_ROWS - 1, ' ', scheme.walls, scheme.walls);
    arena.mark(ARENA_ROWS - 1, ARENA_COLS, scheme.walls);
    arena.mark(ARENA_ROWS, ARENA_COLS, scheme.walls);

    for (row, col) in border().chain(obstacles(level)) {
        arena.set(surface, row, col, scheme.walls);
    }

    starts(level)
}

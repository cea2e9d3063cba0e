/// Drawing target for the game core.
///
/// Coordinates are 0-based character cells on an 80×25 grid.

use super::color::Color;

pub const SCREEN_COLS: usize = 80;
pub const SCREEN_ROWS: usize = 25;

pub trait Surface {
    fn set_cell(&mut self, col: usize, row: usize, glyph: char, fg: Color, bg: Color);

    fn clear(&mut self, bg: Color);

    /// Make pending output visible and wait; used to pace animations.
    fn hold(&mut self, _ms: u64) {}
}

#[cfg(test)]
pub mod testing {
    use super::*;

    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct GridCell {
        pub glyph: char,
        pub fg: Color,
        pub bg: Color,
    }

    /// In-memory surface that records every cell and counts writes.
    pub struct GridSurface {
        pub cells: Vec<GridCell>,
        pub writes: usize,
        pub held_ms: u64,
    }

    impl GridSurface {
        pub fn new() -> Self {
            GridSurface {
                cells: vec![
                    GridCell { glyph: ' ', fg: Color::Gray, bg: Color::Black };
                    SCREEN_COLS * SCREEN_ROWS
                ],
                writes: 0,
                held_ms: 0,
            }
        }

        pub fn cell(&self, col: usize, row: usize) -> GridCell {
            self.cells[row * SCREEN_COLS + col]
        }

        pub fn row_text(&self, row: usize) -> String {
            (0..SCREEN_COLS).map(|c| self.cell(c, row).glyph).collect()
        }
    }

    impl Surface for GridSurface {
        fn set_cell(&mut self, col: usize, row: usize, glyph: char, fg: Color, bg: Color) {
            if col < SCREEN_COLS && row < SCREEN_ROWS {
                self.cells[row * SCREEN_COLS + col] = GridCell { glyph, fg, bg };
                self.writes += 1;
            }
        }

        fn clear(&mut self, bg: Color) {
            self.cells.fill(GridCell { glyph: ' ', fg: Color::Gray, bg });
        }

        fn hold(&mut self, ms: u64) {
            self.held_ms += ms;
        }
    }
}

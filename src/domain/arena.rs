/// Double-density pixel arena.
///
/// The board is 80 columns by 50 logical rows. Each physical text row holds
/// two logical pixels (a "top" and a "bottom" sister) drawn with half-block
/// glyphs. Pixel coordinates are 1-based; row 0 is an off-board sentinel that
/// never renders and never collides.
///
/// The stored color is the only occupancy record: a pixel is occupied when
/// its color differs from the background.

use super::color::Color;
use super::surface::Surface;

pub const ARENA_ROWS: usize = 50;
pub const ARENA_COLS: usize = 80;

const FULL_BLOCK: char = '█';
const UPPER_HALF: char = '▀';
const LOWER_HALF: char = '▄';

#[derive(Clone, Copy, Debug)]
struct Pixel {
    color: Color,
    physical_row: usize,
    sister: isize,
}

pub struct Arena {
    pixels: Vec<Pixel>,
}

fn index(row: usize, col: usize) -> usize {
    row * (ARENA_COLS + 1) + col
}

fn in_bounds(row: usize, col: usize) -> bool {
    (1..=ARENA_ROWS).contains(&row) && (1..=ARENA_COLS).contains(&col)
}

/// Glyph and colors for a physical cell given its (top, bottom) pixels.
///
/// The result depends only on the pair, never on write order. When exactly
/// one half is bright it lands in the foreground.
pub fn compose(top: Color, bottom: Color) -> (char, Color, Color) {
    if top == bottom {
        (FULL_BLOCK, top, bottom)
    } else if bottom.is_bright() && !top.is_bright() {
        (LOWER_HALF, bottom, top)
    } else {
        (UPPER_HALF, top, bottom)
    }
}

impl Arena {
    pub fn new(background: Color) -> Self {
        let mut pixels = Vec::with_capacity((ARENA_ROWS + 1) * (ARENA_COLS + 1));
        for row in 0..=ARENA_ROWS {
            for _col in 0..=ARENA_COLS {
                pixels.push(Pixel {
                    color: background,
                    physical_row: (row + 1) / 2,
                    sister: (row as isize % 2) * 2 - 1,
                });
            }
        }
        Arena { pixels }
    }

    /// Reset every pixel to `background` without drawing anything.
    pub fn clear(&mut self, background: Color) {
        for p in &mut self.pixels {
            p.color = background;
        }
    }

    pub fn query(&self, row: usize, col: usize) -> Option<Color> {
        if row <= ARENA_ROWS && col <= ARENA_COLS {
            Some(self.pixels[index(row, col)].color)
        } else {
            None
        }
    }

    /// Anything that is not background counts, and so does off-board.
    pub fn occupied(&self, row: usize, col: usize, background: Color) -> bool {
        if row == 0 {
            return false;
        }
        if !in_bounds(row, col) {
            return true;
        }
        self.query(row, col) != Some(background)
    }

    /// 1-based text row that shows this pixel.
    pub fn physical_row(&self, row: usize) -> usize {
        (row + 1) / 2
    }

    /// Logical row sharing a text cell with `row`.
    pub fn sister_row(&self, row: usize) -> usize {
        if row % 2 == 1 { row + 1 } else { row - 1 }
    }

    /// Store a pixel color and redraw its text cell.
    ///
    /// Writes to row 0, off-board coordinates, or the bottom-right text cell
    /// are ignored. The last cell would scroll a real console.
    pub fn set(&mut self, surface: &mut dyn Surface, row: usize, col: usize, color: Color) {
        if row == 0 || !in_bounds(row, col) || (row > 48 && col == ARENA_COLS) {
            return;
        }
        self.pixels[index(row, col)].color = color;
        self.render(surface, row, col);
    }

    /// Store a pixel color without drawing. Used for cells painted by other
    /// means, such as the bottom-right corner.
    pub fn mark(&mut self, row: usize, col: usize, color: Color) {
        if row != 0 && in_bounds(row, col) {
            self.pixels[index(row, col)].color = color;
        }
    }

    /// Redraw a pixel's text cell from stored state.
    pub fn repaint(&self, surface: &mut dyn Surface, row: usize, col: usize) {
        if row == 0 || !in_bounds(row, col) || (row > 48 && col == ARENA_COLS) {
            return;
        }
        self.render(surface, row, col);
    }

    fn render(&self, surface: &mut dyn Surface, row: usize, col: usize) {
        let pixel = self.pixels[index(row, col)];
        let sister_row = (row as isize + pixel.sister) as usize;
        let sister = self.pixels[index(sister_row, col)].color;

        let (top, bottom) = if pixel.sister == 1 {
            (pixel.color, sister)
        } else {
            (sister, pixel.color)
        };
        let (glyph, fg, bg) = compose(top, bottom);
        surface.set_cell(col - 1, pixel.physical_row - 1, glyph, fg, bg);
    }
}

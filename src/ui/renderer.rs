/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. The game draws into `front` (an 80×25 grid of Cell) through the
///      `Surface` trait or the text helpers below
///   2. `present()` compares each cell with `back` (what the terminal shows)
///   3. Only changed cells are emitted, batched with `queue!` and flushed once
///   4. `back` becomes a copy of `front`
///
/// `front` is never cleared between presents: the game core draws
/// incrementally and relies on earlier cells staying put.

use std::io::{self, BufWriter, Write};
use std::time::Duration;

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{self, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::color::Color;
use crate::domain::surface::{Surface, SCREEN_COLS, SCREEN_ROWS};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: Color::Gray, bg: Color::Black };

    /// Never produced by drawing, so every position differs from it.
    const INVALID: Cell = Cell { ch: '\0', fg: Color::Black, bg: Color::Black };
}

fn term_color(c: Color) -> style::Color {
    match c {
        Color::Black => style::Color::Black,
        Color::DarkBlue => style::Color::DarkBlue,
        Color::DarkGreen => style::Color::DarkGreen,
        Color::DarkCyan => style::Color::DarkCyan,
        Color::DarkRed => style::Color::DarkRed,
        Color::DarkMagenta => style::Color::DarkMagenta,
        Color::DarkYellow => style::Color::DarkYellow,
        Color::Gray => style::Color::Grey,
        Color::DarkGray => style::Color::DarkGrey,
        Color::Blue => style::Color::Blue,
        Color::Green => style::Color::Green,
        Color::Cyan => style::Color::Cyan,
        Color::Red => style::Color::Red,
        Color::Magenta => style::Color::Magenta,
        Color::Yellow => style::Color::Yellow,
        Color::White => style::Color::White,
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

#[derive(Clone)]
struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    #[cfg(test)]
    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell { ch, fg, bg });
        }
    }

    /// Positions whose cell differs from `other`, row-major.
    fn diff<'a>(&'a self, other: &'a FrameBuffer) -> impl Iterator<Item = (usize, usize, Cell)> + 'a {
        self.cells
            .iter()
            .zip(&other.cells)
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(move |(i, (a, _))| (i % self.width, i / self.width, *a))
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_size: (u16, u16),
    /// First write error seen inside `hold`, reported by the next `present`.
    deferred: Option<io::Error>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(SCREEN_COLS, SCREEN_ROWS),
            back: FrameBuffer::new(SCREEN_COLS, SCREEN_ROWS),
            term_size: (0, 0),
            deferred: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(style::Color::Black),
            Clear(ClearType::All)
        )?;
        self.term_size = terminal::size().unwrap_or((80, 25));
        // Force full repaint on first present.
        self.back.fill(Cell::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Emit every changed cell and remember what the terminal now shows.
    pub fn present(&mut self) -> io::Result<()> {
        if let Some(err) = self.deferred.take() {
            return Err(err);
        }

        let size = terminal::size().unwrap_or(self.term_size);
        if size != self.term_size {
            self.term_size = size;
            self.back.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(style::Color::Black), Clear(ClearType::All))?;
        }

        let mut last_fg = None;
        let mut last_bg = None;
        let mut cursor_at: Option<(usize, usize)> = None;

        for (x, y, cell) in self.front.diff(&self.back) {
            if cursor_at != Some((x, y)) {
                queue!(self.writer, MoveTo(x as u16, y as u16))?;
            }
            if last_fg != Some(cell.fg) {
                queue!(self.writer, SetForegroundColor(term_color(cell.fg)))?;
                last_fg = Some(cell.fg);
            }
            if last_bg != Some(cell.bg) {
                queue!(self.writer, SetBackgroundColor(term_color(cell.bg)))?;
                last_bg = Some(cell.bg);
            }
            queue!(self.writer, Print(cell.ch))?;
            cursor_at = Some((x + 1, y));
        }
        self.writer.flush()?;

        self.back.cells.copy_from_slice(&self.front.cells);
        Ok(())
    }

    // ── Text helpers (0-based columns and rows) ──

    pub fn put_str(&mut self, col: usize, row: usize, text: &str, fg: Color, bg: Color) {
        self.front.put_str(col, row, text, fg, bg);
    }

    /// Column that centers `text` on an 80-column row.
    pub fn center_col(text: &str) -> usize {
        (SCREEN_COLS / 2).saturating_sub(text.chars().count() / 2 + 1)
    }

    pub fn center(&mut self, row: usize, text: &str, fg: Color, bg: Color) {
        self.put_str(Self::center_col(text), row, text, fg, bg);
    }

    /// Score line: Jake on the left in two-player games, Sammy on the right.
    pub fn print_score(&mut self, players: usize, scores: [i32; 2], lives: [u32; 2], bg: Color) {
        if players == 2 {
            let jake = format!("{:>7}  Lives: {}  <--JAKE", scores[1], lives[1]);
            self.put_str(0, 0, &jake, Color::White, bg);
        }
        let sammy = format!("SAMMY-->  Lives: {}     {:>7}", lives[0], scores[0]);
        self.put_str(48, 0, &sammy, Color::White, bg);
    }

    /// Framed box of centered lines using half-block edges.
    pub fn dialog(&mut self, top_row: usize, lines: &[&str], fg: Color, bg: Color) {
        const INNER: usize = 31;
        let top = format!("█{}█", "▀".repeat(INNER));
        let bottom = format!("█{}█", "▄".repeat(INNER));
        self.center(top_row, &top, fg, bg);
        for (i, line) in lines.iter().enumerate() {
            let row = format!("█{:^width$}█", line, width = INNER);
            self.center(top_row + 1 + i, &row, fg, bg);
        }
        self.center(top_row + 1 + lines.len(), &bottom, fg, bg);
    }

    /// Message box with left-aligned text, clipped to fit.
    pub fn message_box(&mut self, top_row: usize, text: &str, fg: Color, bg: Color) {
        let clipped: String = text.chars().chain(std::iter::repeat(' ')).take(29).collect();
        let top = format!("█{}█", "▀".repeat(31));
        let bottom = format!("█{}█", "▄".repeat(31));
        self.center(top_row, &top, fg, bg);
        self.center(top_row + 1, &format!("█ {clipped} █"), fg, bg);
        self.center(top_row + 2, &bottom, fg, bg);
    }

    #[cfg(test)]
    fn text_at(&self, row: usize) -> String {
        (0..SCREEN_COLS).map(|c| self.front.get(c, row).ch).collect()
    }
}

/// Put the terminal back before a panic message is printed.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = execute!(io::stdout(), ResetColor, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
        default_hook(info);
    }));
}

impl Surface for Renderer {
    fn set_cell(&mut self, col: usize, row: usize, glyph: char, fg: Color, bg: Color) {
        self.front.set(col, row, Cell { ch: glyph, fg, bg });
    }

    fn clear(&mut self, bg: Color) {
        self.front.fill(Cell { ch: ' ', fg: Color::Gray, bg });
    }

    fn hold(&mut self, ms: u64) {
        if self.deferred.is_none() {
            if let Err(err) = self.present() {
                self.deferred = Some(err);
            }
        }
        std::thread::sleep(Duration::from_millis(ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_reports_only_changed_cells() {
        let mut a = FrameBuffer::new(4, 2);
        let b = a.clone();
        a.set(1, 1, Cell { ch: 'x', fg: Color::Red, bg: Color::Black });
        a.set(3, 0, Cell { ch: 'y', fg: Color::Red, bg: Color::Black });
        let changed: Vec<_> = a.diff(&b).map(|(x, y, c)| (x, y, c.ch)).collect();
        assert_eq!(changed, vec![(3, 0, 'y'), (1, 1, 'x')]);
    }

    #[test]
    fn put_str_clips_at_edge() {
        let mut fb = FrameBuffer::new(5, 1);
        fb.put_str(3, 0, "abc", Color::White, Color::Black);
        assert_eq!(fb.get(3, 0).ch, 'a');
        assert_eq!(fb.get(4, 0).ch, 'b');
    }

    #[test]
    fn score_line_layout() {
        let mut r = Renderer::new();
        r.print_score(2, [12, 7], [5, 3], Color::DarkBlue);
        let row = r.text_at(0);
        assert!(row.starts_with("      7  Lives: 3  <--JAKE"));
        assert_eq!(row[48..].trim_end(), format!("SAMMY-->  Lives: 5     {:>7}", 12));
    }

    #[test]
    fn single_player_score_leaves_left_blank() {
        let mut r = Renderer::new();
        r.print_score(1, [0, 0], [5, 5], Color::DarkBlue);
        assert!(r.text_at(0)[..26].trim().is_empty());
    }

    #[test]
    fn centered_text_matches_console_layout() {
        assert_eq!(Renderer::center_col("Press any key to continue"), 27);
        let box_row = format!("█{}█", "▀".repeat(31));
        assert_eq!(Renderer::center_col(&box_row), 23);
    }

    #[test]
    fn message_box_pads_and_clips() {
        let mut r = Renderer::new();
        r.message_box(10, " Level 1, Push Space", Color::White, Color::DarkRed);
        let row: String = r.text_at(11).chars().skip(23).take(33).collect();
        assert_eq!(row.chars().count(), 33);
        assert!(row.starts_with("█  Level 1, Push Space"));
        assert!(row.ends_with(" █"));

        r.message_box(10, &"x".repeat(40), Color::White, Color::DarkRed);
        let row: String = r.text_at(11).chars().skip(23).take(33).collect();
        assert_eq!(row, format!("█ {} █", "x".repeat(29)));
    }

    #[test]
    fn dialog_centers_lines() {
        let mut r = Renderer::new();
        r.dialog(9, &["G A M E   O V E R"], Color::White, Color::DarkRed);
        let row: String = r.text_at(10).chars().skip(23).take(33).collect();
        assert_eq!(row, "█       G A M E   O V E R       █");
    }
}

/// Color schemes for the two monitor types offered at setup.

use super::color::Color;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ColorScheme {
    pub sammy: Color,
    pub jake: Color,
    pub walls: Color,
    pub background: Color,
    pub dialog_fg: Color,
    pub dialog_bg: Color,
}

impl ColorScheme {
    pub fn color() -> Self {
        ColorScheme {
            sammy: Color::Yellow,
            jake: Color::Magenta,
            walls: Color::Red,
            background: Color::DarkBlue,
            dialog_fg: Color::White,
            dialog_bg: Color::DarkRed,
        }
    }

    pub fn monochrome() -> Self {
        ColorScheme {
            sammy: Color::White,
            jake: Color::Gray,
            walls: Color::Gray,
            background: Color::Black,
            dialog_fg: Color::White,
            dialog_bg: Color::Black,
        }
    }

    pub fn for_monitor(monochrome: bool) -> Self {
        if monochrome { Self::monochrome() } else { Self::color() }
    }
}

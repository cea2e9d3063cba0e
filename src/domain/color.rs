/// The 16-color text-mode palette.
///
/// Order matches the classic console attribute ordinals: the first eight
/// entries are the dark half, the last eight the bright half.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Color {
    Black,
    DarkBlue,
    DarkGreen,
    DarkCyan,
    DarkRed,
    DarkMagenta,
    DarkYellow,
    Gray,
    DarkGray,
    Blue,
    Green,
    Cyan,
    Red,
    Magenta,
    Yellow,
    White,
}

impl Color {
    #[cfg(test)]
    pub const ALL: [Color; 16] = [
        Color::Black,
        Color::DarkBlue,
        Color::DarkGreen,
        Color::DarkCyan,
        Color::DarkRed,
        Color::DarkMagenta,
        Color::DarkYellow,
        Color::Gray,
        Color::DarkGray,
        Color::Blue,
        Color::Green,
        Color::Cyan,
        Color::Red,
        Color::Magenta,
        Color::Yellow,
        Color::White,
    ];

    /// Bright colors can be drawn as foreground only; the half-block
    /// compositor keeps them out of the background slot when it can.
    pub fn is_bright(self) -> bool {
        matches!(
            self,
            Color::DarkGray
                | Color::Blue
                | Color::Green
                | Color::Cyan
                | Color::Red
                | Color::Magenta
                | Color::Yellow
                | Color::White
        )
    }
}

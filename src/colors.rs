/// The 16 symbolic colors, ordered by their palette index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Color {
    Black,
    DarkRed,
    DarkGreen,
    DarkYellow,
    DarkBlue,
    DarkMagenta,
    DarkCyan,
    Gray,
    DarkGray,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Color {
    pub const ALL: [Color; 16] = [
        Color::Black,
        Color::DarkRed,
        Color::DarkGreen,
        Color::DarkYellow,
        Color::DarkBlue,
        Color::DarkMagenta,
        Color::DarkCyan,
        Color::Gray,
        Color::DarkGray,
        Color::Red,
        Color::Green,
        Color::Yellow,
        Color::Blue,
        Color::Magenta,
        Color::Cyan,
        Color::White,
    ];

    pub fn from_index(index: u16) -> Option<Color> {
        Self::ALL.get(index as usize).copied()
    }

    /// 8-bit channels.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Color::Black => (0x00, 0x00, 0x00),
            Color::DarkRed => (0x80, 0x00, 0x00),
            Color::DarkGreen => (0x00, 0x80, 0x00),
            Color::DarkYellow => (0x80, 0x80, 0x00),
            Color::DarkBlue => (0x00, 0x00, 0x80),
            Color::DarkMagenta => (0x80, 0x00, 0x80),
            Color::DarkCyan => (0x00, 0x80, 0x80),
            Color::Gray => (0xC0, 0xC0, 0xC0),
            Color::DarkGray => (0x80, 0x80, 0x80),
            Color::Red => (0xFF, 0x00, 0x00),
            Color::Green => (0x00, 0xFF, 0x00),
            Color::Yellow => (0xFF, 0xFF, 0x00),
            Color::Blue => (0x00, 0x00, 0xFF),
            Color::Magenta => (0xFF, 0x00, 0xFF),
            Color::Cyan => (0x00, 0xFF, 0xFF),
            Color::White => (0xFF, 0xFF, 0xFF),
        }
    }

    /// Palette index when `rgb` is false, RGB565 otherwise.
    pub fn pack(self, rgb: bool) -> u16 {
        if rgb {
            let (r, g, b) = self.rgb();
            ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3)
        } else {
            self as u16
        }
    }
}

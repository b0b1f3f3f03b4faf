// Terminal color capability adaptation
// Keeps the board palette consistent across truecolor, 256-color and
// basic 16-color terminals

use ratatui::style::Color;
use term_color_support::ColorSupport;

/// Campbell-style RGB sample and a stable 256-color index for each ANSI
/// color the UI uses. Colors outside the table pass through unchanged.
fn palette(c: Color) -> Option<((u8, u8, u8), u8)> {
    match c {
        Color::Black => Some(((12, 12, 12), 232)),
        Color::Red => Some(((197, 15, 31), 160)),
        Color::Green => Some(((19, 161, 14), 28)),
        Color::Yellow => Some(((193, 156, 0), 178)),
        Color::Blue => Some(((0, 55, 218), 20)),
        Color::Gray => Some(((204, 204, 204), 250)),
        Color::DarkGray => Some(((118, 118, 118), 243)),
        Color::LightBlue => Some(((59, 120, 255), 63)),
        Color::White => Some(((242, 242, 242), 255)),
        _ => None,
    }
}

/// Extension trait resolving an ANSI color to the richest representation
/// the current terminal supports.
pub trait TermTone {
    fn tone(self) -> Color;
}

impl TermTone for Color {
    fn tone(self) -> Color {
        let Some(((r, g, b), index256)) = palette(self) else {
            return self;
        };
        let support = ColorSupport::stdout();
        if support.has_16m {
            Color::Rgb(r, g, b)
        } else if support.has_256 {
            Color::Indexed(index256)
        } else {
            self
        }
    }
}

//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::render::Tone;
use crate::tui::notify::NoticeKind;

/// Focused field and header accents
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Delete confirmation and errors
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
/// Success notices
pub const DARK_GREEN: Color = Color::Rgb(0, 80, 0);
/// Info notices and the details overlay
pub const DARK_PURPLE: Color = Color::Rgb(86, 60, 92);

pub fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Neutral => Color::Gray,
        Tone::Pending => Color::White,
        Tone::Active => Color::Cyan,
        Tone::Success => Color::Green,
        Tone::Calm => Color::Blue,
        Tone::Warning => Color::Yellow,
        Tone::Danger => Color::Red,
    }
}

pub fn notice_color(kind: NoticeKind) -> Color {
    match kind {
        NoticeKind::Success => DARK_GREEN,
        NoticeKind::Error => DARK_RED,
        NoticeKind::Info => DARK_PURPLE,
    }
}

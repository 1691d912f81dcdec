pub mod ascii;
pub mod braille;
pub mod halfblock;
pub mod surface;

pub use surface::{CompositeMode, Hsla, Rgba, Surface};

use crossterm::style::Color;

/// How to render sub-cell pixels to terminal characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RenderMode {
    /// Unicode braille characters (2x4 per cell = highest resolution)
    Braille,
    /// Half-block characters ▀▄█ (1x2 per cell)
    HalfBlock,
    /// Plain ASCII characters with density mapping
    Ascii,
}

/// Color output mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorMode {
    /// No color — monochrome
    Mono,
    /// ANSI 16 colors
    Ansi16,
    /// 256-color palette
    Ansi256,
    /// 24-bit true color (RGB)
    TrueColor,
}

/// Surface dimensions, in sub-cell pixels, needed to fill a terminal of
/// `term_cols` x `term_rows` cells under the given render mode.
pub fn pixel_dims(mode: RenderMode, term_cols: usize, term_rows: usize) -> (usize, usize) {
    match mode {
        RenderMode::Braille => (term_cols * 2, term_rows * 4),
        RenderMode::HalfBlock => (term_cols, term_rows * 2),
        RenderMode::Ascii => (term_cols, term_rows),
    }
}

/// Render the surface to a string buffer for output.
pub fn render(surface: &Surface, mode: RenderMode, color_mode: ColorMode, color_quant: u8) -> String {
    match mode {
        RenderMode::Braille => braille::render(surface, color_mode, color_quant),
        RenderMode::HalfBlock => halfblock::render(surface, color_mode, color_quant),
        RenderMode::Ascii => ascii::render(surface, color_mode, color_quant),
    }
}

pub fn map_color(color_mode: ColorMode, color_quant: u8, r: u8, g: u8, b: u8) -> Color {
    // Apply color quantization if enabled (reduces unique colors for better dedup)
    let (r, g, b) = if color_quant > 1 {
        let q = color_quant as u16;
        (
            ((r as u16 + q / 2) / q * q).min(255) as u8,
            ((g as u16 + q / 2) / q * q).min(255) as u8,
            ((b as u16 + q / 2) / q * q).min(255) as u8,
        )
    } else {
        (r, g, b)
    };
    match color_mode {
        ColorMode::Mono => Color::White,
        ColorMode::TrueColor => Color::Rgb { r, g, b },
        ColorMode::Ansi256 => {
            // Approximate RGB to 256-color
            let idx = 16 + (36 * (r as u16 / 51)) + (6 * (g as u16 / 51)) + (b as u16 / 51);
            Color::AnsiValue(idx as u8)
        }
        ColorMode::Ansi16 => {
            // Simple mapping to basic colors
            let brightness = (r as u16 + g as u16 + b as u16) / 3;
            if brightness < 64 {
                Color::Black
            } else if r > g && r > b {
                if brightness > 180 {
                    Color::Red
                } else {
                    Color::DarkRed
                }
            } else if g > r && g > b {
                if brightness > 180 {
                    Color::Green
                } else {
                    Color::DarkGreen
                }
            } else if b > r && b > g {
                if brightness > 180 {
                    Color::Blue
                } else {
                    Color::DarkBlue
                }
            } else if brightness > 180 {
                Color::White
            } else {
                Color::Grey
            }
        }
    }
}

pub fn color_to_fg(color: Color) -> String {
    match color {
        Color::Rgb { r, g, b } => format!("38;2;{};{};{}", r, g, b),
        Color::AnsiValue(v) => format!("38;5;{}", v),
        Color::Black => "30".into(),
        Color::DarkRed => "31".into(),
        Color::DarkGreen => "32".into(),
        Color::DarkYellow => "33".into(),
        Color::DarkBlue => "34".into(),
        Color::DarkMagenta => "35".into(),
        Color::DarkCyan => "36".into(),
        Color::Grey => "37".into(),
        Color::DarkGrey => "90".into(),
        Color::Red => "91".into(),
        Color::Green => "92".into(),
        Color::Yellow => "93".into(),
        Color::Blue => "94".into(),
        Color::Magenta => "95".into(),
        Color::Cyan => "96".into(),
        Color::White => "97".into(),
        _ => "37".into(),
    }
}

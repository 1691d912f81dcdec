use super::{ColorMode, Surface, color_to_fg, map_color};
use crossterm::style::Color;

fn color_to_bg(color: Color) -> String {
    match color {
        Color::Rgb { r, g, b } => format!("48;2;{};{};{}", r, g, b),
        Color::AnsiValue(v) => format!("48;5;{}", v),
        Color::Black => "40".into(),
        Color::DarkRed => "41".into(),
        Color::DarkGreen => "42".into(),
        Color::DarkYellow => "43".into(),
        Color::DarkBlue => "44".into(),
        Color::DarkMagenta => "45".into(),
        Color::DarkCyan => "46".into(),
        Color::Grey => "47".into(),
        Color::DarkGrey => "100".into(),
        Color::Red => "101".into(),
        Color::Green => "102".into(),
        Color::Yellow => "103".into(),
        Color::Blue => "104".into(),
        Color::Magenta => "105".into(),
        Color::Cyan => "106".into(),
        Color::White => "107".into(),
        _ => "40".into(),
    }
}

/// Luma below which a half-block cell is treated as background (dark/empty).
/// Premultiplied channels already carry the pixel's brightness, so the cell
/// color is read straight from the buffer; this cutoff only decides when a
/// cell counts as empty. Kept just above zero so faint glow tails survive.
const DARK_THRESHOLD: f64 = 0.02;

pub fn render(surface: &Surface, color_mode: ColorMode, color_quant: u8) -> String {
    let term_cols = surface.width();
    let term_rows = surface.height() / 2;
    let mut out = String::with_capacity(term_cols * term_rows * 10);

    let mut last_fg = String::new();
    let mut last_bg = String::new();
    let mut in_color = false;

    for row in 0..term_rows {
        for col in 0..term_cols {
            let top = surface.pixel(col, row * 2);
            let bot = surface.pixel(col, row * 2 + 1);

            let top_dark = top.luma() < DARK_THRESHOLD;
            let bot_dark = bot.luma() < DARK_THRESHOLD;

            if color_mode == ColorMode::Mono {
                match (!top_dark, !bot_dark) {
                    (true, true) => out.push('█'),
                    (true, false) => out.push('▀'),
                    (false, true) => out.push('▄'),
                    (false, false) => out.push(' '),
                }
            } else if top_dark && bot_dark {
                // Both pixels dark — just emit space, reset color if needed
                if in_color {
                    out.push_str("\x1b[0m");
                    in_color = false;
                    last_fg.clear();
                    last_bg.clear();
                }
                out.push(' ');
            } else {
                let (tr, tg, tb) = top.rgb8();
                let (br, bg, bb) = bot.rgb8();

                let top_color = map_color(color_mode, color_quant, tr, tg, tb);
                let bot_color = map_color(color_mode, color_quant, br, bg, bb);

                let fg = color_to_fg(top_color);
                let bg_s = color_to_bg(bot_color);

                let fg_changed = fg != last_fg;
                let bg_changed = bg_s != last_bg;

                if fg_changed && bg_changed {
                    out.push_str("\x1b[");
                    out.push_str(&fg);
                    out.push(';');
                    out.push_str(&bg_s);
                    out.push('m');
                } else if fg_changed {
                    out.push_str("\x1b[");
                    out.push_str(&fg);
                    out.push('m');
                } else if bg_changed {
                    out.push_str("\x1b[");
                    out.push_str(&bg_s);
                    out.push('m');
                }

                if fg_changed {
                    last_fg = fg;
                }
                if bg_changed {
                    last_bg = bg_s;
                }
                in_color = true;

                out.push('▀');
            }
        }
        // Reset at end of row
        if in_color {
            out.push_str("\x1b[0m");
            in_color = false;
            last_fg.clear();
            last_bg.clear();
        }
        // Move to next row
        out.push_str("\x1b[");
        let next_row = row + 2;
        out.push_str(&next_row.to_string());
        out.push_str(";1H");
    }
    out
}

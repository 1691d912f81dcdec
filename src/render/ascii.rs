use super::{ColorMode, Surface, color_to_fg, map_color};

const CHARS: &[u8] = b" .:-=+*#%@";

pub fn render(surface: &Surface, color_mode: ColorMode, color_quant: u8) -> String {
    let cols = surface.width();
    let rows = surface.height();
    let mut out = String::with_capacity(cols * rows * 10);
    let use_color = color_mode != ColorMode::Mono;
    let mut last_fg = String::new();

    for row in 0..rows {
        for col in 0..cols {
            let pixel = surface.pixel(col, row);
            let v = pixel.luma().clamp(0.0, 1.0);
            let ci = (v * (CHARS.len() - 1) as f64) as usize;
            let ch = CHARS[ci] as char;

            if use_color {
                let (r, g, b) = pixel.rgb8();
                let color = map_color(color_mode, color_quant, r, g, b);
                let fg = color_to_fg(color);
                if fg != last_fg {
                    out.push_str("\x1b[");
                    out.push_str(&fg);
                    out.push('m');
                    last_fg = fg;
                }
            }
            out.push(ch);
        }
        out.push_str("\x1b[0m\x1b[");
        let next_row = row + 2;
        out.push_str(&next_row.to_string());
        out.push_str(";1H");
        last_fg.clear();
    }
    out
}

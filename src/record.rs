use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use crossterm::{cursor, execute, terminal};

/// A single recorded frame with its timestamp.
struct Frame {
    timestamp_ms: u64,
    content: String,
}

/// Captures rendered frames with timestamps for later playback.
pub struct Recorder {
    frames: Vec<Frame>,
    term_cols: u16,
    term_rows: u16,
    start: Instant,
}

impl Recorder {
    /// Create a new Recorder for a terminal of the given size.
    pub fn new(term_cols: u16, term_rows: u16) -> Self {
        Recorder {
            frames: Vec::new(),
            term_cols,
            term_rows,
            start: Instant::now(),
        }
    }

    /// Record a rendered frame.
    pub fn capture(&mut self, content: &str) {
        let timestamp_ms = self.start.elapsed().as_millis() as u64;
        self.frames.push(Frame {
            timestamp_ms,
            content: content.to_string(),
        });
    }

    /// Save recorded frames to a .glowanim file.
    ///
    /// Format:
    /// ```text
    /// GLOWFIELD v1
    /// FRAMES <count>
    /// SIZE <cols> <rows>
    /// ---
    /// T <timestamp_ms>
    /// <frame content (base64 encoded)>
    /// ---
    /// ...
    /// ```
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "GLOWFIELD v1")?;
        writeln!(writer, "FRAMES {}", self.frames.len())?;
        writeln!(writer, "SIZE {} {}", self.term_cols, self.term_rows)?;

        for frame in &self.frames {
            writeln!(writer, "---")?;
            writeln!(writer, "T {}", frame.timestamp_ms)?;
            // Base64 encode frame content to avoid delimiter conflicts
            let encoded = base64_encode(frame.content.as_bytes());
            writeln!(writer, "{}", encoded)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Number of frames recorded.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

/// Plays back a recorded .glowanim file.
pub struct Player {
    frames: Vec<Frame>,
    term_cols: u16,
    term_rows: u16,
}

impl Player {
    /// Load a .glowanim file for playback.
    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header = lines
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "Missing header"))??;
        if !header.starts_with("GLOWFIELD v1") {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid header: {}", header),
            ));
        }

        let frame_count_line = lines
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "Missing frame count"))??;
        let _frame_count: usize = frame_count_line
            .strip_prefix("FRAMES ")
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "Invalid frame count"))?;

        let size_line = lines
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "Missing size"))??;
        let (term_cols, term_rows) = size_line
            .strip_prefix("SIZE ")
            .and_then(|s| s.split_once(' '))
            .and_then(|(c, r)| Some((c.parse().ok()?, r.parse().ok()?)))
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "Invalid size"))?;

        let mut frames = Vec::new();

        while let Some(line) = lines.next() {
            let line = line?;
            if line != "---" {
                continue;
            }

            let t_line = lines.next().ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "Missing timestamp")
            })??;
            let timestamp_ms: u64 = t_line
                .strip_prefix("T ")
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "Invalid timestamp"))?;

            let encoded = lines.next().ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "Missing frame content")
            })??;

            let content_bytes = base64_decode(&encoded).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Base64 decode error: {}", e),
                )
            })?;
            let content = String::from_utf8(content_bytes).map_err(|e| {
                io::Error::new(io::ErrorKind::InvalidData, format!("UTF-8 error: {}", e))
            })?;

            frames.push(Frame {
                timestamp_ms,
                content,
            });
        }

        Ok(Player {
            frames,
            term_cols,
            term_rows,
        })
    }

    /// Terminal size the recording was captured at.
    pub fn size(&self) -> (u16, u16) {
        (self.term_cols, self.term_rows)
    }

    /// Play back the recording to the terminal.
    pub fn play(&self) -> io::Result<()> {
        if self.frames.is_empty() {
            println!("No frames to play.");
            return Ok(());
        }

        let (rec_cols, rec_rows) = self.size();
        if let Ok((cols, rows)) = terminal::size()
            && (cols < rec_cols || rows < rec_rows)
        {
            eprintln!(
                "Warning: recorded at {}x{}, terminal is {}x{}; frames may clip",
                rec_cols, rec_rows, cols, rows
            );
            std::thread::sleep(Duration::from_millis(1500));
        }

        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)?;

        let start = Instant::now();

        for frame in &self.frames {
            // Wait until the correct time
            let target = Duration::from_millis(frame.timestamp_ms);
            let elapsed = start.elapsed();
            if target > elapsed {
                std::thread::sleep(target - elapsed);
            }

            // Check for quit
            if crossterm::event::poll(Duration::ZERO)?
                && let crossterm::event::Event::Key(key) = crossterm::event::read()?
                && matches!(
                    key.code,
                    crossterm::event::KeyCode::Char('q') | crossterm::event::KeyCode::Esc
                )
            {
                break;
            }

            execute!(stdout, cursor::MoveTo(0, 0))?;
            stdout.write_all(frame.content.as_bytes())?;
            stdout.flush()?;
        }

        execute!(stdout, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()?;

        println!(
            "Playback complete: {} frames, {:.1}s",
            self.frames.len(),
            self.frames.last().map_or(0, |f| f.timestamp_ms) as f64 / 1000.0
        );

        Ok(())
    }
}

// Simple base64 encoder/decoder (no external dependency needed)

const B64_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Reverse lookup: byte value -> 6-bit value, 0xFF for invalid bytes.
const B64_REV: [u8; 256] = {
    let mut table = [0xFF_u8; 256];
    let mut i = 0;
    while i < B64_CHARS.len() {
        table[B64_CHARS[i] as usize] = i as u8;
        i += 1;
    }
    table
};

fn base64_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(3) * 4);
    for chunk in data.chunks(3) {
        let mut triple = (chunk[0] as u32) << 16;
        if let Some(&b) = chunk.get(1) {
            triple |= (b as u32) << 8;
        }
        if let Some(&b) = chunk.get(2) {
            triple |= b as u32;
        }

        out.push(B64_CHARS[(triple >> 18 & 0x3F) as usize] as char);
        out.push(B64_CHARS[(triple >> 12 & 0x3F) as usize] as char);
        out.push(if chunk.len() > 1 {
            B64_CHARS[(triple >> 6 & 0x3F) as usize] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            B64_CHARS[(triple & 0x3F) as usize] as char
        } else {
            '='
        });
    }
    out
}

fn base64_decode(data: &str) -> Result<Vec<u8>, String> {
    let bytes: Vec<u8> = data.bytes().filter(|&b| b != b'\n' && b != b'\r').collect();
    if !bytes.len().is_multiple_of(4) {
        return Err("Invalid base64 length".to_string());
    }

    let mut out = Vec::with_capacity(bytes.len() / 4 * 3);

    for chunk in bytes.chunks(4) {
        let mut triple = 0u32;
        let mut pad = 0;
        for (i, &byte) in chunk.iter().enumerate() {
            let val = if byte == b'=' && i >= 2 {
                pad += 1;
                0
            } else {
                let v = B64_REV[byte as usize];
                if v == 0xFF {
                    return Err(format!("Invalid base64 character: {}", byte as char));
                }
                v as u32
            };
            triple = (triple << 6) | val;
        }

        out.push((triple >> 16) as u8);
        if pad < 2 {
            out.push((triple >> 8) as u8);
        }
        if pad < 1 {
            out.push(triple as u8);
        }
    }

    Ok(out)
}

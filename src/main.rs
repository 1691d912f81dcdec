mod animations;
mod config;
mod external;
mod frame_loop;
mod random;
mod record;
mod render;
mod scheduler;

use std::cell::RefCell;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    cursor, execute, terminal,
    event::{self, Event, KeyCode, KeyEvent},
};

use animations::circles::CircleField;
use external::ParamsSource;
use frame_loop::FrameLoop;
use random::ThreadRandomness;
use render::{ColorMode, RenderMode, Surface};
use scheduler::{RefreshScheduler, StepScheduler};

#[derive(Parser)]
#[command(
    name = "glowfield",
    about = "Drifting glow circles over a procedural nebula backdrop"
)]
struct Cli {
    /// Base hue for the backdrop palette, in degrees (250 violet, 190 teal)
    #[arg(long)]
    hue: Option<f64>,

    /// Render mode
    #[arg(short, long, value_enum)]
    render: Option<RenderMode>,

    /// Color mode
    #[arg(short, long, value_enum)]
    color: Option<ColorMode>,

    /// Target FPS (1-120)
    #[arg(short, long)]
    fps: Option<u32>,

    /// Color quantization step (0 = off, 4/8/16 = coarser colors, less output)
    #[arg(long)]
    quant: Option<u8>,

    /// Hide the status bar for pure animation mode
    #[arg(long)]
    clean: bool,

    /// Record the session to a .glowanim file
    #[arg(long)]
    record: Option<String>,

    /// Play back a recorded .glowanim file
    #[arg(long)]
    play: Option<String>,

    /// Watch a JSON file for live parameter updates
    #[arg(long)]
    params: Option<PathBuf>,

    /// Read JSON parameter updates from stdin
    #[arg(long)]
    params_stdin: bool,

    /// Print the config file path and exit
    #[arg(long)]
    show_config: bool,

    /// Write a commented default config file and exit
    #[arg(long)]
    init_config: bool,
}

/// Settings after CLI > config file > defaults resolution.
struct Settings {
    base_hue: f64,
    render_mode: RenderMode,
    color_mode: ColorMode,
    fps: u32,
    hide_status: bool,
    color_quant: u8,
    record: Option<String>,
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();

    // Playback mode
    if let Some(ref path) = cli.play {
        let player = record::Player::load(path)?;
        return player.play();
    }

    if cli.show_config {
        match config::config_path() {
            Some(path) => {
                println!("Config file: {}", path.display());
                if !path.exists() {
                    println!("(not created yet — run with --init-config)");
                }
            }
            None => println!("No config directory available on this platform"),
        }
        return Ok(());
    }

    if cli.init_config {
        let Some(path) = config::config_path() else {
            eprintln!("No config directory available on this platform");
            return Ok(());
        };
        if path.exists() {
            println!("Config already exists: {}", path.display());
            return Ok(());
        }
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&path, config::default_config_string())?;
        println!("Created {}", path.display());
        return Ok(());
    }

    let cfg = config::load_config();
    let settings = Settings {
        base_hue: cli.hue.or(cfg.hue).unwrap_or(animations::BASE_HUE_DEFAULT),
        render_mode: cli
            .render
            .or(cfg.render.map(Into::into))
            .unwrap_or(RenderMode::HalfBlock),
        color_mode: cli
            .color
            .or(cfg.color.map(Into::into))
            .unwrap_or(ColorMode::TrueColor),
        fps: cli.fps.or(cfg.fps).unwrap_or(60).clamp(1, 120),
        hide_status: cli.clean || cfg.clean.unwrap_or(false),
        color_quant: cli.quant.or(cfg.color_quant).unwrap_or(0),
        record: cli.record.clone(),
    };

    let ext_rx = if cli.params_stdin {
        Some(external::spawn_reader(ParamsSource::Stdin))
    } else {
        cli.params
            .clone()
            .map(|p| external::spawn_reader(ParamsSource::File(p)))
    };

    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)?;

    let mut writer = BufWriter::with_capacity(256 * 1024, stdout);
    let result = run_loop(&mut writer, settings, ext_rx);

    // Cleanup
    execute!(writer, cursor::Show, terminal::LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;

    result
}

const RENDER_MODES: [RenderMode; 3] = [
    RenderMode::Braille,
    RenderMode::HalfBlock,
    RenderMode::Ascii,
];
const COLOR_MODES: [ColorMode; 4] = [
    ColorMode::TrueColor,
    ColorMode::Ansi256,
    ColorMode::Ansi16,
    ColorMode::Mono,
];

/// One animation instance wired to the shared scheduler: the frame loop,
/// and the canvas it paints that the render pass reads back.
struct Scene {
    frame_loop: FrameLoop,
    canvas: Rc<RefCell<Surface>>,
    sprite_count: usize,
}

fn build_scene(
    scheduler: &Rc<StepScheduler>,
    term_cols: usize,
    display_rows: usize,
    render_mode: RenderMode,
    base_hue: f64,
) -> Scene {
    let (px_w, px_h) = render::pixel_dims(render_mode, term_cols, display_rows);
    let background = Rc::new(RefCell::new(Surface::new(px_w, px_h)));
    let canvas = Rc::new(RefCell::new(Surface::new(px_w, px_h)));
    let field = CircleField::new(
        base_hue,
        background,
        Rc::clone(&canvas),
        Box::new(ThreadRandomness::new()),
    );
    let sprite_count = field.sprite_count();
    let frame_loop = FrameLoop::new(
        Rc::clone(scheduler) as Rc<dyn RefreshScheduler>,
        Box::new(field),
    );
    Scene {
        frame_loop,
        canvas,
        sprite_count,
    }
}

fn parse_render_mode(name: &str) -> Option<RenderMode> {
    match name {
        "braille" => Some(RenderMode::Braille),
        "half-block" | "halfblock" => Some(RenderMode::HalfBlock),
        "ascii" => Some(RenderMode::Ascii),
        _ => None,
    }
}

fn parse_color_mode(name: &str) -> Option<ColorMode> {
    match name {
        "mono" => Some(ColorMode::Mono),
        "ansi16" => Some(ColorMode::Ansi16),
        "ansi256" => Some(ColorMode::Ansi256),
        "true-color" | "truecolor" => Some(ColorMode::TrueColor),
        _ => None,
    }
}

fn run_loop(
    stdout: &mut BufWriter<io::Stdout>,
    settings: Settings,
    ext_rx: Option<std::sync::mpsc::Receiver<external::ExternalParams>>,
) -> io::Result<()> {
    let (mut cols, mut rows) = terminal::size()?;
    if cols < 10 || rows < 5 {
        return Err(io::Error::other(format!(
            "terminal too small: {}x{} (minimum 10x5)",
            cols, rows
        )));
    }

    let mut base_hue = settings.base_hue;
    let mut render_mode = settings.render_mode;
    let mut color_mode = settings.color_mode;
    let mut hide_status = settings.hide_status;
    let mut fps = settings.fps;
    let mut frame_dur = Duration::from_secs_f64(1.0 / fps as f64);
    let color_quant = settings.color_quant;

    // Reserve 1 row for the status bar
    let display_rows = if hide_status {
        rows as usize
    } else {
        (rows as usize).saturating_sub(1)
    };

    let scheduler = Rc::new(StepScheduler::new());
    let epoch = Instant::now();
    let mut scene = build_scene(&scheduler, cols as usize, display_rows, render_mode, base_hue);

    let mut ext_state = external::CurrentState::default();

    let mut frame_count: u64 = 0;
    let mut actual_fps: f64 = 0.0;
    let mut fps_update = Instant::now();

    // Recording support
    let mut recorder = settings
        .record
        .as_ref()
        .map(|_| record::Recorder::new(cols, rows));

    // Track if we need to rebuild the scene
    let mut rebuild_scene = false;

    loop {
        // Handle input (non-blocking)
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Resize(w, h) => {
                    if w >= 10 && h >= 5 {
                        cols = w;
                        rows = h;
                        rebuild_scene = true;
                    }
                }
                Event::Key(KeyEvent { code, .. }) => match code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        scene.frame_loop.stop();
                        // Save recording if active
                        if let (Some(rec), Some(path)) = (recorder.take(), &settings.record) {
                            execute!(stdout, cursor::Show, terminal::LeaveAlternateScreen)?;
                            terminal::disable_raw_mode()?;
                            rec.save(path)?;
                            println!("Saved {} frames to {}", rec.frame_count(), path);
                            terminal::enable_raw_mode()?;
                            execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)?;
                        }
                        return Ok(());
                    }
                    // Cycle render mode
                    KeyCode::Char('r') => {
                        let idx = RENDER_MODES
                            .iter()
                            .position(|&m| m == render_mode)
                            .unwrap_or(0);
                        render_mode = RENDER_MODES[(idx + 1) % RENDER_MODES.len()];
                        rebuild_scene = true;
                    }
                    // Cycle color mode (same surface, different read-back)
                    KeyCode::Char('c') => {
                        let idx = COLOR_MODES
                            .iter()
                            .position(|&m| m == color_mode)
                            .unwrap_or(0);
                        color_mode = COLOR_MODES[(idx + 1) % COLOR_MODES.len()];
                    }
                    // Shift the backdrop palette
                    KeyCode::Char('[') => {
                        base_hue -= 10.0;
                        rebuild_scene = true;
                    }
                    KeyCode::Char(']') => {
                        base_hue += 10.0;
                        rebuild_scene = true;
                    }
                    // Toggle status bar
                    KeyCode::Char('h') => {
                        hide_status = !hide_status;
                        rebuild_scene = true;
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        // Live parameter updates
        if let Some(rx) = &ext_rx {
            while let Ok(params) = rx.try_recv() {
                ext_state.merge(params);
            }
            if let Some(v) = ext_state.take_hue_change() {
                base_hue = v;
                rebuild_scene = true;
            }
            if let Some(name) = ext_state.take_render_change()
                && let Some(mode) = parse_render_mode(&name)
                && mode != render_mode
            {
                render_mode = mode;
                rebuild_scene = true;
            }
            if let Some(name) = ext_state.take_color_change()
                && let Some(mode) = parse_color_mode(&name)
            {
                color_mode = mode;
            }
            if let Some(v) = ext_state.take_fps_change() {
                fps = v.clamp(1, 120);
                frame_dur = Duration::from_secs_f64(1.0 / fps as f64);
            }
        }

        // Rebuild the scene if a mode changed or the terminal resized.
        // The old loop is stopped before its replacement exists; a stopped
        // loop never delivers another update.
        if rebuild_scene && cols >= 10 && rows >= 5 {
            // Re-read size to get the settled value
            let (settled_cols, settled_rows) = terminal::size()?;
            if settled_cols >= 10 && settled_rows >= 5 {
                cols = settled_cols;
                rows = settled_rows;
            }
            let display_rows = if hide_status {
                rows as usize
            } else {
                (rows as usize).saturating_sub(1)
            };
            scene.frame_loop.stop();
            scene = build_scene(&scheduler, cols as usize, display_rows, render_mode, base_hue);
            // Reset terminal state completely
            write!(stdout, "\x1b[2J\x1b[H")?;
            stdout.flush()?;
            rebuild_scene = false;
        }

        // Drive the scheduler; the frame loop updates the animation, which
        // paints the canvas.
        let frame_start = Instant::now();
        let now_ms = epoch.elapsed().as_secs_f64() * 1000.0;
        scheduler.fire(now_ms);

        let frame = {
            let mut canvas = scene.canvas.borrow_mut();
            canvas.apply_gain(ext_state.intensity());
            render::render(&canvas, render_mode, color_mode, color_quant)
        };

        // Record frame if recording
        if let Some(ref mut rec) = recorder {
            rec.capture(&frame);
        }

        // Verify terminal size hasn't changed before writing
        // If it changed, skip this frame to avoid writing wrong-sized data
        let (check_cols, check_rows) = terminal::size()?;
        if check_cols != cols || check_rows != rows {
            cols = check_cols;
            rows = check_rows;
            rebuild_scene = true;
            // Sleep briefly to let terminal settle
            std::thread::sleep(Duration::from_millis(50));
            continue;
        }

        // Build entire frame into buffer before flushing
        stdout.write_all(b"\x1b[H")?;
        stdout.write_all(frame.as_bytes())?;

        // Status bar
        frame_count += 1;
        if fps_update.elapsed() >= Duration::from_secs(1) {
            actual_fps = frame_count as f64 / fps_update.elapsed().as_secs_f64();
            frame_count = 0;
            fps_update = Instant::now();
        }
        if !hide_status {
            let rec_indicator = if recorder.is_some() { " [REC]" } else { "" };
            let status = format!(
                " glowfield | hue {:.0} | {:?} | {:?} | {} circles | {:.0} fps{} | [r] render  [c] color  [[/]] hue  [h] hide  [q] quit ",
                base_hue.rem_euclid(360.0),
                render_mode,
                color_mode,
                scene.sprite_count,
                actual_fps,
                rec_indicator,
            );
            let w = cols as usize;
            let truncated: String = status.chars().take(w).collect();
            let padded = format!("{:<width$}", truncated, width = w);
            write!(stdout, "\x1b[{};1H\x1b[7m{}\x1b[0m", rows, padded)?;
        }

        // Single flush per frame
        stdout.flush()?;

        // Sleep to target FPS
        let elapsed = frame_start.elapsed();
        if elapsed < frame_dur {
            std::thread::sleep(frame_dur - elapsed);
        }
    }
}

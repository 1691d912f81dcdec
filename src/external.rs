//! Live parameter updates from outside the process.
//!
//! A newline-delimited JSON stream (stdin or a watched file) carries
//! partial updates; the latest non-empty line wins. Example:
//! `{"hue": 190, "intensity": 1.2}`

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ExternalParams {
    pub hue: Option<f64>,
    pub fps: Option<u32>,
    pub intensity: Option<f64>,
    pub render: Option<String>,
    pub color: Option<String>,
}

/// Accumulated external state. Rebuild-triggering fields (hue, render mode)
/// and one-shot settings (color mode, fps) are held as pendings the main
/// loop takes exactly once; intensity is sticky and read every frame.
#[derive(Debug, Clone, Default)]
pub struct CurrentState {
    hue_pending: Option<f64>,
    render_pending: Option<String>,
    color_pending: Option<String>,
    fps_pending: Option<u32>,
    intensity: Option<f64>,
}

impl CurrentState {
    pub fn merge(&mut self, p: ExternalParams) {
        if let Some(v) = p.hue {
            self.hue_pending = Some(v);
        }
        if let Some(v) = p.render {
            self.render_pending = Some(v);
        }
        if let Some(v) = p.color {
            self.color_pending = Some(v);
        }
        if let Some(v) = p.fps {
            self.fps_pending = Some(v);
        }
        if let Some(v) = p.intensity {
            self.intensity = Some(v);
        }
    }

    pub fn take_hue_change(&mut self) -> Option<f64> {
        self.hue_pending.take()
    }

    pub fn take_render_change(&mut self) -> Option<String> {
        self.render_pending.take()
    }

    pub fn take_color_change(&mut self) -> Option<String> {
        self.color_pending.take()
    }

    pub fn take_fps_change(&mut self) -> Option<u32> {
        self.fps_pending.take()
    }

    pub fn intensity(&self) -> f64 {
        self.intensity.unwrap_or(1.0)
    }
}

pub enum ParamsSource {
    Stdin,
    File(std::path::PathBuf),
}

pub fn spawn_reader(source: ParamsSource) -> std::sync::mpsc::Receiver<ExternalParams> {
    let (tx, rx) = std::sync::mpsc::channel::<ExternalParams>();

    match source {
        ParamsSource::Stdin => {
            std::thread::spawn(move || {
                use std::io::BufRead;
                let stdin = std::io::BufReader::new(std::io::stdin());
                for line in stdin.lines() {
                    match line {
                        Ok(l) => {
                            if let Ok(params) = serde_json::from_str::<ExternalParams>(&l)
                                && tx.send(params).is_err()
                            {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }
            });
        }
        ParamsSource::File(path) => {
            std::thread::spawn(move || {
                // Read the file once on startup if it already exists
                if let Ok(contents) = std::fs::read_to_string(&path)
                    && let Some(line) = contents.lines().rfind(|l| !l.trim().is_empty())
                    && let Ok(params) = serde_json::from_str::<ExternalParams>(line)
                    && tx.send(params).is_err()
                {
                    return;
                }

                let (file_tx, file_rx) = std::sync::mpsc::channel();
                let Ok(mut watcher) = notify::recommended_watcher(move |res| {
                    let _ = file_tx.send(res);
                }) else {
                    return;
                };
                if notify::Watcher::watch(&mut watcher, &path, notify::RecursiveMode::NonRecursive)
                    .is_err()
                {
                    return;
                }
                while let Ok(Ok(_event)) = file_rx.recv() {
                    if let Ok(contents) = std::fs::read_to_string(&path)
                        && let Some(line) = contents.lines().rfind(|l| !l.trim().is_empty())
                        && let Ok(params) = serde_json::from_str::<ExternalParams>(line)
                        && tx.send(params).is_err()
                    {
                        break;
                    }
                }
            });
        }
    }

    rx
}

use crate::render::{ColorMode, RenderMode};
use serde::Deserialize;
use std::path::PathBuf;

/// User configuration loaded from config file.
/// All fields are optional — CLI flags override config, config overrides defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base hue for the backdrop palette, in degrees
    pub hue: Option<f64>,
    /// Default render mode
    pub render: Option<RenderModeConfig>,
    /// Default color mode
    pub color: Option<ColorModeConfig>,
    /// Target FPS (1-120)
    pub fps: Option<u32>,
    /// Hide status bar
    pub clean: Option<bool>,
    /// Color quantization step (0 = off, 4/8/16 = coarser colors for less output)
    pub color_quant: Option<u8>,
}

/// Render mode names for config file (kebab-case friendly)
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderModeConfig {
    Braille,
    HalfBlock,
    Ascii,
}

impl From<RenderModeConfig> for RenderMode {
    fn from(c: RenderModeConfig) -> Self {
        match c {
            RenderModeConfig::Braille => RenderMode::Braille,
            RenderModeConfig::HalfBlock => RenderMode::HalfBlock,
            RenderModeConfig::Ascii => RenderMode::Ascii,
        }
    }
}

/// Color mode names for config file (kebab-case friendly)
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorModeConfig {
    Mono,
    Ansi16,
    Ansi256,
    TrueColor,
}

impl From<ColorModeConfig> for ColorMode {
    fn from(c: ColorModeConfig) -> Self {
        match c {
            ColorModeConfig::Mono => ColorMode::Mono,
            ColorModeConfig::Ansi16 => ColorMode::Ansi16,
            ColorModeConfig::Ansi256 => ColorMode::Ansi256,
            ColorModeConfig::TrueColor => ColorMode::TrueColor,
        }
    }
}

/// Get the config file path: ~/.config/glowfield/config.toml
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("glowfield").join("config.toml"))
}

/// Load config from file. Returns default config if file doesn't exist.
pub fn load_config() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let Ok(contents) = std::fs::read_to_string(&path) else {
        return Config::default();
    };
    match toml::from_str(&contents) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: failed to parse {}: {}", path.display(), e);
            Config::default()
        }
    }
}

/// Generate a default config file with all options commented out
pub fn default_config_string() -> String {
    r#"# glowfield configuration
# Use --show-config to see the active config file path.
# CLI flags override these settings.

# Base hue for the backdrop palette, in degrees.
# Blobs sample hues from [hue, hue + 100]. 250 is the violet default;
# 190 gives the teal variant.
# hue = 250.0

# Default render mode: braille, half-block, ascii
# render = "half-block"

# Default color mode: mono, ansi16, ansi256, true-color
# color = "true-color"

# Target FPS (1-120)
# fps = 60

# Hide status bar
# clean = false

# Color quantization step (0 = off, 4/8/16 = coarser colors, less output)
# Useful for slow terminals or tmux
# color_quant = 0
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_parses_to_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.hue.is_none());
        assert!(config.render.is_none());
        assert!(config.fps.is_none());
    }

    #[test]
    fn test_full_config_parses() {
        let config: Config = toml::from_str(
            r#"
            hue = 190.0
            render = "braille"
            color = "ansi256"
            fps = 30
            clean = true
            color_quant = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.hue, Some(190.0));
        assert!(matches!(config.render, Some(RenderModeConfig::Braille)));
        assert!(matches!(config.color, Some(ColorModeConfig::Ansi256)));
        assert_eq!(config.fps, Some(30));
        assert_eq!(config.clean, Some(true));
        assert_eq!(config.color_quant, Some(8));
    }

    #[test]
    fn test_kebab_case_mode_names() {
        let config: Config = toml::from_str(r#"render = "half-block""#).unwrap();
        assert!(matches!(config.render, Some(RenderModeConfig::HalfBlock)));
        let config: Config = toml::from_str(r#"color = "true-color""#).unwrap();
        assert!(matches!(config.color, Some(ColorModeConfig::TrueColor)));
    }

    #[test]
    fn test_default_config_string_is_valid_toml() {
        let config: Config = toml::from_str(&default_config_string()).unwrap();
        assert!(config.hue.is_none(), "template options must be commented out");
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config: Config = toml::from_str(r#"animation = "fire""#).unwrap();
        assert!(config.hue.is_none());
    }
}

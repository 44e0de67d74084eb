//! Config: capture and document-assembly settings, stored as JSON.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const APP_NAME: &str = "ClickShot";

// ── Capture ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Wait after hiding the panel so the compositor drops it from the frame.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// A dragged region must exceed this on both axes.
    #[serde(default = "default_min_region_size")]
    pub min_region_size: u32,
    /// Windows whose title contains this are never picked.
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default)]
    pub extra_shell_classes: Vec<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            min_region_size: default_min_region_size(),
            app_name: default_app_name(),
            extra_shell_classes: Vec::new(),
        }
    }
}

impl CaptureConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

// ── Document assembly ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyConfig {
    #[serde(default = "default_slide_max_width_fraction")]
    pub slide_max_width_fraction: f64,
    #[serde(default = "default_slide_max_height_fraction")]
    pub slide_max_height_fraction: f64,
    /// How far the picture sits above the slide's vertical centre.
    #[serde(default = "default_slide_vertical_offset_in")]
    pub slide_vertical_offset_in: f64,
    #[serde(default = "default_caption_font_pt")]
    pub caption_font_pt: u32,
    /// Hex RGB, no leading '#'.
    #[serde(default = "default_caption_color")]
    pub caption_color: String,
    #[serde(default = "default_document_image_width_in")]
    pub document_image_width_in: f64,
    /// Used when the primary width would push the picture off the page.
    #[serde(default = "default_document_fallback_width_in")]
    pub document_fallback_width_in: f64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            slide_max_width_fraction: default_slide_max_width_fraction(),
            slide_max_height_fraction: default_slide_max_height_fraction(),
            slide_vertical_offset_in: default_slide_vertical_offset_in(),
            caption_font_pt: default_caption_font_pt(),
            caption_color: default_caption_color(),
            document_image_width_in: default_document_image_width_in(),
            document_fallback_width_in: default_document_fallback_width_in(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl AssemblyConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

// ── Top-level config ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub assembly: AssemblyConfig,
}

fn default_settle_delay_ms() -> u64 { 120 }
fn default_min_region_size() -> u32 { 8 }
fn default_app_name() -> String { APP_NAME.into() }
fn default_slide_max_width_fraction() -> f64 { 0.88 }
fn default_slide_max_height_fraction() -> f64 { 0.74 }
fn default_slide_vertical_offset_in() -> f64 { 0.6 }
fn default_caption_font_pt() -> u32 { 20 }
fn default_caption_color() -> String { "006ED2".into() }
fn default_document_image_width_in() -> f64 { 6.5 }
fn default_document_fallback_width_in() -> f64 { 6.0 }
fn default_poll_interval_ms() -> u64 { 1000 }

// ── Load / save ────────────────────────────────────────────────────────────

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("clickshot").join("config.json"))
        .unwrap_or_else(|| PathBuf::from("config.json"))
}

/// Load config from the user config directory, falling back to defaults.
pub fn load_config() -> AppConfig {
    let path = config_path();
    let contents = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(_) => {
            log::info!("No config at {:?}, using defaults", path);
            return AppConfig::default();
        }
    };
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> AppConfig {
    serde_json::from_str(contents).unwrap_or_else(|e| {
        log::warn!("Failed to parse config: {e}. Using defaults.");
        AppConfig::default()
    })
}

pub fn save_config(cfg: &AppConfig) {
    let path = config_path();
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            log::error!("Failed to create config directory {:?}: {e}", parent);
            return;
        }
    }
    match serde_json::to_string_pretty(cfg) {
        Ok(contents) => {
            if let Err(e) = std::fs::write(&path, contents) {
                log::error!("Failed to write {:?}: {e}", path);
            }
        }
        Err(e) => log::error!("Failed to serialize config: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg = parse_config(r#"{ "capture": { "min_region_size": 12 } }"#);
        assert_eq!(cfg.capture.min_region_size, 12);
        assert_eq!(cfg.capture.settle_delay_ms, 120);
        assert_eq!(cfg.assembly, AssemblyConfig::default());
    }

    #[test]
    fn test_garbage_config_falls_back() {
        assert_eq!(parse_config("not json"), AppConfig::default());
    }

    #[test]
    fn test_defaults_match_layout_constants() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.assembly.document_image_width_in, 6.5);
        assert_eq!(cfg.assembly.document_fallback_width_in, 6.0);
        assert_eq!(cfg.capture.app_name, "ClickShot");
        assert_eq!(cfg.capture.settle_delay(), Duration::from_millis(120));
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let mut cfg = AppConfig::default();
        cfg.capture.extra_shell_classes.push("conky".into());
        let json = serde_json::to_string(&cfg).unwrap();
        assert_eq!(parse_config(&json), cfg);
    }
}

//! Shared state types
//!
//! Capture modes and the status line shown on the control panel.

use std::fmt;

/// The capture mode - what gets captured
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CaptureMode {
    /// The work area of the monitor under the pointer
    #[default]
    Monitor,
    /// A top-level window picked with a click
    Window,
    /// A rectangle dragged over the desktop
    Region,
}

impl CaptureMode {
    /// Short tag used in captions and logs
    pub fn label(&self) -> &'static str {
        match self {
            CaptureMode::Monitor => "monitor",
            CaptureMode::Window => "window",
            CaptureMode::Region => "region",
        }
    }

    /// Message shown when the operator backs out of this mode
    pub fn cancelled_message(&self) -> &'static str {
        match self {
            CaptureMode::Monitor => "Monitor capture cancelled.",
            CaptureMode::Window => "Window capture cancelled.",
            CaptureMode::Region => "Selection cancelled.",
        }
    }

    pub fn all() -> &'static [CaptureMode] {
        &[CaptureMode::Monitor, CaptureMode::Window, CaptureMode::Region]
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Error,
}

impl Severity {
    /// libadwaita style class for the status label
    pub fn css_class(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Info => "accent",
            Severity::Error => "error",
        }
    }
}

/// One update of the single status indicator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub severity: Severity,
    pub text: String,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_labels() {
        let labels: Vec<_> = CaptureMode::all().iter().map(|m| m.label()).collect();
        assert_eq!(labels, vec!["monitor", "window", "region"]);
    }

    #[test]
    fn test_status_constructors() {
        let status = StatusMessage::error("Capture failed");
        assert_eq!(status.severity, Severity::Error);
        assert_eq!(status.to_string(), "Capture failed");
        assert_eq!(StatusMessage::info("x").severity.css_class(), "accent");
    }
}

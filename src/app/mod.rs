//! Application module
//!
//! Session paths, configuration and the small state types shared by the
//! capture flow and the control panel.

pub mod config;
mod session;
mod state;

pub use config::{load_config, AppConfig, AssemblyConfig, CaptureConfig, APP_NAME};
pub use session::{Session, SessionError, DEFAULT_PROJECT_NAME};
pub use state::{CaptureMode, Severity, StatusMessage};

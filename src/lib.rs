//! ClickShot: capture a monitor, a window or a dragged region and have every
//! shot appended, captioned, to a slide deck and a paginated document.

pub mod app;
pub mod capture;
pub mod document;
pub mod naming;
pub mod orchestrator;
pub mod overlay;
#[cfg(feature = "desktop")]
pub mod ui;

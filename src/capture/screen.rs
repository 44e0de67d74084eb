//! Desktop backend on top of xcap
//!
//! Monitors and windows come from xcap, the pointer position from enigo.
//! One `XcapDesktop` serves as geometry provider, capture backend and window
//! locator.

use enigo::{Enigo, Mouse, Settings};
use log::{debug, warn};
use std::cell::RefCell;
use xcap::{Monitor, Window};

use super::frame::{CaptureBackend, CaptureError, PixelLayout, RawFrame};
use super::geometry::{bounding_rect, GeometryProvider, Point, Rect};
use super::window::{WindowHandle, WindowInfo, WindowLocator, WindowSnapshot};

fn monitor_bounds(monitor: &Monitor) -> Result<Rect, xcap::XCapError> {
    Ok(Rect::new(
        monitor.x()?,
        monitor.y()?,
        monitor.width()?,
        monitor.height()?,
    ))
}

impl WindowInfo {
    fn from_xcap_window(window: &Window) -> Result<Self, xcap::XCapError> {
        Ok(Self {
            handle: WindowHandle(u64::from(window.id()?)),
            pid: window.pid()?,
            parent: None,
            class_name: window.app_name()?,
            title: window.title()?,
            bounds: Rect::new(window.x()?, window.y()?, window.width()?, window.height()?),
            z: window.z()?,
            is_minimized: window.is_minimized()?,
        })
    }
}

#[derive(Default)]
pub struct XcapDesktop {
    /// Windows as of the last pick, for raw-bounds fallback
    snapshot: RefCell<WindowSnapshot>,
}

impl XcapDesktop {
    pub fn new() -> Self {
        Self::default()
    }

    fn monitor_rects() -> Vec<Rect> {
        match Monitor::all() {
            Ok(monitors) => monitors
                .iter()
                .filter_map(|m| monitor_bounds(m).ok())
                .collect(),
            Err(e) => {
                warn!("Failed to enumerate monitors: {}", e);
                Vec::new()
            }
        }
    }

    fn pointer_position() -> Option<Point> {
        let enigo = Enigo::new(&Settings::default()).ok()?;
        let (x, y) = enigo.location().ok()?;
        Some(Point::new(x, y))
    }

    fn primary_monitor_rect() -> Option<Rect> {
        let monitors = Monitor::all().ok()?;
        monitors
            .iter()
            .find(|m| m.is_primary().unwrap_or(false))
            .or(monitors.first())
            .and_then(|m| monitor_bounds(m).ok())
    }

    /// Re-list every window. Windows whose info can't be read are skipped.
    pub fn refresh_windows(&self) -> usize {
        let windows = match Window::all() {
            Ok(windows) => windows,
            Err(e) => {
                warn!("Failed to enumerate windows: {}", e);
                Vec::new()
            }
        };

        let infos: Vec<WindowInfo> = windows
            .iter()
            .filter_map(|w| match WindowInfo::from_xcap_window(w) {
                Ok(info) => Some(info),
                Err(e) => {
                    debug!("Skipping window: {}", e);
                    None
                }
            })
            .collect();

        let count = infos.len();
        // The overlay is on screen while picking; hit-test through it.
        *self.snapshot.borrow_mut() = WindowSnapshot::new(infos).ignoring_process(std::process::id());
        count
    }
}

impl GeometryProvider for XcapDesktop {
    fn virtual_desktop_bounds(&self) -> Rect {
        bounding_rect(&Self::monitor_rects())
    }

    fn monitor_under_cursor(&self) -> Rect {
        Self::pointer_position()
            .and_then(|p| Monitor::from_point(p.x, p.y).ok())
            .and_then(|m| monitor_bounds(&m).ok())
            .or_else(Self::primary_monitor_rect)
            .unwrap_or_default()
    }

    fn work_area_under_cursor(&self) -> Rect {
        // xcap reports full monitor geometry; panels are not subtracted.
        self.monitor_under_cursor()
    }

    fn extended_frame_bounds(&self, handle: WindowHandle) -> Option<Rect> {
        let windows = Window::all().ok()?;
        let window = windows
            .iter()
            .find(|w| w.id().ok().map(u64::from) == Some(handle.0))?;
        Some(Rect::new(
            window.x().ok()?,
            window.y().ok()?,
            window.width().ok()?,
            window.height().ok()?,
        ))
    }

    fn raw_window_bounds(&self, handle: WindowHandle) -> Rect {
        self.snapshot
            .borrow()
            .get(handle)
            .map(|w| w.bounds)
            .unwrap_or_default()
    }
}

impl CaptureBackend for XcapDesktop {
    fn monitors(&self) -> Result<Vec<Rect>, CaptureError> {
        let monitors = Monitor::all().map_err(|e| CaptureError::Backend(e.to_string()))?;
        monitors
            .iter()
            .map(|m| monitor_bounds(m).map_err(|e| CaptureError::Backend(e.to_string())))
            .collect()
    }

    fn capture_monitor(&self, index: usize) -> Result<RawFrame, CaptureError> {
        let monitors = Monitor::all().map_err(|e| CaptureError::Backend(e.to_string()))?;
        let monitor = monitors
            .get(index)
            .ok_or(CaptureError::CaptureUnavailable)?;

        let image = monitor
            .capture_image()
            .map_err(|e| CaptureError::Backend(e.to_string()))?;

        Ok(RawFrame {
            width: image.width(),
            height: image.height(),
            stride: image.width() as usize * 4,
            layout: PixelLayout::Rgba,
            data: image.into_raw(),
        })
    }
}

impl WindowLocator for XcapDesktop {
    fn window_at(&self, point: Point) -> Option<WindowHandle> {
        let count = self.refresh_windows();
        debug!("Hit-testing ({}, {}) against {} windows", point.x, point.y, count);
        let snapshot = self.snapshot.borrow();
        let hit = snapshot.window_at(point)?;
        if let Some(info) = snapshot.get(hit) {
            debug!("Pointer is over {}", info.display_label());
        }
        Some(hit)
    }

    fn parent(&self, handle: WindowHandle) -> Option<WindowHandle> {
        self.snapshot.borrow().parent(handle)
    }

    fn class_name(&self, handle: WindowHandle) -> String {
        self.snapshot.borrow().class_name(handle)
    }

    fn title(&self, handle: WindowHandle) -> String {
        self.snapshot.borrow().title(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_desktop_covers_every_monitor() {
        // This test may fail in CI environments without display
        let desktop = XcapDesktop::new();
        let bounds = desktop.virtual_desktop_bounds();
        for monitor in XcapDesktop::monitor_rects() {
            assert_eq!(bounds.union(&monitor), bounds);
        }
    }
}

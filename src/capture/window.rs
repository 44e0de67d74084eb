use std::fmt;

use super::geometry::{Point, Rect};

/// Opaque window-system handle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub u64);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct WindowInfo {
    pub handle: WindowHandle,

    /// Owning process
    pub pid: u32,

    /// Owning window for child controls and transients
    pub parent: Option<WindowHandle>,

    /// Window class (WM_CLASS / app id)
    pub class_name: String,

    pub title: String,

    pub bounds: Rect,

    /// Stacking order; higher is closer to the viewer
    pub z: i32,

    pub is_minimized: bool,
}

impl WindowInfo {
    pub fn display_label(&self) -> String {
        if self.title.is_empty() {
            format!("{} (ID: {})", self.class_name, self.handle)
        } else {
            format!("{} — {}", self.title, self.class_name)
        }
    }
}

/// Window-system lookups used by the window picker.
pub trait WindowLocator {
    /// Topmost window under a desktop-global point.
    fn window_at(&self, point: Point) -> Option<WindowHandle>;

    fn parent(&self, handle: WindowHandle) -> Option<WindowHandle>;

    fn class_name(&self, handle: WindowHandle) -> String;

    fn title(&self, handle: WindowHandle) -> String;
}

/// Point-in-time listing of every window, searchable by position.
#[derive(Debug, Clone, Default)]
pub struct WindowSnapshot {
    windows: Vec<WindowInfo>,
    /// Process whose windows hit-testing looks through (our own overlay).
    ignored_pid: Option<u32>,
}

impl WindowSnapshot {
    pub fn new(windows: Vec<WindowInfo>) -> Self {
        Self {
            windows,
            ignored_pid: None,
        }
    }

    /// Leave every window of `pid` out of `window_at`.
    pub fn ignoring_process(mut self, pid: u32) -> Self {
        self.ignored_pid = Some(pid);
        self
    }

    pub fn get(&self, handle: WindowHandle) -> Option<&WindowInfo> {
        self.windows.iter().find(|w| w.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

impl WindowLocator for WindowSnapshot {
    fn window_at(&self, point: Point) -> Option<WindowHandle> {
        self.windows
            .iter()
            .filter(|w| !w.is_minimized && Some(w.pid) != self.ignored_pid)
            .filter(|w| w.bounds.contains(point))
            .max_by_key(|w| w.z)
            .map(|w| w.handle)
    }

    fn parent(&self, handle: WindowHandle) -> Option<WindowHandle> {
        self.get(handle).and_then(|w| w.parent)
    }

    fn class_name(&self, handle: WindowHandle) -> String {
        self.get(handle)
            .map(|w| w.class_name.clone())
            .unwrap_or_default()
    }

    fn title(&self, handle: WindowHandle) -> String {
        self.get(handle).map(|w| w.title.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(id: u64, title: &str, bounds: Rect, z: i32) -> WindowInfo {
        WindowInfo {
            handle: WindowHandle(id),
            pid: 100,
            parent: None,
            class_name: "firefox".to_string(),
            title: title.to_string(),
            bounds,
            z,
            is_minimized: false,
        }
    }

    #[test]
    fn test_window_info_display_label() {
        let window = info(1, "Mozilla Firefox", Rect::new(0, 0, 800, 600), 0);
        assert_eq!(window.display_label(), "Mozilla Firefox — firefox");
    }

    #[test]
    fn test_window_info_display_label_no_title() {
        let window = info(1, "", Rect::new(0, 0, 800, 600), 0);
        assert_eq!(window.display_label(), "firefox (ID: 0x1)");
    }

    #[test]
    fn test_snapshot_picks_topmost_visible() {
        let mut minimized = info(3, "hidden", Rect::new(0, 0, 100, 100), 9);
        minimized.is_minimized = true;
        let snapshot = WindowSnapshot::new(vec![
            info(1, "back", Rect::new(0, 0, 500, 500), 1),
            info(2, "front", Rect::new(50, 50, 100, 100), 5),
            minimized,
        ]);

        assert_eq!(snapshot.window_at(Point::new(60, 60)), Some(WindowHandle(2)));
        assert_eq!(snapshot.window_at(Point::new(10, 10)), Some(WindowHandle(1)));
        assert_eq!(snapshot.window_at(Point::new(900, 900)), None);
        assert_eq!(snapshot.title(WindowHandle(2)), "front");
        assert_eq!(snapshot.title(WindowHandle(42)), "");
    }

    #[test]
    fn test_snapshot_looks_through_ignored_process() {
        let mut overlay = info(9, "", Rect::new(0, 0, 2560, 1440), 100);
        overlay.pid = 4242;
        let windows = vec![info(1, "editor", Rect::new(0, 0, 800, 600), 1), overlay];

        let seen = WindowSnapshot::new(windows.clone());
        assert_eq!(seen.window_at(Point::new(10, 10)), Some(WindowHandle(9)));

        let through = WindowSnapshot::new(windows).ignoring_process(4242);
        assert_eq!(through.window_at(Point::new(10, 10)), Some(WindowHandle(1)));
        assert_eq!(through.window_at(Point::new(2000, 1000)), None);
        // Still listed for lookups by handle.
        assert!(through.get(WindowHandle(9)).is_some());
    }
}

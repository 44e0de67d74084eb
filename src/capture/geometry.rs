//! Desktop geometry
//!
//! Rectangles live in desktop-global pixel coordinates. The origin of the
//! virtual desktop can be negative when a monitor sits left of or above the
//! primary one.

use super::window::WindowHandle;

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate by `origin`, e.g. overlay-local to desktop-global.
    pub fn offset(self, origin: Point) -> Point {
        Point::new(self.x + origin.x, self.y + origin.y)
    }
}

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalized rectangle spanning two opposite corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let left = a.x.min(b.x);
        let top = a.y.min(b.y);
        Self::new(left, top, a.x.abs_diff(b.x), a.y.abs_diff(b.y))
    }

    /// Build from edges; inverted edges give a zero extent.
    pub fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        let width = if right > left { right.abs_diff(left) } else { 0 };
        let height = if bottom > top { bottom.abs_diff(top) } else { 0 };
        Self::new(left, top, width, height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add_unsigned(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add_unsigned(self.height)
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let overlap = Rect::from_edges(
            self.x.max(other.x),
            self.y.max(other.y),
            self.right().min(other.right()),
            self.bottom().min(other.bottom()),
        );
        (!overlap.is_degenerate()).then_some(overlap)
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_degenerate() {
            return *other;
        }
        if other.is_degenerate() {
            return *self;
        }
        Rect::from_edges(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Grow each dimension to at least `min` pixels.
    pub fn at_least(self, min: u32) -> Rect {
        Rect::new(self.x, self.y, self.width.max(min), self.height.max(min))
    }
}

/// Bounding rectangle of every monitor combined.
pub fn bounding_rect<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Rect {
    rects
        .into_iter()
        .fold(Rect::default(), |acc, rect| acc.union(rect))
}

/// Pure geometry queries against the running desktop session.
pub trait GeometryProvider {
    fn virtual_desktop_bounds(&self) -> Rect;

    /// Full bounds of the monitor under the pointer.
    fn monitor_under_cursor(&self) -> Rect;

    /// Usable area of the monitor under the pointer. Query again for every
    /// interaction; the pointer may have moved.
    fn work_area_under_cursor(&self) -> Rect;

    /// Compositor's view of the window frame, without drop-shadow padding.
    fn extended_frame_bounds(&self, handle: WindowHandle) -> Option<Rect>;

    /// Raw window rectangle as the window system reports it.
    fn raw_window_bounds(&self, handle: WindowHandle) -> Rect;

    /// Visually accurate bounds, falling back to the raw rectangle.
    fn window_bounds(&self, handle: WindowHandle) -> Rect {
        match self.extended_frame_bounds(handle) {
            Some(bounds) if !bounds.is_degenerate() => bounds,
            _ => self.raw_window_bounds(handle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_normalizes() {
        let rect = Rect::from_corners(Point::new(30, 50), Point::new(10, 10));
        assert_eq!(rect, Rect::new(10, 10, 20, 40));
    }

    #[test]
    fn test_intersect_and_contains() {
        let left = Rect::new(-1920, 0, 1920, 1080);
        let right = Rect::new(0, 0, 2560, 1440);
        let region = Rect::new(-100, 100, 300, 50);

        assert_eq!(left.intersect(&region), Some(Rect::new(-100, 100, 100, 50)));
        assert_eq!(right.intersect(&region), Some(Rect::new(0, 100, 200, 50)));
        assert_eq!(left.intersect(&Rect::new(5000, 0, 10, 10)), None);
        assert!(left.contains(Point::new(-1, 0)));
        assert!(!left.contains(Point::new(0, 0)));
    }

    #[test]
    fn test_bounding_rect_with_negative_origin() {
        let monitors = [
            Rect::new(0, 0, 2560, 1440),
            Rect::new(-1920, 200, 1920, 1080),
        ];
        assert_eq!(bounding_rect(&monitors), Rect::new(-1920, 0, 4480, 1440));
    }

    #[test]
    fn test_inverted_edges_are_degenerate() {
        assert!(Rect::from_edges(10, 10, 5, 20).is_degenerate());
        assert_eq!(Rect::new(1, 1, 0, 0).at_least(1), Rect::new(1, 1, 1, 1));
    }

    struct Frames {
        extended: Option<Rect>,
    }

    impl GeometryProvider for Frames {
        fn virtual_desktop_bounds(&self) -> Rect {
            Rect::default()
        }
        fn monitor_under_cursor(&self) -> Rect {
            Rect::default()
        }
        fn work_area_under_cursor(&self) -> Rect {
            Rect::default()
        }
        fn extended_frame_bounds(&self, _: WindowHandle) -> Option<Rect> {
            self.extended
        }
        fn raw_window_bounds(&self, _: WindowHandle) -> Rect {
            Rect::new(-7, 0, 814, 607)
        }
    }

    #[test]
    fn test_window_bounds_prefers_extended_frame() {
        let frames = Frames {
            extended: Some(Rect::new(0, 0, 800, 600)),
        };
        assert_eq!(frames.window_bounds(WindowHandle(1)), Rect::new(0, 0, 800, 600));

        let no_compositor = Frames { extended: None };
        assert_eq!(
            no_compositor.window_bounds(WindowHandle(1)),
            Rect::new(-7, 0, 814, 607)
        );
    }
}

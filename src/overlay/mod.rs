//! Capture overlay
//!
//! A transparent surface spanning the virtual desktop, opened for one
//! interaction and closed afterwards. The controller drives the region and
//! window-pick state machines to a terminal state and returns the result,
//! blocking the interactive thread while the gesture is in progress.

#[cfg(feature = "desktop")]
pub mod gtk_surface;
pub mod region;
pub mod window_pick;

pub use region::RegionState;
pub use window_pick::{resolve_click, root_ancestor, PickState, WindowFilter};

use log::debug;
use std::rc::Rc;

use crate::capture::{Point, Rect, WindowHandle, WindowLocator};

/// Pointer and keyboard input, in overlay-local coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayInput {
    PrimaryDown(Point),
    PointerMoved(Point),
    PrimaryUp(Point),
    Cancel,
}

/// Terminal outcome of an interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution<T> {
    Resolved(T),
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayKind {
    RegionSelect,
    WindowPick,
}

impl OverlayKind {
    pub fn hint(&self) -> &'static str {
        match self {
            OverlayKind::RegionSelect => "Drag to select area • ESC to cancel",
            OverlayKind::WindowPick => "Click a window to capture • ESC to cancel",
        }
    }
}

/// A live overlay. Consumes all input while open.
pub trait OverlaySurface {
    /// Desktop position of the surface's top-left corner
    fn origin(&self) -> Point;

    /// Block until the next input. `None` once the surface is gone.
    fn next_input(&mut self) -> Option<OverlayInput>;

    /// Outline to draw, overlay-local; `None` clears it.
    fn set_selection(&mut self, selection: Option<Rect>);

    /// Tear the surface down. Must be safe to call twice.
    fn close(&mut self);
}

/// Creates a fresh surface for every interaction.
pub trait OverlayHost {
    fn open(&self, kind: OverlayKind, bounds: Rect) -> Box<dyn OverlaySurface>;
}

pub struct OverlayController {
    host: Rc<dyn OverlayHost>,
    locator: Rc<dyn WindowLocator>,
    filter: WindowFilter,
    min_region_size: u32,
}

impl OverlayController {
    pub fn new(
        host: Rc<dyn OverlayHost>,
        locator: Rc<dyn WindowLocator>,
        filter: WindowFilter,
        min_region_size: u32,
    ) -> Self {
        Self {
            host,
            locator,
            filter,
            min_region_size,
        }
    }

    /// Drag out a rectangle over `bounds`. Returns desktop coordinates.
    pub fn select_region(&self, bounds: Rect) -> Resolution<Rect> {
        let mut surface = self.host.open(OverlayKind::RegionSelect, bounds);
        debug!("Region overlay open over {:?}", bounds);
        let origin = surface.origin();

        let mut state = RegionState::Idle;
        while !state.is_terminal() {
            let input = surface.next_input().unwrap_or(OverlayInput::Cancel);
            state = state.advance(input, origin, self.min_region_size);
            surface.set_selection(state.live_selection());
        }

        surface.close();
        debug!("Region overlay closed: {:?}", state);
        state.resolution()
    }

    /// Click a window over `bounds`. Returns its root handle.
    pub fn pick_window(&self, bounds: Rect) -> Resolution<WindowHandle> {
        let mut surface = self.host.open(OverlayKind::WindowPick, bounds);
        debug!("Window-pick overlay open over {:?}", bounds);
        let origin = surface.origin();

        let mut state = PickState::Idle;
        while !state.is_terminal() {
            let input = surface.next_input().unwrap_or(OverlayInput::Cancel);
            state = state.advance(input, origin, self.locator.as_ref(), &self.filter);
        }

        surface.close();
        debug!("Window-pick overlay closed: {:?}", state);
        state.resolution()
    }
}

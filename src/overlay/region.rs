//! Region-select protocol
//!
//! `Idle -> Dragging -> {Resolved | Cancelled}`. Corners are tracked in
//! overlay-local coordinates and converted to desktop coordinates on release.

use log::debug;

use super::{OverlayInput, Resolution};
use crate::capture::{Point, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionState {
    Idle,
    Dragging { anchor: Point, current: Point },
    Resolved(Rect),
    Cancelled,
}

impl RegionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RegionState::Resolved(_) | RegionState::Cancelled)
    }

    /// Feed one input. `origin` is the overlay's desktop position; a
    /// selection must exceed `min_size` on both axes.
    pub fn advance(self, input: OverlayInput, origin: Point, min_size: u32) -> RegionState {
        match (self, input) {
            (RegionState::Resolved(_) | RegionState::Cancelled, _) => self,
            (_, OverlayInput::Cancel) => RegionState::Cancelled,
            (RegionState::Idle | RegionState::Dragging { .. }, OverlayInput::PrimaryDown(p)) => {
                RegionState::Dragging {
                    anchor: p,
                    current: p,
                }
            }
            (RegionState::Dragging { anchor, .. }, OverlayInput::PointerMoved(p)) => {
                RegionState::Dragging { anchor, current: p }
            }
            (RegionState::Dragging { anchor, .. }, OverlayInput::PrimaryUp(p)) => {
                resolve(anchor, p, origin, min_size)
            }
            (RegionState::Idle, _) => RegionState::Idle,
        }
    }

    /// Rectangle to outline while dragging, in overlay-local coordinates.
    pub fn live_selection(&self) -> Option<Rect> {
        match self {
            RegionState::Dragging { anchor, current } => Some(Rect::from_corners(*anchor, *current)),
            _ => None,
        }
    }

    pub fn resolution(&self) -> Resolution<Rect> {
        match self {
            RegionState::Resolved(rect) => Resolution::Resolved(*rect),
            _ => Resolution::Cancelled,
        }
    }
}

fn resolve(anchor: Point, release: Point, origin: Point, min_size: u32) -> RegionState {
    let rect = Rect::from_corners(anchor.offset(origin), release.offset(origin));
    if rect.width > min_size && rect.height > min_size {
        debug!(
            "Region resolved to {}x{} at ({}, {})",
            rect.width, rect.height, rect.x, rect.y
        );
        RegionState::Resolved(rect)
    } else {
        debug!("Region {}x{} below minimum, cancelling", rect.width, rect.height);
        RegionState::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drag(from: (i32, i32), to: (i32, i32), origin: Point, min: u32) -> RegionState {
        [
            OverlayInput::PrimaryDown(Point::new(from.0, from.1)),
            OverlayInput::PointerMoved(Point::new((from.0 + to.0) / 2, (from.1 + to.1) / 2)),
            OverlayInput::PrimaryUp(Point::new(to.0, to.1)),
        ]
        .into_iter()
        .fold(RegionState::Idle, |state, input| state.advance(input, origin, min))
    }

    #[test]
    fn test_tiny_drag_cancels() {
        for min in [4, 8, 16] {
            let state = drag((10, 10), (14, 14), Point::default(), min);
            assert_eq!(state, RegionState::Cancelled);
        }
    }

    #[test]
    fn test_drag_resolves_at_global_offset() {
        let origin = Point::new(-1920, -200);
        let state = drag((10, 10), (30, 50), origin, 8);
        assert_eq!(state, RegionState::Resolved(Rect::new(-1910, -190, 20, 40)));
    }

    #[test]
    fn test_reverse_drag_is_normalized() {
        let state = drag((30, 50), (10, 10), Point::new(100, 100), 8);
        assert_eq!(state, RegionState::Resolved(Rect::new(110, 110, 20, 40)));
    }

    #[test]
    fn test_cancel_from_any_state() {
        let origin = Point::default();
        assert_eq!(
            RegionState::Idle.advance(OverlayInput::Cancel, origin, 8),
            RegionState::Cancelled
        );
        let dragging = RegionState::Idle.advance(OverlayInput::PrimaryDown(Point::new(1, 1)), origin, 8);
        assert_eq!(dragging.advance(OverlayInput::Cancel, origin, 8), RegionState::Cancelled);
    }

    #[test]
    fn test_terminal_states_absorb_input() {
        let resolved = RegionState::Resolved(Rect::new(0, 0, 20, 20));
        assert_eq!(
            resolved.advance(OverlayInput::Cancel, Point::default(), 8),
            resolved
        );
        assert_eq!(resolved.resolution(), Resolution::Resolved(Rect::new(0, 0, 20, 20)));
    }

    #[test]
    fn test_release_without_press_is_ignored() {
        let state = RegionState::Idle.advance(OverlayInput::PrimaryUp(Point::new(5, 5)), Point::default(), 8);
        assert_eq!(state, RegionState::Idle);
        assert_eq!(state.live_selection(), None);
    }

    #[test]
    fn test_live_selection_tracks_pointer() {
        let state = RegionState::Idle
            .advance(OverlayInput::PrimaryDown(Point::new(40, 40)), Point::default(), 8)
            .advance(OverlayInput::PointerMoved(Point::new(10, 20)), Point::default(), 8);
        assert_eq!(state.live_selection(), Some(Rect::new(10, 20, 30, 20)));
    }
}

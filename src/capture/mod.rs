//! Capture module for desktop geometry and frame grabbing
//!
//! Platform access sits behind `GeometryProvider`, `CaptureBackend` and
//! `WindowLocator`. The xcap implementation is only built with the
//! `desktop` feature; everything else runs against fakes.

pub mod desktop;
pub mod frame;
pub mod geometry;
#[cfg(feature = "desktop")]
pub mod screen;
pub mod window;

pub use desktop::DesktopSession;
pub use frame::{
    CaptureBackend, CaptureError, CaptureRequest, CapturedImage, FrameGrabber, PixelLayout,
    RawFrame,
};
pub use geometry::{GeometryProvider, Point, Rect};
#[cfg(feature = "desktop")]
pub use screen::XcapDesktop;
pub use window::{WindowHandle, WindowInfo, WindowLocator, WindowSnapshot};

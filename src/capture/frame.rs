//! Frame grabbing
//!
//! Backends hand back monitor frames in whatever channel order the platform
//! uses. The grabber stitches the requested rectangle together from every
//! monitor it overlaps and normalizes it into a top-left-origin RGB raster.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use log::debug;
use std::rc::Rc;

use super::geometry::Rect;
use crate::app::CaptureMode;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("The selected area is no longer on any screen")]
    CaptureUnavailable,

    #[error("Screen capture failed: {0}")]
    Backend(String),

    #[error("Frame has {actual} bytes, expected at least {expected}")]
    ShortFrame { expected: usize, actual: usize },
}

/// Byte order of one pixel in a raw frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    Rgba,
    Bgra,
    /// BGR plus one padding byte
    Bgrx,
    Rgb,
}

impl PixelLayout {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelLayout::Rgb => 3,
            PixelLayout::Rgba | PixelLayout::Bgra | PixelLayout::Bgrx => 4,
        }
    }

    /// Byte offsets of red, green and blue within a pixel
    fn rgb_offsets(self) -> [usize; 3] {
        match self {
            PixelLayout::Rgba | PixelLayout::Rgb => [0, 1, 2],
            PixelLayout::Bgra | PixelLayout::Bgrx => [2, 1, 0],
        }
    }
}

/// One monitor's pixels as the backend produced them
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    /// Bytes per row, including any padding
    pub stride: usize,
    pub layout: PixelLayout,
    pub data: Vec<u8>,
}

impl RawFrame {
    /// Drop alpha/padding and reorder channels into RGB.
    pub fn normalize(&self) -> Result<RgbImage, CaptureError> {
        let bpp = self.layout.bytes_per_pixel();
        let row_bytes = self.width as usize * bpp;
        let expected = match self.height as usize {
            0 => 0,
            rows => self.stride * (rows - 1) + row_bytes,
        };
        if self.stride < row_bytes || self.data.len() < expected {
            return Err(CaptureError::ShortFrame {
                expected,
                actual: self.data.len(),
            });
        }

        let [r, g, b] = self.layout.rgb_offsets();
        Ok(RgbImage::from_fn(self.width, self.height, |x, y| {
            let at = y as usize * self.stride + x as usize * bpp;
            Rgb([self.data[at + r], self.data[at + g], self.data[at + b]])
        }))
    }
}

/// Platform capture backend
pub trait CaptureBackend {
    /// Bounds of every capturable monitor, in desktop coordinates
    fn monitors(&self) -> Result<Vec<Rect>, CaptureError>;

    fn capture_monitor(&self, index: usize) -> Result<RawFrame, CaptureError>;
}

/// A rectangle to capture. Never degenerate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureRequest {
    pub rect: Rect,
    pub mode: CaptureMode,
}

impl CaptureRequest {
    /// `None` for a zero-area rectangle; callers treat that as a cancellation.
    pub fn new(rect: Rect, mode: CaptureMode) -> Option<Self> {
        (!rect.is_degenerate()).then_some(Self { rect, mode })
    }
}

/// Decoded capture, consumed once by the naming step
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub mode: CaptureMode,
    pub image: RgbImage,
}

impl CapturedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

pub struct FrameGrabber {
    backend: Rc<dyn CaptureBackend>,
}

impl FrameGrabber {
    pub fn new(backend: Rc<dyn CaptureBackend>) -> Self {
        Self { backend }
    }

    /// Capture exactly `request.rect`.
    ///
    /// Parts of the rectangle not covered by any monitor come out black.
    /// A rectangle touching no monitor at all is `CaptureUnavailable`.
    pub fn grab(&self, request: &CaptureRequest) -> Result<CapturedImage, CaptureError> {
        let rect = request.rect;
        let monitors = self.backend.monitors()?;
        let mut canvas = RgbImage::new(rect.width, rect.height);
        let mut covered = false;

        for (index, bounds) in monitors.iter().enumerate() {
            let Some(overlap) = bounds.intersect(&rect) else {
                continue;
            };

            let mut pixels = self.backend.capture_monitor(index)?.normalize()?;
            // HiDPI backends return physical pixels; bring them to desktop units.
            if pixels.width() != bounds.width || pixels.height() != bounds.height {
                pixels = imageops::resize(&pixels, bounds.width, bounds.height, FilterType::Triangle);
            }

            let piece = imageops::crop_imm(
                &pixels,
                overlap.x.abs_diff(bounds.x),
                overlap.y.abs_diff(bounds.y),
                overlap.width,
                overlap.height,
            )
            .to_image();
            imageops::replace(
                &mut canvas,
                &piece,
                i64::from(overlap.x) - i64::from(rect.x),
                i64::from(overlap.y) - i64::from(rect.y),
            );
            covered = true;
        }

        if !covered {
            return Err(CaptureError::CaptureUnavailable);
        }

        debug!(
            "Grabbed {}x{} at ({}, {}) for {} capture",
            rect.width, rect.height, rect.x, rect.y, request.mode
        );
        Ok(CapturedImage {
            mode: request.mode,
            image: canvas,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Monitors filled with a solid BGRA colour each.
    pub(crate) struct FakeBackend {
        pub monitors: Vec<(Rect, [u8; 3])>,
    }

    impl CaptureBackend for FakeBackend {
        fn monitors(&self) -> Result<Vec<Rect>, CaptureError> {
            Ok(self.monitors.iter().map(|(r, _)| *r).collect())
        }

        fn capture_monitor(&self, index: usize) -> Result<RawFrame, CaptureError> {
            let (bounds, [r, g, b]) = self.monitors[index];
            let stride = bounds.width as usize * 4 + 8;
            let mut data = vec![0u8; stride * bounds.height as usize];
            for row in data.chunks_mut(stride) {
                for px in row[..bounds.width as usize * 4].chunks_mut(4) {
                    px.copy_from_slice(&[b, g, r, 255]);
                }
            }
            Ok(RawFrame {
                width: bounds.width,
                height: bounds.height,
                stride,
                layout: PixelLayout::Bgra,
                data,
            })
        }
    }

    fn grabber(monitors: Vec<(Rect, [u8; 3])>) -> FrameGrabber {
        FrameGrabber::new(Rc::new(FakeBackend { monitors }))
    }

    #[test]
    fn test_normalize_reorders_bgrx() {
        let frame = RawFrame {
            width: 2,
            height: 1,
            stride: 8,
            layout: PixelLayout::Bgrx,
            data: vec![3, 2, 1, 0, 30, 20, 10, 0],
        };
        let image = frame.normalize().unwrap();
        assert_eq!(image.get_pixel(0, 0), &Rgb([1, 2, 3]));
        assert_eq!(image.get_pixel(1, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_normalize_rejects_short_frame() {
        let frame = RawFrame {
            width: 4,
            height: 4,
            stride: 16,
            layout: PixelLayout::Rgba,
            data: vec![0; 10],
        };
        assert!(matches!(
            frame.normalize(),
            Err(CaptureError::ShortFrame { .. })
        ));
    }

    #[test]
    fn test_grab_stitches_across_monitors() {
        let grabber = grabber(vec![
            (Rect::new(-100, 0, 100, 50), [255, 0, 0]),
            (Rect::new(0, 0, 100, 50), [0, 0, 255]),
        ]);
        let request = CaptureRequest::new(Rect::new(-10, 5, 20, 10), CaptureMode::Region).unwrap();
        let shot = grabber.grab(&request).unwrap();

        assert_eq!((shot.width(), shot.height()), (20, 10));
        assert_eq!(shot.image.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(shot.image.get_pixel(9, 9), &Rgb([255, 0, 0]));
        assert_eq!(shot.image.get_pixel(10, 0), &Rgb([0, 0, 255]));
        assert_eq!(shot.mode, CaptureMode::Region);
    }

    #[test]
    fn test_grab_off_screen_is_unavailable() {
        let grabber = grabber(vec![(Rect::new(0, 0, 100, 100), [1, 2, 3])]);
        let request = CaptureRequest::new(Rect::new(500, 500, 10, 10), CaptureMode::Window).unwrap();
        assert!(matches!(
            grabber.grab(&request),
            Err(CaptureError::CaptureUnavailable)
        ));
    }

    #[test]
    fn test_degenerate_request_is_rejected() {
        assert!(CaptureRequest::new(Rect::new(0, 0, 0, 10), CaptureMode::Monitor).is_none());
    }
}

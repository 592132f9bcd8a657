//! # Presenter Module
//!
//! Turns decoded frames into displayable images placed inside the viewport.
//!
//! ## Responsibilities
//! - **Orientation**: Applies the capture pipeline's fixed axis correction.
//! - **Placement**: Aspect-preserving shrink-to-fit with centering offsets.
//! - **Caching**: Keeps the last presented frame for freeze-redraws.

use crate::types::{Rect, Viewport};
use crate::video_wrapper::RawFrame;
use std::sync::Arc;
use tracing::trace;

/// Where a frame of the given size lands in the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    /// Fills the viewport width, or its height when the width-fit would overflow.
    pub fn fit(frame_w: u32, frame_h: u32, viewport: Viewport) -> Self {
        if frame_w == 0 || frame_h == 0 {
            return Self {
                x: viewport.width as i32 / 2,
                y: viewport.height as i32 / 2,
                width: 0,
                height: 0,
            };
        }
        let aspect = frame_w as f64 / frame_h as f64;
        let mut width = viewport.width;
        let mut height = (viewport.width as f64 / aspect) as u32;
        if height > viewport.height {
            height = viewport.height;
            width = (viewport.height as f64 * aspect) as u32;
        }
        Self {
            x: (viewport.width as i32 - width as i32).div_euclid(2),
            y: (viewport.height as i32 - height as i32).div_euclid(2),
            width,
            height,
        }
    }

    pub fn to_rect(&self) -> Rect {
        Rect::from_xywh(
            self.x as f32,
            self.y as f32,
            self.width as f32,
            self.height as f32,
        )
    }
}

/// An element of the dihedral group on image axes: optional axis swap, then
/// optional flips of the resulting x and y axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Orientation {
    pub swap_axes: bool,
    pub flip_x: bool,
    pub flip_y: bool,
}

impl Orientation {
    pub const IDENTITY: Orientation = Orientation {
        swap_axes: false,
        flip_x: false,
        flip_y: false,
    };
    /// Rows become columns.
    pub const TRANSPOSE: Orientation = Orientation {
        swap_axes: true,
        flip_x: false,
        flip_y: false,
    };
    pub const ROTATE_CW: Orientation = Orientation {
        swap_axes: true,
        flip_x: true,
        flip_y: false,
    };
    pub const MIRROR_X: Orientation = Orientation {
        swap_axes: false,
        flip_x: true,
        flip_y: false,
    };

    /// The capture correction: transposed import, 90° clockwise, horizontal mirror.
    pub fn capture_correction() -> Self {
        Self::TRANSPOSE.then(Self::ROTATE_CW).then(Self::MIRROR_X)
    }

    /// `self` followed by `next`.
    pub fn then(self, next: Orientation) -> Orientation {
        let (fx, fy) = if next.swap_axes {
            (self.flip_y, self.flip_x)
        } else {
            (self.flip_x, self.flip_y)
        };
        Orientation {
            swap_axes: self.swap_axes ^ next.swap_axes,
            flip_x: next.flip_x ^ fx,
            flip_y: next.flip_y ^ fy,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn output_size(&self, width: u32, height: u32) -> (u32, u32) {
        if self.swap_axes {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Destination coordinates of source pixel `(x, y)` in a `width`×`height` image.
    pub fn map(&self, x: u32, y: u32, width: u32, height: u32) -> (u32, u32) {
        let (dw, dh) = self.output_size(width, height);
        let (mut u, mut v) = if self.swap_axes { (y, x) } else { (x, y) };
        if self.flip_x {
            u = dw - 1 - u;
        }
        if self.flip_y {
            v = dh - 1 - v;
        }
        (u, v)
    }

    /// Re-orients an RGB frame and expands it to RGBA.
    pub fn apply(&self, frame: &RawFrame) -> (u32, u32, Vec<u8>) {
        let (w, h) = (frame.width, frame.height);
        let (dw, dh) = self.output_size(w, h);
        let mut rgba = vec![255u8; dw as usize * dh as usize * 4];

        if self.is_identity() {
            for (src, dst) in frame.data.chunks_exact(3).zip(rgba.chunks_exact_mut(4)) {
                dst[..3].copy_from_slice(src);
            }
            return (dw, dh, rgba);
        }

        for y in 0..h {
            for x in 0..w {
                let (u, v) = self.map(x, y, w, h);
                let s = (y as usize * w as usize + x as usize) * 3;
                let d = (v as usize * dw as usize + u as usize) * 4;
                rgba[d..d + 3].copy_from_slice(&frame.data[s..s + 3]);
            }
        }
        (dw, dh, rgba)
    }
}

/// A frame ready to draw: oriented RGBA pixels and their placement.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<Vec<u8>>,
    pub placement: Placement,
    /// Index of the source frame within its session.
    pub frame_index: u64,
    /// Monotonic per presenter; lets the compositor skip re-uploading a cached frame.
    pub serial: u64,
}

/// Presents frames and caches the most recent one.
#[derive(Debug)]
pub struct Presenter {
    viewport: Viewport,
    orientation: Orientation,
    last: Option<DisplayFrame>,
    serial: u64,
}

impl Presenter {
    pub fn new(viewport: Viewport) -> Self {
        Self::with_orientation(viewport, Orientation::capture_correction())
    }

    pub fn with_orientation(viewport: Viewport, orientation: Orientation) -> Self {
        Self {
            viewport,
            orientation,
            last: None,
            serial: 0,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Orients, places and caches `frame`.
    pub fn present(&mut self, frame: &RawFrame, frame_index: u64) -> &DisplayFrame {
        let (width, height, pixels) = self.orientation.apply(frame);
        let placement = Placement::fit(width, height, self.viewport);
        self.serial += 1;
        trace!(frame_index, ?placement, "Frame presented");
        self.last.insert(DisplayFrame {
            width,
            height,
            pixels: Arc::new(pixels),
            placement,
            frame_index,
            serial: self.serial,
        })
    }

    /// The cached frame, redrawn while frozen.
    pub fn last_frame(&self) -> Option<&DisplayFrame> {
        self.last.as_ref()
    }

    /// Drops the cache at the end of a session.
    pub fn clear(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_correction_is_identity() {
        assert!(Orientation::capture_correction().is_identity());
    }

    #[test]
    fn rotate_cw_moves_top_left_to_top_right() {
        // 3 wide, 2 tall: (0,0) lands at (1,0) in the 2x3 output.
        assert_eq!(Orientation::ROTATE_CW.map(0, 0, 3, 2), (1, 0));
        assert_eq!(Orientation::ROTATE_CW.map(2, 1, 3, 2), (0, 2));
    }

    #[test]
    fn wide_frames_fill_width() {
        let p = Placement::fit(1920, 1080, Viewport::new(1280, 1024));
        assert_eq!((p.width, p.height), (1280, 720));
        assert_eq!((p.x, p.y), (0, 152));
    }
}

//! Raw RGBA frames captured from a playing video.

use crate::errors::MediaError;
use crate::models::Rgb;

const BYTES_PER_PIXEL: usize = 4;

/// A decoded frame in row-major RGBA order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, MediaError> {
        if width == 0 || height == 0 {
            return Err(MediaError::InvalidFrame(format!(
                "empty frame {}x{}",
                width, height
            )));
        }
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if rgba.len() != expected {
            return Err(MediaError::InvalidFrame(format!(
                "expected {} bytes for {}x{}, got {}",
                expected,
                width,
                height,
                rgba.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// A frame filled with one opaque colour.
    pub fn solid(width: u32, height: u32, color: Rgb) -> Result<Self, MediaError> {
        let pixels = width as usize * height as usize;
        Self::new(width, height, [color.r, color.g, color.b, u8::MAX].repeat(pixels))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Colour at `(x, y)`, clamped to the frame edges. Alpha is ignored.
    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let offset = (y * self.width as usize + x) * BYTES_PER_PIXEL;
        Rgb::new(self.rgba[offset], self.rgba[offset + 1], self.rgba[offset + 2])
    }

    /// Nearest-neighbour copy into a `width` x `height` frame.
    pub fn downscale(&self, width: u32, height: u32) -> Frame {
        if width == self.width && height == self.height {
            return self.clone();
        }
        let width = width.max(1);
        let height = height.max(1);
        let mut rgba = Vec::with_capacity(width as usize * height as usize * BYTES_PER_PIXEL);
        for y in 0..height {
            let src_y = (y as u64 * self.height as u64 / height as u64) as u32;
            for x in 0..width {
                let src_x = (x as u64 * self.width as u64 / width as u64) as u32;
                let c = self.pixel(src_x, src_y);
                rgba.extend_from_slice(&[c.r, c.g, c.b, u8::MAX]);
            }
        }
        Frame {
            width,
            height,
            rgba,
        }
    }
}

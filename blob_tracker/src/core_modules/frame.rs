// THEORY:
// The engine never owns pixels. It reads them through `ImageSource`, a minimal
// view of a rectangular, fixed-size, 3-channel 8-bit image: row count, column
// count and per-pixel access in RGB order.
//
// Two sources are provided:
// - `image::RgbImage`, for decoded files and test fixtures.
// - `RawFrame`, a borrowed capture buffer with an explicit stride and channel
//   layout. Cameras hand out BGR or RGBA buffers, often with padded rows; the
//   byte index math mirrors what a capture loop does when it slices a frame.

use image::RgbImage;

use crate::error::{BlobError, Result};

/// Read access to a 3-channel, 8-bit image.
///
/// `Sync` lets the classification pass fan rows out across threads.
pub trait ImageSource: Sync {
    fn num_rows(&self) -> u32;
    fn num_cols(&self) -> u32;
    /// The pixel at `(row, col)` in RGB order. Callers stay in bounds.
    fn pixel(&self, row: u32, col: u32) -> [u8; 3];
}

impl ImageSource for RgbImage {
    fn num_rows(&self) -> u32 {
        self.height()
    }

    fn num_cols(&self) -> u32 {
        self.width()
    }

    #[inline]
    fn pixel(&self, row: u32, col: u32) -> [u8; 3] {
        self.get_pixel(col, row).0
    }
}

/// Byte order of one pixel in a raw frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Rgb,
    Bgr,
    Rgba,
    Bgra,
}

impl PixelLayout {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelLayout::Rgb | PixelLayout::Bgr => 3,
            PixelLayout::Rgba | PixelLayout::Bgra => 4,
        }
    }

    #[inline]
    fn to_rgb(self, bytes: &[u8]) -> [u8; 3] {
        match self {
            PixelLayout::Rgb | PixelLayout::Rgba => [bytes[0], bytes[1], bytes[2]],
            PixelLayout::Bgr | PixelLayout::Bgra => [bytes[2], bytes[1], bytes[0]],
        }
    }
}

/// A borrowed capture buffer with row stride and channel layout.
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    /// Bytes from the start of one row to the start of the next.
    stride: usize,
    layout: PixelLayout,
}

/// Bytes in one row and bytes the whole frame spans, the last row unpadded.
fn frame_extent(
    width: u32,
    height: u32,
    stride: usize,
    layout: PixelLayout,
) -> Result<(usize, usize)> {
    let overflow = BlobError::GeometryOverflow {
        width,
        height,
        stride,
    };
    let Some(row_bytes) = (width as usize).checked_mul(layout.bytes_per_pixel()) else {
        return Err(overflow);
    };
    if width == 0 || height == 0 {
        return Ok((row_bytes, 0));
    }

    let total = stride
        .checked_mul(height as usize - 1)
        .and_then(|rows| rows.checked_add(row_bytes));
    match total {
        Some(total) => Ok((row_bytes, total)),
        None => Err(overflow),
    }
}

impl<'a> RawFrame<'a> {
    /// Wraps `data`, checking that the declared geometry fits inside it.
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        stride: usize,
        layout: PixelLayout,
    ) -> Result<Self> {
        let (row_bytes, expected) = frame_extent(width, height, stride, layout)?;
        if stride < row_bytes {
            return Err(BlobError::BufferTooSmall {
                expected: row_bytes,
                actual: stride,
            });
        }

        if data.len() < expected {
            return Err(BlobError::BufferTooSmall {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            data,
            width,
            height,
            stride,
            layout,
        })
    }

    /// A buffer whose rows are packed back to back with no padding.
    pub fn packed(data: &'a [u8], width: u32, height: u32, layout: PixelLayout) -> Result<Self> {
        Self::new(
            data,
            width,
            height,
            (width as usize).saturating_mul(layout.bytes_per_pixel()),
            layout,
        )
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn stride(&self) -> usize {
        self.stride
    }
}

impl ImageSource for RawFrame<'_> {
    fn num_rows(&self) -> u32 {
        self.height
    }

    fn num_cols(&self) -> u32 {
        self.width
    }

    #[inline]
    fn pixel(&self, row: u32, col: u32) -> [u8; 3] {
        let bytes_per_pixel = self.layout.bytes_per_pixel();
        let byte_index = row as usize * self.stride + col as usize * bytes_per_pixel;
        self.layout
            .to_rgb(&self.data[byte_index..byte_index + bytes_per_pixel])
    }
}

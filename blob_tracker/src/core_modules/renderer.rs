// THEORY:
// The blob code never draws directly. Everything visual goes through the
// `BlobRenderer` trait, a handful of primitives in image-space integer
// coordinates, so the library stays free of any particular GUI toolkit.
//
// - Primitives: `point`, `line`, `circle`, `rectangle`, `clear_background`.
// - `cross_hairs` is derived from `line` + `circle` and shared by every renderer.
// - `ImageRenderer` is the reference implementation, drawing into an
//   `image::RgbImage` with `imageproc`.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

/// Drawing primitives the blob display routines are written against.
pub trait BlobRenderer {
    /// Paints a single pixel. Note the `(row, col)` order.
    fn point(&mut self, row: i32, col: i32, color: Rgb<u8>);

    fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Rgb<u8>, thickness: u32);

    fn circle(&mut self, x_center: i32, y_center: i32, radius: i32, color: Rgb<u8>, thickness: u32);

    fn rectangle(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        color: Rgb<u8>,
        thickness: u32,
    );

    fn clear_background(&mut self, color: Rgb<u8>);

    /// A horizontal and a vertical hair of length `diameter` centred on the
    /// point, optionally circled.
    fn cross_hairs(
        &mut self,
        x_center: i32,
        y_center: i32,
        diameter: i32,
        color: Rgb<u8>,
        circle: bool,
        thickness: u32,
    ) {
        let half = diameter / 2;
        let (left, right) = (x_center - half, x_center + half);
        let (top, bottom) = (y_center - half, y_center + half);
        self.line(left, y_center, right, y_center, color, thickness);
        self.line(x_center, top, x_center, bottom, color, thickness);
        if circle {
            self.circle(x_center, y_center, half, color, thickness);
        }
    }
}

/// What to draw for each blob.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayOptions {
    /// One line per run, which fills the blob.
    pub show_runs: bool,
    pub show_bounding_box: bool,
    /// Circled cross hairs at the centroid, sized to the shorter bounding-box side.
    pub show_cross_hairs: bool,
    pub cross_hair_color: Rgb<u8>,
    pub thickness: u32,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_runs: true,
            show_bounding_box: false,
            show_cross_hairs: false,
            cross_hair_color: Rgb([255, 255, 255]),
            thickness: 1,
        }
    }
}

impl DisplayOptions {
    /// Runs, bounding box and cross hairs.
    pub fn all() -> Self {
        Self {
            show_runs: true,
            show_bounding_box: true,
            show_cross_hairs: true,
            ..Self::default()
        }
    }
}

/// Draws onto an in-memory RGB image.
pub struct ImageRenderer<'a> {
    image: &'a mut RgbImage,
}

impl<'a> ImageRenderer<'a> {
    pub fn new(image: &'a mut RgbImage) -> Self {
        Self { image }
    }
}

/// Offsets for `thickness` parallel strokes, centred on zero.
fn stroke_offsets(thickness: u32) -> impl Iterator<Item = i32> {
    let thickness = thickness.max(1) as i32;
    let first = -(thickness - 1) / 2;
    first..first + thickness
}

impl BlobRenderer for ImageRenderer<'_> {
    fn point(&mut self, row: i32, col: i32, color: Rgb<u8>) {
        let (Ok(x), Ok(y)) = (u32::try_from(col), u32::try_from(row)) else {
            return;
        };
        if x < self.image.width() && y < self.image.height() {
            self.image.put_pixel(x, y, color);
        }
    }

    fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Rgb<u8>, thickness: u32) {
        // Spread extra strokes across the line's minor axis.
        let mostly_horizontal = (x2 - x1).abs() >= (y2 - y1).abs();
        for offset in stroke_offsets(thickness) {
            let (dx, dy) = if mostly_horizontal {
                (0, offset)
            } else {
                (offset, 0)
            };
            draw_line_segment_mut(
                self.image,
                ((x1 + dx) as f32, (y1 + dy) as f32),
                ((x2 + dx) as f32, (y2 + dy) as f32),
                color,
            );
        }
    }

    fn circle(
        &mut self,
        x_center: i32,
        y_center: i32,
        radius: i32,
        color: Rgb<u8>,
        thickness: u32,
    ) {
        for offset in stroke_offsets(thickness) {
            let radius = radius + offset;
            if radius >= 0 {
                draw_hollow_circle_mut(self.image, (x_center, y_center), radius, color);
            }
        }
    }

    fn rectangle(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        color: Rgb<u8>,
        thickness: u32,
    ) {
        for inset in stroke_offsets(thickness) {
            let stroke_width = width - 2 * inset;
            let stroke_height = height - 2 * inset;
            if stroke_width > 0 && stroke_height > 0 {
                let size = (stroke_width as u32, stroke_height as u32);
                let rect = Rect::at(x + inset, y + inset).of_size(size.0, size.1);
                draw_hollow_rect_mut(self.image, rect, color);
            }
        }
    }

    fn clear_background(&mut self, color: Rgb<u8>) {
        for pixel in self.image.pixels_mut() {
            *pixel = color;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::test_utils::{Primitive, RecordingRenderer};

    const RED: Rgb<u8> = Rgb([255, 0, 0]);

    #[test]
    fn cross_hairs_are_two_lines_and_a_circle() {
        let mut renderer = RecordingRenderer::default();
        renderer.cross_hairs(10, 20, 8, RED, true, 1);
        assert_eq!(
            renderer.calls,
            vec![
                Primitive::Line {
                    x1: 6,
                    y1: 20,
                    x2: 14,
                    y2: 20,
                    color: RED,
                    thickness: 1,
                },
                Primitive::Line {
                    x1: 10,
                    y1: 16,
                    x2: 10,
                    y2: 24,
                    color: RED,
                    thickness: 1,
                },
                Primitive::Circle {
                    x: 10,
                    y: 20,
                    radius: 4,
                    color: RED,
                    thickness: 1,
                },
            ]
        );
    }

    #[test]
    fn cross_hairs_without_circle() {
        let mut renderer = RecordingRenderer::default();
        renderer.cross_hairs(0, 0, 3, RED, false, 1);
        assert_eq!(renderer.calls.len(), 2);
    }

    #[test]
    fn image_renderer_draws_horizontal_line() {
        let mut image = RgbImage::new(6, 3);
        ImageRenderer::new(&mut image).line(1, 1, 4, 1, RED, 1);
        for x in 1..4 {
            assert_eq!(*image.get_pixel(x, 1), RED);
        }
        assert_eq!(*image.get_pixel(0, 1), Rgb([0, 0, 0]));
        assert_eq!(*image.get_pixel(5, 1), Rgb([0, 0, 0]));
    }

    #[test]
    fn thick_lines_cover_neighbouring_rows() {
        let mut image = RgbImage::new(6, 5);
        ImageRenderer::new(&mut image).line(0, 2, 5, 2, RED, 3);
        for y in 1..=3 {
            assert_eq!(*image.get_pixel(3, y), RED);
        }
        assert_eq!(*image.get_pixel(3, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn points_outside_the_image_are_ignored() {
        let mut image = RgbImage::new(2, 2);
        let mut renderer = ImageRenderer::new(&mut image);
        renderer.point(-1, 0, RED);
        renderer.point(0, 2, RED);
        renderer.point(1, 0, RED);
        assert_eq!(*image.get_pixel(0, 1), RED);
        assert_eq!(image.pixels().filter(|p| **p == RED).count(), 1);
    }

    #[test]
    fn rectangle_outline_leaves_interior_untouched() {
        let mut image = RgbImage::new(8, 8);
        ImageRenderer::new(&mut image).rectangle(1, 1, 5, 4, RED, 1);
        assert_eq!(*image.get_pixel(1, 1), RED);
        assert_eq!(*image.get_pixel(1, 4), RED);
        assert_eq!(*image.get_pixel(3, 2), Rgb([0, 0, 0]));
    }

    #[test]
    fn clear_background_fills_every_pixel() {
        let mut image = RgbImage::new(3, 3);
        ImageRenderer::new(&mut image).clear_background(Rgb([7, 7, 7]));
        assert!(image.pixels().all(|p| *p == Rgb([7, 7, 7])));
    }
}

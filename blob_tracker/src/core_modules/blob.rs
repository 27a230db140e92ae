// THEORY:
// A `Blob` is one connected region of a single category, assembled run by run
// while the engine scans the image.
//
// Key architectural principles:
// 1.  **Incremental Moments**: the blob never rescans its pixels. Every added run
//     updates the zeroth and first moments and grows the bounding box, so area
//     and centroid are always available in O(1).
// 2.  **Linear Merging**: moments add linearly, so absorbing another blob is just
//     re-adding its runs. Area of the result is exactly the sum of both areas and
//     the bounding box is the union of both boxes.
// 3.  **Frame Scoped**: blob ids are unique within one `find` call only. Nothing
//     here remembers where the blob was in earlier frames.

use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::core_modules::renderer::{BlobRenderer, DisplayOptions};
use crate::core_modules::run::Run;

/// Identifier of a blob, unique within one scan across all categories.
pub type BlobId = u64;

/// Raw image moments of a region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    /// Pixel count.
    pub m00: f64,
    /// Sum of pixel column positions.
    pub m10: f64,
    /// Sum of pixel row positions.
    pub m01: f64,
}

impl Moments {
    fn add_run(&mut self, run: &Run) {
        let area = run.area() as f64;
        self.m00 += area;
        self.m10 += area * run.center_col();
        self.m01 += area * run.row as f64;
    }

    /// `(m10/m00, m01/m00)`, or the origin for an empty region.
    pub fn centroid(&self) -> (f64, f64) {
        if self.m00 > 0.0 {
            (self.m10 / self.m00, self.m01 / self.m00)
        } else {
            (0.0, 0.0)
        }
    }
}

/// Axis-aligned box in pixel units. `x`/`y` is the top-left pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn of_run(run: &Run) -> Self {
        Self {
            x: run.col_start,
            y: run.row,
            width: run.area(),
            height: 1,
        }
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        BoundingBox {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        }
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        col >= self.x && col < self.x + self.width && row >= self.y && row < self.y + self.height
    }
}

/// A connected region of one category.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub id: BlobId,
    pub category: u8,
    moments: Moments,
    /// `None` until the first run arrives.
    bounding_box: Option<BoundingBox>,
    runs: Vec<Run>,
}

impl Blob {
    pub fn new(id: BlobId, category: u8) -> Self {
        Self {
            id,
            category,
            moments: Moments::default(),
            bounding_box: None,
            runs: Vec::new(),
        }
    }

    /// Claims `run` for this blob and folds it into the moments and box.
    /// The caller's run is tagged with this blob's id before it is copied in.
    pub fn add_run(&mut self, run: &mut Run) {
        debug_assert_eq!(run.category, self.category);
        run.blob_id = Some(self.id);
        self.moments.add_run(run);
        let run_box = BoundingBox::of_run(run);
        self.bounding_box = Some(match self.bounding_box {
            Some(current) => current.union(&run_box),
            None => run_box,
        });
        self.runs.push(*run);
    }

    /// Absorbs every run of `other`. `other` is consumed; its id is gone.
    pub fn merge(&mut self, other: Blob) {
        for mut run in other.runs {
            self.add_run(&mut run);
        }
    }

    pub fn area(&self) -> f64 {
        self.moments.m00
    }

    pub fn moments(&self) -> &Moments {
        &self.moments
    }

    pub fn centroid(&self) -> (f64, f64) {
        self.moments.centroid()
    }

    pub fn centroid_x(&self) -> f64 {
        self.centroid().0
    }

    pub fn centroid_y(&self) -> f64 {
        self.centroid().1
    }

    /// The enclosing box, or an all-zero box for a blob with no runs.
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box.unwrap_or_default()
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Draws the blob: a line per run, then the optional box and cross hairs.
    pub fn display(
        &self,
        renderer: &mut impl BlobRenderer,
        color: Rgb<u8>,
        options: &DisplayOptions,
    ) {
        if options.show_runs {
            for run in &self.runs {
                let row = run.row as i32;
                renderer.line(
                    run.col_start as i32,
                    row,
                    run.col_end as i32,
                    row,
                    color,
                    options.thickness,
                );
            }
        }

        let bounds = self.bounding_box();
        if options.show_bounding_box {
            renderer.rectangle(
                bounds.x as i32,
                bounds.y as i32,
                bounds.width as i32,
                bounds.height as i32,
                color,
                options.thickness,
            );
        }

        if options.show_cross_hairs {
            let (x, y) = self.centroid();
            renderer.cross_hairs(
                x.round() as i32,
                y.round() as i32,
                bounds.width.min(bounds.height) as i32,
                options.cross_hair_color,
                true,
                options.thickness,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::test_utils::{Primitive, RecordingRenderer};

    fn blob_with(id: BlobId, runs: &[(u32, u32, u32)]) -> Blob {
        let mut blob = Blob::new(id, 1);
        for &(row, start, end) in runs {
            blob.add_run(&mut Run::new(row, start, end, 1));
        }
        blob
    }

    #[test]
    fn add_run_tags_the_run_and_updates_moments() {
        let mut blob = Blob::new(7, 1);
        let mut run = Run::new(2, 1, 3, 1);
        blob.add_run(&mut run);

        assert_eq!(run.blob_id, Some(7));
        assert_eq!(blob.runs()[0].blob_id, Some(7));
        assert_eq!(blob.area(), 3.0);
        assert_eq!(blob.centroid(), (2.0, 2.0));
        assert_eq!(
            blob.bounding_box(),
            BoundingBox {
                x: 1,
                y: 2,
                width: 3,
                height: 1,
            }
        );
    }

    #[test]
    fn empty_blob_centroid_is_origin() {
        let blob = Blob::new(1, 1);
        assert!(blob.is_empty());
        assert_eq!(blob.centroid(), (0.0, 0.0));
        assert_eq!(blob.bounding_box(), BoundingBox::default());
    }

    #[test]
    fn square_centroid_is_its_center() {
        let blob = blob_with(1, &[(1, 1, 2), (2, 1, 2)]);
        assert_eq!(blob.area(), 4.0);
        assert_eq!(blob.centroid_x(), 1.5);
        assert_eq!(blob.centroid_y(), 1.5);
    }

    #[test]
    fn merge_adds_areas_and_unions_boxes() {
        let mut left = blob_with(1, &[(0, 0, 2), (1, 0, 0)]);
        let right = blob_with(2, &[(3, 5, 9)]);
        let expected_box = left.bounding_box().union(&right.bounding_box());
        let expected_area = left.area() + right.area();

        left.merge(right);

        assert_eq!(left.area(), expected_area);
        assert_eq!(left.bounding_box(), expected_box);
        assert_eq!(
            expected_box,
            BoundingBox {
                x: 0,
                y: 0,
                width: 10,
                height: 4,
            }
        );
        assert!(left.runs().iter().all(|run| run.blob_id == Some(1)));
        assert_eq!(left.runs().len(), 3);
    }

    #[test]
    fn merged_moments_match_a_blob_built_in_one_go() {
        let mut merged = blob_with(1, &[(0, 0, 3)]);
        merged.merge(blob_with(2, &[(1, 2, 6), (2, 6, 6)]));
        let direct = blob_with(1, &[(0, 0, 3), (1, 2, 6), (2, 6, 6)]);
        assert_eq!(merged.moments(), direct.moments());
    }

    #[test]
    fn display_draws_runs_box_and_cross_hairs() {
        let blob = blob_with(1, &[(1, 1, 4), (2, 1, 4), (3, 1, 4)]);
        let mut renderer = RecordingRenderer::default();
        let color = Rgb([0, 255, 0]);
        blob.display(&mut renderer, color, &DisplayOptions::all());

        // Three runs plus the two cross-hair lines.
        assert_eq!(renderer.lines(), 5);
        let outline = Primitive::Rectangle {
            x: 1,
            y: 1,
            width: 4,
            height: 3,
            color,
            thickness: 1,
        };
        assert_eq!(renderer.rectangles(), vec![&outline]);
        // Diameter is the shorter side, so the radius is 1.
        let circle = Primitive::Circle {
            x: 3,
            y: 2,
            radius: 1,
            color: Rgb([255, 255, 255]),
            thickness: 1,
        };
        assert!(renderer.calls.contains(&circle));
    }

    #[test]
    fn default_display_draws_runs_only() {
        let blob = blob_with(1, &[(0, 0, 1), (1, 0, 1)]);
        let mut renderer = RecordingRenderer::default();
        blob.display(&mut renderer, Rgb([1, 2, 3]), &DisplayOptions::default());
        assert_eq!(renderer.lines(), 2);
        assert_eq!(renderer.calls.len(), 2);
    }
}

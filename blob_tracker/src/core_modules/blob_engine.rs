// THEORY:
// The `BlobEngine` turns one image into a `BlobCollection`. It is a single-pass,
// run-based connected-component labeler that handles every color category at
// once.
//
// Algorithm steps:
// 1.  **Classification**: every pixel is converted into the working color space
//     and labeled with the first category whose ranges it passes. This is the
//     only pass that may run in parallel; labels are independent per pixel.
// 2.  **Run Extraction**: each grid row is split into maximal same-category
//     intervals. Background runs are never recorded.
// 3.  **Row Linking**: a two-row window (`prev`, `cur`) of runs, bucketed by
//     category, is walked top to bottom. A run that overlaps a run above joins
//     that run's blob. A run that touches two different blobs merges them on the
//     spot: the blob from the row above is absorbed into the run's blob and every
//     run in the window still carrying the absorbed id is rewritten, so later
//     comparisons on the same row already see the unified id. A run that touches
//     nothing starts a new blob.
//     This step is strictly sequential in row order.
// 4.  **Frame Isolation**: the category grid is reused as a buffer, but the run
//     window and the blob id counter live in a `RowLinker` owned by a single
//     `find` call. Two calls on the same image give the same blobs.

use log::{debug, trace, warn};

use crate::core_modules::blob::{Blob, BlobId};
use crate::core_modules::blob_collection::BlobCollection;
use crate::core_modules::classifier::{CategoryGrid, DEFAULT_PARALLEL_THRESHOLD, PixelClassifier};
use crate::core_modules::color_category::{BACKGROUND, ColorCategory, DisplayColor};
use crate::core_modules::color_space::ColorSpace;
use crate::core_modules::frame::ImageSource;
use crate::core_modules::renderer::{BlobRenderer, DisplayOptions};
use crate::core_modules::run::{Run, extract_runs};
use crate::error::{BlobError, Result};

/// Most categories a grid cell can address.
pub const MAX_CATEGORIES: usize = u8::MAX as usize + 1;

/// Per-call linking state: the two-row run window and the blob id counter.
struct RowLinker {
    next_id: BlobId,
    prev: Vec<Vec<Run>>,
    cur: Vec<Vec<Run>>,
}

impl RowLinker {
    fn new(category_count: usize) -> Self {
        Self {
            next_id: 0,
            prev: vec![Vec::new(); category_count],
            cur: vec![Vec::new(); category_count],
        }
    }

    /// Extracts the runs of `row` and links them against the row above.
    fn scan_row(&mut self, row: u32, labels: &[u8], blobs: &mut BlobCollection) {
        for runs in self.cur.iter_mut() {
            runs.clear();
        }
        extract_runs(row, labels, &mut self.cur);

        for category in 1..self.cur.len() {
            self.link_category(category, blobs);
        }

        std::mem::swap(&mut self.prev, &mut self.cur);
    }

    fn link_category(&mut self, category: usize, blobs: &mut BlobCollection) {
        let Some(index) = blobs.category_mut(category as u8) else {
            return;
        };
        let prev = &mut self.prev[category];
        let cur = &mut self.cur[category];

        for i in 0..cur.len() {
            for j in 0..prev.len() {
                if !cur[i].overlaps(&prev[j]) {
                    continue;
                }
                let Some(above_id) = prev[j].blob_id else {
                    continue;
                };

                match cur[i].blob_id {
                    None => {
                        if let Some(blob) = index.get_mut(above_id) {
                            blob.add_run(&mut cur[i]);
                        }
                    }
                    Some(survivor) if survivor != above_id => {
                        let Some(absorbed) = index.remove(above_id) else {
                            continue;
                        };
                        trace!(
                            "category {category}: blob {above_id} ({} px) merged into {survivor}",
                            absorbed.area()
                        );
                        if let Some(blob) = index.get_mut(survivor) {
                            blob.merge(absorbed);
                        }
                        for run in prev.iter_mut().chain(cur.iter_mut()) {
                            if run.blob_id == Some(above_id) {
                                run.blob_id = Some(survivor);
                            }
                        }
                    }
                    // Another contact point of an already unified shape.
                    Some(_) => {}
                }
            }

            if cur[i].blob_id.is_none() {
                let mut blob = Blob::new(self.next_id, category as u8);
                self.next_id += 1;
                blob.add_run(&mut cur[i]);
                index.insert(blob);
            }
        }
    }
}

/// Finds color blobs in images against an ordered category list.
///
/// The engine is Idle until it holds a category list, and Ready after.
/// `find` is the only operation that produces blobs and it recomputes
/// everything from scratch each time.
#[derive(Debug, Clone)]
pub struct BlobEngine {
    color_space: ColorSpace,
    categories: Vec<ColorCategory>,
    grid: CategoryGrid,
    blobs: BlobCollection,
    /// Pixel count from which classification runs on the rayon pool.
    parallel_threshold: Option<usize>,
}

impl BlobEngine {
    pub fn new(color_space: ColorSpace) -> Self {
        Self {
            color_space,
            categories: Vec::new(),
            grid: CategoryGrid::default(),
            blobs: BlobCollection::default(),
            parallel_threshold: Some(DEFAULT_PARALLEL_THRESHOLD),
        }
    }

    pub fn with_categories(
        color_space: ColorSpace,
        categories: Vec<ColorCategory>,
    ) -> Result<Self> {
        let mut engine = Self::new(color_space);
        engine.set_categories(categories)?;
        Ok(engine)
    }

    /// Binds a category list. Entry 0 is treated as the background.
    pub fn set_categories(&mut self, categories: Vec<ColorCategory>) -> Result<()> {
        let count = categories.len();
        if count > MAX_CATEGORIES {
            warn!("rejecting {count} categories, at most {MAX_CATEGORIES} fit");
            return Err(BlobError::TooManyCategories(count));
        }
        self.categories = categories;
        self.blobs.clear();
        Ok(())
    }

    pub fn categories(&self) -> &[ColorCategory] {
        &self.categories
    }

    /// Lets an editor tweak thresholds in place between scans.
    pub fn categories_mut(&mut self) -> &mut [ColorCategory] {
        &mut self.categories
    }

    pub fn clear_categories(&mut self) {
        self.categories.clear();
        self.blobs.clear();
    }

    pub fn is_ready(&self) -> bool {
        !self.categories.is_empty()
    }

    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    pub fn set_color_space(&mut self, color_space: ColorSpace) {
        self.color_space = color_space;
    }

    /// `None` keeps classification on the calling thread.
    pub fn set_parallel_threshold(&mut self, pixels: Option<usize>) {
        self.parallel_threshold = pixels;
    }

    pub fn parallel_threshold(&self) -> Option<usize> {
        self.parallel_threshold
    }

    /// Labels `image` and rebuilds the blob collection from it.
    ///
    /// Fails without scanning when no categories are bound or the image has no
    /// pixels; the previous result is discarded either way.
    pub fn find(&mut self, image: &impl ImageSource) -> Result<&BlobCollection> {
        self.blobs.clear();

        if self.categories.is_empty() {
            warn!("find called without a category list");
            self.grid.reset(0, 0);
            return Err(BlobError::NoCategories);
        }

        let width = image.num_cols();
        let height = image.num_rows();
        if width == 0 || height == 0 {
            warn!("find called on an empty {width}x{height} image");
            self.grid.reset(0, 0);
            return Err(BlobError::EmptyImage { width, height });
        }

        self.color_space.prepare(&mut self.categories);

        // --- 1. Classification ---
        let pixels = width as usize * height as usize;
        let parallel = self
            .parallel_threshold
            .is_some_and(|threshold| pixels >= threshold);
        self.grid.reset(width, height);
        let classifier = PixelClassifier::new(self.color_space, &self.categories);
        self.grid.fill(image, &classifier, parallel);

        // --- 2. Run extraction and row linking ---
        let mut blobs = BlobCollection::new(self.categories.len());
        let mut linker = RowLinker::new(self.categories.len());
        for row in 0..height {
            linker.scan_row(row, self.grid.row(row), &mut blobs);
        }
        self.blobs = blobs;

        debug!(
            "found {} blobs in {width}x{height} image over {} categories (parallel: {parallel})",
            self.blobs.blob_count(),
            self.categories.len() - 1
        );
        Ok(&self.blobs)
    }

    /// Result of the last successful `find`, empty otherwise.
    pub fn blobs(&self) -> &BlobCollection {
        &self.blobs
    }

    /// Per-pixel labels from the last `find`.
    pub fn category_grid(&self) -> &CategoryGrid {
        &self.grid
    }

    pub fn remove_small_blobs(&mut self, min_area: f64) -> usize {
        let removed = self.blobs.remove_small_blobs(min_area);
        debug!("removed {removed} blobs smaller than {min_area}");
        removed
    }

    pub fn remove_small_blobs_in(&mut self, category: u8, min_area: f64) -> usize {
        self.blobs.remove_small_blobs_in(category, min_area)
    }

    pub fn find_largest_blobs(&self) -> Vec<Option<BlobId>> {
        self.blobs.find_largest_blobs()
    }

    /// Fills the canvas with the background category's display color.
    pub fn display_background(&self, renderer: &mut impl BlobRenderer) {
        let color = self
            .categories
            .get(BACKGROUND as usize)
            .map_or(DisplayColor::BLACK, |background| background.display_color);
        renderer.clear_background(color.to_rgb());
    }

    /// Paints every pixel in the display color of its category. Slow, meant
    /// for checking thresholds.
    pub fn display_categories(&self, renderer: &mut impl BlobRenderer) {
        for (row, labels) in self.grid.rows().enumerate() {
            for (col, &label) in labels.iter().enumerate() {
                if let Some(category) = self.categories.get(label as usize) {
                    renderer.point(row as i32, col as i32, category.display_color.to_rgb());
                }
            }
        }
    }

    pub fn display_blobs(&self, renderer: &mut impl BlobRenderer, options: &DisplayOptions) {
        self.blobs
            .display_blobs(renderer, &self.categories, options);
    }

    pub fn display_blob(
        &self,
        renderer: &mut impl BlobRenderer,
        id: BlobId,
        color: image::Rgb<u8>,
        options: &DisplayOptions,
    ) -> bool {
        self.blobs.display_blob(renderer, id, color, options)
    }

    pub fn display_blobs_by_id(
        &self,
        renderer: &mut impl BlobRenderer,
        ids: &[BlobId],
        color: image::Rgb<u8>,
        options: &DisplayOptions,
    ) -> usize {
        self.blobs
            .display_blobs_by_id(renderer, ids, color, options)
    }

    pub fn display_largest_blobs(
        &self,
        renderer: &mut impl BlobRenderer,
        options: &DisplayOptions,
    ) -> usize {
        self.blobs
            .display_largest_blobs(renderer, &self.categories, options)
    }
}

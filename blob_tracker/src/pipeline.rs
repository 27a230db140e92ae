// THEORY:
// The `pipeline` module is the top-level, single-threaded API of the tracker.
// It wraps a `BlobEngine` with the settings a tracking loop needs and turns each
// frame into a small, serializable `FrameReport`.
//
// Per frame:
// 1.  **Find**: the engine labels the frame and builds the blob collection.
// 2.  **Prune**: blobs below the configured minimum area are dropped, which is
//     the only noise filtering the tracker does.
// 3.  **Summarize**: the largest blob of every category is reported together
//     with the blob count and how long the frame took.
//
// Frames are independent. The frame counter is the only state carried from one
// call to the next; blob ids restart with every frame.

use std::path::Path;
use std::time::{Duration, Instant};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::core_modules::blob::{Blob, BlobId, BoundingBox};
use crate::core_modules::blob_engine::BlobEngine;
use crate::core_modules::classifier::DEFAULT_PARALLEL_THRESHOLD;
use crate::core_modules::color_category::{ColorCategory, DisplayColor};
use crate::core_modules::color_space::ColorSpace;
use crate::core_modules::frame::ImageSource;
use crate::error::{BlobError, Result};

fn default_parallel_threshold() -> Option<usize> {
    Some(DEFAULT_PARALLEL_THRESHOLD)
}

/// Everything needed to build a tracker, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub color_space: ColorSpace,
    /// Ordered category list. Entry 0 is the background.
    pub categories: Vec<ColorCategory>,
    /// Blobs with a smaller area are pruned after every `find`.
    #[serde(default)]
    pub min_blob_area: Option<f64>,
    /// Pixel count from which classification goes parallel. `null` disables it.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: Option<usize>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        let background = ColorCategory::background("background", DisplayColor::BLACK);
        Self {
            color_space: ColorSpace::default(),
            categories: vec![background],
            min_blob_area: None,
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

impl TrackerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| BlobError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// The reported facts about one blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobSummary {
    pub id: BlobId,
    pub category: u8,
    pub category_name: String,
    pub area: f64,
    /// `(x, y)` in pixels.
    pub centroid: (f64, f64),
    pub bounding_box: BoundingBox,
}

impl BlobSummary {
    pub fn new(blob: &Blob, categories: &[ColorCategory]) -> Self {
        Self {
            id: blob.id,
            category: blob.category,
            category_name: categories
                .get(blob.category as usize)
                .map(|category| category.name.clone())
                .unwrap_or_default(),
            area: blob.area(),
            centroid: blob.centroid(),
            bounding_box: blob.bounding_box(),
        }
    }
}

/// The outcome of one processed frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub frame_index: u64,
    /// Time spent in `find` and pruning.
    pub elapsed: Duration,
    /// Blobs left after pruning, all categories.
    pub blob_count: usize,
    pub removed_small: usize,
    /// Largest blob per category. Element 0 (background) is always `None`.
    pub largest: Vec<Option<BlobSummary>>,
}

impl FrameReport {
    /// The largest blob of a category, if it has any.
    pub fn largest_in(&self, category: u8) -> Option<&BlobSummary> {
        self.largest.get(category as usize).and_then(Option::as_ref)
    }
}

/// A configured engine plus a frame counter.
#[derive(Debug, Clone)]
pub struct BlobTracker {
    engine: BlobEngine,
    min_blob_area: Option<f64>,
    frame_index: u64,
}

impl BlobTracker {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        let mut engine = BlobEngine::with_categories(config.color_space, config.categories)?;
        engine.set_parallel_threshold(config.parallel_threshold);
        Ok(Self {
            engine,
            min_blob_area: config.min_blob_area,
            frame_index: 0,
        })
    }

    /// Runs find, prune and summarize on one frame.
    pub fn process_frame(&mut self, image: &impl ImageSource) -> Result<FrameReport> {
        let frame_index = self.frame_index;
        self.frame_index += 1;

        let start = Instant::now();
        self.engine.find(image)?;
        let removed_small = match self.min_blob_area {
            Some(min_area) => self.engine.remove_small_blobs(min_area),
            None => 0,
        };
        let elapsed = start.elapsed();

        let blobs = self.engine.blobs();
        let categories = self.engine.categories();
        let largest = blobs
            .find_largest_blobs()
            .into_iter()
            .map(|id| id.and_then(|id| blobs.find_blob(id)))
            .map(|blob| blob.map(|blob| BlobSummary::new(blob, categories)))
            .collect();

        let report = FrameReport {
            frame_index,
            elapsed,
            blob_count: blobs.blob_count(),
            removed_small,
            largest,
        };
        debug!(
            "frame {frame_index}: {} blobs ({} pruned) in {:?}",
            report.blob_count, report.removed_small, report.elapsed
        );
        Ok(report)
    }

    /// The engine holding the last frame's blobs, for rendering.
    pub fn engine(&self) -> &BlobEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut BlobEngine {
        &mut self.engine
    }

    pub fn frames_processed(&self) -> u64 {
        self.frame_index
    }
}

// THEORY:
// This file is the main entry point for the `blob_tracker` library crate.
//
// Two levels of API are exported:
// - `core_modules`: the blob engine and its data model (categories, runs, blobs,
//   per-category indices) for callers that drive `find` themselves and render
//   with their own `BlobRenderer`.
// - `pipeline` / `parallel_pipeline`: a configured tracker that runs the engine
//   on whole frames, prunes small blobs and reports the largest blob of every
//   category, either on the calling thread or on a pool of workers.
//
// The most used types are re-exported at the crate root.

pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use core_modules::blob::{Blob, BlobId, BoundingBox};
pub use core_modules::blob_collection::BlobCollection;
pub use core_modules::blob_engine::BlobEngine;
pub use core_modules::blob_index::BlobIndex;
pub use core_modules::color_category::{ColorCategory, ColorRange, DisplayColor};
pub use core_modules::color_space::ColorSpace;
pub use core_modules::frame::{ImageSource, PixelLayout, RawFrame};
pub use core_modules::range_test::RangeTest;
pub use core_modules::renderer::{BlobRenderer, DisplayOptions, ImageRenderer};
pub use error::{BlobError, Result};
pub use parallel_pipeline::ParallelTracker;
pub use pipeline::{BlobSummary, BlobTracker, FrameReport, TrackerConfig};

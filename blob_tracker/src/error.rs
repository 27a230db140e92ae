// THEORY:
// Every failure the tracker can report lives in one enum. The taxonomy is small:
// the engine either has what it needs before the scan starts (categories bound,
// a non-empty image) or it refuses to begin. Once classification starts it runs
// to completion, so there are no partial-failure variants.
//
// Malformed thresholds (a non-circular range with `lower > upper`) are not an
// error. Such a range never passes and that is the caller's responsibility.

use std::path::PathBuf;

/// Errors produced by the blob engine, the tracker pipeline and its worker pool.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// `find` was called while no category list is bound (engine is idle).
    #[error("no color categories are bound to the blob engine")]
    NoCategories,

    /// The supplied image has no pixels to scan.
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// Category labels are stored as bytes, so at most 256 entries fit, background included.
    #[error("{0} color categories exceed the limit of 256")]
    TooManyCategories(usize),

    /// A raw frame buffer is shorter than its declared geometry requires.
    #[error("frame buffer holds {actual} bytes but its geometry needs {expected}")]
    BufferTooSmall { expected: usize, actual: usize },

    /// A raw frame's declared geometry spans more bytes than can be addressed.
    #[error("frame geometry {width}x{height} with stride {stride} overflows")]
    GeometryOverflow {
        width: u32,
        height: u32,
        stride: usize,
    },

    /// A tracker configuration could not be parsed.
    #[error("invalid tracker configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A tracker configuration file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The parallel worker pool has shut down or a worker died mid-frame.
    #[error("worker pool is closed")]
    WorkerPoolClosed,
}

pub type Result<T> = std::result::Result<T, BlobError>;

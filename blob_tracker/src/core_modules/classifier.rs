// THEORY:
// Classification turns an image into a same-size grid of category labels.
//
// 1.  **Ordered rule matching**: each pixel is converted into the working color
//     space, then categories 1..N are tried in list order. The first whose three
//     range tests pass wins; if none do, the pixel is background (0).
// 2.  **Pure per pixel**: a label depends only on its own pixel, so rows can be
//     classified independently. Large images are split into row bands and run on
//     the rayon pool; small ones stay on the calling thread where the pool
//     overhead would dominate.

use rayon::prelude::*;

use crate::core_modules::color_category::{BACKGROUND, ColorCategory};
use crate::core_modules::color_space::ColorSpace;
use crate::core_modules::frame::ImageSource;

/// Pixel count at which classification switches to the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 64 * 1024;

/// Assigns a category label to converted pixels. First match wins.
#[derive(Debug, Clone, Copy)]
pub struct PixelClassifier<'a> {
    color_space: ColorSpace,
    categories: &'a [ColorCategory],
}

impl<'a> PixelClassifier<'a> {
    pub fn new(color_space: ColorSpace, categories: &'a [ColorCategory]) -> Self {
        Self {
            color_space,
            categories,
        }
    }

    /// Label of a captured RGB pixel.
    #[inline]
    pub fn classify(&self, rgb: [u8; 3]) -> u8 {
        let converted = self.color_space.convert(rgb);
        self.categories
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, category)| category.matches(converted))
            .map_or(BACKGROUND, |(index, _)| index as u8)
    }

    fn classify_row(&self, image: &impl ImageSource, row: u32, labels: &mut [u8]) {
        for (col, label) in labels.iter_mut().enumerate() {
            *label = self.classify(image.pixel(row, col as u32));
        }
    }
}

/// Row-major grid holding one category label per image pixel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryGrid {
    width: u32,
    height: u32,
    labels: Vec<u8>,
}

impl CategoryGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            labels: vec![BACKGROUND; width as usize * height as usize],
        }
    }

    /// Resizes to the given dimensions and resets every cell to background.
    pub fn reset(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        let cells = width as usize * height as usize;
        self.labels.clear();
        self.labels.resize(cells, BACKGROUND);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[inline]
    pub fn get(&self, row: u32, col: u32) -> u8 {
        self.labels[row as usize * self.width as usize + col as usize]
    }

    pub fn row(&self, row: u32) -> &[u8] {
        let start = row as usize * self.width as usize;
        &self.labels[start..start + self.width as usize]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.labels.chunks_exact(self.width.max(1) as usize)
    }

    /// Number of cells carrying `category`.
    pub fn count(&self, category: u8) -> usize {
        self.labels
            .iter()
            .filter(|&&label| label == category)
            .count()
    }

    /// Classifies every pixel of `image` into this grid, which must already be
    /// sized to the image. Rows run on the rayon pool when `parallel` is set.
    pub fn fill(
        &mut self,
        image: &impl ImageSource,
        classifier: &PixelClassifier<'_>,
        parallel: bool,
    ) {
        let width = self.width as usize;
        if width == 0 {
            return;
        }

        if parallel {
            self.labels
                .par_chunks_mut(width)
                .enumerate()
                .for_each(|(row, labels)| {
                    classifier.classify_row(image, row as u32, labels);
                });
        } else {
            for (row, labels) in self.labels.chunks_mut(width).enumerate() {
                classifier.classify_row(image, row as u32, labels);
            }
        }
    }
}

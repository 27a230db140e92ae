// THEORY:
// One `BlobIndex` per color category, positioned exactly like the category
// list it was built from. Slot 0 is the background and is never populated, so
// every query here starts at category 1.
//
// The collection is rebuilt from scratch on every `find`. It is a plain result
// container: queries and rendering read it, pruning is the only mutation
// offered to callers.

use image::Rgb;

use crate::core_modules::blob::{Blob, BlobId};
use crate::core_modules::blob_index::BlobIndex;
use crate::core_modules::color_category::ColorCategory;
use crate::core_modules::renderer::{BlobRenderer, DisplayOptions};

/// Per-category blob indices for one processed image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlobCollection {
    indices: Vec<BlobIndex>,
}

impl BlobCollection {
    /// An empty collection with one index per category, background included.
    pub fn new(category_count: usize) -> Self {
        Self {
            indices: vec![BlobIndex::new(); category_count],
        }
    }

    /// Number of category slots, background included.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn category(&self, category: u8) -> Option<&BlobIndex> {
        self.indices.get(category as usize)
    }

    pub(crate) fn category_mut(&mut self, category: u8) -> Option<&mut BlobIndex> {
        self.indices.get_mut(category as usize)
    }

    /// `(category, index)` pairs for categories 1..N.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &BlobIndex)> {
        self.indices
            .iter()
            .enumerate()
            .skip(1)
            .map(|(category, index)| (category as u8, index))
    }

    /// Every blob of every category, category by category.
    pub fn blobs(&self) -> impl Iterator<Item = &Blob> {
        self.iter().flat_map(|(_, index)| index.iter())
    }

    /// Looks a blob up by id across categories 1..N.
    pub fn find_blob(&self, id: BlobId) -> Option<&Blob> {
        self.iter().find_map(|(_, index)| index.get(id))
    }

    pub fn blob_count(&self) -> usize {
        self.iter().map(|(_, index)| index.len()).sum()
    }

    /// Prunes blobs below `min_area` in every category. Returns the total removed.
    pub fn remove_small_blobs(&mut self, min_area: f64) -> usize {
        self.indices
            .iter_mut()
            .skip(1)
            .map(|index| index.remove_small_blobs(min_area))
            .sum()
    }

    /// Prunes one category. Background or an unknown category removes nothing.
    pub fn remove_small_blobs_in(&mut self, category: u8, min_area: f64) -> usize {
        if category == 0 {
            return 0;
        }
        self.category_mut(category)
            .map_or(0, |index| index.remove_small_blobs(min_area))
    }

    /// Largest blob id per category. Element 0 is always `None`.
    pub fn find_largest_blobs(&self) -> Vec<Option<BlobId>> {
        let mut largest = Vec::with_capacity(self.indices.len());
        if !self.indices.is_empty() {
            largest.push(None);
        }
        largest.extend(self.iter().map(|(_, index)| index.find_largest_blob()));
        largest
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }

    /// Draws every blob in its category's display color.
    pub fn display_blobs(
        &self,
        renderer: &mut impl BlobRenderer,
        categories: &[ColorCategory],
        options: &DisplayOptions,
    ) {
        for (category, index) in self.iter() {
            let Some(entry) = categories.get(category as usize) else {
                continue;
            };
            let color = entry.display_color.to_rgb();
            for blob in index {
                blob.display(renderer, color, options);
            }
        }
    }

    /// Draws one blob. Returns `false` when no blob has that id.
    pub fn display_blob(
        &self,
        renderer: &mut impl BlobRenderer,
        id: BlobId,
        color: Rgb<u8>,
        options: &DisplayOptions,
    ) -> bool {
        match self.find_blob(id) {
            Some(blob) => {
                blob.display(renderer, color, options);
                true
            }
            None => false,
        }
    }

    /// Draws each listed blob that exists. Returns how many were drawn.
    pub fn display_blobs_by_id(
        &self,
        renderer: &mut impl BlobRenderer,
        ids: &[BlobId],
        color: Rgb<u8>,
        options: &DisplayOptions,
    ) -> usize {
        ids.iter()
            .filter(|&&id| self.display_blob(renderer, id, color, options))
            .count()
    }

    /// Draws the largest blob of each category in that category's color.
    /// Returns how many were drawn.
    pub fn display_largest_blobs(
        &self,
        renderer: &mut impl BlobRenderer,
        categories: &[ColorCategory],
        options: &DisplayOptions,
    ) -> usize {
        let mut drawn = 0;
        for (category, largest) in self.find_largest_blobs().into_iter().enumerate() {
            let (Some(id), Some(entry)) = (largest, categories.get(category)) else {
                continue;
            };
            if self.display_blob(renderer, id, entry.display_color.to_rgb(), options) {
                drawn += 1;
            }
        }
        drawn
    }
}

use std::collections::BTreeMap;

use crate::core_modules::blob::{Blob, BlobId};

/// The blobs of a single category, keyed by id.
///
/// Ordered by id, which is also creation order within a scan, so every
/// traversal (and the largest-blob tie-break) is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlobIndex {
    blobs: BTreeMap<BlobId, Blob>,
}

impl BlobIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `blob`, replacing any blob already stored under its id.
    pub fn insert(&mut self, blob: Blob) -> Option<Blob> {
        self.blobs.insert(blob.id, blob)
    }

    pub fn get(&self, id: BlobId) -> Option<&Blob> {
        self.blobs.get(&id)
    }

    pub fn get_mut(&mut self, id: BlobId) -> Option<&mut Blob> {
        self.blobs.get_mut(&id)
    }

    pub fn remove(&mut self, id: BlobId) -> Option<Blob> {
        self.blobs.remove(&id)
    }

    pub fn contains(&self, id: BlobId) -> bool {
        self.blobs.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Blob> {
        self.blobs.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = BlobId> + '_ {
        self.blobs.keys().copied()
    }

    pub fn clear(&mut self) {
        self.blobs.clear();
    }

    /// Drops every blob whose area is strictly below `min_area`.
    /// Returns how many were removed.
    pub fn remove_small_blobs(&mut self, min_area: f64) -> usize {
        let before = self.blobs.len();
        self.blobs.retain(|_, blob| blob.area() >= min_area);
        before - self.blobs.len()
    }

    /// Id of the blob with the greatest area. Among equal areas the first one
    /// seen (lowest id) is kept.
    pub fn find_largest_blob(&self) -> Option<BlobId> {
        let mut largest = None;
        let mut max_area = 0.0;
        for blob in self.blobs.values() {
            if blob.area() > max_area {
                max_area = blob.area();
                largest = Some(blob.id);
            }
        }
        largest
    }

    /// Sum of all blob areas.
    pub fn total_area(&self) -> f64 {
        self.blobs.values().map(Blob::area).sum()
    }
}

impl<'a> IntoIterator for &'a BlobIndex {
    type Item = &'a Blob;
    type IntoIter = std::collections::btree_map::Values<'a, BlobId, Blob>;

    fn into_iter(self) -> Self::IntoIter {
        self.blobs.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::run::Run;

    fn blob(id: BlobId, width: u32) -> Blob {
        let mut blob = Blob::new(id, 1);
        blob.add_run(&mut Run::new(id as u32, 0, width - 1, 1));
        blob
    }

    fn index_of(sizes: &[(BlobId, u32)]) -> BlobIndex {
        let mut index = BlobIndex::new();
        for &(id, width) in sizes {
            index.insert(blob(id, width));
        }
        index
    }

    #[test]
    fn largest_of_empty_index_is_none() {
        assert_eq!(BlobIndex::new().find_largest_blob(), None);
    }

    #[test]
    fn largest_blob_has_greatest_area() {
        let index = index_of(&[(1, 3), (2, 9), (3, 4)]);
        assert_eq!(index.find_largest_blob(), Some(2));
    }

    #[test]
    fn ties_keep_the_first_seen() {
        let index = index_of(&[(4, 5), (2, 5), (9, 1)]);
        assert_eq!(index.find_largest_blob(), Some(2));
    }

    #[test]
    fn pruning_keeps_blobs_at_the_threshold() {
        let mut index = index_of(&[(1, 2), (2, 3), (3, 4), (4, 1)]);
        assert_eq!(index.remove_small_blobs(3.0), 2);
        assert_eq!(index.ids().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(index.remove_small_blobs(3.0), 0);
    }

    #[test]
    fn remove_returns_the_blob() {
        let mut index = index_of(&[(1, 2)]);
        assert!(index.contains(1));
        assert_eq!(index.remove(1).map(|blob| blob.area()), Some(2.0));
        assert!(index.is_empty());
        assert!(index.remove(1).is_none());
    }

    #[test]
    fn total_area_sums_members() {
        let index = index_of(&[(1, 2), (2, 3)]);
        assert_eq!(index.total_area(), 5.0);
        assert_eq!((&index).into_iter().count(), 2);
    }
}

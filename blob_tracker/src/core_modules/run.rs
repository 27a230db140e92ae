use crate::core_modules::blob::BlobId;

/// A maximal horizontal interval of same-category pixels on one row.
///
/// `col_start` and `col_end` are both inclusive, so a single pixel has
/// `col_start == col_end`. `blob_id` stays `None` until the run is linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub row: u32,
    pub col_start: u32,
    pub col_end: u32,
    pub category: u8,
    pub blob_id: Option<BlobId>,
}

impl Run {
    pub fn new(row: u32, col_start: u32, col_end: u32, category: u8) -> Self {
        debug_assert!(col_start <= col_end);
        Self {
            row,
            col_start,
            col_end,
            category,
            blob_id: None,
        }
    }

    /// Pixel count. Runs are one row tall.
    #[inline]
    pub fn area(&self) -> u32 {
        self.col_end - self.col_start + 1
    }

    /// Closed-interval overlap on columns only: `[a,b]` and `[c,d]` touch iff `a <= d && c <= b`.
    #[inline]
    pub fn overlaps(&self, other: &Run) -> bool {
        self.col_start <= other.col_end && other.col_start <= self.col_end
    }

    /// Midpoint column, used for the first moment in x.
    #[inline]
    pub fn center_col(&self) -> f64 {
        (self.col_start as f64 + self.col_end as f64) / 2.0
    }
}

/// Splits one row of category labels into runs, skipping background.
///
/// A run ends wherever the label changes. Appends to `runs_by_category`,
/// indexed by category, which must have an entry for every label in `labels`.
pub fn extract_runs(row: u32, labels: &[u8], runs_by_category: &mut [Vec<Run>]) {
    if labels.is_empty() {
        return;
    }

    let mut current = labels[0];
    let mut start = 0u32;
    for (col, &label) in labels.iter().enumerate().skip(1) {
        if label != current {
            if current != 0 {
                let run = Run::new(row, start, col as u32 - 1, current);
                runs_by_category[current as usize].push(run);
            }
            current = label;
            start = col as u32;
        }
    }

    if current != 0 {
        let last = labels.len() as u32 - 1;
        runs_by_category[current as usize].push(Run::new(row, start, last, current));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_closed_on_both_ends() {
        let a = Run::new(0, 2, 4, 1);
        assert!(a.overlaps(&Run::new(1, 4, 6, 1)));
        assert!(a.overlaps(&Run::new(1, 0, 2, 1)));
        assert!(a.overlaps(&Run::new(1, 3, 3, 1)));
        assert!(a.overlaps(&Run::new(1, 0, 9, 1)));
        assert!(!a.overlaps(&Run::new(1, 5, 7, 1)));
        assert!(!a.overlaps(&Run::new(1, 0, 1, 1)));
    }

    #[test]
    fn single_pixel_run_has_area_one() {
        let run = Run::new(3, 7, 7, 2);
        assert_eq!(run.area(), 1);
        assert_eq!(run.center_col(), 7.0);
    }

    #[test]
    fn extraction_splits_on_label_changes_and_skips_background() {
        let labels = [0, 1, 1, 2, 0, 0, 1, 1, 1];
        let mut runs = vec![Vec::new(); 3];
        extract_runs(5, &labels, &mut runs);

        assert!(runs[0].is_empty());
        assert_eq!(runs[1], vec![Run::new(5, 1, 2, 1), Run::new(5, 6, 8, 1)]);
        assert_eq!(runs[2], vec![Run::new(5, 3, 3, 2)]);
    }

    #[test]
    fn full_width_run_ends_at_last_column() {
        let labels = [1u8; 4];
        let mut runs = vec![Vec::new(); 2];
        extract_runs(0, &labels, &mut runs);
        assert_eq!(runs[1], vec![Run::new(0, 0, 3, 1)]);
    }

    #[test]
    fn empty_row_yields_nothing() {
        let mut runs = vec![Vec::new(); 2];
        extract_runs(0, &[], &mut runs);
        assert!(runs.iter().all(Vec::is_empty));
    }
}

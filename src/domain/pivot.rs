//! Local extremum (pivot) detection.
//!
//! A pivot at `i` is strictly below (minimum) or strictly above (maximum)
//! every value within `radius` bars on both sides. Indices closer than
//! `radius` to either end of the slice are never pivots.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotKind {
    Low,
    High,
}

pub fn find_pivots(values: &[f64], radius: usize, kind: PivotKind) -> Vec<usize> {
    if radius == 0 || values.len() < 2 * radius + 1 {
        return Vec::new();
    }

    (radius..values.len() - radius)
        .filter(|&i| {
            let center = values[i];
            if !center.is_finite() {
                return false;
            }
            (i - radius..=i + radius)
                .filter(|&j| j != i)
                .all(|j| match kind {
                    PivotKind::Low => center < values[j],
                    PivotKind::High => center > values[j],
                })
        })
        .collect()
}

pub fn local_minima(values: &[f64], radius: usize) -> Vec<usize> {
    find_pivots(values, radius, PivotKind::Low)
}

pub fn local_maxima(values: &[f64], radius: usize) -> Vec<usize> {
    find_pivots(values, radius, PivotKind::High)
}

/// Pivot in `candidates` nearest to `target`, within `radius` bars.
/// Ties prefer the earlier index.
pub fn nearest_within(candidates: &[usize], target: usize, radius: usize) -> Option<usize> {
    candidates
        .iter()
        .copied()
        .filter(|&c| c.abs_diff(target) <= radius)
        .min_by_key(|&c| (c.abs_diff(target), c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_single_valley() {
        let values = [5.0, 4.0, 3.0, 1.0, 3.0, 4.0, 5.0];
        assert_eq!(local_minima(&values, 3), vec![3]);
        assert!(local_maxima(&values, 3).is_empty());
    }

    #[test]
    fn plateau_is_not_a_pivot() {
        let values = [5.0, 4.0, 1.0, 1.0, 4.0, 5.0, 6.0];
        assert!(local_minima(&values, 2).is_empty());
    }

    #[test]
    fn edges_are_excluded() {
        let values = [0.0, 5.0, 6.0, 7.0, 8.0];
        assert!(local_minima(&values, 2).is_empty());
    }

    #[test]
    fn too_short_returns_empty() {
        assert!(local_minima(&[1.0, 0.0], 3).is_empty());
        assert!(local_minima(&[3.0, 1.0, 3.0], 0).is_empty());
    }

    #[test]
    fn multiple_peaks() {
        let values = [1.0, 3.0, 1.0, 0.0, 1.0, 4.0, 1.0, 0.0];
        assert_eq!(local_maxima(&values, 1), vec![1, 5]);
        assert_eq!(local_minima(&values, 1), vec![3]);
    }

    #[test]
    fn nan_center_is_skipped() {
        let values = [5.0, 4.0, f64::NAN, 4.0, 5.0];
        assert!(local_minima(&values, 2).is_empty());
    }

    #[test]
    fn nearest_prefers_closest_then_earliest() {
        assert_eq!(nearest_within(&[2, 8, 11], 10, 3), Some(11));
        assert_eq!(nearest_within(&[8, 12], 10, 3), Some(8));
        assert_eq!(nearest_within(&[1, 20], 10, 3), None);
    }
}

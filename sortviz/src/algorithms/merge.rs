//! Top-down merge sort
//!
//! Both halves are copied out before a merge and every element is written
//! back into the shared array through the probe, so each write-back counts
//! as one swap. Only write-backs that change a slot produce a snapshot.

use super::Probe;

pub(super) fn sort(array: &mut [f64], probe: &mut Probe<'_>) {
    let len = array.len();
    merge_sort(array, 0, len, probe);
}

/// Sort the half-open range `lo..hi`
fn merge_sort(array: &mut [f64], lo: usize, hi: usize, probe: &mut Probe<'_>) {
    if hi - lo <= 1 {
        return;
    }
    let mid = lo + (hi - lo) / 2;
    merge_sort(array, lo, mid, probe);
    merge_sort(array, mid, hi, probe);
    merge(array, lo, mid, hi, probe);
}

fn merge(array: &mut [f64], lo: usize, mid: usize, hi: usize, probe: &mut Probe<'_>) {
    let left = array[lo..mid].to_vec();
    let right = array[mid..hi].to_vec();
    let (mut i, mut j, mut k) = (0, 0, lo);

    while i < left.len() && j < right.len() {
        // Ties take the left element first
        if probe.compare(left[i], right[j]).is_le() {
            probe.write(array, k, left[i]);
            i += 1;
        } else {
            probe.write(array, k, right[j]);
            j += 1;
        }
        k += 1;
    }

    for &value in left[i..].iter().chain(&right[j..]) {
        probe.write(array, k, value);
        k += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::super::{NoSnapshots, Probe, RecordedSnapshots};
    use super::*;
    use crate::metrics::Metrics;

    fn run(mut array: Vec<f64>) -> (Vec<f64>, Metrics) {
        let mut sink = NoSnapshots;
        let mut probe = Probe::new(&mut sink);
        sort(&mut array, &mut probe);
        (array, probe.finish())
    }

    #[test]
    fn test_reference_counts() {
        let (sorted, metrics) = run(vec![3.0, 1.0, 2.0]);
        assert_eq!(sorted, vec![1.0, 2.0, 3.0]);
        assert_eq!(metrics.comparisons, 3);
        assert_eq!(metrics.swaps, 5);
    }

    #[test]
    fn test_sorted_input_still_writes_back() {
        let (sorted, metrics) = run(vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(sorted, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(metrics.comparisons, 4);
        assert_eq!(metrics.swaps, 8);
    }

    #[test]
    fn test_unchanged_write_backs_are_not_shown() {
        let mut sink = RecordedSnapshots::default();
        let mut probe = Probe::new(&mut sink);
        let mut array = vec![1.0, 2.0, 3.0, 4.0];
        sort(&mut array, &mut probe);

        assert_eq!(probe.finish().swaps, 8);
        assert!(sink.states.is_empty());
    }

    #[test]
    fn test_only_changing_write_backs_are_shown() {
        let mut sink = RecordedSnapshots::default();
        let mut probe = Probe::new(&mut sink);
        let mut array = vec![3.0, 1.0, 2.0];
        sort(&mut array, &mut probe);

        assert_eq!(probe.finish().swaps, 5);
        // Merging [1] with [2] writes both back unchanged
        assert_eq!(
            sink.states,
            vec![
                vec![1.0, 1.0, 2.0],
                vec![1.0, 2.0, 2.0],
                vec![1.0, 2.0, 3.0],
            ]
        );
    }

    #[test]
    fn test_empty_range_is_noop() {
        let (sorted, metrics) = run(Vec::new());
        assert!(sorted.is_empty());
        assert_eq!(metrics, Metrics::default());
    }
}

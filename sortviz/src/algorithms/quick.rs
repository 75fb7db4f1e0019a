//! Quick sort with Lomuto partitioning
//!
//! The last element of each range is the pivot. After partitioning, the
//! smaller side is sorted recursively and the larger side in the loop, which
//! keeps recursion depth logarithmic even for sorted input.

use super::Probe;

pub(super) fn sort(array: &mut [f64], probe: &mut Probe<'_>) {
    let len = array.len();
    if len > 1 {
        quick_sort(array, 0, len - 1, probe);
    }
}

/// Sort the inclusive range `lo..=hi`
fn quick_sort(array: &mut [f64], mut lo: usize, mut hi: usize, probe: &mut Probe<'_>) {
    while lo < hi {
        let p = partition(array, lo, hi, probe);
        if p - lo < hi - p {
            if p > lo {
                quick_sort(array, lo, p - 1, probe);
            }
            lo = p + 1;
        } else {
            if p < hi {
                quick_sort(array, p + 1, hi, probe);
            }
            // p > lo here, otherwise the first branch is taken
            hi = p - 1;
        }
    }
}

fn partition(array: &mut [f64], lo: usize, hi: usize, probe: &mut Probe<'_>) -> usize {
    let pivot = array[hi];
    let mut store = lo;
    for j in lo..hi {
        if probe.compare(array[j], pivot).is_le() {
            if store != j {
                probe.swap(array, store, j);
            }
            store += 1;
        }
    }
    if store != hi {
        probe.swap(array, store, hi);
    }
    store
}

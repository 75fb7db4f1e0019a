//! Bubble sort
//!
//! Every pass compares every remaining adjacent pair; there is no early exit
//! on a pass without exchanges, so an already sorted input of length n still
//! costs n(n-1)/2 comparisons.

use super::Probe;

pub(super) fn sort(array: &mut [f64], probe: &mut Probe<'_>) {
    let len = array.len();
    for pass in 0..len.saturating_sub(1) {
        for j in 0..len - pass - 1 {
            if probe.compare(array[j], array[j + 1]).is_gt() {
                probe.swap(array, j, j + 1);
            }
        }
    }
}

//! Insertion sort
//!
//! Each new element sinks left through adjacent exchanges, so the swap count
//! equals the number of inversions in the input.

use super::Probe;

pub(super) fn sort(array: &mut [f64], probe: &mut Probe<'_>) {
    for i in 1..array.len() {
        let mut j = i;
        while j > 0 && probe.compare(array[j - 1], array[j]).is_gt() {
            probe.swap(array, j - 1, j);
            j -= 1;
        }
    }
}

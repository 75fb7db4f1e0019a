//! Heap sort over a binary max-heap

use super::Probe;

pub(super) fn sort(array: &mut [f64], probe: &mut Probe<'_>) {
    let len = array.len();
    if len < 2 {
        return;
    }

    for root in (0..len / 2).rev() {
        sift_down(array, root, len, probe);
    }

    for end in (1..len).rev() {
        probe.swap(array, 0, end);
        sift_down(array, 0, end, probe);
    }
}

/// Restore the heap property below `root` within `0..end`
fn sift_down(array: &mut [f64], mut root: usize, end: usize, probe: &mut Probe<'_>) {
    loop {
        let left = 2 * root + 1;
        if left >= end {
            return;
        }

        let mut largest = root;
        if probe.compare(array[left], array[largest]).is_gt() {
            largest = left;
        }
        let right = left + 1;
        if right < end && probe.compare(array[right], array[largest]).is_gt() {
            largest = right;
        }
        if largest == root {
            return;
        }

        probe.swap(array, root, largest);
        root = largest;
    }
}

//! Selection sort

use super::Probe;

pub(super) fn sort(array: &mut [f64], probe: &mut Probe<'_>) {
    let len = array.len();
    for i in 0..len.saturating_sub(1) {
        let mut min = i;
        for j in i + 1..len {
            if probe.compare(array[j], array[min]).is_lt() {
                min = j;
            }
        }
        // No exchange when the minimum already sits in place
        if min != i {
            probe.swap(array, i, min);
        }
    }
}

//! In-place k-d ordering of the id/coordinate arrays.

use super::{median, DIMS};

/// Order `[left, right)` so every range longer than `node_size` is split
/// at its median slot on `axis`, recursing with the next axis.
pub(super) fn sort_kd(
    ids: &mut [u32],
    coords: &mut [f64],
    node_size: usize,
    left: usize,
    right: usize,
    axis: usize,
) {
    if right - left <= node_size {
        return;
    }

    let m = median(left, right);
    select(ids, coords, m, left, right - 1, axis);

    let next = (axis + 1) % DIMS;
    sort_kd(ids, coords, node_size, left, m, next);
    sort_kd(ids, coords, node_size, m + 1, right, next);
}

/// Floyd-Rivest selection: move the `k`-th smallest value on `axis` of the
/// inclusive range `[left, right]` to slot `k`, smaller-or-equal values
/// before it and greater-or-equal after.
fn select(
    ids: &mut [u32],
    coords: &mut [f64],
    k: usize,
    left: usize,
    right: usize,
    axis: usize,
) {
    // Signed bounds: `right` may step below `left` when the pivot lands
    // on the first slot.
    let k = k as isize;
    let mut left = left as isize;
    let mut right = right as isize;

    while right > left {
        if right - left > 600 {
            let n = (right - left + 1) as f64;
            let m = (k - left + 1) as f64;
            let z = n.ln();
            let s = 0.5 * (2.0 * z / 3.0).exp();
            let sign = if m - n / 2.0 < 0.0 { -1.0 } else { 1.0 };
            let sd = 0.5 * (z * s * (n - s) / n).sqrt() * sign;
            let new_left =
                left.max((k as f64 - m * s / n + sd).floor() as isize);
            let new_right =
                right.min((k as f64 + (n - m) * s / n + sd).floor() as isize);
            select(
                ids,
                coords,
                k as usize,
                new_left as usize,
                new_right as usize,
                axis,
            );
        }

        let t = value(coords, k, axis);
        let mut i = left;
        let mut j = right;

        swap_item(ids, coords, left, k);
        if value(coords, right, axis) > t {
            swap_item(ids, coords, left, right);
        }

        while i < j {
            swap_item(ids, coords, i, j);
            i += 1;
            j -= 1;
            while value(coords, i, axis) < t {
                i += 1;
            }
            while value(coords, j, axis) > t {
                j -= 1;
            }
        }

        if value(coords, left, axis) == t {
            swap_item(ids, coords, left, j);
        } else {
            j += 1;
            swap_item(ids, coords, j, right);
        }

        if j <= k {
            left = j + 1;
        }
        if k <= j {
            right = j - 1;
        }
    }
}

#[inline]
fn value(coords: &[f64], slot: isize, axis: usize) -> f64 {
    coords[slot as usize * DIMS + axis]
}

#[inline]
fn swap_item(ids: &mut [u32], coords: &mut [f64], i: isize, j: isize) {
    let (i, j) = (i as usize, j as usize);
    ids.swap(i, j);
    for d in 0..DIMS {
        coords.swap(i * DIMS + d, j * DIMS + d);
    }
}

//! Geometric primitives: fit testing and recursive space decomposition.
//!
//! `best_fit` is the heart of the packer. Given an item placed flush in one
//! corner of a block, it partitions the remaining void into up to three
//! axis-aligned residual blocks, favoring a partition that leaves the
//! largest usable void rather than the largest raw volume.

use std::cmp::Ordering;

use crate::types::{Dims, EPSILON};

/// An axis-aligned rectangular void inside a parcel, tracked only by its
/// three sorted dimensions — no coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Block([f64; 3]);

impl Block {
    pub fn from_dims(d: Dims) -> Self {
        Self(d.as_array())
    }

    pub fn as_dims(&self) -> Dims {
        Dims::from_sorted_unchecked(self.0)
    }

    #[inline]
    pub fn get(&self, i: usize) -> f64 {
        self.0[i]
    }

    pub fn volume(&self) -> f64 {
        self.0[0] * self.0[1] * self.0[2]
    }
}

/// `true` iff `item` fits within `block` on every axis, both sorted ascending.
///
/// Rotation is already handled by the sorting precondition: any axis-aligned
/// rotation of `item` reduces to the same sorted triple.
#[inline]
pub fn fits(item: Dims, block: Dims) -> bool {
    for i in 0..3 {
        if block.get(i) + EPSILON < item.get(i) {
            return false;
        }
    }
    true
}

#[inline]
pub fn volume(dims: Dims) -> f64 {
    dims.volume()
}

fn sorted3(a: f64, b: f64, c: f64) -> [f64; 3] {
    let mut v = [a, b, c];
    v.sort_by(|x, y| x.partial_cmp(y).unwrap_or(Ordering::Equal));
    v
}

fn volume3(v: [f64; 3]) -> f64 {
    v[0] * v[1] * v[2]
}

/// Wraps box axis indices with Python-style negative wraparound: `idx(-1)` on
/// a 3-axis box means "the last axis", matching `box_dims[side_1 - 1]` in the
/// original algorithm.
fn idx(i: isize) -> usize {
    (((i % 3) + 3) % 3) as usize
}

/// Chooses the two remaining axes for the item's middle/shortest dimensions,
/// given the stacking axis `side_1` already chosen for its longest dimension.
fn choose_sides(item: [f64; 3], box_dims: [f64; 3], side_1: usize) -> (usize, usize) {
    let m1 = idx(side_1 as isize - 1);
    let m2 = idx(side_1 as isize - 2);
    if item[1] > box_dims[m1] {
        (idx(side_1 as isize - 2), idx(side_1 as isize - 1))
    } else if item[1] > box_dims[m2] {
        (idx(side_1 as isize - 1), idx(side_1 as isize - 2))
    } else {
        ((side_1 + 1) % 3, (side_1 + 2) % 3)
    }
}

/// Partitions `block \ item` into up to three residual sub-blocks.
///
/// `item` and `block` must both already satisfy `fits(item, block)`; calling
/// this otherwise produces nonsensical (possibly negative) residuals.
///
/// The policy, in order:
/// 1. Pick the stacking axis for the item's longest dimension. If some axis
///    can hold the item stacked twice, reserve the upper half for other
///    items (the "don't open a new bin" rule) and narrow that axis down to
///    exactly the item's length for the rest of this call. Otherwise take
///    the first axis that holds the item once.
/// 2. Pick the remaining two axes, rotating the item to whichever orientation
///    its middle dimension's constraints force, or else rotating "forward".
/// 3. Of the two ways to slice the ground footprint into two rectangles,
///    keep whichever keeps the two residuals closest in size (smaller one
///    has less volume) — this `<` is intentional and must not be flipped.
/// 4. Drop any residual with a zero dimension and return the rest sorted by
///    ascending volume.
pub fn best_fit(item: Dims, block: Dims) -> Vec<Block> {
    let item = item.as_array();
    let mut box_dims = block.as_array();
    let mut residuals: Vec<[f64; 3]> = Vec::new();
    let mut side_1: Option<usize> = None;

    for i in 0..3 {
        if box_dims[i] >= item[2] * 2.0 {
            side_1 = Some(i);
            let upper = sorted3(
                box_dims[i] - item[2],
                box_dims[idx(i as isize - 1)],
                box_dims[idx(i as isize - 2)],
            );
            residuals.push(upper);
            box_dims[i] = item[2];
            break;
        } else if (box_dims[i] - item[2]).abs() < EPSILON {
            side_1 = Some(i);
            break;
        }
    }

    let side_1 = side_1.unwrap_or_else(|| {
        for i in 0..3 {
            if box_dims[i] >= item[2] {
                let upper = sorted3(box_dims[i] - item[2], item[1], item[0]);
                residuals.push(upper);
                return i;
            }
        }
        unreachable!("best_fit called with an item that does not fit the block")
    });

    let (side_2, side_3) = choose_sides(item, box_dims, side_1);

    let block_2a = sorted3(box_dims[side_1], box_dims[side_2], box_dims[side_3] - item[0]);
    let block_3a = sorted3(box_dims[side_1], box_dims[side_2] - item[1], item[0]);

    let block_2b = sorted3(box_dims[side_1], box_dims[side_2] - item[1], box_dims[side_3]);
    let block_3b = sorted3(box_dims[side_1], box_dims[side_3] - item[0], item[1]);

    // Choosing the partition whose larger slab has *less* volume keeps the
    // two residual slabs closer in size. Do not flip this operator.
    if volume3(block_2a) < volume3(block_2b) {
        residuals.push(block_2a);
        residuals.push(block_3a);
    } else {
        residuals.push(block_2b);
        residuals.push(block_3b);
    }

    let mut blocks: Vec<Block> = residuals
        .into_iter()
        .filter(|b| b[0] > EPSILON)
        .map(Block)
        .collect();

    blocks.sort_by(|a, b| a.volume().partial_cmp(&b.volume()).unwrap_or(Ordering::Equal));
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(a: f64, b: f64, c: f64) -> Dims {
        Dims::new(a, b, c).unwrap()
    }

    #[test]
    fn fits_checks_each_axis() {
        assert!(fits(dims(5.0, 5.0, 5.0), dims(10.0, 10.0, 10.0)));
        assert!(!fits(dims(5.0, 5.0, 11.0), dims(10.0, 10.0, 10.0)));
    }

    #[test]
    fn exact_fit_leaves_no_residual() {
        let blocks = best_fit(dims(13.0, 13.0, 31.0), dims(13.0, 13.0, 31.0));
        assert!(blocks.is_empty());
    }

    #[test]
    fn best_fit_residuals_are_sorted_and_nonzero() {
        let blocks = best_fit(dims(5.0, 5.0, 5.0), dims(10.0, 10.0, 10.0));
        for b in &blocks {
            let mut a = b.0;
            a.sort_by(|x, y| x.partial_cmp(y).unwrap());
            assert_eq!(a, b.0, "residual must already be sorted ascending");
            assert!(b.0[0] > EPSILON, "residual must not have a zero dimension");
        }
        for pair in blocks.windows(2) {
            assert!(pair[0].volume() <= pair[1].volume());
        }
    }

    #[test]
    fn two_stack_rule_reserves_upper_slab_when_axis_holds_item_twice() {
        // Axis of length 10 holds an item of longest side 5 twice (P5).
        let blocks = best_fit(dims(2.0, 3.0, 5.0), dims(2.0, 3.0, 10.0));
        let has_upper_slab = blocks
            .iter()
            .any(|b| (b.volume() - sorted3(5.0, 2.0, 3.0).iter().product::<f64>()).abs() < 1e-6);
        assert!(has_upper_slab);
    }

    #[test]
    fn partition_operator_is_strictly_less_than() {
        // Regression guard for the documented tie-break: a symmetric block
        // with a cubic item should not panic and should yield sorted,
        // nonzero residuals regardless of which option tie-breaks.
        let blocks = best_fit(dims(4.0, 4.0, 4.0), dims(8.0, 8.0, 8.0));
        assert!(!blocks.is_empty());
        for b in &blocks {
            assert!(b.0[0] > EPSILON);
        }
    }
}

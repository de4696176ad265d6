//! Per-dimension addressing.
//!
//! Each matrix axis maps a logical index to a physical offset contribution:
//! either the strided form `zero + i * stride`, or an explicit offset table
//! (the selection-view representation, which admits arbitrary order and
//! repeats). The offset of a cell is the sum of its axes' contributions.
//!
//! The composition methods implement the view algebra: all of them are pure,
//! none of them touch element data. Strided compositions are O(1); composing
//! on an already-selected axis rebuilds that axis's offset table.

use std::sync::Arc;

#[derive(Clone, Debug)]
pub(crate) enum AxisMap {
    /// `offset(i) = zero + i * stride`. Negative strides iterate backwards.
    Strided { zero: isize, stride: isize },
    /// `offset(i) = offsets[i]`. One precomputed physical offset per logical
    /// index.
    Picked { offsets: Arc<[isize]> },
}

impl AxisMap {
    #[inline]
    pub(crate) fn offset(&self, i: usize) -> isize {
        match self {
            AxisMap::Strided { zero, stride } => zero + i as isize * stride,
            AxisMap::Picked { offsets } => offsets[i],
        }
    }

    /// Reverse iteration order along an axis of length `len`.
    ///
    /// Strided: `zero' = zero + (len - 1) * stride`, `stride' = -stride`.
    pub(crate) fn flipped(&self, len: usize) -> AxisMap {
        match self {
            AxisMap::Strided { zero, stride } => {
                let last = if len == 0 { 0 } else { (len - 1) as isize };
                AxisMap::Strided {
                    zero: zero + last * stride,
                    stride: -stride,
                }
            }
            AxisMap::Picked { offsets } => {
                let rev: Vec<isize> = offsets.iter().rev().copied().collect();
                AxisMap::Picked {
                    offsets: rev.into(),
                }
            }
        }
    }

    /// Restrict to the sub-range `start..start + len`.
    ///
    /// The caller has already range-checked `start` and `len`.
    pub(crate) fn narrowed(&self, start: usize, len: usize) -> AxisMap {
        match self {
            AxisMap::Strided { zero, stride } => AxisMap::Strided {
                zero: zero + start as isize * stride,
                stride: *stride,
            },
            AxisMap::Picked { offsets } => AxisMap::Picked {
                offsets: offsets[start..start + len].into(),
            },
        }
    }

    /// Keep every `step`-th index. The caller has verified `step > 0`; the
    /// new logical length is `ceil(len / step)`.
    pub(crate) fn stepped(&self, step: usize) -> AxisMap {
        match self {
            AxisMap::Strided { zero, stride } => AxisMap::Strided {
                zero: *zero,
                stride: stride * step as isize,
            },
            AxisMap::Picked { offsets } => {
                let taken: Vec<isize> = offsets.iter().step_by(step).copied().collect();
                AxisMap::Picked {
                    offsets: taken.into(),
                }
            }
        }
    }

    /// Fold a constant base offset into this axis. Dimension-reducing views
    /// (row, column, slice) use this to absorb the fixed axis's contribution.
    pub(crate) fn shifted(&self, base: isize) -> AxisMap {
        match self {
            AxisMap::Strided { zero, stride } => AxisMap::Strided {
                zero: zero + base,
                stride: *stride,
            },
            AxisMap::Picked { offsets } => {
                let moved: Vec<isize> = offsets.iter().map(|o| o + base).collect();
                AxisMap::Picked {
                    offsets: moved.into(),
                }
            }
        }
    }

    /// Select the given logical indexes, in order, repeats allowed. The
    /// caller has verified every index is in range.
    pub(crate) fn picked(&self, indexes: &[usize]) -> AxisMap {
        let offsets: Vec<isize> = indexes.iter().map(|&i| self.offset(i)).collect();
        AxisMap::Picked {
            offsets: offsets.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strided_offset() {
        let ax = AxisMap::Strided { zero: 3, stride: 2 };
        assert_eq!(ax.offset(0), 3);
        assert_eq!(ax.offset(4), 11);
    }

    #[test]
    fn test_flip_round_trip() {
        let ax = AxisMap::Strided { zero: 0, stride: 1 };
        let flipped = ax.flipped(5);
        assert_eq!(flipped.offset(0), 4);
        assert_eq!(flipped.offset(4), 0);
        let back = flipped.flipped(5);
        for i in 0..5 {
            assert_eq!(back.offset(i), ax.offset(i));
        }
    }

    #[test]
    fn test_flip_empty_axis() {
        let ax = AxisMap::Strided { zero: 7, stride: 3 };
        let flipped = ax.flipped(0);
        match flipped {
            AxisMap::Strided { zero, stride } => {
                assert_eq!(zero, 7);
                assert_eq!(stride, -3);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_narrow_then_step() {
        // Logical axis over offsets 0,1,...,9; narrow to 2..8, step 2.
        let ax = AxisMap::Strided { zero: 0, stride: 1 };
        let sub = ax.narrowed(2, 6).stepped(2);
        assert_eq!(sub.offset(0), 2);
        assert_eq!(sub.offset(1), 4);
        assert_eq!(sub.offset(2), 6);
    }

    #[test]
    fn test_picked_arbitrary_order_and_repeats() {
        let ax = AxisMap::Strided { zero: 10, stride: 5 };
        let picked = ax.picked(&[3, 0, 3]);
        assert_eq!(picked.offset(0), 25);
        assert_eq!(picked.offset(1), 10);
        assert_eq!(picked.offset(2), 25);
    }

    #[test]
    fn test_compose_on_picked_axis() {
        let ax = AxisMap::Strided { zero: 0, stride: 1 }.picked(&[5, 1, 4, 2]);
        let narrowed = ax.narrowed(1, 3);
        assert_eq!(narrowed.offset(0), 1);
        let flipped = narrowed.flipped(3);
        assert_eq!(flipped.offset(0), 2);
        assert_eq!(flipped.offset(2), 1);
    }
}

use std::fmt;

use hdf5::{Hyperslab, SliceOrIndex};

use crate::config::Shape;
use crate::error::Result;

/// Rectangular rank-3 selection: per-axis offset, stride, count and block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slab {
    pub offset: [usize; 3],
    pub stride: [usize; 3],
    pub count: [usize; 3],
    pub block: [usize; 3],
}

impl Slab {
    /// Selects exactly plane `z`: offset `[z, 0, 0]`, count `[1, height, width]`,
    /// unit stride and block.
    pub fn plane(z: usize, height: usize, width: usize) -> Self {
        Self { offset: [z, 0, 0], stride: [1, 1, 1], count: [1, height, width], block: [1, 1, 1] }
    }

    /// Number of selected elements along each axis, saturating at `usize::MAX`.
    pub fn out_shape(&self) -> [usize; 3] {
        [0, 1, 2].map(|i| self.count[i].saturating_mul(self.block[i]))
    }

    /// Total number of selected elements, or `None` on overflow.
    pub fn len(&self) -> Option<usize> {
        (0..3).try_fold(1usize, |n, i| n.checked_mul(self.count[i])?.checked_mul(self.block[i]))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Checks that the selection is well-formed and lies inside `shape`.
    pub fn check(&self, shape: &Shape) -> Result<()> {
        let dims = shape.dims();
        for axis in 0..3 {
            let (offset, stride, count, block) =
                (self.offset[axis], self.stride[axis], self.count[axis], self.block[axis]);
            ensure!(stride > 0 && block > 0, "slab {}: zero stride or block on axis {}", self, axis);
            ensure!(count > 0, "slab {}: empty selection on axis {}", self, axis);
            ensure!(block <= stride || count == 1, "slab {}: overlapping blocks on axis {}", self, axis);
            let end = (count - 1)
                .checked_mul(stride)
                .and_then(|n| n.checked_add(offset))
                .and_then(|n| n.checked_add(block));
            match end {
                Some(end) if end <= dims[axis] => {}
                _ => fail!("slab {} out of bounds for shape {} on axis {}", self, shape, axis),
            }
        }
        Ok(())
    }
}

impl From<Slab> for Hyperslab {
    fn from(slab: Slab) -> Self {
        let axes = (0..3)
            .map(|i| SliceOrIndex::SliceCount {
                start: slab.offset[i],
                step: slab.stride[i],
                count: slab.count[i],
                block: slab.block[i],
            })
            .collect::<Vec<_>>();
        Self::new(axes)
    }
}

impl fmt::Display for Slab {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "offset={:?} stride={:?} count={:?} block={:?}",
            self.offset, self.stride, self.count, self.block
        )
    }
}

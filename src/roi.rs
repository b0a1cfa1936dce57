//! Regions of interest.
//!
//! A [`Roi`] is an axis-aligned box described by a signed `offset` and a non-negative `shape`.
//! Pyramid levels describe their total extent as a world-space [`Roi`] (in the units of the voxel size),
//! and blocks describe the voxels they read and write as index-space [`Roi`]s.
//! Unlike an [`ArraySubset`](crate::array_subset::ArraySubset), a [`Roi`] may begin before the origin.

use thiserror::Error;

use crate::{
    array_subset::{ArraySubset, IncompatibleDimensionalityError},
    coordinate::Coordinate,
};

/// How [`Roi::snap_to_grid`] rounds onto the grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SnapMode {
    /// Expand to the smallest grid-aligned region containing the region.
    Grow,
    /// Contract to the largest grid-aligned region contained in the region.
    Shrink,
}

/// A region of interest error.
#[derive(Debug, Error)]
pub enum RoiError {
    /// Incompatible dimensionality.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// A shape component is negative.
    #[error("region shape {0} has a negative component")]
    NegativeShape(Coordinate),
    /// A grid spacing component is not positive.
    #[error("grid spacing {0} must be positive")]
    NonPositiveGrid(Coordinate),
    /// A block shape component is not positive.
    #[error("block shape {0} must be positive")]
    NonPositiveBlockShape(Coordinate),
}

/// An N-dimensional region of interest.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Roi {
    offset: Coordinate,
    shape: Coordinate,
}

impl core::fmt::Display for Roi {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{}:{}]", self.offset, self.end())
    }
}

impl Roi {
    /// Create a new region of interest.
    ///
    /// # Errors
    /// Returns a [`RoiError`] if the dimensionality of `offset` and `shape` differ or `shape` has a negative component.
    pub fn new(offset: Coordinate, shape: Coordinate) -> Result<Self, RoiError> {
        if offset.dims() != shape.dims() {
            return Err(IncompatibleDimensionalityError::new(shape.dims(), offset.dims()).into());
        }
        if shape.iter().any(|&s| s < 0) {
            return Err(RoiError::NegativeShape(shape));
        }
        Ok(Self { offset, shape })
    }

    /// Create a new region of interest without validation.
    ///
    /// `offset` and `shape` must have the same dimensionality and `shape` must be non-negative.
    pub(crate) fn new_unchecked(offset: Coordinate, shape: Coordinate) -> Self {
        debug_assert_eq!(offset.dims(), shape.dims());
        debug_assert!(shape.iter().all(|&s| s >= 0));
        Self { offset, shape }
    }

    /// Create a region of interest from a begin and end (exclusive).
    ///
    /// Axes where `end` precedes `begin` have zero extent.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of `begin` and `end` differ.
    pub fn from_begin_end(
        begin: Coordinate,
        end: &Coordinate,
    ) -> Result<Self, IncompatibleDimensionalityError> {
        let shape = end
            .sub(&begin)?
            .max_elementwise(&Coordinate::splat(0, begin.dims()))?;
        Ok(Self {
            offset: begin,
            shape,
        })
    }

    /// Create a region of interest covering an index-space [`ArraySubset`].
    #[must_use]
    pub fn from_array_subset(subset: &ArraySubset) -> Self {
        Self {
            offset: Coordinate::from_unsigned(subset.start()),
            shape: Coordinate::from_unsigned(subset.shape()),
        }
    }

    /// Return the offset (inclusive begin) of the region.
    #[must_use]
    pub fn offset(&self) -> &Coordinate {
        &self.offset
    }

    /// Return the shape of the region.
    #[must_use]
    pub fn shape(&self) -> &Coordinate {
        &self.shape
    }

    /// Return the end (exclusive) of the region.
    #[must_use]
    pub fn end(&self) -> Coordinate {
        Coordinate::new(
            std::iter::zip(self.offset.iter(), self.shape.iter())
                .map(|(o, s)| o + s)
                .collect::<Vec<_>>(),
        )
    }

    /// Return the dimensionality of the region.
    #[must_use]
    pub fn dims(&self) -> usize {
        self.offset.dims()
    }

    /// Returns true if the region contains no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shape.iter().any(|&s| s == 0)
    }

    /// Returns true if `other` lies entirely within this region.
    ///
    /// An empty `other` is contained by any region of the same dimensionality.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        if self.dims() != other.dims() {
            return false;
        }
        if other.is_empty() {
            return true;
        }
        let (end, other_end) = (self.end(), other.end());
        self.offset
            .iter()
            .zip(other.offset.iter())
            .zip(end.iter().zip(other_end.iter()))
            .all(|((b, ob), (e, oe))| ob >= b && oe <= e)
    }

    /// Return the intersection of this region and `other`.
    ///
    /// The result has zero extent along any axis where they do not overlap.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionalities differ.
    pub fn intersect(&self, other: &Self) -> Result<Self, IncompatibleDimensionalityError> {
        let begin = self.offset.max_elementwise(&other.offset)?;
        let end = self.end().min_elementwise(&other.end())?;
        Self::from_begin_end(begin, &end)
    }

    /// Translate the region by `delta`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionalities differ.
    pub fn shift(&self, delta: &Coordinate) -> Result<Self, IncompatibleDimensionalityError> {
        Ok(Self {
            offset: self.offset.add(delta)?,
            shape: self.shape.clone(),
        })
    }

    /// Snap the region onto the grid with spacing `grid` anchored at the origin.
    ///
    /// [`SnapMode::Grow`] rounds the begin down and the end up.
    /// [`SnapMode::Shrink`] rounds the begin up and the end down, possibly producing an empty region.
    ///
    /// # Errors
    /// Returns a [`RoiError`] if the dimensionality of `grid` differs or a component of `grid` is not positive.
    pub fn snap_to_grid(&self, grid: &Coordinate, mode: SnapMode) -> Result<Self, RoiError> {
        if grid.dims() != self.dims() {
            return Err(IncompatibleDimensionalityError::new(grid.dims(), self.dims()).into());
        }
        if !grid.is_positive() {
            return Err(RoiError::NonPositiveGrid(grid.clone()));
        }
        let end = self.end();
        let (begin, end) = match mode {
            SnapMode::Grow => (
                self.offset.div_floor(grid)?.mul(grid)?,
                end.div_ceil(grid)?.mul(grid)?,
            ),
            SnapMode::Shrink => (
                self.offset.div_ceil(grid)?.mul(grid)?,
                end.div_floor(grid)?.mul(grid)?,
            ),
        };
        Ok(Self::from_begin_end(begin, &end)?)
    }

    /// Partition the region into sub-regions of `block_shape`.
    ///
    /// Sub-regions are returned in C order (last axis fastest), begin at `offset + k * block_shape`,
    /// and are truncated at the end of the region rather than padded.
    /// Together they cover the region exactly, without overlap.
    ///
    /// # Errors
    /// Returns a [`RoiError`] if the dimensionality of `block_shape` differs or a component of `block_shape` is not positive.
    pub fn partition_into(&self, block_shape: &Coordinate) -> Result<Vec<Self>, RoiError> {
        if block_shape.dims() != self.dims() {
            return Err(
                IncompatibleDimensionalityError::new(block_shape.dims(), self.dims()).into(),
            );
        }
        if !block_shape.is_positive() {
            return Err(RoiError::NonPositiveBlockShape(block_shape.clone()));
        }
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let num_blocks = self.shape.div_ceil(block_shape)?;
        let num_blocks = num_blocks
            .to_unsigned()
            .ok_or_else(|| RoiError::NegativeShape(self.shape.clone()))?;
        let end = self.end();
        ArraySubset::new_with_shape(num_blocks)
            .iter_indices()
            .map(|block_indices| {
                let begin = Coordinate::new(
                    itertools::izip!(&block_indices, self.offset.iter(), block_shape.iter())
                        .map(|(&i, o, b)| o + i64::try_from(i).unwrap_or(i64::MAX) * b)
                        .collect::<Vec<_>>(),
                );
                let block_end = begin.add(block_shape)?.min_elementwise(&end)?;
                Ok(Self::from_begin_end(begin, &block_end)?)
            })
            .collect()
    }

    /// Convert to an index-space [`ArraySubset`].
    ///
    /// Returns [`None`] if the region begins before the origin.
    #[must_use]
    pub fn to_array_subset(&self) -> Option<ArraySubset> {
        let start = self.offset.to_unsigned()?;
        let shape = self.shape.to_unsigned()?;
        ArraySubset::new_with_start_shape(start, shape).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roi(offset: &[i64], shape: &[i64]) -> Roi {
        Roi::new(Coordinate::from(offset), Coordinate::from(shape)).unwrap()
    }

    #[test]
    fn roi_new() {
        assert!(Roi::new(Coordinate::from([0, 0]), Coordinate::from([1])).is_err());
        assert!(Roi::new(Coordinate::from([0]), Coordinate::from([-1])).is_err());
        let r = roi(&[-2, 3], &[4, 5]);
        assert_eq!(r.end(), Coordinate::from([2, 8]));
        assert_eq!(r.dims(), 2);
        assert!(!r.is_empty());
        assert_eq!(r.to_string(), "[(-2, 3):(2, 8)]");
        assert!(r.to_array_subset().is_none());
        assert!(roi(&[1, 1], &[0, 2]).is_empty());
    }

    #[test]
    fn roi_snap_grow() {
        let r = roi(&[-3, 5], &[10, 10]);
        let grid = Coordinate::from([4, 4]);
        assert_eq!(
            r.snap_to_grid(&grid, SnapMode::Grow).unwrap(),
            roi(&[-4, 4], &[12, 12])
        );
        assert_eq!(
            r.snap_to_grid(&grid, SnapMode::Shrink).unwrap(),
            roi(&[0, 8], &[4, 4])
        );
        // Already aligned regions are unchanged
        let aligned = roi(&[8, 16], &[32, 32]);
        assert_eq!(
            aligned.snap_to_grid(&Coordinate::from([8, 8]), SnapMode::Grow).unwrap(),
            aligned
        );
        assert!(r.snap_to_grid(&Coordinate::from([0, 4]), SnapMode::Grow).is_err());
        assert!(r.snap_to_grid(&Coordinate::from([4]), SnapMode::Grow).is_err());
    }

    #[test]
    fn roi_snap_shrink_empty() {
        let r = roi(&[1], &[2]);
        let snapped = r.snap_to_grid(&Coordinate::from([4]), SnapMode::Shrink).unwrap();
        assert!(snapped.is_empty());
    }

    #[test]
    fn roi_intersect_contains() {
        let a = roi(&[0, 0], &[10, 10]);
        let b = roi(&[5, -5], &[10, 10]);
        let i = a.intersect(&b).unwrap();
        assert_eq!(i, roi(&[5, 0], &[5, 5]));
        assert!(a.contains(&i));
        assert!(b.contains(&i));
        assert!(!a.contains(&b));
        assert!(a.intersect(&roi(&[20, 20], &[1, 1])).unwrap().is_empty());
        assert_eq!(
            a.shift(&Coordinate::from([1, -1])).unwrap(),
            roi(&[1, -1], &[10, 10])
        );
    }

    #[test]
    fn roi_partition() {
        let r = roi(&[2, 0], &[5, 4]);
        let blocks = r.partition_into(&Coordinate::from([2, 3])).unwrap();
        assert_eq!(
            blocks,
            vec![
                roi(&[2, 0], &[2, 3]),
                roi(&[2, 3], &[2, 1]),
                roi(&[4, 0], &[2, 3]),
                roi(&[4, 3], &[2, 1]),
                roi(&[6, 0], &[1, 3]),
                roi(&[6, 3], &[1, 1]),
            ]
        );
        let covered: i64 = blocks.iter().map(|b| b.shape().product()).sum();
        assert_eq!(covered, r.shape().product());
        assert!(blocks.iter().all(|b| r.contains(b)));
    }

    #[test]
    fn roi_partition_invalid() {
        let r = roi(&[0, 0], &[4, 4]);
        assert!(matches!(
            r.partition_into(&Coordinate::from([0, 2])),
            Err(RoiError::NonPositiveBlockShape(_))
        ));
        assert!(matches!(
            r.partition_into(&Coordinate::from([-1, 2])),
            Err(RoiError::NonPositiveBlockShape(_))
        ));
        assert!(r.partition_into(&Coordinate::from([2])).is_err());
        assert!(roi(&[0], &[0])
            .partition_into(&Coordinate::from([2]))
            .unwrap()
            .is_empty());
    }
}

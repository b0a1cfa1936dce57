//! Array subsets.
//!
//! An [`ArraySubset`] is an unsigned, index-space region of an array.
//! It is used by the [`array`](crate::array) module to map requests onto chunks and to copy elements between dense buffers.
//!
//! World-space regions (which may have negative offsets) are represented by [`Roi`](crate::roi::Roi) instead.

mod iterators;

pub use iterators::{ChunksIterator, IndicesIterator};

use derive_more::Display;
use itertools::izip;
use thiserror::Error;

use crate::array::{ArrayIndices, ArrayShape};

/// An array subset.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Default)]
#[display("start {start:?} shape {shape:?}")]
pub struct ArraySubset {
    /// The start of the array subset.
    start: ArrayIndices,
    /// The shape of the array subset.
    shape: ArrayShape,
}

/// An array extract/store elements error.
#[derive(Debug, Error)]
#[error("array subset {_0} is incompatible with array of shape {_1:?} and {_2} elements")]
pub struct IncompatibleArraySubsetError(ArraySubset, ArrayShape, usize);

impl ArraySubset {
    /// Create a new array subset with `shape` starting at the origin.
    #[must_use]
    pub fn new_with_shape(shape: ArrayShape) -> Self {
        Self {
            start: vec![0; shape.len()],
            shape,
        }
    }

    /// Create a new array subset.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleDimensionalityError`] if the size of `start` and `shape` do not match.
    pub fn new_with_start_shape(
        start: ArrayIndices,
        shape: ArrayShape,
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if start.len() == shape.len() {
            Ok(Self { start, shape })
        } else {
            Err(IncompatibleDimensionalityError::new(
                start.len(),
                shape.len(),
            ))
        }
    }

    /// Create a new array subset from a start and end (exclusive).
    ///
    /// An end less than the start along an axis results in an empty extent along that axis.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleDimensionalityError`] if the size of `start` and `end` do not match.
    pub fn new_with_start_end_exc(
        start: ArrayIndices,
        end: &[u64],
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if start.len() == end.len() {
            let shape = std::iter::zip(&start, end)
                .map(|(&start, &end)| end.saturating_sub(start))
                .collect();
            Ok(Self { start, shape })
        } else {
            Err(IncompatibleDimensionalityError::new(start.len(), end.len()))
        }
    }

    /// Return the start of the array subset.
    #[must_use]
    pub fn start(&self) -> &[u64] {
        &self.start
    }

    /// Return the shape of the array subset.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the dimensionality of the array subset.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.start.len()
    }

    /// Return the end (exclusive) of the array subset.
    #[must_use]
    pub fn end_exc(&self) -> ArrayIndices {
        std::iter::zip(&self.start, &self.shape)
            .map(|(start, size)| start + size)
            .collect()
    }

    /// Return the number of elements of the array subset.
    ///
    /// Equal to the product of the components of its shape.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().product()
    }

    /// Return the number of elements of the array subset as a `usize`.
    ///
    /// # Panics
    ///
    /// Panics if [`num_elements()`](Self::num_elements()) is greater than [`usize::MAX`].
    #[must_use]
    pub fn num_elements_usize(&self) -> usize {
        usize::try_from(self.num_elements()).unwrap()
    }

    /// Returns true if the array subset has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shape.iter().any(|&s| s == 0)
    }

    /// Bound the array subset to the domain within `end` (exclusive).
    ///
    /// # Errors
    /// Returns an error if `end` does not match the array subset dimensionality.
    pub fn bound(&self, end: &[u64]) -> Result<Self, IncompatibleDimensionalityError> {
        if end.len() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                end.len(),
                self.dimensionality(),
            ));
        }
        let start: ArrayIndices = std::iter::zip(self.start(), end)
            .map(|(&a, &b)| std::cmp::min(a, b))
            .collect();
        let end: ArrayIndices = std::iter::zip(self.end_exc(), end)
            .map(|(a, &b)| std::cmp::min(a, b))
            .collect();
        Self::new_with_start_end_exc(start, &end)
    }

    /// Return the overlapping region of this array subset and `other`.
    ///
    /// The result is empty if they do not overlap.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionalities differ.
    pub fn overlap(&self, other: &Self) -> Result<Self, IncompatibleDimensionalityError> {
        if other.dimensionality() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                other.dimensionality(),
                self.dimensionality(),
            ));
        }
        let start: ArrayIndices = std::iter::zip(self.start(), other.start())
            .map(|(&a, &b)| std::cmp::max(a, b))
            .collect();
        let end: ArrayIndices = std::iter::zip(self.end_exc(), other.end_exc())
            .map(|(a, b)| std::cmp::min(a, b))
            .collect();
        Self::new_with_start_end_exc(start, &end)
    }

    /// Return this array subset relative to `origin`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionalities differ.
    ///
    /// # Panics
    /// Panics in debug builds if `origin` is beyond the start of the array subset.
    pub fn relative_to(&self, origin: &[u64]) -> Result<Self, IncompatibleDimensionalityError> {
        if origin.len() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                origin.len(),
                self.dimensionality(),
            ));
        }
        let start = std::iter::zip(self.start(), origin)
            .map(|(&s, &o)| {
                debug_assert!(s >= o);
                s - o
            })
            .collect();
        Ok(Self {
            start,
            shape: self.shape.clone(),
        })
    }

    /// Returns true if the array subset is within the bounds of `array_shape`.
    #[must_use]
    pub fn inbounds(&self, array_shape: &[u64]) -> bool {
        self.dimensionality() == array_shape.len()
            && izip!(self.start(), self.shape(), array_shape)
                .all(|(subset_start, subset_shape, shape)| subset_start + subset_shape <= *shape)
    }

    /// Returns true if this array subset contains every element of `other`.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.dimensionality() == other.dimensionality()
            && izip!(self.start(), self.end_exc(), other.start(), other.end_exc())
                .all(|(s, e, os, oe)| os >= s && oe <= e)
    }

    /// Returns an iterator over the indices of elements within the subset.
    #[must_use]
    pub fn iter_indices(&self) -> IndicesIterator {
        IndicesIterator::new(self.clone())
    }

    /// Returns an iterator over chunks with shape `chunk_shape` overlapping the array subset.
    ///
    /// All chunks have the same shape `chunk_shape`, so they may extend beyond the subset.
    ///
    /// # Errors
    ///
    /// Returns an error if `chunk_shape` does not match the array subset dimensionality or has a zero component.
    pub fn iter_chunks(
        &self,
        chunk_shape: &[u64],
    ) -> Result<ChunksIterator, IncompatibleDimensionalityError> {
        ChunksIterator::new(self, chunk_shape)
    }

    /// Return the elements in this array subset from a dense C-order array with shape `array_shape`.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleArraySubsetError`] if the array subset is not within the bounds of `array_shape` or `elements` does not match `array_shape`.
    pub fn extract_elements<T: Copy>(
        &self,
        elements: &[T],
        array_shape: &[u64],
    ) -> Result<Vec<T>, IncompatibleArraySubsetError> {
        self.validate_buffer(elements.len(), array_shape)?;
        let mut subset_elements = Vec::with_capacity(self.num_elements_usize());
        for_each_row(self, array_shape, |offset, length| {
            subset_elements.extend_from_slice(&elements[offset..offset + length]);
        });
        Ok(subset_elements)
    }

    /// Store `subset_elements` into the region of this array subset in a dense C-order array (`array_elements`) with shape `array_shape`.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleArraySubsetError`] if:
    ///  - the array subset is not within the bounds of `array_shape`,
    ///  - the length of `array_elements` is not compatible with `array_shape`, or
    ///  - the length of `subset_elements` does not match the number of elements in this subset.
    pub fn store_elements<T: Copy>(
        &self,
        subset_elements: &[T],
        array_elements: &mut [T],
        array_shape: &[u64],
    ) -> Result<(), IncompatibleArraySubsetError> {
        self.validate_buffer(array_elements.len(), array_shape)?;
        if subset_elements.len() as u64 != self.num_elements() {
            return Err(IncompatibleArraySubsetError(
                self.clone(),
                self.shape.clone(),
                subset_elements.len(),
            ));
        }
        let mut subset_offset = 0;
        for_each_row(self, array_shape, |offset, length| {
            array_elements[offset..offset + length]
                .copy_from_slice(&subset_elements[subset_offset..subset_offset + length]);
            subset_offset += length;
        });
        Ok(())
    }

    fn validate_buffer(
        &self,
        num_elements: usize,
        array_shape: &[u64],
    ) -> Result<(), IncompatibleArraySubsetError> {
        if num_elements as u64 == array_shape.iter().product::<u64>() && self.inbounds(array_shape)
        {
            Ok(())
        } else {
            Err(IncompatibleArraySubsetError(
                self.clone(),
                array_shape.to_vec(),
                num_elements,
            ))
        }
    }
}

/// Call `f(linear_offset, length)` for each contiguous row (along the last axis) of `subset` in an array of `array_shape`.
///
/// Rows are visited in C order. The subset must be in bounds.
fn for_each_row(subset: &ArraySubset, array_shape: &[u64], mut f: impl FnMut(usize, usize)) {
    if subset.is_empty() {
        return;
    }
    let Some((&row_length, outer_shape)) = subset.shape().split_last() else {
        // zero dimensional
        f(0, 1);
        return;
    };
    let dims = array_shape.len();
    let outer_subset = ArraySubset {
        start: subset.start()[..dims - 1].to_vec(),
        shape: outer_shape.to_vec(),
    };
    let row_length = usize::try_from(row_length).unwrap();
    let row_start = subset.start()[dims - 1];
    for outer_indices in outer_subset.iter_indices() {
        let mut linear = 0u64;
        for (index, extent) in std::iter::zip(&outer_indices, &array_shape[..dims - 1]) {
            linear = linear * extent + index;
        }
        linear = linear * array_shape[dims - 1] + row_start;
        f(usize::try_from(linear).unwrap(), row_length);
    }
}

/// An incompatible dimensionality error.
#[derive(Copy, Clone, Debug, Error)]
#[error("incompatible dimensionality {0}, expected {1}")]
pub struct IncompatibleDimensionalityError(usize, usize);

impl IncompatibleDimensionalityError {
    /// Create a new incompatible dimensionality error.
    #[must_use]
    pub const fn new(got: usize, expected: usize) -> Self {
        Self(got, expected)
    }
}

use std::iter::FusedIterator;

use crate::{
    array::{ArrayIndices, ArrayShape},
    array_subset::{ArraySubset, IncompatibleDimensionalityError},
};

use super::IndicesIterator;

/// Iterates over the regular sized chunks overlapping an array subset.
///
/// Iterates over the last dimension fastest (i.e. C-contiguous order).
/// All chunks have the same size, and may extend over the bounds of the array subset since the start of the first chunk is aligned to the chunk size.
///
/// The iterator item is a ([`ArrayIndices`], [`ArraySubset`]) tuple corresponding to the chunk indices and array subset.
///
/// For example, consider a 4x3 array with element indices
/// ```text
/// (0, 0)  (0, 1)  (0, 2)
/// (1, 0)  (1, 1)  (1, 2)
/// (2, 0)  (2, 1)  (2, 2)
/// (3, 0)  (3, 1)  (3, 2)
/// ```
/// A 2x2 chunks iterator with an array subset covering the entire array will produce
/// ```rust,ignore
/// [
///     ((0, 0), ArraySubset{offset: (0,0), shape: (2, 2)}),
///     ((0, 1), ArraySubset{offset: (0,2), shape: (2, 2)}),
///     ((1, 0), ArraySubset{offset: (2,0), shape: (2, 2)}),
///     ((1, 1), ArraySubset{offset: (2,2), shape: (2, 2)}),
/// ]
/// ```
#[derive(Clone, Debug)]
pub struct ChunksIterator {
    inner: IndicesIterator,
    chunk_shape: ArrayShape,
}

impl ChunksIterator {
    /// Create a new chunks iterator.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `chunk_shape` does not match the dimensionality of `subset`.
    /// A chunk shape with a zero component is also rejected.
    pub fn new(
        subset: &ArraySubset,
        chunk_shape: &[u64],
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if subset.dimensionality() != chunk_shape.len() || chunk_shape.contains(&0) {
            return Err(IncompatibleDimensionalityError::new(
                chunk_shape.len(),
                subset.dimensionality(),
            ));
        }
        let subset_chunks = if subset.is_empty() {
            ArraySubset::new_with_shape(vec![0; subset.dimensionality()])
        } else {
            let chunk_start: ArrayIndices = std::iter::zip(subset.start(), chunk_shape)
                .map(|(s, c)| s / c)
                .collect();
            let chunk_end_exc: ArrayIndices = std::iter::zip(subset.end_exc(), chunk_shape)
                .map(|(e, c)| (e - 1) / c + 1)
                .collect();
            ArraySubset::new_with_start_end_exc(chunk_start, &chunk_end_exc)?
        };
        Ok(Self {
            inner: subset_chunks.iter_indices(),
            chunk_shape: chunk_shape.to_vec(),
        })
    }

    fn chunk_indices_with_subset(
        &self,
        chunk_indices: ArrayIndices,
    ) -> (ArrayIndices, ArraySubset) {
        let start = std::iter::zip(&chunk_indices, &self.chunk_shape)
            .map(|(i, c)| i * c)
            .collect();
        let chunk_subset = ArraySubset {
            start,
            shape: self.chunk_shape.clone(),
        };
        (chunk_indices, chunk_subset)
    }
}

impl Iterator for ChunksIterator {
    type Item = (ArrayIndices, ArraySubset);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|chunk_indices| self.chunk_indices_with_subset(chunk_indices))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for ChunksIterator {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner
            .next_back()
            .map(|chunk_indices| self.chunk_indices_with_subset(chunk_indices))
    }
}

impl ExactSizeIterator for ChunksIterator {}

impl FusedIterator for ChunksIterator {}

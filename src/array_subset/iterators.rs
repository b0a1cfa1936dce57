//! Array subset iterators.
//!
//! The iterators are:
//!  - [`IndicesIterator`]: iterate over the multidimensional indices of the elements in the subset.
//!  - [`ChunksIterator`]: iterate over regular sized chunks overlapping the subset.
//!
//! These are created with [`ArraySubset::iter_indices`](super::ArraySubset::iter_indices) and
//! [`ArraySubset::iter_chunks`](super::ArraySubset::iter_chunks).

mod chunks_iterator;
mod indices_iterator;

pub use chunks_iterator::ChunksIterator;
pub use indices_iterator::IndicesIterator;

#[cfg(test)]
mod tests {
    use crate::array_subset::ArraySubset;

    #[test]
    fn array_subset_iter_indices() {
        let subset = ArraySubset::new_with_start_shape(vec![1, 1], vec![2, 2]).unwrap();
        let mut iter = subset.iter_indices();
        assert_eq!(iter.size_hint(), (4, Some(4)));
        assert_eq!(iter.next(), Some(vec![1, 1]));
        assert_eq!(iter.next_back(), Some(vec![2, 2]));
        assert_eq!(iter.len(), 2);
        assert_eq!(iter.next(), Some(vec![1, 2]));
        assert_eq!(iter.next(), Some(vec![2, 1]));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn array_subset_iter_indices_empty() {
        let subset = ArraySubset::new_with_start_shape(vec![1, 1], vec![0, 2]).unwrap();
        assert_eq!(subset.iter_indices().next(), None);
    }

    #[test]
    fn array_subset_iter_chunks() {
        let subset = ArraySubset::new_with_start_shape(vec![2, 2], vec![3, 4]).unwrap();
        assert!(subset.iter_chunks(&[2]).is_err());
        assert!(subset.iter_chunks(&[2, 0]).is_err());
        let mut iter = subset.iter_chunks(&[2, 3]).unwrap();
        assert_eq!(iter.size_hint(), (4, Some(4)));
        assert_eq!(
            iter.next(),
            Some((
                vec![1, 0],
                ArraySubset::new_with_start_shape(vec![2, 0], vec![2, 3]).unwrap(),
            ))
        );
        assert_eq!(
            iter.next(),
            Some((
                vec![1, 1],
                ArraySubset::new_with_start_shape(vec![2, 3], vec![2, 3]).unwrap(),
            ))
        );
        assert_eq!(
            iter.next_back(),
            Some((
                vec![2, 1],
                ArraySubset::new_with_start_shape(vec![4, 3], vec![2, 3]).unwrap(),
            ))
        );
        assert_eq!(
            iter.next(),
            Some((
                vec![2, 0],
                ArraySubset::new_with_start_shape(vec![4, 0], vec![2, 3]).unwrap(),
            ))
        );
        assert_eq!(iter.next(), None);
    }
}

//! Fill values.
//!
//! The fill value of an array is the element value of any chunk that has not been written,
//! and of any region read from outside the array bounds.

use super::Element;

/// The fill value of an array.
///
/// Stored as the native endian bytes of a single element.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FillValue(Vec<u8>);

impl core::fmt::Display for FillValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<Vec<u8>> for FillValue {
    fn from(value: Vec<u8>) -> Self {
        FillValue(value)
    }
}

macro_rules! impl_from_element {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FillValue {
                fn from(value: $t) -> Self {
                    FillValue(value.to_ne_bytes().to_vec())
                }
            }
        )*
    };
}

impl_from_element!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl FillValue {
    /// Create a new fill value composed of `bytes`.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> FillValue {
        FillValue(bytes)
    }

    /// Returns the size in bytes of the fill value.
    #[must_use]
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Return the byte representation of the fill value.
    #[must_use]
    pub fn as_ne_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Return the fill value as an element of type `T`.
    ///
    /// Returns [`None`] if the size of `T` does not match the fill value.
    #[must_use]
    pub fn to_element<T: Element>(&self) -> Option<T> {
        (self.0.len() == core::mem::size_of::<T>()).then(|| bytemuck::pod_read_unaligned(&self.0))
    }

    /// Check if the bytes are equal to a sequence of the fill value.
    ///
    /// An empty sequence is considered equal.
    #[must_use]
    pub fn equals_all(&self, bytes: &[u8]) -> bool {
        !self.0.is_empty()
            && bytes.len() % self.0.len() == 0
            && bytes.chunks_exact(self.0.len()).all(|element| element == self.0)
    }
}

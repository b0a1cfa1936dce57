//! N-dimensional integer coordinates.
//!
//! A [`Coordinate`] is an immutable, ordered tuple of signed integers with one component per axis.
//! It is used for world-space offsets and extents, voxel sizes, and scale factors.
//! Arithmetic is elementwise and requires both operands to have the same dimensionality.

use derive_more::{Deref, From};
use itertools::izip;

use crate::array_subset::IncompatibleDimensionalityError;

/// An N-dimensional integer coordinate.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Deref, From)]
pub struct Coordinate(Vec<i64>);

impl core::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "(")?;
        for (i, component) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{component}")?;
        }
        write!(f, ")")
    }
}

impl Coordinate {
    /// Create a new coordinate from its components.
    #[must_use]
    pub fn new(components: impl Into<Vec<i64>>) -> Self {
        Self(components.into())
    }

    /// Create a coordinate of dimensionality `dims` with every component set to `value`.
    #[must_use]
    pub fn splat(value: i64, dims: usize) -> Self {
        Self(vec![value; dims])
    }

    /// Create a coordinate from unsigned components.
    ///
    /// Components are saturated at [`i64::MAX`].
    #[must_use]
    pub fn from_unsigned(components: &[u64]) -> Self {
        Self(
            components
                .iter()
                .map(|&c| i64::try_from(c).unwrap_or(i64::MAX))
                .collect(),
        )
    }

    /// Return the dimensionality of the coordinate.
    #[must_use]
    pub fn dims(&self) -> usize {
        self.0.len()
    }

    /// Return the components of the coordinate.
    #[must_use]
    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    /// Convert the coordinate to unsigned components.
    ///
    /// Returns [`None`] if any component is negative.
    #[must_use]
    pub fn to_unsigned(&self) -> Option<Vec<u64>> {
        self.0.iter().map(|&c| u64::try_from(c).ok()).collect()
    }

    /// Return the product of the components.
    #[must_use]
    pub fn product(&self) -> i64 {
        self.0.iter().product()
    }

    /// Returns true if every component is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0.iter().all(|&c| c > 0)
    }

    /// Returns true if every component of this coordinate is a multiple of the corresponding component of `other`.
    ///
    /// A zero component of `other` only divides a zero component of `self`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionalities differ.
    pub fn is_multiple_of(&self, other: &Self) -> Result<bool, IncompatibleDimensionalityError> {
        self.check_dims(other)?;
        Ok(std::iter::zip(&self.0, &other.0).all(|(&a, &b)| {
            if b == 0 {
                a == 0
            } else {
                a % b == 0
            }
        }))
    }

    /// Elementwise addition.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionalities differ.
    pub fn add(&self, other: &Self) -> Result<Self, IncompatibleDimensionalityError> {
        self.zip_with(other, |a, b| a + b)
    }

    /// Elementwise subtraction.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionalities differ.
    pub fn sub(&self, other: &Self) -> Result<Self, IncompatibleDimensionalityError> {
        self.zip_with(other, |a, b| a - b)
    }

    /// Elementwise multiplication.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionalities differ.
    pub fn mul(&self, other: &Self) -> Result<Self, IncompatibleDimensionalityError> {
        self.zip_with(other, |a, b| a * b)
    }

    /// Elementwise floor division.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionalities differ.
    ///
    /// # Panics
    /// Panics if a component of `other` is zero.
    pub fn div_floor(&self, other: &Self) -> Result<Self, IncompatibleDimensionalityError> {
        self.zip_with(other, i64::div_euclid)
    }

    /// Elementwise ceiling division.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionalities differ.
    ///
    /// # Panics
    /// Panics if a component of `other` is zero.
    pub fn div_ceil(&self, other: &Self) -> Result<Self, IncompatibleDimensionalityError> {
        self.zip_with(other, |a, b| -((-a).div_euclid(b)))
    }

    /// Elementwise maximum.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionalities differ.
    pub fn max_elementwise(&self, other: &Self) -> Result<Self, IncompatibleDimensionalityError> {
        self.zip_with(other, std::cmp::max)
    }

    /// Elementwise minimum.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionalities differ.
    pub fn min_elementwise(&self, other: &Self) -> Result<Self, IncompatibleDimensionalityError> {
        self.zip_with(other, std::cmp::min)
    }

    /// Prepend `value` as a new leading axis.
    #[must_use]
    pub fn prepend(&self, value: i64) -> Self {
        let mut components = Vec::with_capacity(self.dims() + 1);
        components.push(value);
        components.extend_from_slice(&self.0);
        Self(components)
    }

    fn check_dims(&self, other: &Self) -> Result<(), IncompatibleDimensionalityError> {
        if self.dims() == other.dims() {
            Ok(())
        } else {
            Err(IncompatibleDimensionalityError::new(other.dims(), self.dims()))
        }
    }

    fn zip_with(
        &self,
        other: &Self,
        f: impl Fn(i64, i64) -> i64,
    ) -> Result<Self, IncompatibleDimensionalityError> {
        self.check_dims(other)?;
        Ok(Self(
            izip!(&self.0, &other.0).map(|(&a, &b)| f(a, b)).collect(),
        ))
    }
}

impl From<&[i64]> for Coordinate {
    fn from(components: &[i64]) -> Self {
        Self(components.to_vec())
    }
}

impl<const N: usize> From<[i64; N]> for Coordinate {
    fn from(components: [i64; N]) -> Self {
        Self(components.to_vec())
    }
}

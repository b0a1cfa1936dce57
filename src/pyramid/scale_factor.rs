//! Per-level scale factors.

use std::str::FromStr;

use crate::coordinate::Coordinate;

use super::{ConfigurationError, ShapeArg};

/// An ordered list of per-level scale factors.
///
/// Each factor is the ratio between the voxel size of a level and the previous level, not the base level.
/// Parsed from a `;`-separated list where each factor is an integer (isotropic) or comma-separated integers (anisotropic),
/// e.g. `2,2,1;2,2,1;2;2`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScaleFactors(Vec<ShapeArg>);

impl ScaleFactors {
    /// Create a new list of scale factors.
    #[must_use]
    pub fn new(factors: Vec<ShapeArg>) -> Self {
        Self(factors)
    }

    /// Return the unresolved scale factors.
    #[must_use]
    pub fn factors(&self) -> &[ShapeArg] {
        &self.0
    }

    /// Resolve each scale factor to a [`Coordinate`] with `spatial_rank` components.
    ///
    /// # Errors
    /// Returns a [`ConfigurationError`] if the list is empty, or a factor has a zero component or does not match `spatial_rank`.
    pub fn resolve(&self, spatial_rank: usize) -> Result<Vec<Coordinate>, ConfigurationError> {
        if self.0.is_empty() {
            return Err(ConfigurationError::EmptyScaleFactors);
        }
        self.0
            .iter()
            .map(|factor| {
                let resolved = factor.to_shape(spatial_rank).ok_or_else(|| {
                    let components = match factor {
                        ShapeArg::Scalar(scalar) => vec![*scalar],
                        ShapeArg::PerAxis(shape) => shape.clone(),
                    };
                    ConfigurationError::ScaleFactorLength(components, spatial_rank)
                })?;
                if resolved.contains(&0) {
                    return Err(ConfigurationError::ZeroComponent {
                        argument: "scale factor",
                        value: resolved,
                    });
                }
                Ok(Coordinate::from_unsigned(&resolved))
            })
            .collect()
    }
}

impl FromStr for ScaleFactors {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(';')
            .map(|factor| ShapeArg::parse("scale factor", factor))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl core::fmt::Display for ScaleFactors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", itertools::join(&self.0, ";"))
    }
}

impl From<Vec<ShapeArg>> for ScaleFactors {
    fn from(factors: Vec<ShapeArg>) -> Self {
        Self(factors)
    }
}

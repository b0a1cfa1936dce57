//! Chunk shape arguments and their resolution for new levels.

use std::str::FromStr;

use crate::array::ArrayShape;

use super::ConfigurationError;

/// A shape argument: a single integer applied to every axis, or one integer per axis.
///
/// Parsed from `"16"` or `"8,16,16"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShapeArg {
    /// The same extent for every axis.
    Scalar(u64),
    /// An extent per axis.
    PerAxis(Vec<u64>),
}

impl ShapeArg {
    /// Parse a shape argument named `argument` from `value`.
    ///
    /// # Errors
    /// Returns [`ConfigurationError::MalformedArgument`] if `value` is not an integer or a comma-separated list of integers.
    pub fn parse(argument: &'static str, value: &str) -> Result<Self, ConfigurationError> {
        let malformed = || ConfigurationError::MalformedArgument {
            argument,
            value: value.to_string(),
        };
        if let Ok(scalar) = value.trim().parse::<u64>() {
            return Ok(Self::Scalar(scalar));
        }
        value
            .split(',')
            .map(|component| component.trim().parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map(Self::PerAxis)
            .map_err(|_| malformed())
    }

    /// Broadcast to `rank` axes, or return the per axis values if they already have length `rank`.
    ///
    /// Returns [`None`] on a length mismatch.
    #[must_use]
    pub fn to_shape(&self, rank: usize) -> Option<ArrayShape> {
        match self {
            Self::Scalar(scalar) => Some(vec![*scalar; rank]),
            Self::PerAxis(shape) => (shape.len() == rank).then(|| shape.clone()),
        }
    }
}

impl FromStr for ShapeArg {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse("shape", s)
    }
}

impl core::fmt::Display for ShapeArg {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Scalar(scalar) => write!(f, "{scalar}"),
            Self::PerAxis(shape) => write!(f, "{}", itertools::join(shape, ",")),
        }
    }
}

/// Resolve the chunk shape of a new level.
///
/// - Without `chunk_shape`, the chunk shape of the previous level is reused verbatim.
/// - With a channel axis (`channel_dims == 1`):
///   - a scalar is broadcast to the spatial axes after the channel extent `num_channels`,
///   - a full rank shape is used as-is if its first component is `num_channels`,
///   - a spatial rank shape is prefixed with `num_channels`.
/// - Without a channel axis, a scalar is broadcast and a spatial rank shape is used as-is.
///
/// # Errors
/// Returns a [`ConfigurationError`] if `chunk_shape` has an unexpected length, a mismatched channel extent, or a zero component.
pub fn resolve_chunk_shape(
    chunk_shape: Option<&ShapeArg>,
    previous_chunk_shape: &[u64],
    spatial_rank: usize,
    channel_dims: usize,
    num_channels: u64,
) -> Result<ArrayShape, ConfigurationError> {
    let Some(chunk_shape) = chunk_shape else {
        return Ok(previous_chunk_shape.to_vec());
    };
    let rank = spatial_rank + channel_dims;
    let length_error = |shape: &[u64]| ConfigurationError::ChunkShapeLength {
        chunk_shape: shape.to_vec(),
        spatial_rank,
        rank,
    };

    let resolved = match chunk_shape {
        ShapeArg::Scalar(scalar) => {
            let mut resolved = vec![num_channels; channel_dims];
            resolved.extend(std::iter::repeat(*scalar).take(spatial_rank));
            resolved
        }
        ShapeArg::PerAxis(shape) if channel_dims > 0 && shape.len() == rank => {
            if shape[0] != num_channels {
                return Err(ConfigurationError::ChunkShapeChannels(
                    shape.clone(),
                    num_channels,
                ));
            }
            shape.clone()
        }
        ShapeArg::PerAxis(shape) if shape.len() == spatial_rank => {
            let mut resolved = vec![num_channels; channel_dims];
            resolved.extend_from_slice(shape);
            resolved
        }
        ShapeArg::PerAxis(shape) => return Err(length_error(shape)),
    };

    if resolved.contains(&0) {
        Err(ConfigurationError::ZeroComponent {
            argument: "chunk shape",
            value: resolved,
        })
    } else {
        Ok(resolved)
    }
}

use thiserror::Error;

use crate::{
    array::{ArrayCreateError, ArrayError, ArrayShape},
    array_subset::IncompatibleDimensionalityError,
    coordinate::Coordinate,
    node::NodePathError,
    roi::{Roi, RoiError},
    storage::StorageError,
};

/// A configuration error.
///
/// Raised for malformed or inconsistent arguments before any level is built.
/// Geometry errors found while building a level are wrapped in [`PyramidError::LevelGeometry`].
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// An argument is not an integer or a comma-separated list of integers.
    #[error("malformed {argument} {value:?}, expected an integer or comma-separated integers")]
    MalformedArgument {
        /// The argument name.
        argument: &'static str,
        /// The malformed value.
        value: String,
    },
    /// An argument has a zero component.
    #[error("{argument} {value:?} has a zero component")]
    ZeroComponent {
        /// The argument name.
        argument: &'static str,
        /// The value.
        value: Vec<u64>,
    },
    /// The scale factor list is empty.
    #[error("no scale factors were given")]
    EmptyScaleFactors,
    /// A scale factor does not match the spatial rank.
    #[error("scale factor {_0:?} must be a scalar or have one component per spatial axis ({_1})")]
    ScaleFactorLength(Vec<u64>, usize),
    /// A chunk shape does not match the spatial or full rank.
    #[error("chunk shape {chunk_shape:?} must be a scalar, or have one component per spatial axis ({spatial_rank}) or per array axis ({rank}) if there is a channel axis")]
    ChunkShapeLength {
        /// The chunk shape.
        chunk_shape: Vec<u64>,
        /// The number of spatial axes.
        spatial_rank: usize,
        /// The array dimensionality.
        rank: usize,
    },
    /// The channel component of a chunk shape does not match the channel count.
    #[error("chunk shape {_0:?} does not match the channel count: the first component must be {_1} or omitted")]
    ChunkShapeChannels(Vec<u64>, u64),
    /// The worker count is zero.
    #[error("the number of workers must be at least one")]
    ZeroWorkers,
    /// The worker pool could not be created.
    #[error("failed to create worker pool: {_0}")]
    WorkerPool(String),
    /// A block region does not align with a voxel size.
    #[error("region {_0} is not aligned to voxel size {_1}")]
    MisalignedRegion(Roi, Coordinate),
    /// Incompatible dimensionality.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// An invalid region, such as a non-positive block shape.
    #[error(transparent)]
    Roi(#[from] RoiError),
}

/// An input error.
///
/// Raised when the named dataset cannot be used as the base of a pyramid.
#[derive(Debug, Error)]
pub enum InputError {
    /// The dataset path is not valid.
    #[error(transparent)]
    InvalidPath(#[from] NodePathError),
    /// The dataset path does not hold an array.
    #[error("{_0} does not seem to be a dataset")]
    NotAnArray(String),
    /// The root node cannot be moved below itself.
    #[error("the root array cannot be promoted to a scale level, name it s<n> or move it into a group")]
    UnscaledRoot,
    /// The dataset metadata could not be read.
    #[error(transparent)]
    InvalidMetadata(#[from] ArrayCreateError),
    /// The offset of the dataset is not a multiple of its voxel size.
    #[error("offset {offset} is not a multiple of voxel size {voxel_size}")]
    MisalignedOffset {
        /// The dataset offset.
        offset: Coordinate,
        /// The dataset voxel size.
        voxel_size: Coordinate,
    },
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
}

/// An internal sampling error.
///
/// A block with a spatial shape that is not a multiple of the scale factor indicates a miscomputed read region.
#[derive(Debug, Error)]
pub enum SamplingError {
    /// The block shape is not a multiple of the scale factor.
    #[error("block shape {_0:?} is not a multiple of scale factor {_1:?}")]
    NotMultiple(ArrayShape, ArrayShape),
    /// The number of elements does not match the block shape.
    #[error("got {_0} elements for block shape {_1:?}")]
    InvalidElementsLength(usize, ArrayShape),
    /// An element could not be converted to `f64`.
    #[error("element cannot be converted to f64")]
    FloatConversion,
    /// A mean could not be represented by the element type.
    #[error("mean {_0} cannot be represented by the element type")]
    ElementConversion(f64),
}

/// A block processing error, carrying the output region of the block.
#[derive(Debug, Error)]
pub enum BlockError {
    /// Reading the input region failed.
    #[error("failed to read {read_roi} for block {write_roi}: {source}")]
    Read {
        /// The output region.
        write_roi: Roi,
        /// The input region.
        read_roi: Roi,
        /// The underlying error.
        source: ArrayError,
    },
    /// Downsampling failed.
    #[error("failed to downsample block {write_roi}: {source}")]
    Downsample {
        /// The output region.
        write_roi: Roi,
        /// The underlying error.
        source: SamplingError,
    },
    /// Writing the output region failed.
    #[error("failed to write to {write_roi}: {source}")]
    Write {
        /// The output region.
        write_roi: Roi,
        /// The underlying error.
        source: ArrayError,
    },
}

impl BlockError {
    /// Return the output region of the failed block.
    #[must_use]
    pub fn write_roi(&self) -> &Roi {
        match self {
            Self::Read { write_roi, .. }
            | Self::Downsample { write_roi, .. }
            | Self::Write { write_roi, .. } => write_roi,
        }
    }
}

/// A pyramid error.
#[derive(Debug, Error)]
pub enum PyramidError {
    /// A configuration error.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// An input error.
    #[error(transparent)]
    Input(#[from] InputError),
    /// The array has more than one channel axis.
    #[error("{_0} channel dimensions found, more than one channel dimension is not supported")]
    ChannelDimension(usize),
    /// A block of a level failed.
    #[error("level s{level} failed: {source}")]
    BlockWrite {
        /// The index of the failed level.
        level: u64,
        /// The block error.
        source: BlockError,
    },
    /// The geometry of a level could not be derived from the level below it.
    #[error("level s{level} has invalid geometry: {source}")]
    LevelGeometry {
        /// The index of the level.
        level: u64,
        /// The geometry error.
        source: ConfigurationError,
    },
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// An array error.
    #[error(transparent)]
    ArrayError(#[from] ArrayError),
    /// An array creation error.
    #[error(transparent)]
    ArrayCreateError(#[from] ArrayCreateError),
}

impl PyramidError {
    /// Returns true if the error was raised while validating the configuration or input, before any level was built.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::Input(_) | Self::ChannelDimension(_)
        )
    }
}

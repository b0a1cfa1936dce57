use thiserror::Error;

use crate::{
    array_subset::{IncompatibleArraySubsetError, IncompatibleDimensionalityError},
    node::{NodePath, NodePathError},
    roi::Roi,
    storage::StorageError,
};

use super::{
    codec::CodecError,
    data_type::{IncompatibleFillValueError, UnsupportedDataTypeError},
    ArrayShape, DataType,
};

/// An array creation error.
#[derive(Debug, Error)]
pub enum ArrayCreateError {
    /// Invalid zarr format.
    #[error("invalid zarr format {0}, expected 3")]
    InvalidZarrFormat(u64),
    /// The node is a group rather than an array.
    #[error("{0} is a group, expected an array")]
    NotAnArray(NodePath),
    /// An invalid node path
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// Unsupported data type.
    #[error(transparent)]
    DataTypeCreateError(#[from] UnsupportedDataTypeError),
    /// Invalid fill value.
    #[error(transparent)]
    InvalidFillValue(#[from] IncompatibleFillValueError),
    /// Error creating codecs.
    #[error(transparent)]
    CodecsCreateError(#[from] CodecError),
    /// Unsupported chunk grid.
    #[error("unsupported chunk grid {0}, expected regular")]
    UnsupportedChunkGrid(String),
    /// Unsupported chunk key encoding.
    #[error("unsupported chunk key encoding {0}, expected default with separator /")]
    UnsupportedChunkKeyEncoding(String),
    /// The dimensionality of the chunk grid does not match the array shape.
    #[error("chunk grid dimensionality {0} does not match array dimensionality {1}")]
    InvalidChunkGridDimensionality(usize, usize),
    /// The chunk shape has a zero component.
    #[error("chunk shape {0:?} has a zero component")]
    InvalidChunkShape(ArrayShape),
    /// The `resolution` or `offset` attributes are invalid.
    #[error("invalid spatial attributes: {0}")]
    InvalidSpatialAttributes(String),
    /// Storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// An error deserializing the metadata.
    #[error(transparent)]
    MetadataDeserializationError(#[from] serde_json::Error),
    /// Missing metadata.
    #[error("array metadata is missing at {0}")]
    MissingMetadata(NodePath),
}

/// Array errors.
#[derive(Debug, Error)]
pub enum ArrayError {
    /// A store error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// A codec error.
    #[error(transparent)]
    CodecError(#[from] CodecError),
    /// Incompatible dimensionality.
    #[error(transparent)]
    IncompatibleDimensionalityError(#[from] IncompatibleDimensionalityError),
    /// Incompatible array subset.
    #[error(transparent)]
    IncompatibleArraySubset(#[from] IncompatibleArraySubsetError),
    /// A region to write is not within the array bounds.
    #[error("region {_0} is not within the bounds of array shape {_1:?}")]
    InvalidRegion(Roi, ArrayShape),
    /// Invalid chunk grid indices.
    #[error("chunk grid indices {_0:?} are invalid for chunk grid shape {_1:?}")]
    InvalidChunkGridIndices(Vec<u64>, ArrayShape),
    /// The element type does not match the array data type.
    #[error("got element type {_0}, expected {_1}")]
    IncompatibleElementType(DataType, DataType),
    /// The number of elements does not match the region.
    #[error("got {_0} elements, expected {_1}")]
    InvalidElementsLength(usize, u64),
}

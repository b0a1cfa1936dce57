use serde::{Deserialize, Serialize};

use super::{codec::CodecMetadata, ArrayShape, DataType};

/// The attribute holding the voxel size of the spatial axes.
pub const RESOLUTION_ATTRIBUTE: &str = "resolution";

/// The attribute holding the world-space offset of the spatial axes.
pub const OFFSET_ATTRIBUTE: &str = "offset";

/// Array metadata.
///
/// An example `zarr.json` document:
/// ```json
/// {
///     "zarr_format": 3,
///     "node_type": "array",
///     "shape": [32, 32, 32],
///     "data_type": "uint8",
///     "chunk_grid": {"name": "regular", "configuration": {"chunk_shape": [16, 16, 16]}},
///     "chunk_key_encoding": {"name": "default", "configuration": {"separator": "/"}},
///     "fill_value": 0,
///     "codecs": [{"name": "bytes", "configuration": {"endian": "little"}}],
///     "attributes": {"resolution": [4, 4, 4], "offset": [0, 0, 0]}
/// }
/// ```
/// The `node_type` field is written by [`NodeMetadata`](crate::node::NodeMetadata).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ArrayMetadata {
    /// The format version. Always `3`.
    pub zarr_format: u64,
    /// The array shape.
    pub shape: ArrayShape,
    /// The data type.
    pub data_type: DataType,
    /// The chunk grid.
    pub chunk_grid: ChunkGridMetadata,
    /// The chunk key encoding.
    #[serde(default)]
    pub chunk_key_encoding: ChunkKeyEncodingMetadata,
    /// The fill value.
    pub fill_value: serde_json::Value,
    /// The codecs.
    pub codecs: Vec<CodecMetadata>,
    /// User attributes, including the spatial attributes.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// Chunk grid metadata.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChunkGridMetadata {
    /// The chunk grid name. Only `regular` is supported.
    pub name: String,
    /// The chunk grid configuration.
    pub configuration: RegularChunkGridConfiguration,
}

/// Regular chunk grid configuration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RegularChunkGridConfiguration {
    /// The chunk shape.
    pub chunk_shape: ArrayShape,
}

impl ChunkGridMetadata {
    /// Create regular chunk grid metadata.
    #[must_use]
    pub fn regular(chunk_shape: ArrayShape) -> Self {
        Self {
            name: "regular".to_string(),
            configuration: RegularChunkGridConfiguration { chunk_shape },
        }
    }
}

/// Chunk key encoding metadata.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChunkKeyEncodingMetadata {
    /// The chunk key encoding name. Only `default` is supported.
    pub name: String,
    /// The chunk key encoding configuration.
    #[serde(default)]
    pub configuration: ChunkKeyEncodingConfiguration,
}

/// Chunk key encoding configuration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChunkKeyEncodingConfiguration {
    /// The separator between chunk grid indices in a key.
    pub separator: String,
}

impl Default for ChunkKeyEncodingConfiguration {
    fn default() -> Self {
        Self {
            separator: "/".to_string(),
        }
    }
}

impl Default for ChunkKeyEncodingMetadata {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            configuration: ChunkKeyEncodingConfiguration::default(),
        }
    }
}

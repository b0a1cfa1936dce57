use std::sync::Arc;

use crate::coordinate::Coordinate;

use super::{
    codec::{BytesCodec, BytesToBytesCodecTraits},
    Array, ArrayCreateError, ArrayMetadata, ArrayShape, ChunkGridMetadata,
    ChunkKeyEncodingMetadata, CodecChain, DataType, FillValue, OFFSET_ATTRIBUTE,
    RESOLUTION_ATTRIBUTE,
};

/// An [`Array`] builder.
///
/// The array builder is initialised from an array shape, data type, chunk shape, and fill value.
///  - The only codec enabled by default is `bytes` (with little endian encoding), so the output is uncompressed.
///  - The chunk key encoding is always `default` with the `/` chunk key separator.
///  - Attributes are empty, so every axis is spatial with a voxel size of one.
///
/// Use the methods in the array builder to change the configuration away from these defaults, and then build the array at a path of some storage with [`ArrayBuilder::build`].
/// Note that [`build`](ArrayBuilder::build) does not modify the store; the array metadata has to be explicitly written with [`Array::store_metadata`].
///
/// For example:
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # use std::sync::Arc;
/// use zarrs_pyramid::array::{ArrayBuilder, DataType, FillValue};
/// use zarrs_pyramid::coordinate::Coordinate;
/// # let store = Arc::new(zarrs_pyramid::storage::store::MemoryStore::new());
/// let array = ArrayBuilder::new(
///     vec![3, 64, 64], // array shape
///     DataType::Float32,
///     vec![3, 32, 32], // chunk shape
///     FillValue::from(0.0f32),
/// )
/// .bytes_to_bytes_codecs(vec![
///     #[cfg(feature = "gzip")]
///     Arc::new(zarrs_pyramid::array::codec::GzipCodec::new(5)?),
/// ])
/// .spatial(&Coordinate::from([4, 4]), &Coordinate::from([0, 0])) // a leading channel axis
/// .build(store.clone(), "/raw")?;
/// array.store_metadata()?; // write metadata to the store
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ArrayBuilder {
    /// Array shape.
    pub shape: ArrayShape,
    /// Data type.
    pub data_type: DataType,
    /// Chunk shape.
    pub chunk_shape: ArrayShape,
    /// Fill value.
    pub fill_value: FillValue,
    /// The `bytes` codec.
    pub bytes_codec: BytesCodec,
    /// Bytes to bytes codecs.
    pub bytes_to_bytes_codecs: Vec<Arc<dyn BytesToBytesCodecTraits>>,
    /// Attributes.
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl ArrayBuilder {
    /// Create a new array builder.
    #[must_use]
    pub fn new(
        shape: ArrayShape,
        data_type: DataType,
        chunk_shape: ArrayShape,
        fill_value: FillValue,
    ) -> Self {
        Self {
            shape,
            data_type,
            chunk_shape,
            fill_value,
            bytes_codec: BytesCodec::little(),
            bytes_to_bytes_codecs: Vec::default(),
            attributes: serde_json::Map::default(),
        }
    }

    /// Create a new builder copying the configuration of an existing array.
    #[must_use]
    pub fn from_array<T: ?Sized>(array: &Array<T>) -> Self {
        let mut builder = Self::new(
            array.shape().to_vec(),
            array.data_type(),
            array.chunk_shape().to_vec(),
            array.fill_value().clone(),
        );
        builder
            .bytes_codec(*array.codecs().bytes_codec())
            .bytes_to_bytes_codecs(array.codecs().bytes_to_bytes_codecs().to_vec())
            .attributes(array.attributes().clone());
        builder
    }

    /// Set the shape.
    pub fn shape(&mut self, shape: ArrayShape) -> &mut Self {
        self.shape = shape;
        self
    }

    /// Set the data type.
    pub fn data_type(&mut self, data_type: DataType) -> &mut Self {
        self.data_type = data_type;
        self
    }

    /// Set the chunk shape.
    pub fn chunk_shape(&mut self, chunk_shape: ArrayShape) -> &mut Self {
        self.chunk_shape = chunk_shape;
        self
    }

    /// Set the fill value.
    pub fn fill_value(&mut self, fill_value: FillValue) -> &mut Self {
        self.fill_value = fill_value;
        self
    }

    /// Set the `bytes` codec.
    pub fn bytes_codec(&mut self, bytes_codec: BytesCodec) -> &mut Self {
        self.bytes_codec = bytes_codec;
        self
    }

    /// Set the bytes to bytes codecs.
    ///
    /// If left unmodified, the array will have no bytes to bytes codecs.
    pub fn bytes_to_bytes_codecs(
        &mut self,
        bytes_to_bytes_codecs: Vec<Arc<dyn BytesToBytesCodecTraits>>,
    ) -> &mut Self {
        self.bytes_to_bytes_codecs = bytes_to_bytes_codecs;
        self
    }

    /// Set the user defined attributes.
    ///
    /// If left unmodified, the user defined attributes of the array will be empty.
    pub fn attributes(
        &mut self,
        attributes: serde_json::Map<String, serde_json::Value>,
    ) -> &mut Self {
        self.attributes = attributes;
        self
    }

    /// Set the `resolution` and `offset` attributes.
    ///
    /// The array axes not covered by `voxel_size` are channel axes.
    pub fn spatial(&mut self, voxel_size: &Coordinate, offset: &Coordinate) -> &mut Self {
        self.attributes.insert(
            RESOLUTION_ATTRIBUTE.to_string(),
            voxel_size.as_slice().into(),
        );
        self.attributes
            .insert(OFFSET_ATTRIBUTE.to_string(), offset.as_slice().into());
        self
    }

    /// Build into an [`Array`].
    ///
    /// # Errors
    ///
    /// Returns [`ArrayCreateError`] if there is an error creating the array.
    /// This can be due to an invalid path, or a problem with array configuration.
    pub fn build<TStorage: ?Sized>(
        &self,
        storage: Arc<TStorage>,
        path: &str,
    ) -> Result<Array<TStorage>, ArrayCreateError> {
        let codecs = CodecChain::new(self.bytes_codec, self.bytes_to_bytes_codecs.clone());
        let metadata = ArrayMetadata {
            zarr_format: 3,
            shape: self.shape.clone(),
            data_type: self.data_type,
            chunk_grid: ChunkGridMetadata::regular(self.chunk_shape.clone()),
            chunk_key_encoding: ChunkKeyEncodingMetadata::default(),
            fill_value: self.data_type.metadata_fill_value(&self.fill_value)?,
            codecs: codecs.create_metadatas(),
            attributes: self.attributes.clone(),
        };
        Array::new_with_metadata(storage, path, metadata)
    }
}

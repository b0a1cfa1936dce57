//! Chunked N-dimensional arrays.
//!
//! An array is a node in a hierarchy holding a dense N-dimensional grid of elements, split into regular chunks.
//! Each chunk is encoded with a [`CodecChain`] and stored at its own key.
//!
//! Use [`ArrayBuilder`] to setup a new array, or use [`Array::open`] for an existing array.
//!
//! ### Spatial metadata
//! The trailing axes of an array are *spatial*.
//! The `resolution` attribute holds the voxel size (world units per element) of each spatial axis and the
//! `offset` attribute holds the world-space position of element zero.
//! Any leading axes not covered by `resolution` are *channel* axes.
//! Without these attributes, every axis is spatial with a voxel size of one and a zero offset.

mod array_builder;
mod array_errors;
mod array_metadata;
pub mod codec;
mod data_type;
mod fill_value;

use std::sync::Arc;

pub use self::{
    array_builder::ArrayBuilder,
    array_errors::{ArrayCreateError, ArrayError},
    array_metadata::{
        ArrayMetadata, ChunkGridMetadata, ChunkKeyEncodingConfiguration, ChunkKeyEncodingMetadata,
        RegularChunkGridConfiguration, OFFSET_ATTRIBUTE, RESOLUTION_ATTRIBUTE,
    },
    codec::CodecChain,
    data_type::{DataType, Element, IncompatibleFillValueError, UnsupportedDataTypeError},
    fill_value::FillValue,
};

use crate::{
    array_subset::{ArraySubset, IncompatibleDimensionalityError},
    config::global_config,
    coordinate::Coordinate,
    node::{NodeMetadata, NodePath},
    roi::Roi,
    storage::{
        create_array, erase_chunk, retrieve_chunk, retrieve_node_metadata, store_chunk,
        ReadableStorageTraits, ReadableWritableStorageTraits, WritableStorageTraits,
    },
};

/// An ND index to an element in an array.
pub type ArrayIndices = Vec<u64>;

/// The shape of an array.
pub type ArrayShape = Vec<u64>;

/// A chunked array.
///
/// ### Metadata
///
/// An array is defined by the following parameters (which are encoded in its JSON metadata):
///  - **shape**: defines the length of the array dimensions,
///  - **data type**: defines the numerical representation of array elements,
///  - **chunk grid**: a regular grid of chunks with a fixed chunk shape,
///  - **fill value**: an element value to use for uninitialised portions of the array,
///  - **codecs**: used to encode and decode chunks,
///  - **attributes**: user metadata, including the `resolution` and `offset` spatial attributes.
///
/// ### Reading and writing
/// Elements are read and written as typed [`Element`] slices in C order.
/// Reads may extend outside of the array, in which case the outside is filled with the fill value.
/// Writes must lie within the array.
/// A chunk which is only partially covered by a write is read, updated, and written back.
#[derive(Debug)]
pub struct Array<TStorage: ?Sized> {
    storage: Arc<TStorage>,
    path: NodePath,
    metadata: ArrayMetadata,
    chunk_shape: ArrayShape,
    fill_value: FillValue,
    codecs: CodecChain,
    voxel_size: Coordinate,
    offset: Coordinate,
}

impl<TStorage: ?Sized> Array<TStorage> {
    /// Create an array in `storage` at `path` with `metadata`.
    /// This does **not** write to the store, use [`store_metadata`](Array<WritableStorageTraits>::store_metadata) to write `metadata` to `storage`.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if:
    ///  - any metadata is invalid,
    ///  - the chunk grid, chunk key encoding, data type or a codec is unsupported, or
    ///  - the `resolution` or `offset` attributes are invalid.
    pub fn new_with_metadata(
        storage: Arc<TStorage>,
        path: &str,
        metadata: ArrayMetadata,
    ) -> Result<Self, ArrayCreateError> {
        let path = NodePath::new(path)?;
        if metadata.zarr_format != 3 {
            return Err(ArrayCreateError::InvalidZarrFormat(metadata.zarr_format));
        }

        if metadata.chunk_grid.name != "regular" {
            return Err(ArrayCreateError::UnsupportedChunkGrid(
                metadata.chunk_grid.name.clone(),
            ));
        }
        let chunk_shape = metadata.chunk_grid.configuration.chunk_shape.clone();
        if chunk_shape.len() != metadata.shape.len() {
            return Err(ArrayCreateError::InvalidChunkGridDimensionality(
                chunk_shape.len(),
                metadata.shape.len(),
            ));
        }
        if chunk_shape.contains(&0) {
            return Err(ArrayCreateError::InvalidChunkShape(chunk_shape));
        }

        let chunk_key_encoding = &metadata.chunk_key_encoding;
        if chunk_key_encoding.name != "default" || chunk_key_encoding.configuration.separator != "/"
        {
            return Err(ArrayCreateError::UnsupportedChunkKeyEncoding(format!(
                "{} ({})",
                chunk_key_encoding.name, chunk_key_encoding.configuration.separator
            )));
        }

        let fill_value = metadata
            .data_type
            .fill_value_from_metadata(&metadata.fill_value)?;
        let codecs = CodecChain::from_metadata(&metadata.codecs)?;
        let (voxel_size, offset) = spatial_attributes(&metadata)?;

        Ok(Self {
            storage,
            path,
            metadata,
            chunk_shape,
            fill_value,
            codecs,
            voxel_size,
            offset,
        })
    }

    /// Get the underlying storage backing the array.
    #[must_use]
    pub fn storage(&self) -> Arc<TStorage> {
        self.storage.clone()
    }

    /// Get the node path.
    #[must_use]
    pub const fn path(&self) -> &NodePath {
        &self.path
    }

    /// Get the data type.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.metadata.data_type
    }

    /// Get the fill value.
    #[must_use]
    pub const fn fill_value(&self) -> &FillValue {
        &self.fill_value
    }

    /// Get the array shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.metadata.shape
    }

    /// Get the array dimensionality.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.metadata.shape.len()
    }

    /// Get the chunk shape.
    #[must_use]
    pub fn chunk_shape(&self) -> &[u64] {
        &self.chunk_shape
    }

    /// Get the shape of the chunk grid, the number of chunks along each axis.
    #[must_use]
    pub fn chunk_grid_shape(&self) -> ArrayShape {
        std::iter::zip(self.shape(), &self.chunk_shape)
            .map(|(s, c)| s.div_ceil(*c))
            .collect()
    }

    /// Get the codecs.
    #[must_use]
    pub const fn codecs(&self) -> &CodecChain {
        &self.codecs
    }

    /// Get the attributes.
    #[must_use]
    pub const fn attributes(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.metadata.attributes
    }

    /// Get the voxel size of the spatial axes.
    #[must_use]
    pub const fn voxel_size(&self) -> &Coordinate {
        &self.voxel_size
    }

    /// Get the world-space offset of the spatial axes.
    #[must_use]
    pub const fn offset(&self) -> &Coordinate {
        &self.offset
    }

    /// Get the number of spatial axes.
    #[must_use]
    pub fn spatial_dims(&self) -> usize {
        self.voxel_size.dims()
    }

    /// Get the number of leading channel axes.
    #[must_use]
    pub fn channel_dims(&self) -> usize {
        self.dimensionality() - self.spatial_dims()
    }

    /// Get the number of channels, the product of the extents of the channel axes.
    ///
    /// An array without a channel axis has one channel.
    #[must_use]
    pub fn num_channels(&self) -> u64 {
        self.shape()[..self.channel_dims()].iter().product()
    }

    /// Get the shape of the spatial axes.
    #[must_use]
    pub fn spatial_shape(&self) -> &[u64] {
        &self.shape()[self.channel_dims()..]
    }

    /// Get the world-space region of interest covered by the array.
    #[must_use]
    pub fn roi(&self) -> Roi {
        let shape = std::iter::zip(self.spatial_shape(), self.voxel_size.iter())
            .map(|(&s, v)| i64::try_from(s).unwrap_or(i64::MAX).saturating_mul(*v))
            .collect::<Vec<_>>();
        Roi::new_unchecked(self.offset.clone(), Coordinate::new(shape))
    }

    /// Return the metadata.
    #[must_use]
    pub const fn metadata(&self) -> &ArrayMetadata {
        &self.metadata
    }

    /// Return the array subset of the chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndices`] if `chunk_indices` are not within the chunk grid.
    pub fn chunk_subset(&self, chunk_indices: &[u64]) -> Result<ArraySubset, ArrayError> {
        let chunk_grid_shape = self.chunk_grid_shape();
        if chunk_indices.len() != chunk_grid_shape.len()
            || std::iter::zip(chunk_indices, &chunk_grid_shape).any(|(i, s)| i >= s)
        {
            return Err(ArrayError::InvalidChunkGridIndices(
                chunk_indices.to_vec(),
                chunk_grid_shape,
            ));
        }
        let start = std::iter::zip(chunk_indices, &self.chunk_shape)
            .map(|(i, c)| i * c)
            .collect();
        Ok(ArraySubset::new_with_start_shape(
            start,
            self.chunk_shape.clone(),
        )?)
    }

    fn num_chunk_elements(&self) -> usize {
        self.chunk_shape
            .iter()
            .product::<u64>()
            .try_into()
            .unwrap_or(usize::MAX)
    }

    fn validate_element_type<T: Element>(&self) -> Result<T, ArrayError> {
        if T::DATA_TYPE == self.data_type() {
            self.fill_value.to_element::<T>().ok_or(
                ArrayError::IncompatibleElementType(T::DATA_TYPE, self.data_type()),
            )
        } else {
            Err(ArrayError::IncompatibleElementType(
                T::DATA_TYPE,
                self.data_type(),
            ))
        }
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> Array<TStorage> {
    /// Open an existing array in `storage` at `path`.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if there is a storage error, the metadata is missing or invalid, or the node is a group.
    pub fn open(storage: Arc<TStorage>, path: &str) -> Result<Self, ArrayCreateError> {
        let node_path = NodePath::new(path)?;
        match retrieve_node_metadata(&*storage, &node_path)? {
            Some(NodeMetadata::Array(metadata)) => Self::new_with_metadata(storage, path, metadata),
            Some(NodeMetadata::Group(_)) => Err(ArrayCreateError::NotAnArray(node_path)),
            None => Err(ArrayCreateError::MissingMetadata(node_path)),
        }
    }

    /// Read and decode the chunk at `chunk_indices` into its elements.
    ///
    /// A chunk that does not exist in the store is filled with the fill value.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `T` does not match the data type,
    ///  - the chunk indices are invalid,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_chunk_elements<T: Element>(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Vec<T>, ArrayError> {
        let fill = self.validate_element_type::<T>()?;
        self.chunk_subset(chunk_indices)?;
        match retrieve_chunk(&*self.storage, &self.path, chunk_indices)? {
            Some(encoded) => {
                let decoded = self.codecs.decode(
                    encoded.to_vec(),
                    self.data_type(),
                    self.num_chunk_elements() * self.data_type().size(),
                )?;
                Ok(bytemuck::pod_collect_to_vec(&decoded))
            }
            None => Ok(vec![fill; self.num_chunk_elements()]),
        }
    }

    /// Read the elements in the index-space region `roi`.
    ///
    /// `roi` has the full dimensionality of the array and may extend beyond the array in any direction,
    /// including to negative indices.
    /// Elements outside of the array are the fill value.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `T` does not match the data type,
    ///  - the dimensionality of `roi` does not match the array,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_roi_elements<T: Element>(&self, roi: &Roi) -> Result<Vec<T>, ArrayError> {
        let fill = self.validate_element_type::<T>()?;
        if roi.dims() != self.dimensionality() {
            return Err(
                IncompatibleDimensionalityError::new(roi.dims(), self.dimensionality()).into(),
            );
        }
        let output_shape = roi
            .shape()
            .to_unsigned()
            .ok_or_else(|| ArrayError::InvalidRegion(roi.clone(), self.shape().to_vec()))?;
        let num_elements = usize::try_from(output_shape.iter().product::<u64>())
            .map_err(|_| ArrayError::InvalidRegion(roi.clone(), self.shape().to_vec()))?;
        let mut output = vec![fill; num_elements];

        let bounds = Roi::from_array_subset(&ArraySubset::new_with_shape(self.shape().to_vec()));
        let Some(inside) = roi.intersect(&bounds)?.to_array_subset() else {
            return Ok(output);
        };
        if inside.is_empty() {
            return Ok(output);
        }

        let inside_output = relative_to_roi(&inside, roi)
            .ok_or_else(|| ArrayError::InvalidRegion(roi.clone(), self.shape().to_vec()))?;
        if inside_output == ArraySubset::new_with_shape(output_shape.clone()) {
            return self.retrieve_array_subset_elements(&inside);
        }

        let inside_elements = self.retrieve_array_subset_elements::<T>(&inside)?;
        inside_output.store_elements(&inside_elements, &mut output, &output_shape)?;
        Ok(output)
    }

    /// Read the elements in `array_subset`, which must be within the array.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `T` does not match the data type,
    ///  - `array_subset` is not within the array,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_array_subset_elements<T: Element>(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<Vec<T>, ArrayError> {
        let fill = self.validate_element_type::<T>()?;
        if !array_subset.inbounds(self.shape()) {
            return Err(ArrayError::InvalidRegion(
                Roi::from_array_subset(array_subset),
                self.shape().to_vec(),
            ));
        }
        let mut output = vec![fill; array_subset.num_elements_usize()];
        for (chunk_indices, chunk_subset) in array_subset.iter_chunks(&self.chunk_shape)? {
            let overlap = chunk_subset.overlap(array_subset)?;
            let chunk_elements = self.retrieve_chunk_elements::<T>(&chunk_indices)?;
            let elements = overlap
                .relative_to(chunk_subset.start())?
                .extract_elements(&chunk_elements, &self.chunk_shape)?;
            overlap
                .relative_to(array_subset.start())?
                .store_elements(&elements, &mut output, array_subset.shape())?;
        }
        Ok(output)
    }
}

impl<TStorage: ?Sized + WritableStorageTraits> Array<TStorage> {
    /// Store metadata.
    ///
    /// # Errors
    /// Returns [`StorageError`](crate::storage::StorageError) if there is an underlying store error.
    pub fn store_metadata(&self) -> Result<(), ArrayError> {
        Ok(create_array(&*self.storage, &self.path, &self.metadata)?)
    }

    /// Encode `chunk_elements` and store at `chunk_indices`.
    ///
    /// If every element is the fill value and the [store empty chunks](crate::config::Config#store-empty-chunks)
    /// option is disabled, the chunk is erased instead.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `T` does not match the data type,
    ///  - the chunk indices are invalid,
    ///  - the length of `chunk_elements` does not match the chunk shape,
    ///  - there is a codec encoding error, or
    ///  - an underlying store error.
    pub fn store_chunk_elements<T: Element>(
        &self,
        chunk_indices: &[u64],
        chunk_elements: &[T],
    ) -> Result<(), ArrayError> {
        self.validate_element_type::<T>()?;
        self.chunk_subset(chunk_indices)?;
        if chunk_elements.len() != self.num_chunk_elements() {
            return Err(ArrayError::InvalidElementsLength(
                chunk_elements.len(),
                self.num_chunk_elements() as u64,
            ));
        }
        let decoded: &[u8] = bytemuck::cast_slice(chunk_elements);
        if !global_config().store_empty_chunks() && self.fill_value.equals_all(decoded) {
            erase_chunk(&*self.storage, &self.path, chunk_indices)?;
        } else {
            let encoded = self.codecs.encode(decoded.to_vec(), self.data_type())?;
            store_chunk(&*self.storage, &self.path, chunk_indices, encoded.into())?;
        }
        Ok(())
    }
}

impl<TStorage: ?Sized + ReadableWritableStorageTraits> Array<TStorage> {
    /// Store `elements` in the index-space region `roi`, which must be within the array.
    ///
    /// Chunks entirely covered by `roi` are written without being read.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `T` does not match the data type,
    ///  - `roi` is not within the array,
    ///  - the length of `elements` does not match `roi`,
    ///  - there is a codec encoding or decoding error, or
    ///  - an underlying store error.
    pub fn store_roi_elements<T: Element>(
        &self,
        roi: &Roi,
        elements: &[T],
    ) -> Result<(), ArrayError> {
        let array_subset = roi
            .to_array_subset()
            .ok_or_else(|| ArrayError::InvalidRegion(roi.clone(), self.shape().to_vec()))?;
        self.store_array_subset_elements(&array_subset, elements)
    }

    /// Store `elements` in `array_subset`, which must be within the array.
    ///
    /// # Errors
    /// See [`store_roi_elements`](Array::store_roi_elements).
    pub fn store_array_subset_elements<T: Element>(
        &self,
        array_subset: &ArraySubset,
        elements: &[T],
    ) -> Result<(), ArrayError> {
        let fill = self.validate_element_type::<T>()?;
        if !array_subset.inbounds(self.shape()) {
            return Err(ArrayError::InvalidRegion(
                Roi::from_array_subset(array_subset),
                self.shape().to_vec(),
            ));
        }
        if elements.len() as u64 != array_subset.num_elements() {
            return Err(ArrayError::InvalidElementsLength(
                elements.len(),
                array_subset.num_elements(),
            ));
        }

        for (chunk_indices, chunk_subset) in array_subset.iter_chunks(&self.chunk_shape)? {
            let overlap = chunk_subset.overlap(array_subset)?;
            let overlap_elements = overlap
                .relative_to(array_subset.start())?
                .extract_elements(elements, array_subset.shape())?;
            let mut chunk_elements = if array_subset.contains(&chunk_subset.bound(self.shape())?) {
                vec![fill; self.num_chunk_elements()]
            } else {
                self.retrieve_chunk_elements::<T>(&chunk_indices)?
            };
            overlap.relative_to(chunk_subset.start())?.store_elements(
                &overlap_elements,
                &mut chunk_elements,
                &self.chunk_shape,
            )?;
            self.store_chunk_elements(&chunk_indices, &chunk_elements)?;
        }
        Ok(())
    }
}

/// Return `subset` relative to the offset of `roi`, or [`None`] if `subset` begins before `roi`.
fn relative_to_roi(subset: &ArraySubset, roi: &Roi) -> Option<ArraySubset> {
    let start = std::iter::zip(subset.start(), roi.offset().iter())
        .map(|(&s, &o)| u64::try_from(i64::try_from(s).ok()? - o).ok())
        .collect::<Option<Vec<_>>>()?;
    ArraySubset::new_with_start_shape(start, subset.shape().to_vec()).ok()
}

/// Parse the `resolution` and `offset` attributes.
fn spatial_attributes(
    metadata: &ArrayMetadata,
) -> Result<(Coordinate, Coordinate), ArrayCreateError> {
    let parse = |name: &str| -> Result<Option<Vec<i64>>, ArrayCreateError> {
        metadata
            .attributes
            .get(name)
            .map(|value| {
                serde_json::from_value::<Vec<i64>>(value.clone()).map_err(|err| {
                    ArrayCreateError::InvalidSpatialAttributes(format!("{name}: {err}"))
                })
            })
            .transpose()
    };
    let rank = metadata.shape.len();
    let voxel_size = Coordinate::new(parse(RESOLUTION_ATTRIBUTE)?.unwrap_or_else(|| vec![1; rank]));
    if voxel_size.dims() > rank {
        return Err(ArrayCreateError::InvalidSpatialAttributes(format!(
            "{RESOLUTION_ATTRIBUTE} {voxel_size} has more axes than the array dimensionality {rank}"
        )));
    }
    if !voxel_size.is_positive() {
        return Err(ArrayCreateError::InvalidSpatialAttributes(format!(
            "{RESOLUTION_ATTRIBUTE} {voxel_size} must be positive"
        )));
    }
    let offset = Coordinate::new(
        parse(OFFSET_ATTRIBUTE)?.unwrap_or_else(|| vec![0; voxel_size.dims()]),
    );
    if offset.dims() != voxel_size.dims() {
        return Err(ArrayCreateError::InvalidSpatialAttributes(format!(
            "{OFFSET_ATTRIBUTE} {offset} does not match {RESOLUTION_ATTRIBUTE} {voxel_size}"
        )));
    }
    Ok((voxel_size, offset))
}

#[cfg(test)]
mod tests {
    use crate::storage::{store::MemoryStore, StoreKey, ReadableStorageTraits};

    use super::*;

    fn roi(offset: &[i64], shape: &[i64]) -> Roi {
        Roi::new(Coordinate::from(offset), Coordinate::from(shape)).unwrap()
    }

    fn test_array(store: &Arc<MemoryStore>) -> Array<MemoryStore> {
        let mut builder = ArrayBuilder::new(vec![4, 6], DataType::UInt16, vec![2, 4], 9u16.into());
        builder.spatial(&Coordinate::from([2, 2]), &Coordinate::from([4, -2]));
        let array = builder.build(store.clone(), "/array").unwrap();
        array.store_metadata().unwrap();
        array
    }

    #[test]
    fn array_open() -> Result<(), Box<dyn std::error::Error>> {
        let store = Arc::new(MemoryStore::new());
        let array = test_array(&store);
        let opened = Array::open(store.clone(), "/array")?;
        assert_eq!(opened.metadata(), array.metadata());
        assert_eq!(opened.shape(), &[4, 6]);
        assert_eq!(opened.chunk_shape(), &[2, 4]);
        assert_eq!(opened.chunk_grid_shape(), vec![2, 2]);
        assert_eq!(opened.voxel_size(), &Coordinate::from([2, 2]));
        assert_eq!(opened.channel_dims(), 0);
        assert_eq!(opened.num_channels(), 1);
        assert_eq!(opened.roi(), roi(&[4, -2], &[8, 12]));

        assert!(matches!(
            Array::open(store.clone(), "/missing"),
            Err(ArrayCreateError::MissingMetadata(_))
        ));
        crate::storage::create_group(
            &*store,
            &NodePath::new("/group")?,
            &crate::node::GroupMetadata::default(),
        )?;
        assert!(matches!(
            Array::open(store, "/group"),
            Err(ArrayCreateError::NotAnArray(_))
        ));
        Ok(())
    }

    #[test]
    fn array_store_retrieve() -> Result<(), Box<dyn std::error::Error>> {
        let store = Arc::new(MemoryStore::new());
        let array = test_array(&store);

        // Unwritten arrays are the fill value
        assert_eq!(
            array.retrieve_array_subset_elements::<u16>(&ArraySubset::new_with_shape(vec![1, 2]))?,
            vec![9, 9]
        );

        let elements: Vec<u16> = (0..24).collect();
        array.store_roi_elements(&roi(&[0, 0], &[4, 6]), &elements)?;
        assert_eq!(
            array.retrieve_roi_elements::<u16>(&roi(&[0, 0], &[4, 6]))?,
            elements
        );
        assert_eq!(
            array.retrieve_roi_elements::<u16>(&roi(&[1, 3], &[2, 2]))?,
            vec![9, 10, 15, 16]
        );

        // Partially covering a chunk preserves the rest of it
        array.store_roi_elements(&roi(&[1, 1], &[1, 2]), &[100u16, 101])?;
        assert_eq!(
            array.retrieve_roi_elements::<u16>(&roi(&[0, 0], &[2, 4]))?,
            vec![0, 1, 2, 3, 6, 100, 101, 9]
        );

        assert!(array.store_roi_elements(&roi(&[3, 0], &[2, 1]), &[0u16, 0]).is_err());
        assert!(array.store_roi_elements(&roi(&[-1, 0], &[1, 1]), &[0u16]).is_err());
        assert!(array.store_roi_elements(&roi(&[0, 0], &[1, 1]), &[0u16, 0]).is_err());
        assert!(array.retrieve_roi_elements::<u8>(&roi(&[0, 0], &[1, 1])).is_err());
        Ok(())
    }

    #[test]
    fn array_retrieve_out_of_bounds() -> Result<(), Box<dyn std::error::Error>> {
        let store = Arc::new(MemoryStore::new());
        let array = test_array(&store);
        let elements: Vec<u16> = (0..24).collect();
        array.store_roi_elements(&roi(&[0, 0], &[4, 6]), &elements)?;

        assert_eq!(
            array.retrieve_roi_elements::<u16>(&roi(&[-1, 4], &[2, 3]))?,
            vec![9, 9, 9, 4, 5, 9]
        );
        assert_eq!(
            array.retrieve_roi_elements::<u16>(&roi(&[10, 10], &[1, 2]))?,
            vec![9, 9]
        );
        assert!(array
            .retrieve_roi_elements::<u16>(&roi(&[0, 0, 0], &[1, 1, 1]))
            .is_err());
        Ok(())
    }

    #[test]
    fn array_empty_chunks_erased() -> Result<(), Box<dyn std::error::Error>> {
        let store = Arc::new(MemoryStore::new());
        let array = test_array(&store);
        let key = StoreKey::new("array/c/0/0")?;
        array.store_chunk_elements(&[0, 0], &[1u16; 8])?;
        assert!(store.get(&key)?.is_some());
        array.store_chunk_elements(&[0, 0], &[9u16; 8])?;
        assert!(store.get(&key)?.is_none());
        assert!(array.store_chunk_elements(&[2, 0], &[1u16; 8]).is_err());
        assert!(array.store_chunk_elements(&[0, 0], &[1u16; 7]).is_err());
        Ok(())
    }

    #[test]
    fn array_spatial_attributes() {
        let store = Arc::new(MemoryStore::new());
        let mut builder =
            ArrayBuilder::new(vec![3, 8, 8], DataType::Float32, vec![3, 4, 4], 0f32.into());
        builder.spatial(&Coordinate::from([4, 4]), &Coordinate::from([8, 0]));
        let array = builder.build(store.clone(), "/rgb").unwrap();
        assert_eq!(array.channel_dims(), 1);
        assert_eq!(array.num_channels(), 3);
        assert_eq!(array.spatial_shape(), &[8, 8]);
        assert_eq!(array.roi(), roi(&[8, 0], &[32, 32]));

        builder.spatial(&Coordinate::from([4, 4, 4, 4]), &Coordinate::from([0, 0, 0, 0]));
        assert!(builder.build(store.clone(), "/rgb").is_err());
        builder.spatial(&Coordinate::from([0, 4]), &Coordinate::from([0, 0]));
        assert!(builder.build(store, "/rgb").is_err());
    }
}

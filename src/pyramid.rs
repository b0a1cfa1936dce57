//! Scale pyramids.
//!
//! A scale pyramid is a chain of progressively coarser versions of an array, stored as sibling arrays `s0`, `s1`, `s2`, ... in a group.
//! Each level is downsampled from the previous level by a per-level [scale factor](ScaleFactors),
//! so the voxel size of level `n` is the voxel size of level `n - 1` multiplied by the scale factor of level `n`.
//!
//! Arrays of continuous data are downsampled by averaging windows, and label arrays by picking a single voxel per window ([`SamplingStrategy`]).
//! The output of a level is split into chunk aligned [`Block`]s which are processed in parallel by a [`BlockwiseScheduler`].
//! A level is only started once the previous level is complete.
//!
//! ### Example
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # use std::sync::Arc;
//! use zarrs_pyramid::array::{ArrayBuilder, DataType};
//! use zarrs_pyramid::pyramid::{create_scale_pyramid, PyramidOptions, ScaleFactors};
//! # let store = Arc::new(zarrs_pyramid::storage::store::MemoryStore::new());
//! let array = ArrayBuilder::new(vec![32, 32], DataType::UInt8, vec![16, 16], 0u8.into())
//!     .build(store.clone(), "/raw")?;
//! array.store_metadata()?;
//!
//! // Moves /raw to /raw/s0 and creates /raw/s1 and /raw/s2
//! let scales: ScaleFactors = "2;2".parse()?;
//! let options = PyramidOptions::builder().num_workers(4).build();
//! let levels = create_scale_pyramid(store, "/raw", &scales, &options)?;
//! assert_eq!(levels[1].path.as_str(), "/raw/s2");
//! assert_eq!(levels[1].shape, vec![8, 8]);
//! # Ok(())
//! # }
//! ```

mod blockwise;
mod chunk_shape;
mod options;
mod pyramid_errors;
mod sampling;
mod scale_factor;

use std::sync::Arc;

pub use self::{
    blockwise::{partition_blocks, Block, BlockwiseScheduler, BlockwiseSummary},
    chunk_shape::{resolve_chunk_shape, ShapeArg},
    options::{PyramidOptions, PyramidOptionsBuilder},
    pyramid_errors::{BlockError, ConfigurationError, InputError, PyramidError, SamplingError},
    sampling::SamplingStrategy,
    scale_factor::ScaleFactors,
};

use log::info;

use crate::{
    array::{Array, ArrayBuilder, ArrayShape, DataType, Element},
    coordinate::Coordinate,
    node::{GroupMetadata, NodeMetadata, NodePath},
    roi::{Roi, SnapMode},
    storage::{
        create_group, retrieve_node_metadata, ReadableStorageTraits,
        ReadableWritableStorageTraits, StorePrefix,
    },
};

/// The state of a [`ScalePyramid`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PyramidState {
    /// The base array has been validated and no level has been built.
    Initializing,
    /// Building the level with this scale index.
    BuildingLevel(u64),
    /// Every requested level has been built.
    Completed,
    /// Building failed. Completed levels are left in place.
    Failed,
}

/// A summary of a built pyramid level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PyramidLevel {
    /// The scale index `n` of the level `s<n>`.
    pub scale: u64,
    /// The path of the level array.
    pub path: NodePath,
    /// The array shape.
    pub shape: ArrayShape,
    /// The chunk shape.
    pub chunk_shape: ArrayShape,
    /// The voxel size of the spatial axes.
    pub voxel_size: Coordinate,
    /// The world-space region covered by the level.
    pub roi: Roi,
}

impl PyramidLevel {
    fn new<TStorage: ?Sized>(scale: u64, array: &Array<TStorage>) -> Self {
        Self {
            scale,
            path: array.path().clone(),
            shape: array.shape().to_vec(),
            chunk_shape: array.chunk_shape().to_vec(),
            voxel_size: array.voxel_size().clone(),
            roi: array.roi(),
        }
    }
}

/// Parse the scale index of a level named `s<n>`.
fn extract_scale(name: &str) -> Option<u64> {
    name.strip_prefix('s')?.parse().ok()
}

/// A scale pyramid under construction.
///
/// [`open`](ScalePyramid::open) validates the base array, and [`build`](ScalePyramid::build) adds levels above it.
///
/// The base array is found at the dataset path given to [`open`](ScalePyramid::open):
///  - an array named `s<n>` is level `n` and new levels are created next to it,
///  - any other array is moved to `<path>/s0` by [`build`](ScalePyramid::build), and `<path>` becomes a group,
///  - a group containing an array `s0` (a previously moved array) has level 0 at `<path>/s0`,
///  - a path with no metadata but an array `s0` (an interrupted move) has level 0 at `<path>/s0`,
///    and the group metadata of `<path>` is written by [`build`](ScalePyramid::build).
#[derive(Debug)]
pub struct ScalePyramid<TStorage: ?Sized> {
    storage: Arc<TStorage>,
    dataset_path: NodePath,
    group_path: NodePath,
    base_path: NodePath,
    lowest_scale: u64,
    promote: bool,
    write_group: bool,
    base: Array<TStorage>,
    state: PyramidState,
}

impl<TStorage: ?Sized + ReadableStorageTraits> ScalePyramid<TStorage> {
    /// Open the base array of a scale pyramid in `storage` at `dataset_path`.
    ///
    /// # Errors
    /// Returns a [`PyramidError`] if
    ///  - `dataset_path` is not an array (or a group with an `s0` array),
    ///  - the array metadata is invalid,
    ///  - the array has more than one channel axis, or
    ///  - the offset of the array is not a multiple of its voxel size.
    pub fn open(storage: Arc<TStorage>, dataset_path: &str) -> Result<Self, PyramidError> {
        let dataset_path = NodePath::new(dataset_path).map_err(InputError::from)?;
        let not_an_array = || InputError::NotAnArray(dataset_path.to_string());

        let metadata = retrieve_node_metadata(&*storage, &dataset_path).map_err(InputError::from)?;
        let (group_path, base_path, lowest_scale, promote, write_group) = match metadata {
            Some(NodeMetadata::Array(_)) => match extract_scale(dataset_path.name()) {
                Some(scale) => {
                    let group_path = dataset_path.parent().ok_or_else(not_an_array)?;
                    (group_path, dataset_path.clone(), scale, false, false)
                }
                None if dataset_path.is_root() => return Err(InputError::UnscaledRoot.into()),
                None => {
                    let base_path = dataset_path.child("s0").map_err(InputError::from)?;
                    (dataset_path.clone(), base_path, 0, true, true)
                }
            },
            Some(NodeMetadata::Group(_)) | None => {
                let base_path = dataset_path.child("s0").map_err(InputError::from)?;
                match retrieve_node_metadata(&*storage, &base_path).map_err(InputError::from)? {
                    Some(NodeMetadata::Array(_)) => {
                        (dataset_path.clone(), base_path, 0, false, metadata.is_none())
                    }
                    _ => return Err(not_an_array().into()),
                }
            }
        };

        let current_path = if promote { &dataset_path } else { &base_path };
        let base = Array::open(storage.clone(), current_path.as_str()).map_err(InputError::from)?;
        if base.channel_dims() > 1 {
            return Err(PyramidError::ChannelDimension(base.channel_dims()));
        }
        if !base
            .offset()
            .is_multiple_of(base.voxel_size())
            .map_err(ConfigurationError::from)?
        {
            return Err(InputError::MisalignedOffset {
                offset: base.offset().clone(),
                voxel_size: base.voxel_size().clone(),
            }
            .into());
        }

        Ok(Self {
            storage,
            dataset_path,
            group_path,
            base_path,
            lowest_scale,
            promote,
            write_group,
            base,
            state: PyramidState::Initializing,
        })
    }

    /// Return the base array.
    #[must_use]
    pub const fn base(&self) -> &Array<TStorage> {
        &self.base
    }

    /// Return the path of the group holding the levels.
    #[must_use]
    pub const fn group_path(&self) -> &NodePath {
        &self.group_path
    }

    /// Return the path of the lowest level, after any move to `s0`.
    #[must_use]
    pub const fn base_path(&self) -> &NodePath {
        &self.base_path
    }

    /// Return the scale index of the base array.
    #[must_use]
    pub const fn lowest_scale(&self) -> u64 {
        self.lowest_scale
    }

    /// Returns true if the base array will be moved to `s0` when the pyramid is built.
    #[must_use]
    pub const fn requires_promotion(&self) -> bool {
        self.promote
    }

    /// Return the state.
    #[must_use]
    pub const fn state(&self) -> PyramidState {
        self.state
    }
}

impl<TStorage: ?Sized + ReadableWritableStorageTraits> ScalePyramid<TStorage> {
    /// Build a level for each scale factor in `scales` above the base array.
    ///
    /// The scale factors, chunk shape and worker pool are validated before the store is modified.
    /// Levels are named `s<n>` counting up from the base level.
    /// If a level fails, no further levels are built and completed levels remain in the store.
    ///
    /// Returns a summary of each new level.
    ///
    /// # Errors
    /// Returns a [`PyramidError`] if the configuration is invalid, a block fails, or there is a storage error.
    pub fn build(
        &mut self,
        scales: &ScaleFactors,
        options: &PyramidOptions,
    ) -> Result<Vec<PyramidLevel>, PyramidError> {
        let result = self.build_levels(scales, options);
        self.state = match &result {
            Ok(_) => PyramidState::Completed,
            Err(err) => {
                log::error!("Failed to build scale pyramid at {}: {err}", self.dataset_path);
                PyramidState::Failed
            }
        };
        result
    }

    fn build_levels(
        &mut self,
        scales: &ScaleFactors,
        options: &PyramidOptions,
    ) -> Result<Vec<PyramidLevel>, PyramidError> {
        let spatial_rank = self.base.spatial_dims();
        let channel_dims = self.base.channel_dims();
        let factors = scales.resolve(spatial_rank)?;
        let chunk_shape = resolve_chunk_shape(
            options.chunk_shape(),
            self.base.chunk_shape(),
            spatial_rank,
            channel_dims,
            self.base.num_channels(),
        )?;
        if options.chunk_shape().is_none() {
            info!("Reusing chunk shape of {chunk_shape:?} for new datasets");
        }
        let block_shape = Coordinate::from_unsigned(&chunk_shape[channel_dims..]);
        let scheduler = BlockwiseScheduler::new(options.num_workers(), options.max_retries())?;

        if self.promote {
            self.promote_base()?;
        }
        if self.write_group {
            create_group(&*self.storage, &self.group_path, &GroupMetadata::default())?;
            self.write_group = false;
        }

        info!("Scaling {} by a factor of {scales}", self.base_path);
        let mut previous = Array::open(self.storage.clone(), self.base_path.as_str())?;
        let mut levels = Vec::with_capacity(factors.len());
        for (scale, factor) in (self.lowest_scale + 1..).zip(&factors) {
            self.state = PyramidState::BuildingLevel(scale);
            let next = self.build_level(
                &previous,
                scale,
                factor,
                &chunk_shape,
                &block_shape,
                &scheduler,
            )?;
            levels.push(PyramidLevel::new(scale, &next));
            previous = next;
        }
        Ok(levels)
    }

    /// Move the base array from `<path>` to `<path>/s0`.
    fn promote_base(&mut self) -> Result<(), PyramidError> {
        info!("Moving {} to {}", self.dataset_path, self.base_path);
        self.storage.rename_prefix(
            &StorePrefix::from(&self.dataset_path),
            &StorePrefix::from(&self.base_path),
        )?;
        self.promote = false;
        Ok(())
    }

    fn build_level(
        &self,
        previous: &Array<TStorage>,
        scale: u64,
        factor: &Coordinate,
        chunk_shape: &[u64],
        block_shape: &Coordinate,
        scheduler: &BlockwiseScheduler,
    ) -> Result<Array<TStorage>, PyramidError> {
        let geometry = |source: ConfigurationError| PyramidError::LevelGeometry {
            level: scale,
            source,
        };
        let voxel_size = previous
            .voxel_size()
            .mul(factor)
            .map_err(|err| geometry(err.into()))?;
        let total_roi = previous
            .roi()
            .snap_to_grid(&voxel_size, SnapMode::Grow)
            .map_err(|err| geometry(err.into()))?;
        info!("Next voxel size: {voxel_size}");
        info!("Next total ROI: {total_roi}");
        info!("Next chunk shape: {chunk_shape:?}");

        let path = self
            .group_path
            .child(&format!("s{scale}"))
            .map_err(InputError::from)?;
        info!("Preparing {path}");
        let spatial_shape = total_roi
            .shape()
            .div_floor(&voxel_size)
            .map_err(|err| geometry(err.into()))?;
        let shape: ArrayShape = previous.shape()[..previous.channel_dims()]
            .iter()
            .copied()
            .chain(spatial_shape.iter().map(|s| s.unsigned_abs()))
            .collect();
        let next = ArrayBuilder::from_array(previous)
            .shape(shape)
            .chunk_shape(chunk_shape.to_vec())
            .spatial(&voxel_size, total_roi.offset())
            .build(self.storage.clone(), path.as_str())?;
        next.store_metadata()?;

        let blocks = partition_blocks(
            &total_roi,
            &voxel_size,
            next.offset(),
            previous.voxel_size(),
            previous.offset(),
            block_shape,
        )
        .map_err(geometry)?;
        info!("Downsampling by factor {factor}");
        info!(
            "Processing ROI {total_roi} with {} blocks of {block_shape}",
            blocks.len()
        );

        let strategy = SamplingStrategy::for_data_type(previous.data_type());
        let factor: Vec<u64> = factor.iter().map(|f| f.unsigned_abs()).collect();
        let summary = scheduler
            .run(&blocks, |block| {
                downscale_block(previous, &next, strategy, &factor, block)
            })
            .map_err(|source| PyramidError::BlockWrite {
                level: scale,
                source,
            })?;
        info!(
            "Completed {path}: {} blocks, {} retries",
            summary.blocks_processed, summary.retries
        );
        Ok(next)
    }
}

/// Downsample the read region of `block` in `input` into the write region of `block` in `output`.
fn downscale_block<TStorage: ?Sized + ReadableWritableStorageTraits>(
    input: &Array<TStorage>,
    output: &Array<TStorage>,
    strategy: SamplingStrategy,
    factor: &[u64],
    block: &Block,
) -> Result<(), BlockError> {
    macro_rules! downscale {
        ($t:ty) => {
            downscale_block_elements::<TStorage, $t>(input, output, strategy, factor, block)
        };
    }
    match input.data_type() {
        DataType::Int8 => downscale!(i8),
        DataType::Int16 => downscale!(i16),
        DataType::Int32 => downscale!(i32),
        DataType::Int64 => downscale!(i64),
        DataType::UInt8 => downscale!(u8),
        DataType::UInt16 => downscale!(u16),
        DataType::UInt32 => downscale!(u32),
        DataType::UInt64 => downscale!(u64),
        DataType::Float32 => downscale!(f32),
        DataType::Float64 => downscale!(f64),
    }
}

fn downscale_block_elements<TStorage: ?Sized + ReadableWritableStorageTraits, T: Element>(
    input: &Array<TStorage>,
    output: &Array<TStorage>,
    strategy: SamplingStrategy,
    factor: &[u64],
    block: &Block,
) -> Result<(), BlockError> {
    let read_roi = with_channel_axes(&block.read_roi, input);
    let elements = input
        .retrieve_roi_elements::<T>(&read_roi)
        .map_err(|source| BlockError::Read {
            write_roi: block.write_roi.clone(),
            read_roi: block.read_roi.clone(),
            source,
        })?;
    let read_shape: ArrayShape = read_roi.shape().iter().map(|s| s.unsigned_abs()).collect();
    let downsampled = strategy
        .downsample(&elements, &read_shape, factor)
        .map_err(|source| BlockError::Downsample {
            write_roi: block.write_roi.clone(),
            source,
        })?;
    output
        .store_roi_elements(&with_channel_axes(&block.write_roi, output), &downsampled)
        .map_err(|source| BlockError::Write {
            write_roi: block.write_roi.clone(),
            source,
        })
}

/// Extend a spatial region with the full extent of the channel axes of `array`.
fn with_channel_axes<TStorage: ?Sized>(roi: &Roi, array: &Array<TStorage>) -> Roi {
    let channel_shape = &array.shape()[..array.channel_dims()];
    let offset = std::iter::repeat(0)
        .take(channel_shape.len())
        .chain(roi.offset().iter().copied())
        .collect::<Vec<_>>();
    let shape = Coordinate::from_unsigned(channel_shape)
        .iter()
        .copied()
        .chain(roi.shape().iter().copied())
        .collect::<Vec<_>>();
    Roi::new_unchecked(Coordinate::new(offset), Coordinate::new(shape))
}

/// Create a scale pyramid from the array at `dataset_path` in `storage`.
///
/// See [`ScalePyramid`].
///
/// # Errors
/// Returns a [`PyramidError`] if the base array or configuration is invalid, a block fails, or there is a storage error.
pub fn create_scale_pyramid<TStorage: ?Sized + ReadableWritableStorageTraits>(
    storage: Arc<TStorage>,
    dataset_path: &str,
    scales: &ScaleFactors,
    options: &PyramidOptions,
) -> Result<Vec<PyramidLevel>, PyramidError> {
    ScalePyramid::open(storage, dataset_path)?.build(scales, options)
}

#[cfg(test)]
mod tests {
    use crate::storage::store::MemoryStore;

    use super::*;

    #[test]
    fn pyramid_extract_scale() {
        assert_eq!(extract_scale("s0"), Some(0));
        assert_eq!(extract_scale("s12"), Some(12));
        assert_eq!(extract_scale("s"), None);
        assert_eq!(extract_scale("raw"), None);
        assert_eq!(extract_scale("scale"), None);
        assert_eq!(extract_scale(""), None);
    }

    fn base_array(store: &Arc<MemoryStore>, path: &str, shape: Vec<u64>, voxel_size: &[i64]) {
        let rank = shape.len();
        let mut builder = ArrayBuilder::new(shape, DataType::Float32, vec![4; rank], 0f32.into());
        builder.spatial(
            &Coordinate::from(voxel_size),
            &Coordinate::splat(0, voxel_size.len()),
        );
        builder
            .build(store.clone(), path)
            .unwrap()
            .store_metadata()
            .unwrap();
    }

    #[test]
    fn pyramid_open() {
        let store = Arc::new(MemoryStore::new());
        base_array(&store, "/volume/raw", vec![8, 8], &[1, 1]);
        let pyramid = ScalePyramid::open(store.clone(), "/volume/raw").unwrap();
        assert_eq!(pyramid.lowest_scale(), 0);
        assert!(pyramid.requires_promotion());
        assert_eq!(pyramid.group_path().as_str(), "/volume/raw");
        assert_eq!(pyramid.base_path().as_str(), "/volume/raw/s0");
        assert_eq!(pyramid.state(), PyramidState::Initializing);

        base_array(&store, "/volume/s3", vec![8, 8], &[1, 1]);
        let pyramid = ScalePyramid::open(store.clone(), "/volume/s3").unwrap();
        assert_eq!(pyramid.lowest_scale(), 3);
        assert!(!pyramid.requires_promotion());
        assert_eq!(pyramid.group_path().as_str(), "/volume");

        assert!(matches!(
            ScalePyramid::open(store.clone(), "/volume/missing"),
            Err(PyramidError::Input(InputError::NotAnArray(_)))
        ));
        assert!(matches!(
            ScalePyramid::open(store.clone(), "/volume"),
            Err(PyramidError::Input(InputError::NotAnArray(_)))
        ));
        assert!(matches!(
            ScalePyramid::open(store, "volume"),
            Err(PyramidError::Input(InputError::InvalidPath(_)))
        ));
    }

    #[test]
    fn pyramid_open_invalid_base() {
        let store = Arc::new(MemoryStore::new());
        base_array(&store, "/two_channels", vec![2, 3, 8, 8], &[1, 1]);
        let err = ScalePyramid::open(store.clone(), "/two_channels").unwrap_err();
        assert!(matches!(err, PyramidError::ChannelDimension(2)));
        assert!(err.is_validation_error());

        let mut builder = ArrayBuilder::new(vec![8, 8], DataType::UInt8, vec![4, 4], 0u8.into());
        builder.spatial(&Coordinate::from([4, 4]), &Coordinate::from([2, 0]));
        builder
            .build(store.clone(), "/misaligned")
            .unwrap()
            .store_metadata()
            .unwrap();
        assert!(matches!(
            ScalePyramid::open(store.clone(), "/misaligned"),
            Err(PyramidError::Input(InputError::MisalignedOffset { .. }))
        ));

        base_array(&store, "/", vec![8, 8], &[1, 1]);
        assert!(matches!(
            ScalePyramid::open(store, "/"),
            Err(PyramidError::Input(InputError::UnscaledRoot))
        ));
    }

    #[test]
    fn pyramid_build_state() {
        let store = Arc::new(MemoryStore::new());
        base_array(&store, "/raw", vec![8, 8], &[2, 2]);
        let mut pyramid = ScalePyramid::open(store.clone(), "/raw").unwrap();
        let options = PyramidOptions::builder().num_workers(2).build();

        // Invalid scale factors fail before the base array is moved
        let scales: ScaleFactors = "2,2,2".parse().unwrap();
        assert!(pyramid.build(&scales, &options).is_err());
        assert_eq!(pyramid.state(), PyramidState::Failed);
        assert!(pyramid.requires_promotion());

        let scales: ScaleFactors = "2;2,1".parse().unwrap();
        let levels = pyramid.build(&scales, &options).unwrap();
        assert_eq!(pyramid.state(), PyramidState::Completed);
        assert!(!pyramid.requires_promotion());
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].scale, 1);
        assert_eq!(levels[0].path.as_str(), "/raw/s1");
        assert_eq!(levels[0].shape, vec![4, 4]);
        assert_eq!(levels[0].voxel_size, Coordinate::from([4, 4]));
        assert_eq!(levels[1].shape, vec![2, 4]);
        assert_eq!(levels[1].voxel_size, Coordinate::from([8, 4]));
        assert_eq!(levels[1].chunk_shape, vec![4, 4]);
        assert!(Array::open(store.clone(), "/raw/s0").is_ok());
        assert!(matches!(
            retrieve_node_metadata(&*store, &NodePath::new("/raw").unwrap()).unwrap(),
            Some(NodeMetadata::Group(_))
        ));
    }

    #[test]
    fn pyramid_downscale_with_channels() {
        let store = Arc::new(MemoryStore::new());
        let mut builder =
            ArrayBuilder::new(vec![2, 4, 4], DataType::Float32, vec![2, 2, 2], 0f32.into());
        builder.spatial(&Coordinate::from([1, 1]), &Coordinate::from([0, 0]));
        let array = builder.build(store.clone(), "/rgb/s0").unwrap();
        array.store_metadata().unwrap();
        let elements: Vec<f32> = (0..32u8).map(f32::from).collect();
        array
            .store_array_subset_elements(
                &crate::array_subset::ArraySubset::new_with_shape(vec![2, 4, 4]),
                &elements,
            )
            .unwrap();

        let scales: ScaleFactors = "2".parse().unwrap();
        let options = PyramidOptions::builder().num_workers(2).build();
        let levels = create_scale_pyramid(store.clone(), "/rgb/s0", &scales, &options).unwrap();
        assert_eq!(levels[0].shape, vec![2, 2, 2]);

        let s1 = Array::open(store, "/rgb/s1").unwrap();
        assert_eq!(s1.num_channels(), 2);
        let output = s1
            .retrieve_array_subset_elements::<f32>(
                &crate::array_subset::ArraySubset::new_with_shape(vec![2, 2, 2]),
            )
            .unwrap();
        assert_eq!(
            output,
            vec![2.5, 4.5, 10.5, 12.5, 18.5, 20.5, 26.5, 28.5]
        );
    }
}

use std::sync::Arc;

use zarrs_pyramid::{
    array::{Array, ArrayBuilder, DataType, Element, FillValue},
    array_subset::ArraySubset,
    coordinate::Coordinate,
    node::{NodeMetadata, NodePath},
    pyramid::{
        create_scale_pyramid, BlockError, ConfigurationError, PyramidError, PyramidOptions,
        PyramidState, SamplingStrategy, ScalePyramid, ScaleFactors, ShapeArg,
    },
    storage::{
        retrieve_node_metadata, store::FilesystemStore, store::MemoryStore, Bytes, MaybeBytes,
        ReadableStorageTraits, ReadableWritableStorageTraits, StorageError, StoreKey, StorePrefix,
        WritableStorageTraits,
    },
};

fn options() -> PyramidOptions {
    PyramidOptions::builder().num_workers(4).build()
}

fn create_base<TStorage: ?Sized + ReadableWritableStorageTraits, T: Element>(
    store: &Arc<TStorage>,
    path: &str,
    shape: Vec<u64>,
    chunk_shape: Vec<u64>,
    fill_value: FillValue,
    elements: &[T],
) -> Result<Array<TStorage>, Box<dyn std::error::Error>> {
    let array = ArrayBuilder::new(shape.clone(), T::DATA_TYPE, chunk_shape, fill_value)
        .build(store.clone(), path)?;
    array.store_metadata()?;
    array.store_array_subset_elements(&ArraySubset::new_with_shape(shape), elements)?;
    Ok(array)
}

fn node_metadata<TStorage: ?Sized + ReadableWritableStorageTraits>(
    store: &TStorage,
    path: &str,
) -> Option<NodeMetadata> {
    retrieve_node_metadata(store, &NodePath::new(path).unwrap()).unwrap()
}

fn all_elements<TStorage: ?Sized + ReadableWritableStorageTraits, T: Element>(
    store: &Arc<TStorage>,
    path: &str,
) -> Vec<T> {
    let array = Array::open(store.clone(), path).unwrap();
    array
        .retrieve_array_subset_elements::<T>(&ArraySubset::new_with_shape(array.shape().to_vec()))
        .unwrap()
}

fn scenario_unsuffixed<TStorage: ?Sized + ReadableWritableStorageTraits>(
    store: Arc<TStorage>,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = format!("/{name}");
    let elements: Vec<u8> = (0..32 * 32 * 32).map(|i| (i % 251) as u8).collect();
    create_base(
        &store,
        &path,
        vec![32, 32, 32],
        vec![16, 16, 16],
        0u8.into(),
        &elements,
    )?;

    let scales: ScaleFactors = "2;2;2".parse()?;
    let levels = create_scale_pyramid(store.clone(), &path, &scales, &options())?;
    assert_eq!(levels.len(), 3);

    assert!(matches!(
        node_metadata(&*store, &path),
        Some(NodeMetadata::Group(_))
    ));
    let s0 = Array::open(store.clone(), &format!("{path}/s0"))?;
    assert_eq!(s0.shape(), &[32, 32, 32]);
    assert_eq!(all_elements::<_, u8>(&store, &format!("{path}/s0")), elements);

    for (scale, extent) in [(1, 16), (2, 8), (3, 4)] {
        let level = Array::open(store.clone(), &format!("{path}/s{scale}"))?;
        assert_eq!(level.shape(), &[extent; 3]);
        assert_eq!(level.chunk_shape(), &[16, 16, 16]);
        assert_eq!(level.voxel_size(), &Coordinate::splat(1 << scale, 3));
        assert_eq!(level.data_type(), DataType::UInt8);
    }
    Ok(())
}

#[test]
fn pyramid_unsuffixed_memory() -> Result<(), Box<dyn std::error::Error>> {
    scenario_unsuffixed(Arc::new(MemoryStore::new()), "raw")
}

#[test]
fn pyramid_unsuffixed_filesystem() -> Result<(), Box<dyn std::error::Error>> {
    let path = tempfile::TempDir::new()?;
    scenario_unsuffixed(Arc::new(FilesystemStore::new(path.path())?), "raw")
}

#[test]
fn pyramid_arbitrary_name() -> Result<(), Box<dyn std::error::Error>> {
    let path = tempfile::TempDir::new()?;
    scenario_unsuffixed(Arc::new(FilesystemStore::new(path.path())?), "potato")?;
    scenario_unsuffixed(Arc::new(MemoryStore::new()), "potato")
}

fn scenario_suffixed<TStorage: ?Sized + ReadableWritableStorageTraits>(
    store: Arc<TStorage>,
) -> Result<(), Box<dyn std::error::Error>> {
    let elements: Vec<f32> = (0..32 * 32 * 32u32).map(|i| (i % 97) as f32).collect();
    create_base(
        &store,
        "/volume/s1",
        vec![32, 32, 32],
        vec![8, 8, 8],
        0f32.into(),
        &elements,
    )?;

    let scales: ScaleFactors = "2;2;2".parse()?;
    let levels = create_scale_pyramid(store.clone(), "/volume/s1", &scales, &options())?;
    let names: Vec<&str> = levels.iter().map(|level| level.path.as_str()).collect();
    assert_eq!(names, ["/volume/s2", "/volume/s3", "/volume/s4"]);
    assert_eq!(levels[0].shape, vec![16, 16, 16]);
    assert_eq!(levels[1].shape, vec![8, 8, 8]);
    assert_eq!(levels[2].shape, vec![4, 4, 4]);

    assert!(node_metadata(&*store, "/volume/s0").is_none());
    assert_eq!(
        all_elements::<_, f32>(&store, "/volume/s1"),
        elements,
        "the base level is untouched"
    );
    Ok(())
}

#[test]
fn pyramid_suffixed_memory() -> Result<(), Box<dyn std::error::Error>> {
    scenario_suffixed(Arc::new(MemoryStore::new()))
}

#[test]
fn pyramid_suffixed_filesystem() -> Result<(), Box<dyn std::error::Error>> {
    let path = tempfile::TempDir::new()?;
    scenario_suffixed(Arc::new(FilesystemStore::new(path.path())?))
}

#[test]
fn pyramid_invalid_chunk_shape() -> Result<(), Box<dyn std::error::Error>> {
    let path = tempfile::TempDir::new()?;
    let store = Arc::new(FilesystemStore::new(path.path())?);
    let mut builder = ArrayBuilder::new(
        vec![3, 16, 16, 16],
        DataType::UInt8,
        vec![3, 8, 8, 8],
        0u8.into(),
    );
    builder.spatial(&Coordinate::from([1, 1, 1]), &Coordinate::from([0, 0, 0]));
    builder.build(store.clone(), "/rgb")?.store_metadata()?;

    let scales: ScaleFactors = "2;2".parse()?;
    let options = PyramidOptions::builder()
        .num_workers(2)
        .chunk_shape(Some(ShapeArg::PerAxis(vec![8, 8])))
        .build();
    let err = create_scale_pyramid(store.clone(), "/rgb", &scales, &options).unwrap_err();
    assert!(matches!(
        err,
        PyramidError::Configuration(ConfigurationError::ChunkShapeLength { .. })
    ));
    assert!(err.is_validation_error());

    // Nothing was built or moved
    assert!(matches!(
        node_metadata(&*store, "/rgb"),
        Some(NodeMetadata::Array(_))
    ));
    assert!(node_metadata(&*store, "/rgb/s0").is_none());
    assert!(node_metadata(&*store, "/rgb/s1").is_none());
    Ok(())
}

#[test]
fn pyramid_labels_constant() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    // Two label regions, each a constant aligned to every window
    let elements: Vec<u64> = (0..16 * 16u64)
        .map(|i| if i % 16 < 8 { 7 } else { 1_000_000_007 })
        .collect();
    create_base(&store, "/labels", vec![16, 16], vec![4, 4], 0u64.into(), &elements)?;

    let scales: ScaleFactors = "2;2;2".parse()?;
    create_scale_pyramid(store.clone(), "/labels", &scales, &options())?;
    for (scale, extent) in [(1, 8), (2, 4), (3, 2)] {
        let level = all_elements::<_, u64>(&store, &format!("/labels/s{scale}"));
        assert_eq!(level.len(), extent * extent);
        for (i, label) in level.iter().enumerate() {
            let expected = if i % extent < extent / 2 { 7 } else { 1_000_000_007 };
            assert_eq!(*label, expected);
        }
    }
    Ok(())
}

#[test]
fn pyramid_mean_preserved() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let elements: Vec<f64> = (0..16 * 16u32)
        .map(|i| f64::from((i * 37) % 101) / 3.0)
        .collect();
    create_base(&store, "/raw/s0", vec![16, 16], vec![8, 8], 0f64.into(), &elements)?;

    let scales: ScaleFactors = "2;2,4".parse()?;
    create_scale_pyramid(store.clone(), "/raw/s0", &scales, &options())?;

    let mean = |values: &[f64]| values.iter().sum::<f64>() / values.len() as f64;
    let base_mean = mean(&elements);
    for scale in 1..=2 {
        let level = all_elements::<_, f64>(&store, &format!("/raw/s{scale}"));
        assert!((mean(&level) - base_mean).abs() < 1e-9);
    }

    // Window aligned region [0..4, 0..4] of s0 is [0..2, 0..2] of s1
    let s1 = Array::open(store.clone(), "/raw/s1")?;
    let region = s1.retrieve_array_subset_elements::<f64>(&ArraySubset::new_with_start_shape(
        vec![0, 0],
        vec![2, 2],
    )?)?;
    let s0 = Array::open(store, "/raw/s0")?;
    let input = s0.retrieve_array_subset_elements::<f64>(&ArraySubset::new_with_start_shape(
        vec![0, 0],
        vec![4, 4],
    )?)?;
    assert!((mean(&region) - mean(&input)).abs() < 1e-9);
    Ok(())
}

#[test]
fn pyramid_voxel_sizes() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let mut builder =
        ArrayBuilder::new(vec![9, 16, 16], DataType::UInt16, vec![4, 8, 8], 0u16.into());
    builder.spatial(&Coordinate::from([4, 1, 1]), &Coordinate::from([8, 0, 0]));
    builder.build(store.clone(), "/em")?.store_metadata()?;

    let scales: ScaleFactors = "1,2,2;1,2,2;2".parse()?;
    let levels = create_scale_pyramid(store.clone(), "/em", &scales, &options())?;
    let voxel_sizes: Vec<Coordinate> = levels
        .iter()
        .map(|level| level.voxel_size.clone())
        .collect();
    assert_eq!(
        voxel_sizes,
        vec![
            Coordinate::from([4, 2, 2]),
            Coordinate::from([4, 4, 4]),
            Coordinate::from([8, 8, 8])
        ]
    );
    // The z extent grows to cover the base region at the coarser voxel size
    assert_eq!(levels[0].shape, vec![9, 8, 8]);
    assert_eq!(levels[2].shape, vec![5, 2, 2]);
    assert_eq!(levels[2].roi.offset(), &Coordinate::from([8, 0, 0]));
    for level in &levels {
        assert_eq!(level.chunk_shape, vec![4, 8, 8]);
    }
    Ok(())
}

#[test]
fn pyramid_rebuild_after_promotion() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let elements = vec![3u8; 64];
    create_base(&store, "/raw", vec![8, 8], vec![4, 4], 0u8.into(), &elements)?;

    let scales: ScaleFactors = "2".parse()?;
    create_scale_pyramid(store.clone(), "/raw", &scales, &options())?;
    // The promoted group is accepted as a pyramid with level 0 at s0
    let levels = create_scale_pyramid(store.clone(), "/raw", &scales, &options())?;
    assert_eq!(levels[0].path.as_str(), "/raw/s1");
    assert_eq!(all_elements::<_, u8>(&store, "/raw/s1"), vec![3u8; 16]);
    Ok(())
}

fn scenario_interrupted_promotion<TStorage: ?Sized + ReadableWritableStorageTraits>(
    store: Arc<TStorage>,
) -> Result<(), Box<dyn std::error::Error>> {
    let elements: Vec<u8> = (0..64).collect();
    create_base(&store, "/raw", vec![8, 8], vec![4, 4], 0u8.into(), &elements)?;
    // The array was moved to s0 but the group metadata was never written
    store.rename_prefix(&StorePrefix::new("raw/")?, &StorePrefix::new("raw/s0/")?)?;
    assert!(node_metadata(&*store, "/raw").is_none());

    let scales: ScaleFactors = "2".parse()?;
    let levels = create_scale_pyramid(store.clone(), "/raw", &scales, &options())?;
    assert_eq!(levels[0].path.as_str(), "/raw/s1");
    assert!(matches!(
        node_metadata(&*store, "/raw"),
        Some(NodeMetadata::Group(_))
    ));
    assert!(node_metadata(&*store, "/raw/s0/s0").is_none());
    assert_eq!(all_elements::<_, u8>(&store, "/raw/s0"), elements);
    assert_eq!(
        all_elements::<_, u8>(&store, "/raw/s1"),
        SamplingStrategy::MeanPooling.downsample(&elements, &[8, 8], &[2, 2])?
    );
    Ok(())
}

#[test]
fn pyramid_interrupted_promotion_memory() -> Result<(), Box<dyn std::error::Error>> {
    scenario_interrupted_promotion(Arc::new(MemoryStore::new()))
}

#[test]
fn pyramid_interrupted_promotion_filesystem() -> Result<(), Box<dyn std::error::Error>> {
    let path = tempfile::TempDir::new()?;
    scenario_interrupted_promotion(Arc::new(FilesystemStore::new(path.path())?))
}

/// A memory store which fails to write any key starting with `fail_prefix`.
#[derive(Debug)]
struct FailingStore {
    inner: MemoryStore,
    fail_prefix: &'static str,
}

impl ReadableStorageTraits for FailingStore {
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        self.inner.get(key)
    }
}

impl WritableStorageTraits for FailingStore {
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        if key.as_str().starts_with(self.fail_prefix) {
            Err(StorageError::from(format!("no space left for {key}")))
        } else {
            self.inner.set(key, value)
        }
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        self.inner.erase(key)
    }

    fn ensure_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError> {
        self.inner.ensure_prefix(prefix)
    }

    fn rename_prefix(&self, from: &StorePrefix, to: &StorePrefix) -> Result<(), StorageError> {
        self.inner.rename_prefix(from, to)
    }
}

#[test]
fn pyramid_level_write_failure() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(FailingStore {
        inner: MemoryStore::new(),
        fail_prefix: "raw/s2/c/",
    });
    let elements: Vec<u16> = (1..=256).collect();
    create_base(&store, "/raw/s0", vec![16, 16], vec![4, 4], 0u16.into(), &elements)?;

    let scales: ScaleFactors = "2;2;2".parse()?;
    let mut pyramid = ScalePyramid::open(store.clone(), "/raw/s0")?;
    let err = pyramid.build(&scales, &options()).unwrap_err();
    assert!(matches!(
        err,
        PyramidError::BlockWrite {
            level: 2,
            source: BlockError::Write { .. }
        }
    ));
    assert!(!err.is_validation_error());
    assert_eq!(pyramid.state(), PyramidState::Failed);

    // Completed levels remain and no level is started after the failed one
    assert_eq!(
        all_elements::<_, u16>(&store, "/raw/s1"),
        SamplingStrategy::MeanPooling.downsample(&elements, &[16, 16], &[2, 2])?
    );
    assert!(matches!(
        node_metadata(&*store, "/raw/s2"),
        Some(NodeMetadata::Array(_))
    ));
    assert!(node_metadata(&*store, "/raw/s3").is_none());
    Ok(())
}

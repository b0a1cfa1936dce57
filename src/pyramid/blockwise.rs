//! Blockwise processing of a pyramid level.
//!
//! The output of a level is partitioned into [`Block`]s with [`partition_blocks`].
//! The write regions of the blocks are pairwise disjoint and chunk aligned, and each block reads from an input array that is not modified while the level is processed.
//! A [`BlockwiseScheduler`] can therefore process blocks in any order and in parallel, without locks or conflict detection.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use rayon::prelude::*;

use crate::{coordinate::Coordinate, roi::Roi};

use super::{BlockError, ConfigurationError};

/// A unit of work of a pyramid level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// The region written, in the voxel index space of the output array.
    pub write_roi: Roi,
    /// The region read, in the voxel index space of the input array.
    ///
    /// This may extend beyond the input array.
    pub read_roi: Roi,
}

/// Partition the world-space region `output_roi` into blocks of `block_shape` output voxels.
///
/// Blocks begin at the offset of `output_roi` and are shrunk at its upper bound.
/// The write region of each block is relative to `output_offset` in units of `output_voxel_size`,
/// and the read region covers the same world-space region relative to `input_offset` in units of `input_voxel_size`.
///
/// # Errors
/// Returns a [`ConfigurationError`] if
///  - any argument has a different dimensionality,
///  - `block_shape` has a non-positive component, or
///  - a block is not aligned to the input or output voxel grid.
pub fn partition_blocks(
    output_roi: &Roi,
    output_voxel_size: &Coordinate,
    output_offset: &Coordinate,
    input_voxel_size: &Coordinate,
    input_offset: &Coordinate,
    block_shape: &Coordinate,
) -> Result<Vec<Block>, ConfigurationError> {
    let block_shape_world = block_shape.mul(output_voxel_size)?;
    output_roi
        .partition_into(&block_shape_world)?
        .into_iter()
        .map(|world_roi| {
            Ok(Block {
                write_roi: to_index_space(&world_roi, output_offset, output_voxel_size)?,
                read_roi: to_index_space(&world_roi, input_offset, input_voxel_size)?,
            })
        })
        .collect()
}

/// Convert a world-space region to the voxel index space of an array with `offset` and `voxel_size`.
fn to_index_space(
    world_roi: &Roi,
    offset: &Coordinate,
    voxel_size: &Coordinate,
) -> Result<Roi, ConfigurationError> {
    let relative = world_roi.offset().sub(offset)?;
    if !voxel_size.is_positive()
        || !relative.is_multiple_of(voxel_size)?
        || !world_roi.shape().is_multiple_of(voxel_size)?
    {
        return Err(ConfigurationError::MisalignedRegion(
            world_roi.clone(),
            voxel_size.clone(),
        ));
    }
    let begin = relative.div_floor(voxel_size)?;
    let shape = world_roi.shape().div_floor(voxel_size)?;
    Ok(Roi::new(begin, shape)?)
}

/// A summary of a completed [`BlockwiseScheduler::run`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockwiseSummary {
    /// The number of blocks processed.
    pub blocks_processed: usize,
    /// The number of retries used.
    pub retries: usize,
}

/// Processes the blocks of a level on a dedicated pool of worker threads.
///
/// The same scheduler (and its workers) is reused for every level of a pyramid.
#[derive(Debug)]
pub struct BlockwiseScheduler {
    thread_pool: rayon::ThreadPool,
    num_workers: usize,
    max_retries: usize,
}

impl BlockwiseScheduler {
    /// Create a new scheduler with `num_workers` worker threads.
    ///
    /// A block is retried up to `max_retries` times before it is considered failed.
    ///
    /// # Errors
    /// Returns a [`ConfigurationError`] if `num_workers` is zero or the worker pool cannot be created.
    pub fn new(num_workers: usize, max_retries: usize) -> Result<Self, ConfigurationError> {
        if num_workers == 0 {
            return Err(ConfigurationError::ZeroWorkers);
        }
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .thread_name(|index| format!("zarrs_pyramid-worker-{index}"))
            .build()
            .map_err(|err| ConfigurationError::WorkerPool(err.to_string()))?;
        Ok(Self {
            thread_pool,
            num_workers,
            max_retries,
        })
    }

    /// Return the number of workers.
    #[must_use]
    pub const fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Return the number of times a failing block is retried.
    #[must_use]
    pub const fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Process every block in `blocks` with `process`.
    ///
    /// Blocks are processed in no particular order.
    /// Once a block has failed `max_retries + 1` times, no further blocks are started, blocks in progress are allowed to finish, and the block error is returned.
    /// This returns only after every started block has finished.
    ///
    /// # Errors
    /// Returns the [`BlockError`] of the first block to fail permanently.
    pub fn run<F>(&self, blocks: &[Block], process: F) -> Result<BlockwiseSummary, BlockError>
    where
        F: Fn(&Block) -> Result<(), BlockError> + Sync,
    {
        let cancelled = AtomicBool::new(false);
        let blocks_processed = AtomicUsize::new(0);
        let retries = AtomicUsize::new(0);
        let failure: Mutex<Option<BlockError>> = Mutex::new(None);

        self.thread_pool.install(|| {
            blocks.par_iter().for_each(|block| {
                let mut attempt = 0;
                while !cancelled.load(Ordering::Relaxed) {
                    match process(block) {
                        Ok(()) => {
                            blocks_processed.fetch_add(1, Ordering::Relaxed);
                            break;
                        }
                        Err(err) if attempt < self.max_retries => {
                            attempt += 1;
                            retries.fetch_add(1, Ordering::Relaxed);
                            log::warn!(
                                "Block {} failed (attempt {attempt} of {}), retrying: {err}",
                                block.write_roi,
                                self.max_retries + 1
                            );
                        }
                        Err(err) => {
                            log::error!("Failed to write to {}: {err}", block.write_roi);
                            cancelled.store(true, Ordering::Relaxed);
                            failure.lock().get_or_insert(err);
                            break;
                        }
                    }
                }
            });
        });

        match failure.into_inner() {
            Some(err) => Err(err),
            None => Ok(BlockwiseSummary {
                blocks_processed: blocks_processed.into_inner(),
                retries: retries.into_inner(),
            }),
        }
    }
}

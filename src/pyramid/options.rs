//! Options for building a scale pyramid.

use crate::config::global_config;

use super::ShapeArg;

/// Options for building a scale pyramid.
///
/// The worker count and retry budget default to the [global configuration](crate::config::Config).
#[derive(Debug, Clone)]
pub struct PyramidOptions {
    num_workers: usize,
    max_retries: usize,
    chunk_shape: Option<ShapeArg>,
}

impl Default for PyramidOptions {
    fn default() -> Self {
        PyramidOptionsBuilder::new().build()
    }
}

impl PyramidOptions {
    /// Create a new pyramid options builder.
    #[must_use]
    pub fn builder() -> PyramidOptionsBuilder {
        PyramidOptionsBuilder::new()
    }

    /// Return the number of workers.
    #[must_use]
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Set the number of workers.
    pub fn set_num_workers(&mut self, num_workers: usize) {
        self.num_workers = num_workers;
    }

    /// Return the number of times a failing block is retried.
    #[must_use]
    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Set the number of times a failing block is retried.
    pub fn set_max_retries(&mut self, max_retries: usize) {
        self.max_retries = max_retries;
    }

    /// Return the chunk shape argument for new levels.
    ///
    /// If [`None`], new levels reuse the chunk shape of the base level.
    #[must_use]
    pub fn chunk_shape(&self) -> Option<&ShapeArg> {
        self.chunk_shape.as_ref()
    }

    /// Set the chunk shape argument for new levels.
    pub fn set_chunk_shape(&mut self, chunk_shape: Option<ShapeArg>) {
        self.chunk_shape = chunk_shape;
    }
}

/// Builder for [`PyramidOptions`].
#[derive(Debug, Clone)]
pub struct PyramidOptionsBuilder {
    num_workers: usize,
    max_retries: usize,
    chunk_shape: Option<ShapeArg>,
}

impl Default for PyramidOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PyramidOptionsBuilder {
    /// Create a new pyramid options builder.
    #[must_use]
    pub fn new() -> Self {
        let config = global_config();
        Self {
            num_workers: config.default_workers(),
            max_retries: config.default_max_retries(),
            chunk_shape: None,
        }
    }

    /// Build into pyramid options.
    #[must_use]
    pub fn build(&self) -> PyramidOptions {
        PyramidOptions {
            num_workers: self.num_workers,
            max_retries: self.max_retries,
            chunk_shape: self.chunk_shape.clone(),
        }
    }

    /// Set the number of workers processing the blocks of a level.
    #[must_use]
    pub fn num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    /// Set the number of times a failing block is retried before the build is aborted.
    #[must_use]
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the chunk shape argument for new levels.
    #[must_use]
    pub fn chunk_shape(mut self, chunk_shape: Option<ShapeArg>) -> Self {
        self.chunk_shape = chunk_shape;
        self
    }
}

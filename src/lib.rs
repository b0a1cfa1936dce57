//! Blockwise multiscale (pyramid) downsampling of chunked N-dimensional arrays.
//!
//! `zarrs_pyramid` builds a scale pyramid from an array in a [Zarr V3](https://zarr.dev)-style hierarchy.
//! Each new level `s<n>` is a coarser copy of the level below it, written block by block in parallel.
//!
//! ## Getting Started
//! - [`array::Array`] and [`storage`] read and write chunked arrays with a voxel size and world offset.
//! - [`pyramid::create_scale_pyramid`] and [`pyramid::ScalePyramid`] build a pyramid above an array.
//! - The `zarrs_pyramid` binary exposes the pyramid builder on the command line.
//!
//! ## Example
//! ```rust
//! # use std::sync::Arc;
//! use zarrs_pyramid::array::{Array, ArrayBuilder, DataType};
//! use zarrs_pyramid::array_subset::ArraySubset;
//! use zarrs_pyramid::pyramid::{create_scale_pyramid, PyramidOptions};
//! use zarrs_pyramid::storage::store::MemoryStore;
//!
//! let store = Arc::new(MemoryStore::new());
//! let array = ArrayBuilder::new(vec![4, 4], DataType::Float32, vec![2, 2], 0f32.into())
//!     .build(store.clone(), "/raw/s0")?;
//! array.store_metadata()?;
//! let elements: Vec<f32> = (0..16u8).map(f32::from).collect();
//! array.store_array_subset_elements(&ArraySubset::new_with_shape(vec![4, 4]), &elements)?;
//!
//! create_scale_pyramid(store.clone(), "/raw/s0", &"2".parse()?, &PyramidOptions::default())?;
//!
//! let s1 = Array::open(store, "/raw/s1")?;
//! let means = s1.retrieve_array_subset_elements::<f32>(&ArraySubset::new_with_shape(vec![2, 2]))?;
//! assert_eq!(means, vec![2.5, 4.5, 10.5, 12.5]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Crate Features
//! #### Default
//!  - `gzip`: the gzip bytes-to-bytes codec.
//!
//! ## Logging
//! Progress is reported through the [`log`] facade at the `info` level.
//! Retried blocks are logged at `warn` and failed blocks at `error`.

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::missing_panics_doc)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod array;
pub mod array_subset;
pub mod config;
pub mod coordinate;
pub mod node;
pub mod pyramid;
pub mod roi;
pub mod storage;

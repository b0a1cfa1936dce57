//! Hierarchy nodes.
//!
//! A node in a hierarchy is either an [`Array`](crate::array::Array) or a group of nodes.
//! Every node has a [`NodePath`] and a metadata document ([`NodeMetadata`]) stored at `<path>/zarr.json`.

mod node_metadata;
mod node_path;

pub use node_metadata::{GroupMetadata, NodeMetadata};
pub use node_path::{NodePath, NodePathError};

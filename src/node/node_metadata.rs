use serde::{Deserialize, Serialize};

use crate::array::ArrayMetadata;

/// Node metadata ([`ArrayMetadata`] or [`GroupMetadata`]).
///
/// Serialised with a `node_type` field of `array` or `group`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "node_type", rename_all = "lowercase")]
pub enum NodeMetadata {
    /// Array metadata.
    Array(ArrayMetadata),
    /// Group metadata.
    Group(GroupMetadata),
}

/// Group metadata.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GroupMetadata {
    /// The format version. Always `3`.
    pub zarr_format: u64,
    /// User attributes.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Default for GroupMetadata {
    fn default() -> Self {
        Self {
            zarr_format: 3,
            attributes: serde_json::Map::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_metadata_group() {
        let json = r#"{"zarr_format":3,"node_type":"group"}"#;
        let metadata: NodeMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata, NodeMetadata::Group(GroupMetadata::default()));
        assert_eq!(
            serde_json::to_string(&metadata).unwrap(),
            r#"{"node_type":"group","zarr_format":3}"#
        );
    }

    #[test]
    fn node_metadata_invalid() {
        let json = r#"{"zarr_format":3,"node_type":"potato"}"#;
        assert!(serde_json::from_str::<NodeMetadata>(json).is_err());
    }
}

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::array::DataType;

use super::{CodecError, CodecMetadata};

pub(super) const IDENTIFIER: &str = "bytes";

/// The endianness of each element in an array, either `big` or `little`.
#[derive(Serialize, Deserialize, Copy, Clone, Eq, PartialEq, Debug, Display)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    /// Little endian.
    Little,
    /// Big endian.
    Big,
}

impl Endianness {
    /// Return true if the endianness matches the endianness of the CPU.
    #[must_use]
    pub fn is_native(self) -> bool {
        self == NATIVE_ENDIAN
    }
}

/// The endianness of the CPU.
pub const NATIVE_ENDIAN: Endianness = if cfg!(target_endian = "big") {
    Endianness::Big
} else {
    Endianness::Little
};

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(deny_unknown_fields)]
struct BytesCodecConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    endian: Option<Endianness>,
}

/// The `bytes` codec.
///
/// Serialises elements with a fixed endianness.
/// The endianness is optional in metadata, in which case elements are assumed to be little endian.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BytesCodec {
    endian: Option<Endianness>,
}

impl BytesCodec {
    /// Create a new `bytes` codec.
    #[must_use]
    pub const fn new(endian: Option<Endianness>) -> Self {
        Self { endian }
    }

    /// Create a new `bytes` codec for little endian serialisation.
    #[must_use]
    pub const fn little() -> Self {
        Self::new(Some(Endianness::Little))
    }

    pub(super) fn from_metadata(metadata: &CodecMetadata) -> Result<Self, CodecError> {
        let configuration: BytesCodecConfiguration = metadata.to_configuration()?;
        Ok(Self::new(configuration.endian))
    }

    pub(super) fn create_metadata(&self) -> CodecMetadata {
        match self.endian {
            Some(endian) => CodecMetadata {
                name: IDENTIFIER.to_string(),
                configuration: Some(
                    [(
                        "endian".to_string(),
                        serde_json::Value::String(endian.to_string().to_lowercase()),
                    )]
                    .into_iter()
                    .collect(),
                ),
            },
            None => CodecMetadata {
                name: IDENTIFIER.to_string(),
                configuration: None,
            },
        }
    }

    fn needs_swap(&self, data_type: DataType) -> bool {
        data_type.size() > 1 && !self.endian.unwrap_or(Endianness::Little).is_native()
    }

    pub(super) fn encode(&self, mut decoded_value: Vec<u8>, data_type: DataType) -> Vec<u8> {
        if self.needs_swap(data_type) {
            reverse_endianness(&mut decoded_value, data_type);
        }
        decoded_value
    }

    pub(super) fn decode(&self, mut encoded_value: Vec<u8>, data_type: DataType) -> Vec<u8> {
        if self.needs_swap(data_type) {
            reverse_endianness(&mut encoded_value, data_type);
        }
        encoded_value
    }
}

/// Reverse the byte order of each element of `data_type` in `v`.
fn reverse_endianness(v: &mut [u8], data_type: DataType) {
    v.chunks_exact_mut(data_type.size())
        .for_each(<[u8]>::reverse);
}

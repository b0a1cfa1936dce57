//! Codecs.
//!
//! A chunk is encoded by the `bytes` codec, which serialises elements with a fixed endianness,
//! followed by zero or more bytes to bytes codecs (e.g. `gzip` with the `gzip` feature).
//! The codecs of an array are described by a [`CodecChain`] and serialised as a list of [`CodecMetadata`].

mod bytes_codec;
#[cfg(feature = "gzip")]
mod gzip_codec;

pub use bytes_codec::{BytesCodec, Endianness, NATIVE_ENDIAN};
#[cfg(feature = "gzip")]
pub use gzip_codec::GzipCodec;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::DataType;

/// Codec metadata.
///
/// For example `{"name": "gzip", "configuration": {"level": 5}}`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CodecMetadata {
    /// The codec name.
    pub name: String,
    /// The codec configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<serde_json::Map<String, serde_json::Value>>,
}

impl CodecMetadata {
    /// Create codec metadata from a name and a serializable configuration.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the configuration does not serialise to a JSON object.
    pub fn new_with_serializable_configuration<T: Serialize>(
        name: &str,
        configuration: &T,
    ) -> Result<Self, CodecError> {
        match serde_json::to_value(configuration) {
            Ok(serde_json::Value::Object(configuration)) => Ok(Self {
                name: name.to_string(),
                configuration: Some(configuration),
            }),
            Ok(_) => Err(CodecError::InvalidConfiguration(
                name.to_string(),
                "not an object".to_string(),
            )),
            Err(err) => Err(CodecError::InvalidConfiguration(
                name.to_string(),
                err.to_string(),
            )),
        }
    }

    /// Deserialise the configuration.
    ///
    /// A missing configuration is deserialised from an empty object.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the configuration is not valid for `T`.
    pub fn to_configuration<T: for<'de> Deserialize<'de>>(&self) -> Result<T, CodecError> {
        let configuration =
            serde_json::Value::Object(self.configuration.clone().unwrap_or_default());
        serde_json::from_value(configuration)
            .map_err(|err| CodecError::InvalidConfiguration(self.name.clone(), err.to_string()))
    }
}

/// A codec error.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// The decoded size of a chunk did not match what was expected.
    #[error("the size of a decoded chunk is {_0}, expected {_1}")]
    UnexpectedChunkDecodedSize(usize, usize),
    /// An unsupported codec.
    #[error("unsupported codec {0}")]
    UnsupportedCodec(String),
    /// An invalid codec configuration.
    #[error("invalid configuration for codec {0}: {1}")]
    InvalidConfiguration(String, String),
    /// The codec chain does not start with the `bytes` codec.
    #[error("the first codec must be bytes")]
    MissingBytesCodec,
}

/// Traits for bytes to bytes codecs.
pub trait BytesToBytesCodecTraits: core::fmt::Debug + Send + Sync {
    /// Create the metadata of the codec.
    fn create_metadata(&self) -> CodecMetadata;

    /// Encode bytes.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails.
    fn encode(&self, decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError>;

    /// Decode bytes.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails.
    fn decode(&self, encoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError>;
}

/// A codec chain: a `bytes` codec followed by bytes to bytes codecs.
#[derive(Clone, Debug)]
pub struct CodecChain {
    bytes_codec: BytesCodec,
    bytes_to_bytes_codecs: Vec<Arc<dyn BytesToBytesCodecTraits>>,
}

impl Default for CodecChain {
    fn default() -> Self {
        Self::new(BytesCodec::little(), Vec::new())
    }
}

impl CodecChain {
    /// Create a new codec chain.
    #[must_use]
    pub fn new(
        bytes_codec: BytesCodec,
        bytes_to_bytes_codecs: Vec<Arc<dyn BytesToBytesCodecTraits>>,
    ) -> Self {
        Self {
            bytes_codec,
            bytes_to_bytes_codecs,
        }
    }

    /// Create a codec chain from metadata.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the first codec is not `bytes`, or a codec is unsupported or has an invalid configuration.
    pub fn from_metadata(metadatas: &[CodecMetadata]) -> Result<Self, CodecError> {
        let (first, rest) = metadatas
            .split_first()
            .ok_or(CodecError::MissingBytesCodec)?;
        if first.name != bytes_codec::IDENTIFIER {
            return Err(CodecError::MissingBytesCodec);
        }
        let bytes_codec = BytesCodec::from_metadata(first)?;
        let bytes_to_bytes_codecs = rest
            .iter()
            .map(|metadata| -> Result<Arc<dyn BytesToBytesCodecTraits>, CodecError> {
                match metadata.name.as_str() {
                    #[cfg(feature = "gzip")]
                    gzip_codec::IDENTIFIER => Ok(Arc::new(GzipCodec::from_metadata(metadata)?)),
                    _ => Err(CodecError::UnsupportedCodec(metadata.name.clone())),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(bytes_codec, bytes_to_bytes_codecs))
    }

    /// Get the `bytes` codec.
    #[must_use]
    pub const fn bytes_codec(&self) -> &BytesCodec {
        &self.bytes_codec
    }

    /// Get the bytes to bytes codecs.
    #[must_use]
    pub fn bytes_to_bytes_codecs(&self) -> &[Arc<dyn BytesToBytesCodecTraits>] {
        &self.bytes_to_bytes_codecs
    }

    /// Create the metadata of the codec chain.
    #[must_use]
    pub fn create_metadatas(&self) -> Vec<CodecMetadata> {
        std::iter::once(self.bytes_codec.create_metadata())
            .chain(
                self.bytes_to_bytes_codecs
                    .iter()
                    .map(|codec| codec.create_metadata()),
            )
            .collect()
    }

    /// Encode native endian chunk bytes of `data_type`.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails.
    pub fn encode(
        &self,
        decoded_value: Vec<u8>,
        data_type: DataType,
    ) -> Result<Vec<u8>, CodecError> {
        let mut value = self.bytes_codec.encode(decoded_value, data_type);
        for codec in &self.bytes_to_bytes_codecs {
            value = codec.encode(value)?;
        }
        Ok(value)
    }

    /// Decode chunk bytes of `data_type` to native endian with an expected decoded size in bytes.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails or the decoded size is unexpected.
    pub fn decode(
        &self,
        encoded_value: Vec<u8>,
        data_type: DataType,
        decoded_size: usize,
    ) -> Result<Vec<u8>, CodecError> {
        let mut value = encoded_value;
        for codec in self.bytes_to_bytes_codecs.iter().rev() {
            value = codec.decode(value)?;
        }
        if value.len() != decoded_size {
            return Err(CodecError::UnexpectedChunkDecodedSize(
                value.len(),
                decoded_size,
            ));
        }
        Ok(self.bytes_codec.decode(value, data_type))
    }
}

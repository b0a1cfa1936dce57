use std::io::{Cursor, Read};

use flate2::bufread::{GzDecoder, GzEncoder};
use serde::{Deserialize, Serialize};

use super::{BytesToBytesCodecTraits, CodecError, CodecMetadata};

pub(super) const IDENTIFIER: &str = "gzip";

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
struct GzipCodecConfiguration {
    level: u32,
}

/// A `gzip` codec implementation.
#[derive(Clone, Debug)]
pub struct GzipCodec {
    compression_level: u32,
}

impl GzipCodec {
    /// Create a new `gzip` codec.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidConfiguration`] if `compression_level` is not in the range 0 to 9.
    pub fn new(compression_level: u32) -> Result<Self, CodecError> {
        if compression_level > 9 {
            return Err(CodecError::InvalidConfiguration(
                IDENTIFIER.to_string(),
                format!("compression level {compression_level} is not in the range 0 to 9"),
            ));
        }
        Ok(Self { compression_level })
    }

    pub(super) fn from_metadata(metadata: &CodecMetadata) -> Result<Self, CodecError> {
        let configuration: GzipCodecConfiguration = metadata.to_configuration()?;
        Self::new(configuration.level)
    }
}

impl BytesToBytesCodecTraits for GzipCodec {
    fn create_metadata(&self) -> CodecMetadata {
        CodecMetadata {
            name: IDENTIFIER.to_string(),
            configuration: Some(
                [(
                    "level".to_string(),
                    serde_json::Value::from(self.compression_level),
                )]
                .into_iter()
                .collect(),
            ),
        }
    }

    fn encode(&self, decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let mut encoder = GzEncoder::new(
            Cursor::new(decoded_value),
            flate2::Compression::new(self.compression_level),
        );
        let mut out: Vec<u8> = Vec::new();
        encoder.read_to_end(&mut out)?;
        Ok(out)
    }

    fn decode(&self, encoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let mut decoder = GzDecoder::new(Cursor::new(encoded_value));
        let mut out: Vec<u8> = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gzip_level() {
        assert!(GzipCodec::new(9).is_ok());
        assert!(GzipCodec::new(10).is_err());
        let metadata = CodecMetadata {
            name: IDENTIFIER.to_string(),
            configuration: Some(serde_json::json!({"level": 12}).as_object().unwrap().clone()),
        };
        assert!(GzipCodec::from_metadata(&metadata).is_err());
    }
}

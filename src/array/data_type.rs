//! Data types.
//!
//! A [`DataType`] is identified in array metadata by its name (e.g. `uint8`, `float32`).
//! Rust element types implement [`Element`].

use serde::de::Error as _;
use thiserror::Error;

use super::FillValue;

/// A data type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[rustfmt::skip]
pub enum DataType {
    /// `int8` Integer in `[-2^7, 2^7-1]`.
    Int8,
    /// `int16` Integer in `[-2^15, 2^15-1]`.
    Int16,
    /// `int32` Integer in `[-2^31, 2^31-1]`.
    Int32,
    /// `int64` Integer in `[-2^63, 2^63-1]`.
    Int64,
    /// `uint8` Integer in `[0, 2^8-1]`.
    UInt8,
    /// `uint16` Integer in `[0, 2^16-1]`.
    UInt16,
    /// `uint32` Integer in `[0, 2^32-1]`.
    UInt32,
    /// `uint64` Integer in `[0, 2^64-1]`.
    ///
    /// Arrays of this type hold segmentation labels.
    UInt64,
    /// `float32` IEEE 754 single-precision floating point.
    Float32,
    /// `float64` IEEE 754 double-precision floating point.
    Float64,
}

/// An unsupported data type error.
#[derive(Debug, Error)]
#[error("unsupported data type {_0}")]
pub struct UnsupportedDataTypeError(String);

/// A fill value incompatibility error.
#[derive(Debug, Error)]
#[error("incompatible fill value {1} for data type {0}")]
pub struct IncompatibleFillValueError(DataType, serde_json::Value);

impl core::fmt::Display for DataType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl serde::Serialize for DataType {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.name())
    }
}

impl<'de> serde::Deserialize<'de> for DataType {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let name = String::deserialize(d)?;
        Self::from_name(&name).map_err(|err| D::Error::custom(err.to_string()))
    }
}

impl DataType {
    /// Returns the name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }

    /// Create a data type from its name.
    ///
    /// # Errors
    /// Returns [`UnsupportedDataTypeError`] if the name is not a supported data type.
    pub fn from_name(name: &str) -> Result<Self, UnsupportedDataTypeError> {
        Ok(match name {
            "int8" => Self::Int8,
            "int16" => Self::Int16,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "uint8" => Self::UInt8,
            "uint16" => Self::UInt16,
            "uint32" => Self::UInt32,
            "uint64" => Self::UInt64,
            "float32" => Self::Float32,
            "float64" => Self::Float64,
            _ => return Err(UnsupportedDataTypeError(name.to_string())),
        })
    }

    /// Returns the size in bytes of an element.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    /// Returns true if the data type holds segmentation labels rather than intensities.
    #[must_use]
    pub const fn is_label(&self) -> bool {
        matches!(self, Self::UInt64)
    }

    /// Create a fill value from its JSON metadata representation.
    ///
    /// Integers must be in range for the data type.
    /// Floating point fill values may also be `"NaN"`, `"Infinity"`, or `"-Infinity"`.
    ///
    /// # Errors
    /// Returns [`IncompatibleFillValueError`] if the fill value is incompatible with the data type.
    pub fn fill_value_from_metadata(
        &self,
        fill_value: &serde_json::Value,
    ) -> Result<FillValue, IncompatibleFillValueError> {
        let err = || IncompatibleFillValueError(*self, fill_value.clone());
        macro_rules! int {
            ($t:ty) => {{
                let value = if let Some(value) = fill_value.as_i64() {
                    <$t>::try_from(value).ok()
                } else {
                    fill_value.as_u64().and_then(|value| <$t>::try_from(value).ok())
                };
                value.map(FillValue::from).ok_or_else(err)
            }};
        }
        let float = || -> Option<f64> {
            match fill_value {
                serde_json::Value::Number(number) => number.as_f64(),
                serde_json::Value::String(string) => match string.as_str() {
                    "NaN" => Some(f64::NAN),
                    "Infinity" => Some(f64::INFINITY),
                    "-Infinity" => Some(f64::NEG_INFINITY),
                    _ => None,
                },
                _ => None,
            }
        };
        match self {
            Self::Int8 => int!(i8),
            Self::Int16 => int!(i16),
            Self::Int32 => int!(i32),
            Self::Int64 => int!(i64),
            Self::UInt8 => int!(u8),
            Self::UInt16 => int!(u16),
            Self::UInt32 => int!(u32),
            Self::UInt64 => int!(u64),
            #[allow(clippy::cast_possible_truncation)]
            Self::Float32 => float().map(|value| FillValue::from(value as f32)).ok_or_else(err),
            Self::Float64 => float().map(FillValue::from).ok_or_else(err),
        }
    }

    /// Create the JSON metadata representation of a fill value.
    ///
    /// # Errors
    /// Returns [`IncompatibleFillValueError`] if the size of the fill value does not match the data type.
    pub fn metadata_fill_value(
        &self,
        fill_value: &FillValue,
    ) -> Result<serde_json::Value, IncompatibleFillValueError> {
        fn float(value: f64) -> serde_json::Value {
            if value.is_nan() {
                "NaN".into()
            } else if value == f64::INFINITY {
                "Infinity".into()
            } else if value == f64::NEG_INFINITY {
                "-Infinity".into()
            } else {
                value.into()
            }
        }
        let bytes = fill_value.as_ne_bytes();
        let err = || {
            IncompatibleFillValueError(*self, serde_json::Value::String(format!("{bytes:?}")))
        };
        macro_rules! value {
            ($t:ty) => {
                bytes.try_into().map(<$t>::from_ne_bytes).map_err(|_| err())
            };
        }
        Ok(match self {
            Self::Int8 => value!(i8)?.into(),
            Self::Int16 => value!(i16)?.into(),
            Self::Int32 => value!(i32)?.into(),
            Self::Int64 => value!(i64)?.into(),
            Self::UInt8 => value!(u8)?.into(),
            Self::UInt16 => value!(u16)?.into(),
            Self::UInt32 => value!(u32)?.into(),
            Self::UInt64 => value!(u64)?.into(),
            Self::Float32 => float(f64::from(value!(f32)?)),
            Self::Float64 => float(value!(f64)?),
        })
    }
}

/// A Rust type which can be stored as the elements of an array.
pub trait Element:
    bytemuck::Pod
    + num::Bounded
    + num::ToPrimitive
    + num::FromPrimitive
    + PartialEq
    + Send
    + Sync
    + 'static
{
    /// The data type of the element.
    const DATA_TYPE: DataType;
}

macro_rules! impl_element {
    ($t:ty, $data_type:expr) => {
        impl Element for $t {
            const DATA_TYPE: DataType = $data_type;
        }
    };
}

impl_element!(i8, DataType::Int8);
impl_element!(i16, DataType::Int16);
impl_element!(i32, DataType::Int32);
impl_element!(i64, DataType::Int64);
impl_element!(u8, DataType::UInt8);
impl_element!(u16, DataType::UInt16);
impl_element!(u32, DataType::UInt32);
impl_element!(u64, DataType::UInt64);
impl_element!(f32, DataType::Float32);
impl_element!(f64, DataType::Float64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_names() {
        for data_type in [
            DataType::Int8,
            DataType::Int16,
            DataType::Int32,
            DataType::Int64,
            DataType::UInt8,
            DataType::UInt16,
            DataType::UInt32,
            DataType::UInt64,
            DataType::Float32,
            DataType::Float64,
        ] {
            assert_eq!(DataType::from_name(data_type.name()).unwrap(), data_type);
        }
        assert!(DataType::from_name("bool").is_err());
        assert_eq!(
            serde_json::to_string(&DataType::UInt16).unwrap(),
            r#""uint16""#
        );
        assert!(serde_json::from_str::<DataType>(r#""complex64""#).is_err());
        assert!(DataType::UInt64.is_label());
        assert!(!DataType::UInt32.is_label());
        assert_eq!(DataType::Float64.size(), 8);
    }

    #[test]
    fn data_type_fill_value() {
        let fill_value = DataType::UInt8
            .fill_value_from_metadata(&serde_json::json!(7))
            .unwrap();
        assert_eq!(fill_value.as_ne_bytes(), &[7]);
        assert!(DataType::UInt8
            .fill_value_from_metadata(&serde_json::json!(256))
            .is_err());
        assert!(DataType::UInt8
            .fill_value_from_metadata(&serde_json::json!(-1))
            .is_err());
        assert!(DataType::Int16
            .fill_value_from_metadata(&serde_json::json!(1.5))
            .is_err());
        let fill_value = DataType::Float32
            .fill_value_from_metadata(&serde_json::json!("NaN"))
            .unwrap();
        assert_eq!(
            DataType::Float32.metadata_fill_value(&fill_value).unwrap(),
            serde_json::json!("NaN")
        );
        let fill_value = DataType::Int64
            .fill_value_from_metadata(&serde_json::json!(-3))
            .unwrap();
        assert_eq!(
            DataType::Int64.metadata_fill_value(&fill_value).unwrap(),
            serde_json::json!(-3)
        );
        assert!(DataType::Int32.metadata_fill_value(&fill_value).is_err());
    }
}

//! Downsampling of in-memory blocks.

use ndarray::{ArrayViewD, IxDyn, Slice};

use crate::array::{ArrayShape, DataType, Element};

use super::SamplingError;

/// How a block is reduced by a scale factor.
///
/// Selected once per array from its data type with [`SamplingStrategy::for_data_type`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SamplingStrategy {
    /// Replace each window with the arithmetic mean of its elements.
    ///
    /// The mean is computed in `f64` and cast back to the element type, truncating toward zero for integers.
    /// Means beyond the range of the element type saturate at its bounds.
    MeanPooling,
    /// Pick the element at offset `factor / 2` of each window.
    ///
    /// Elements are never blended, so label identifiers are preserved.
    StrideSample,
}

impl SamplingStrategy {
    /// Select the sampling strategy for arrays of `data_type`.
    ///
    /// Label data types use [`StrideSample`](SamplingStrategy::StrideSample), all others use [`MeanPooling`](SamplingStrategy::MeanPooling).
    #[must_use]
    pub const fn for_data_type(data_type: DataType) -> Self {
        if data_type.is_label() {
            Self::StrideSample
        } else {
            Self::MeanPooling
        }
    }

    /// Downsample the dense C-order block `elements` with `shape` by `factor`.
    ///
    /// `factor` applies to the trailing (spatial) axes of `shape`, leading channel axes are untouched.
    /// The returned block has shape `shape / factor` along the spatial axes.
    ///
    /// # Errors
    /// Returns a [`SamplingError`] if
    ///  - the length of `elements` does not match `shape`,
    ///  - `factor` has more axes than `shape` or a zero component,
    ///  - the spatial shape is not a multiple of `factor`,
    ///  - an element cannot be converted to `f64`, or
    ///  - a `NaN` mean cannot be represented by `T`.
    #[allow(clippy::cast_possible_wrap)]
    pub fn downsample<T: Element>(
        self,
        elements: &[T],
        shape: &[u64],
        factor: &[u64],
    ) -> Result<Vec<T>, SamplingError> {
        let not_multiple = || SamplingError::NotMultiple(shape.to_vec(), factor.to_vec());
        let channel_dims = shape.len().checked_sub(factor.len()).ok_or_else(not_multiple)?;
        let factor: ArrayShape = std::iter::repeat(1)
            .take(channel_dims)
            .chain(factor.iter().copied())
            .collect();
        if std::iter::zip(shape, &factor).any(|(&s, &f)| f == 0 || s % f != 0) {
            return Err(not_multiple());
        }

        let invalid_length =
            || SamplingError::InvalidElementsLength(elements.len(), shape.to_vec());
        let num_elements = shape.iter().try_fold(1u64, |n, &s| n.checked_mul(s));
        if u64::try_from(elements.len()).ok() != num_elements {
            return Err(invalid_length());
        }

        let shape_usize = to_usize(shape).ok_or_else(not_multiple)?;
        let factor_usize = to_usize(&factor).ok_or_else(not_multiple)?;
        let block =
            ArrayViewD::from_shape(IxDyn(&shape_usize), elements).map_err(|_| invalid_length())?;

        match self {
            Self::StrideSample => Ok(block
                .slice_each_axis(|axis| {
                    let f = factor_usize[axis.axis.index()];
                    Slice::new((f / 2) as isize, None, f as isize)
                })
                .iter()
                .copied()
                .collect()),
            Self::MeanPooling => {
                #[allow(clippy::cast_precision_loss)]
                let window_size = factor_usize.iter().product::<usize>() as f64;
                block
                    .exact_chunks(IxDyn(&factor_usize))
                    .into_iter()
                    .map(|window| {
                        let sum = window.iter().try_fold(0.0, |sum, element| {
                            element
                                .to_f64()
                                .map(|value| sum + value)
                                .ok_or(SamplingError::FloatConversion)
                        })?;
                        mean_to_element(sum / window_size)
                    })
                    .collect()
            }
        }
    }
}

/// Convert a window mean back to `T`, saturating at the bounds of `T`.
fn mean_to_element<T: Element>(mean: f64) -> Result<T, SamplingError> {
    match T::from_f64(mean) {
        Some(element) => Ok(element),
        None if mean.is_nan() => Err(SamplingError::ElementConversion(mean)),
        None if mean.is_sign_negative() => Ok(T::min_value()),
        None => Ok(T::max_value()),
    }
}

fn to_usize(shape: &[u64]) -> Option<Vec<usize>> {
    shape.iter().map(|&s| usize::try_from(s).ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_strategy_for_data_type() {
        assert_eq!(
            SamplingStrategy::for_data_type(DataType::UInt64),
            SamplingStrategy::StrideSample
        );
        assert_eq!(
            SamplingStrategy::for_data_type(DataType::UInt8),
            SamplingStrategy::MeanPooling
        );
        assert_eq!(
            SamplingStrategy::for_data_type(DataType::Float32),
            SamplingStrategy::MeanPooling
        );
    }

    #[test]
    fn sampling_mean_pooling() {
        #[rustfmt::skip]
        let elements: Vec<f32> = vec![
            0.0, 1.0, 2.0, 3.0,
            4.0, 5.0, 6.0, 7.0,
            8.0, 9.0, 10.0, 11.0,
            12.0, 13.0, 14.0, 15.0,
        ];
        let output = SamplingStrategy::MeanPooling
            .downsample(&elements, &[4, 4], &[2, 2])
            .unwrap();
        assert_eq!(output, vec![2.5, 4.5, 10.5, 12.5]);

        let output = SamplingStrategy::MeanPooling
            .downsample(&elements, &[4, 4], &[1, 4])
            .unwrap();
        assert_eq!(output, vec![1.5, 5.5, 9.5, 13.5]);
    }

    #[test]
    fn sampling_mean_pooling_integer_truncates() {
        let output = SamplingStrategy::MeanPooling
            .downsample(&[1u8, 2, 2, 2, 255, 254, 0, 0], &[8], &[4])
            .unwrap();
        assert_eq!(output, vec![1, 127]);
        let output = SamplingStrategy::MeanPooling
            .downsample(&[-1i16, -2], &[2], &[2])
            .unwrap();
        assert_eq!(output, vec![-1]);
    }

    #[test]
    fn sampling_stride() {
        let elements: Vec<u64> = (0..16).collect();
        let output = SamplingStrategy::StrideSample
            .downsample(&elements, &[4, 4], &[2, 2])
            .unwrap();
        assert_eq!(output, vec![5, 7, 13, 15]);

        let elements: Vec<u64> = (0..9).collect();
        let output = SamplingStrategy::StrideSample
            .downsample(&elements, &[9], &[3])
            .unwrap();
        assert_eq!(output, vec![1, 4, 7]);
    }

    #[test]
    fn sampling_stride_constant_label() {
        let elements = vec![42u64; 64];
        let output = SamplingStrategy::StrideSample
            .downsample(&elements, &[4, 4, 4], &[2, 2, 2])
            .unwrap();
        assert_eq!(output, vec![42u64; 8]);
    }

    #[test]
    fn sampling_channel_axis_untouched() {
        // 2 channels of 2x2
        let elements: Vec<f64> = vec![1.0, 2.0, 3.0, 4.0, 10.0, 20.0, 30.0, 40.0];
        let output = SamplingStrategy::MeanPooling
            .downsample(&elements, &[2, 2, 2], &[2, 2])
            .unwrap();
        assert_eq!(output, vec![2.5, 25.0]);
        let output = SamplingStrategy::StrideSample
            .downsample(&elements, &[2, 2, 2], &[2, 2])
            .unwrap();
        assert_eq!(output, vec![4.0, 40.0]);
    }

    #[test]
    fn sampling_invalid() {
        let elements = vec![0u16; 6];
        assert!(matches!(
            SamplingStrategy::MeanPooling.downsample(&elements, &[2, 3], &[2, 2]),
            Err(SamplingError::NotMultiple(_, _))
        ));
        assert!(SamplingStrategy::MeanPooling
            .downsample(&elements, &[2, 3], &[0, 3])
            .is_err());
        assert!(SamplingStrategy::MeanPooling
            .downsample(&elements, &[6], &[2, 3])
            .is_err());
        assert!(matches!(
            SamplingStrategy::StrideSample.downsample(&elements, &[2, 2], &[2, 2]),
            Err(SamplingError::InvalidElementsLength(6, _))
        ));
        assert!(matches!(
            SamplingStrategy::MeanPooling.downsample(&elements, &[2, 2], &[2, 2]),
            Err(SamplingError::InvalidElementsLength(6, _))
        ));
        assert!(matches!(
            SamplingStrategy::MeanPooling.downsample(&elements[..3], &[2, 2], &[2, 2]),
            Err(SamplingError::InvalidElementsLength(3, _))
        ));
    }

    #[test]
    fn sampling_mean_pooling_extremes() {
        let output = SamplingStrategy::MeanPooling
            .downsample(&[i64::MAX; 4], &[4], &[2])
            .unwrap();
        assert_eq!(output, vec![i64::MAX; 2]);
        let output = SamplingStrategy::MeanPooling
            .downsample(&[i64::MIN; 4], &[2, 2], &[2, 2])
            .unwrap();
        assert_eq!(output, vec![i64::MIN]);
        let output = SamplingStrategy::MeanPooling
            .downsample(&[u64::MAX, u64::MAX], &[2], &[2])
            .unwrap();
        assert_eq!(output, vec![u64::MAX]);
        let output = SamplingStrategy::MeanPooling
            .downsample(&[u32::MAX; 8], &[2, 2, 2], &[2, 2, 2])
            .unwrap();
        assert_eq!(output, vec![u32::MAX]);
    }

    #[test]
    fn sampling_mean_pooling_nan() {
        let output = SamplingStrategy::MeanPooling
            .downsample(&[f64::NAN, 1.0, 2.0, 4.0], &[4], &[2])
            .unwrap();
        assert!(output[0].is_nan());
        assert_eq!(output[1], 3.0);
        assert!(matches!(
            mean_to_element::<u8>(f64::NAN),
            Err(SamplingError::ElementConversion(_))
        ));
        assert_eq!(mean_to_element::<i8>(-1e9).unwrap(), i8::MIN);
    }
}

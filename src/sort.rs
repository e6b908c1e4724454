// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Defines the sort-order kernels that resolve ranking permutations

use arrow_array::cast::AsArray;
use arrow_array::types::ByteArrayType;
use arrow_array::{
    downcast_primitive_array, Array, ArrowNativeTypeOp, BooleanArray, GenericByteArray,
    UInt32Array,
};
use arrow_schema::{ArrowError, DataType};
use std::cmp::Ordering;

pub use arrow_schema::SortOptions;

/// Returns the indices that would sort `values` according to `options`.
///
/// The result is a permutation of `[0, len)`: indexing `values` by it yields
/// the values in the requested order, with nulls placed according to
/// [`SortOptions::nulls_first`]. Floats are ordered by IEEE 754 totalOrder.
///
/// Note: this uses an unstable sort, the order of equal values is arbitrary.
/// Use [`stable_sorted_order`] where ties must resolve to original row order.
///
/// # Example
///
/// ```
/// # use arrow_array::{Int32Array, UInt32Array};
/// # use arrow_rank::sort::{sorted_order, SortOptions};
/// let array = Int32Array::from(vec![Some(3), None, Some(1), Some(2)]);
/// let indices = sorted_order(&array, SortOptions::default()).unwrap();
/// // Nulls first (the default), then ascending values
/// assert_eq!(indices, UInt32Array::from(vec![1, 2, 3, 0]));
/// ```
pub fn sorted_order(values: &dyn Array, options: SortOptions) -> Result<UInt32Array, ArrowError> {
    sorted_order_impl(values, options, false)
}

/// Returns the indices that would stably sort `values` according to `options`.
///
/// Like [`sorted_order`], but equal values keep their original relative
/// order, for both ascending and descending sorts.
///
/// # Example
///
/// ```
/// # use arrow_array::{Int32Array, UInt32Array};
/// # use arrow_rank::sort::{stable_sorted_order, SortOptions};
/// let array = Int32Array::from(vec![2, 1, 2, 1]);
/// let indices = stable_sorted_order(&array, SortOptions::default()).unwrap();
/// assert_eq!(indices, UInt32Array::from(vec![1, 3, 0, 2]));
/// ```
pub fn stable_sorted_order(
    values: &dyn Array,
    options: SortOptions,
) -> Result<UInt32Array, ArrowError> {
    sorted_order_impl(values, options, true)
}

fn sorted_order_impl(
    values: &dyn Array,
    options: SortOptions,
    stable: bool,
) -> Result<UInt32Array, ArrowError> {
    let (v, n) = partition_validity(values);

    Ok(downcast_primitive_array! {
        values => sort_primitive(values.values(), v, n, options, stable),
        DataType::Boolean => sort_boolean(values.as_boolean(), v, n, options, stable),
        DataType::Utf8 => sort_bytes(values.as_string::<i32>(), v, n, options, stable),
        DataType::LargeUtf8 => sort_bytes(values.as_string::<i64>(), v, n, options, stable),
        DataType::Binary => sort_bytes(values.as_binary::<i32>(), v, n, options, stable),
        DataType::LargeBinary => sort_bytes(values.as_binary::<i64>(), v, n, options, stable),
        t => {
            return Err(ArrowError::ComputeError(format!(
                "Sort not supported for data type {t:?}"
            )));
        }
    })
}

// partition indices into valid and null indices, both in original row order
fn partition_validity(array: &dyn Array) -> (Vec<u32>, Vec<u32>) {
    match array.null_count() {
        // faster path
        0 => ((0..(array.len() as u32)).collect(), vec![]),
        _ => {
            let indices = 0..(array.len() as u32);
            indices.partition(|index| array.is_valid(*index as usize))
        }
    }
}

fn sort_primitive<T: ArrowNativeTypeOp>(
    values: &[T],
    value_indices: Vec<u32>,
    nulls: Vec<u32>,
    options: SortOptions,
    stable: bool,
) -> UInt32Array {
    let mut valids = value_indices
        .into_iter()
        .map(|index| (index, values[index as usize]))
        .collect::<Vec<(u32, T)>>();
    sort_impl(options, &mut valids, &nulls, stable, T::compare).into()
}

fn sort_boolean(
    values: &BooleanArray,
    value_indices: Vec<u32>,
    nulls: Vec<u32>,
    options: SortOptions,
    stable: bool,
) -> UInt32Array {
    let mut valids = value_indices
        .into_iter()
        .map(|index| (index, values.value(index as usize)))
        .collect::<Vec<(u32, bool)>>();
    sort_impl(options, &mut valids, &nulls, stable, |a, b| a.cmp(&b)).into()
}

fn sort_bytes<T: ByteArrayType>(
    values: &GenericByteArray<T>,
    value_indices: Vec<u32>,
    nulls: Vec<u32>,
    options: SortOptions,
    stable: bool,
) -> UInt32Array {
    let mut valids = value_indices
        .into_iter()
        .map(|index| (index, values.value(index as usize).as_ref()))
        .collect::<Vec<(u32, &[u8])>>();
    sort_impl(options, &mut valids, &nulls, stable, Ord::cmp).into()
}

/// Sorts the valid `(index, value)` pairs and splices the null indices in
/// before or after them according to `options.nulls_first`.
///
/// Descending order reverses the comparator rather than the sorted slice, so
/// the stable path keeps equal values in original row order either way.
#[inline(never)]
fn sort_impl<T: Copy>(
    options: SortOptions,
    valids: &mut [(u32, T)],
    nulls: &[u32],
    stable: bool,
    mut cmp: impl FnMut(T, T) -> Ordering,
) -> Vec<u32> {
    match (stable, options.descending) {
        (false, false) => valids.sort_unstable_by(|a, b| cmp(a.1, b.1)),
        (false, true) => valids.sort_unstable_by(|a, b| cmp(a.1, b.1).reverse()),
        (true, false) => valids.sort_by(|a, b| cmp(a.1, b.1)),
        (true, true) => valids.sort_by(|a, b| cmp(a.1, b.1).reverse()),
    }

    let mut out = Vec::with_capacity(valids.len() + nulls.len());
    match options.nulls_first {
        true => {
            out.extend_from_slice(nulls);
            out.extend(valids.iter().map(|x| x.0));
        }
        false => {
            out.extend(valids.iter().map(|x| x.0));
            out.extend_from_slice(nulls);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::types::*;
    use arrow_array::*;
    use half::f16;

    fn test_sorted_order_primitive_arrays<T>(
        data: Vec<Option<T::Native>>,
        options: SortOptions,
        expected_data: Vec<u32>,
    ) where
        T: ArrowPrimitiveType,
        PrimitiveArray<T>: From<Vec<Option<T::Native>>>,
    {
        let array = PrimitiveArray::<T>::from(data);
        let output = sorted_order(&array, options).unwrap();
        assert_eq!(output, UInt32Array::from(expected_data))
    }

    fn test_stable_sorted_order_primitive_arrays<T>(
        data: Vec<Option<T::Native>>,
        options: SortOptions,
        expected_data: Vec<u32>,
    ) where
        T: ArrowPrimitiveType,
        PrimitiveArray<T>: From<Vec<Option<T::Native>>>,
    {
        let array = PrimitiveArray::<T>::from(data);
        let output = stable_sorted_order(&array, options).unwrap();
        assert_eq!(output, UInt32Array::from(expected_data))
    }

    #[test]
    fn test_sorted_order_int32() {
        // All values distinct so the unstable sort has a unique answer
        let data = vec![Some(3), None, Some(5), Some(1), None, Some(4)];
        test_sorted_order_primitive_arrays::<Int32Type>(
            data.clone(),
            SortOptions {
                descending: false,
                nulls_first: true,
            },
            vec![1, 4, 3, 0, 5, 2],
        );
        test_sorted_order_primitive_arrays::<Int32Type>(
            data.clone(),
            SortOptions {
                descending: false,
                nulls_first: false,
            },
            vec![3, 0, 5, 2, 1, 4],
        );
        test_sorted_order_primitive_arrays::<Int32Type>(
            data.clone(),
            SortOptions {
                descending: true,
                nulls_first: true,
            },
            vec![1, 4, 2, 5, 0, 3],
        );
        test_sorted_order_primitive_arrays::<Int32Type>(
            data,
            SortOptions {
                descending: true,
                nulls_first: false,
            },
            vec![2, 5, 0, 3, 1, 4],
        );
    }

    #[test]
    fn test_sorted_order_empty() {
        test_sorted_order_primitive_arrays::<Int32Type>(vec![], SortOptions::default(), vec![]);
    }

    #[test]
    fn test_sorted_order_all_nulls() {
        // Null indices are emitted in original row order
        test_sorted_order_primitive_arrays::<Int64Type>(
            vec![None, None, None],
            SortOptions::default(),
            vec![0, 1, 2],
        );
        test_sorted_order_primitive_arrays::<Int64Type>(
            vec![None, None, None],
            SortOptions {
                descending: true,
                nulls_first: false,
            },
            vec![0, 1, 2],
        );
    }

    #[test]
    fn test_sorted_order_float_total_order() {
        // -0.0 < 0.0 and NaN sorts after every other value ascending
        test_sorted_order_primitive_arrays::<Float64Type>(
            vec![Some(1.0), Some(f64::NAN), Some(-0.0), Some(0.0), None],
            SortOptions {
                descending: false,
                nulls_first: false,
            },
            vec![2, 3, 0, 1, 4],
        );
    }

    #[test]
    fn test_sorted_order_f16() {
        test_sorted_order_primitive_arrays::<Float16Type>(
            vec![
                Some(f16::from_f32(2.5)),
                Some(f16::from_f32(0.5)),
                Some(f16::from_f32(1.5)),
            ],
            SortOptions::default(),
            vec![1, 2, 0],
        );
    }

    #[test]
    fn test_stable_sorted_order_ties() {
        let data = vec![Some(2), Some(1), Some(2), Some(1), Some(1)];
        test_stable_sorted_order_primitive_arrays::<Int32Type>(
            data.clone(),
            SortOptions::default(),
            vec![1, 3, 4, 0, 2],
        );
        // Ties keep original order under descending as well
        test_stable_sorted_order_primitive_arrays::<Int32Type>(
            data,
            SortOptions {
                descending: true,
                nulls_first: true,
            },
            vec![0, 2, 1, 3, 4],
        );
    }

    #[test]
    fn test_stable_sorted_order_ties_with_nulls() {
        let data = vec![Some(1), None, Some(1), None];
        test_stable_sorted_order_primitive_arrays::<Int32Type>(
            data.clone(),
            SortOptions {
                descending: false,
                nulls_first: true,
            },
            vec![1, 3, 0, 2],
        );
        test_stable_sorted_order_primitive_arrays::<Int32Type>(
            data.clone(),
            SortOptions {
                descending: false,
                nulls_first: false,
            },
            vec![0, 2, 1, 3],
        );
        // All valid values equal, descending must not reorder them
        test_stable_sorted_order_primitive_arrays::<Int32Type>(
            data,
            SortOptions {
                descending: true,
                nulls_first: false,
            },
            vec![0, 2, 1, 3],
        );
    }

    #[test]
    fn test_stable_sorted_order_boolean() {
        let array = BooleanArray::from(vec![
            Some(true),
            Some(false),
            None,
            Some(true),
            Some(false),
        ]);
        let output = stable_sorted_order(&array, SortOptions::default()).unwrap();
        assert_eq!(output, UInt32Array::from(vec![2, 1, 4, 0, 3]));

        let output = stable_sorted_order(
            &array,
            SortOptions {
                descending: true,
                nulls_first: false,
            },
        )
        .unwrap();
        assert_eq!(output, UInt32Array::from(vec![0, 3, 1, 4, 2]));
    }

    #[test]
    fn test_sorted_order_strings() {
        let array = StringArray::from(vec![Some("foo"), None, Some("bar"), Some("baz")]);
        let output = sorted_order(
            &array,
            SortOptions {
                descending: false,
                nulls_first: false,
            },
        )
        .unwrap();
        assert_eq!(output, UInt32Array::from(vec![2, 3, 0, 1]));

        let output = sorted_order(
            &array,
            SortOptions {
                descending: true,
                nulls_first: true,
            },
        )
        .unwrap();
        assert_eq!(output, UInt32Array::from(vec![1, 0, 3, 2]));

        let array = LargeStringArray::from(vec![Some("foo"), None, Some("bar"), Some("baz")]);
        let output = sorted_order(
            &array,
            SortOptions {
                descending: false,
                nulls_first: false,
            },
        )
        .unwrap();
        assert_eq!(output, UInt32Array::from(vec![2, 3, 0, 1]));
    }

    #[test]
    fn test_sorted_order_binary() {
        let v: Vec<&[u8]> = vec![&[1, 2, 3], &[0], &[1, 2]];
        let array = BinaryArray::from(v.clone());
        let output = sorted_order(&array, SortOptions::default()).unwrap();
        assert_eq!(output, UInt32Array::from(vec![1, 2, 0]));

        let array = LargeBinaryArray::from(v);
        let output = sorted_order(&array, SortOptions::default()).unwrap();
        assert_eq!(output, UInt32Array::from(vec![1, 2, 0]));
    }

    #[test]
    fn test_sorted_order_unsupported() {
        let array = NullArray::new(3);
        let err = sorted_order(&array, SortOptions::default()).unwrap_err();
        assert!(err.to_string().contains("Sort not supported"), "{err}");
    }
}

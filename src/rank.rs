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

//! Provides `rank` to assign a rank to each value in an array

use crate::sort::{sorted_order, stable_sorted_order};
use arrow_array::cast::AsArray;
use arrow_array::types::*;
use arrow_array::{
    downcast_primitive_array, Array, ArrayRef, ArrowNativeTypeOp, ArrowPrimitiveType, BooleanArray,
    Float64Array, GenericByteArray, PrimitiveArray, RecordBatch, RecordBatchOptions, UInt32Array,
};
use arrow_buffer::{BooleanBuffer, NullBuffer};
use arrow_schema::{ArrowError, DataType, Field, Fields, Schema, SortOptions};
use std::sync::Arc;

/// How a group of equal values shares a rank.
///
/// All methods agree on arrays of distinct values, they only differ in the
/// rank assigned within a group of ties. Given the ascending input
/// `[50, 20, 20, 40]` the methods yield
///
/// | Method    | Ranks                  |
/// |-----------|------------------------|
/// | `First`   | `[4.0, 1.0, 2.0, 3.0]` |
/// | `Dense`   | `[3.0, 1.0, 1.0, 2.0]` |
/// | `Min`     | `[4.0, 1.0, 1.0, 3.0]` |
/// | `Max`     | `[4.0, 2.0, 2.0, 3.0]` |
/// | `Average` | `[4.0, 1.5, 1.5, 3.0]` |
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RankMethod {
    /// Each row takes its position in the sort order, ties resolve to the
    /// earlier row
    First,
    /// Groups of equal values are numbered consecutively, leaving no gaps
    /// after a tie
    Dense,
    /// Every row of a group takes the first position the group covers
    Min,
    /// Every row of a group takes the last position the group covers
    Max,
    /// Every row of a group takes the mean of its [`Min`] and [`Max`] ranks
    ///
    /// [`Min`]: RankMethod::Min
    /// [`Max`]: RankMethod::Max
    #[default]
    Average,
}

/// Whether null values receive a rank.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NullPolicy {
    /// Nulls are ranked like any other value, comparing equal to each other
    /// and sorting before or after all valid values according to
    /// [`SortOptions::nulls_first`]
    Include,
    /// Nulls receive a null rank and do not count towards the ranks of valid
    /// values
    #[default]
    Exclude,
}

/// Options that define a ranking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RankOptions {
    /// The rank shared by a group of equal values
    pub method: RankMethod,
    /// The order in which to rank, including where nulls sort
    pub sort: SortOptions,
    /// Whether nulls receive a rank
    pub null_policy: NullPolicy,
}

/// Assigns a rank to each value in `values` based on its position in the
/// sorted order, as a `Float64` value per input row.
///
/// The rank shared by equal values is determined by [`RankOptions::method`],
/// the sort order by [`RankOptions::sort`], and the treatment of nulls by
/// [`RankOptions::null_policy`]. A value of `None` ranks ascending with
/// [`RankMethod::Average`], excluding nulls.
///
/// Excluded nulls yield a null rank and never occupy a position in the sort
/// order, so the remaining ranks are the same regardless of
/// [`SortOptions::nulls_first`].
///
/// # Example
///
/// ```
/// # use arrow_array::Int32Array;
/// # use arrow_rank::rank::{rank, NullPolicy, RankMethod, RankOptions};
/// # use arrow_rank::sort::SortOptions;
/// let array = Int32Array::from(vec![Some(10), Some(20), Some(20), Some(5), None]);
/// let options = RankOptions {
///     method: RankMethod::Average,
///     sort: SortOptions {
///         descending: false,
///         nulls_first: false,
///     },
///     null_policy: NullPolicy::Include,
/// };
/// let ranks = rank(&array, Some(options)).unwrap();
/// assert_eq!(ranks.values(), &[2.0, 3.5, 3.5, 1.0, 5.0]);
/// ```
pub fn rank(values: &dyn Array, options: Option<RankOptions>) -> Result<Float64Array, ArrowError> {
    let options = options.unwrap_or_default();
    downcast_primitive_array! {
        values => primitive_rank(values, &options),
        DataType::Boolean => boolean_rank(values.as_boolean(), &options),
        DataType::Utf8 => bytes_rank(values.as_bytes::<Utf8Type>(), &options),
        DataType::LargeUtf8 => bytes_rank(values.as_bytes::<LargeUtf8Type>(), &options),
        DataType::Binary => bytes_rank(values.as_bytes::<BinaryType>(), &options),
        DataType::LargeBinary => bytes_rank(values.as_bytes::<LargeBinaryType>(), &options),
        d => Err(ArrowError::ComputeError(format!("{d:?} not supported in rank")))
    }
}

/// Assigns a rank to each value of every column in `batch`, returning a new
/// [`RecordBatch`] of `Float64` columns with the same names and row count.
///
/// Each column is ranked independently with the same `options`, as by
/// [`rank`]. Under [`NullPolicy::Exclude`] an output column is nullable
/// when its input column is, otherwise every rank is valid.
///
/// # Example
///
/// ```
/// # use std::sync::Arc;
/// # use arrow_array::cast::AsArray;
/// # use arrow_array::types::Float64Type;
/// # use arrow_array::{Int32Array, RecordBatch, StringArray};
/// # use arrow_rank::rank::{rank_batch, RankMethod, RankOptions};
/// let batch = RecordBatch::try_from_iter([
///     ("a", Arc::new(Int32Array::from(vec![2, 1, 2])) as _),
///     ("b", Arc::new(StringArray::from(vec!["x", "y", "x"])) as _),
/// ])
/// .unwrap();
/// let options = RankOptions {
///     method: RankMethod::Min,
///     ..Default::default()
/// };
/// let ranks = rank_batch(&batch, Some(options)).unwrap();
/// assert_eq!(
///     ranks.column(0).as_primitive::<Float64Type>().values(),
///     &[2.0, 1.0, 2.0]
/// );
/// assert_eq!(
///     ranks.column(1).as_primitive::<Float64Type>().values(),
///     &[1.0, 3.0, 1.0]
/// );
/// ```
pub fn rank_batch(
    batch: &RecordBatch,
    options: Option<RankOptions>,
) -> Result<RecordBatch, ArrowError> {
    let options = options.unwrap_or_default();
    let columns = batch
        .columns()
        .iter()
        .map(|column| Ok(Arc::new(rank(column.as_ref(), Some(options))?) as ArrayRef))
        .collect::<Result<Vec<_>, ArrowError>>()?;

    let exclude = options.null_policy == NullPolicy::Exclude;
    let fields = batch
        .schema()
        .fields()
        .iter()
        .map(|field| {
            Field::new(
                field.name().clone(),
                DataType::Float64,
                exclude && field.is_nullable(),
            )
        })
        .collect::<Fields>();
    let schema = Schema::new_with_metadata(fields, batch.schema().metadata().clone());

    RecordBatch::try_new_with_options(
        Arc::new(schema),
        columns,
        &RecordBatchOptions::new().with_row_count(Some(batch.num_rows())),
    )
}

/// Resolves the permutation that orders `values` for ranking.
///
/// Excluded nulls always sort after every valid value so they sit outside
/// the ranked prefix of the permutation, the caller's null position only
/// applies when nulls participate. Row order must break ties for
/// [`RankMethod::First`], which only a stable sort preserves.
fn resolve_order(values: &dyn Array, options: &RankOptions) -> Result<UInt32Array, ArrowError> {
    let sort = match options.null_policy {
        NullPolicy::Include => options.sort,
        NullPolicy::Exclude => SortOptions {
            nulls_first: false,
            ..options.sort
        },
    };
    match options.method {
        RankMethod::First => stable_sorted_order(values, sort),
        _ => sorted_order(values, sort),
    }
}

fn primitive_rank<T: ArrowPrimitiveType>(
    array: &PrimitiveArray<T>,
    options: &RankOptions,
) -> Result<Float64Array, ArrowError>
where
    T::Native: ArrowNativeTypeOp,
{
    let order = resolve_order(array, options)?;
    let values = array.values();
    Ok(rank_impl(
        array.len(),
        order.values(),
        array.nulls().filter(|n| n.null_count() > 0),
        options,
        |a, b| values[a].is_eq(values[b]),
    ))
}

fn boolean_rank(array: &BooleanArray, options: &RankOptions) -> Result<Float64Array, ArrowError> {
    let order = resolve_order(array, options)?;
    Ok(rank_impl(
        array.len(),
        order.values(),
        array.nulls().filter(|n| n.null_count() > 0),
        options,
        |a, b| array.value(a) == array.value(b),
    ))
}

fn bytes_rank<T: ByteArrayType>(
    array: &GenericByteArray<T>,
    options: &RankOptions,
) -> Result<Float64Array, ArrowError> {
    let order = resolve_order(array, options)?;
    Ok(rank_impl(
        array.len(),
        order.values(),
        array.nulls().filter(|n| n.null_count() > 0),
        options,
        |a, b| {
            let a: &[u8] = array.value(a).as_ref();
            let b: &[u8] = array.value(b).as_ref();
            a == b
        },
    ))
}

/// Ranks the rows of an array given the permutation that sorts it.
///
/// `eq` compares two row indices for equality of their values, it is never
/// invoked on a null row. Nulls compare equal to each other, so a contiguous
/// null block in the sort order forms a single tie group.
#[inline(never)]
fn rank_impl<E>(
    len: usize,
    order: &[u32],
    nulls: Option<&NullBuffer>,
    options: &RankOptions,
    eq: E,
) -> Float64Array
where
    E: Fn(usize, usize) -> bool,
{
    // Excluded nulls occupy the tail of the permutation and keep their rank
    // slots masked out
    let (ranked, out_nulls) = match (options.null_policy, nulls) {
        (NullPolicy::Exclude, Some(n)) => (len - n.null_count(), Some(n.clone())),
        _ => (len, None),
    };
    let order = &order[..ranked];

    let tie = |a: u32, b: u32| -> bool {
        let (a, b) = (a as usize, b as usize);
        match nulls {
            Some(n) => match (n.is_valid(a), n.is_valid(b)) {
                (true, true) => eq(a, b),
                (false, false) => true,
                _ => false,
            },
            None => eq(a, b),
        }
    };

    // Rank of each sorted position
    let ranks: Vec<f64> = match options.method {
        // The stable permutation already resolved ties by row order
        RankMethod::First => (0..ranked).map(|pos| (pos + 1) as f64).collect(),
        method => grouped_ranks(method, order, tie),
    };

    // Scatter back to original row order
    let mut out = vec![0.0; len];
    for (pos, &row) in order.iter().enumerate() {
        out[row as usize] = ranks[pos];
    }
    Float64Array::new(out.into(), out_nulls)
}

/// Computes the rank of each sorted position for the group-based methods.
///
/// The sorted positions are grouped into runs of tied rows, each group is
/// reduced to its first position and size, and the per-group rank is
/// broadcast back to every member position through its group id.
fn grouped_ranks(
    method: RankMethod,
    order: &[u32],
    tie: impl Fn(u32, u32) -> bool,
) -> Vec<f64> {
    // A sorted position opens a new tie group when its row is not a tie with
    // the previous position's row
    let flags = BooleanBuffer::collect_bool(order.len(), |pos| {
        pos == 0 || !tie(order[pos - 1], order[pos])
    });

    // Inclusive scan of the boundary flags, 1-based compact group ids
    let mut groups = 0u32;
    let dense: Vec<u32> = flags
        .iter()
        .map(|flag| {
            groups += flag as u32;
            groups
        })
        .collect();

    if let RankMethod::Dense = method {
        return dense.iter().map(|&group| group as f64).collect();
    }

    // Segmented reduction keyed by the group ids: each group's first 1-based
    // position and its size
    let mut mins = Vec::with_capacity(groups as usize);
    let mut counts = vec![0u32; groups as usize];
    for (pos, &group) in dense.iter().enumerate() {
        if flags.value(pos) {
            mins.push(pos as u32 + 1);
        }
        counts[group as usize - 1] += 1;
    }

    let group_rank: Vec<f64> = match method {
        RankMethod::Min => mins.iter().map(|&min| min as f64).collect(),
        RankMethod::Max => mins
            .iter()
            .zip(&counts)
            .map(|(&min, &count)| (min as u64 + count as u64 - 1) as f64)
            .collect(),
        RankMethod::Average => mins
            .iter()
            .zip(&counts)
            .map(|(&min, &count)| min as f64 + (count - 1) as f64 / 2.0)
            .collect(),
        RankMethod::First | RankMethod::Dense => unreachable!("resolved before the reduction"),
    };

    dense
        .iter()
        .map(|&group| group_rank[group as usize - 1])
        .collect()
}

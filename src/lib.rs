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

//! Arrow ranking kernels
//!
//! # Rank RecordBatch
//!
//! ```
//! # use std::sync::Arc;
//! # use arrow_array::*;
//! # use arrow_array::cast::AsArray;
//! # use arrow_array::types::Float64Type;
//! # use arrow_rank::rank::{rank_batch, NullPolicy, RankMethod, RankOptions};
//! #
//! let a: ArrayRef = Arc::new(Int32Array::from(vec![Some(10), Some(20), Some(20), None]));
//! let batch = RecordBatch::try_from_iter(vec![("a", a)]).unwrap();
//!
//! // Rank each column, nulls sort first and rank like any other value
//! let options = RankOptions {
//!     method: RankMethod::Min,
//!     null_policy: NullPolicy::Include,
//!     ..Default::default()
//! };
//! let ranks = rank_batch(&batch, Some(options)).unwrap();
//!
//! let col = ranks.column(0).as_primitive::<Float64Type>();
//! assert_eq!(col.values(), &[2.0, 3.0, 3.0, 1.0]);
//! ```
//!

#![warn(missing_docs)]
pub mod rank;
pub mod sort;

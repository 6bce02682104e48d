//! SparseVector: an immutable, dimension-tagged SparseData.
//!
//! The dimension equals the logical length, except that a vector holding
//! exactly one element is tagged with dimension `-1` to mark it scalar.

use crate::convert::{self, NullBitmap};
use crate::error::{Result, SvecError};
use crate::sparse_data::SparseData;
use crate::text;
use crate::unnest::Unnest;
use crate::wire;
use std::fmt;
use std::str::FromStr;

pub const SCALAR_DIMENSION: i32 = -1;

#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    dimension: i32,
    data: SparseData,
}

impl SparseVector {
    /// Wraps `data`, optionally trimming buffer slack first.
    pub fn from_sparse_data(mut data: SparseData, trim: bool) -> Result<Self> {
        if trim {
            data.trim();
        }
        let total = data.total_logical_count();
        let dimension = i32::try_from(total).map_err(|_| SvecError::CountOverflow {
            field: "dimension",
            value: total,
        })?;
        Ok(Self {
            dimension: if dimension == 1 { SCALAR_DIMENSION } else { dimension },
            data,
        })
    }

    /// An empty vector with room for `allocation` runs.
    pub fn make_empty(allocation: usize) -> Result<Self> {
        Self::from_sparse_data(SparseData::new_empty(allocation)?, false)
    }

    /// A new vector with doubled buffer capacity and the same content.
    pub fn realloc(&self) -> Result<Self> {
        Self::from_sparse_data(self.data.grow()?, false)
    }

    pub fn from_dense(array: &[f64], nulls: Option<&NullBitmap>) -> Result<Self> {
        Self::from_sparse_data(convert::from_dense(array, nulls)?, true)
    }

    pub fn from_options(values: &[Option<f64>]) -> Result<Self> {
        Self::from_sparse_data(convert::from_options(values)?, true)
    }

    pub fn from_wire(bytes: &[u8]) -> Result<Self> {
        Self::from_sparse_data(wire::deserialize(bytes)?, true)
    }

    pub fn to_wire(&self) -> Result<Vec<u8>> {
        wire::serialize(&self.data)
    }

    pub fn dimension(&self) -> i32 {
        self.dimension
    }

    pub fn is_scalar(&self) -> bool {
        self.dimension == SCALAR_DIMENSION
    }

    /// Logical length, regardless of the scalar tag.
    pub fn len(&self) -> u64 {
        self.data.total_logical_count()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &SparseData {
        &self.data
    }

    pub fn into_sparse_data(self) -> SparseData {
        self.data
    }

    pub fn to_array(&self) -> Result<Vec<f64>> {
        convert::to_dense(&self.data)
    }

    pub fn to_options(&self) -> Result<Vec<Option<f64>>> {
        convert::to_dense_options(&self.data)
    }

    pub fn unnest(&self) -> Unnest<'_> {
        self.data.iter()
    }
}

impl FromStr for SparseVector {
    type Err = SvecError;

    fn from_str(s: &str) -> Result<Self> {
        text::parse_svec(s)
    }
}

impl fmt::Display for SparseVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&text::render_svec(self))
    }
}

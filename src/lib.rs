//! # svec
//!
//! Run-length encoded sparse vectors of 64-bit floats, with first-class NULL
//! elements.
//!
//! ## Features
//!
//! - **Compact runs**: each run stores one value and a variable-width count
//!   (1, 3, 5 or 9 bytes)
//! - **NULL support**: NULL is a reserved NaN payload (`NVP`) that never
//!   collides with arithmetic NaN
//! - **Binary and text codecs**: a big-endian wire record and the
//!   `{counts}:{values}` text form
//! - **Batch tooling**: parallel conversion of many vectors and a checksummed
//!   container file
//!
//! ## Quick Start
//!
//! ```rust
//! use svec::SparseVector;
//!
//! let dense = vec![Some(0.0), Some(0.0), Some(0.0), None, Some(2.5)];
//! let svec = SparseVector::from_options(&dense).unwrap();
//! assert_eq!(svec.to_string(), "{3,1,1}:{0,NVP,2.5}");
//! assert_eq!(svec.dimension(), 5);
//!
//! let bytes = svec.to_wire().unwrap();
//! let decoded = SparseVector::from_wire(&bytes).unwrap();
//! assert_eq!(decoded.to_options().unwrap(), dense);
//! ```
//!
//! ### Parsing the text form
//!
//! ```rust
//! use svec::{SparseVector, SvecError};
//!
//! let svec: SparseVector = "{1,10,1}:{4.3,0,7.4}".parse().unwrap();
//! assert_eq!(svec.len(), 12);
//! assert_eq!(svec.unnest().nth(5), Some(0.0));
//!
//! let err = "{1,2}:{3.0}".parse::<SparseVector>().unwrap_err();
//! assert!(matches!(err, SvecError::RunCountMismatch { counts: 2, values: 1 }));
//! ```
//!
//! ### Batches and containers
//!
//! ```rust
//! use svec::{container, pipeline, SvecConfig};
//! use std::io::Cursor;
//!
//! let config = SvecConfig::default().with_threads(2);
//! let vectors = pipeline::parse_dense_lines("{1,1,2}\n{NULL}\n", &config).unwrap();
//!
//! let mut file = Vec::new();
//! container::write_svec_container(&mut file, &vectors).unwrap();
//! let restored = container::read_svec_container(&mut Cursor::new(file)).unwrap();
//! assert_eq!(restored, vectors);
//! ```

pub mod buffer;
pub mod cli;
pub mod config;
pub mod container;
pub mod convert;
pub mod error;
pub mod literal;
pub mod pipeline;
pub mod reduce;
pub mod runcount;
pub mod sparse_data;
pub mod svec;
pub mod text;
pub mod unnest;
pub mod value;
pub mod wire;

// Re-export commonly used types for convenience
pub use config::{OutputFormat, SvecConfig};
pub use convert::NullBitmap;
pub use error::{Result, SvecError};
pub use pipeline::BatchStats;
pub use sparse_data::{ElementType, Run, SparseData};
pub use svec::SparseVector;
pub use unnest::Unnest;
pub use value::{is_nvp, nvp, NVP_BITS};

/// svec library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

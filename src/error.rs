use thiserror::Error;

#[derive(Error, Debug)]
pub enum SvecError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Non-positive run length in input: {0}")]
	InvalidRunLength(i64),

	#[error("Unique value count not equal to run length count ({counts} counts, {values} values)")]
	RunCountMismatch { counts: usize, values: usize },

	#[error("NULL value in the count array")]
	NullCountArray,

	#[error("Invalid input string for svec: missing ':' between count and value arrays")]
	MissingSeparator,

	#[error("Malformed run-length stream at byte {offset}")]
	MalformedRunStream { offset: usize },

	#[error("Malformed wire format: {0}")]
	MalformedWireFormat(String),

	#[error("Allocation failure: could not reserve {requested} bytes")]
	AllocationFailure { requested: usize },

	#[error("Malformed array literal: {0}")]
	MalformedLiteral(String),

	#[error("Invalid sparse data: {0}")]
	InvalidSparseData(String),

	#[error("Unsupported element type tag: {0}")]
	UnsupportedElementType(u32),

	#[error("{field} value {value} does not fit its 32-bit field")]
	CountOverflow { field: &'static str, value: u64 },

	#[error("Invalid svec container format: {0}")]
	InvalidFormat(String),

	#[error("Data integrity check failed: checksum mismatch in record {record}")]
	ChecksumMismatch { record: usize },

	#[error("line {line}: {source}")]
	AtLine {
		line: usize,
		#[source]
		source: Box<SvecError>,
	},

	#[error("JSON output error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Configuration error: {0}")]
	ConfigError(String),
}

pub type Result<T> = std::result::Result<T, SvecError>;

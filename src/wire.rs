//! Binary wire format for SparseData
//!
//! Five big-endian 32-bit fields followed by the two raw payloads:
//! `type_tag | unique_run_count | total_logical_count | values_len | runs_len | values | runs`

use crate::error::{Result, SvecError};
use crate::sparse_data::SparseData;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

pub const WIRE_HEADER_SIZE: usize = 5 * 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireHeader {
	pub type_tag: u32,
	pub unique_run_count: u32,
	pub total_logical_count: u32,
	pub values_len: u32,
	pub runs_len: u32,
}

impl WireHeader {
	pub fn for_sparse_data(sdata: &SparseData) -> Result<Self> {
		Ok(Self {
			type_tag: sdata.element_type().tag(),
			unique_run_count: fit_u32("unique_run_count", sdata.unique_run_count() as u64)?,
			total_logical_count: fit_u32("total_logical_count", sdata.total_logical_count())?,
			values_len: fit_u32("values_len", sdata.values_bytes().len() as u64)?,
			runs_len: fit_u32("runs_len", sdata.runs_bytes().len() as u64)?,
		})
	}

	pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
		writer.write_u32::<BigEndian>(self.type_tag)?;
		writer.write_u32::<BigEndian>(self.unique_run_count)?;
		writer.write_u32::<BigEndian>(self.total_logical_count)?;
		writer.write_u32::<BigEndian>(self.values_len)?;
		writer.write_u32::<BigEndian>(self.runs_len)?;
		Ok(())
	}

	pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
		let mut field = |name: &str| {
			reader
				.read_u32::<BigEndian>()
				.map_err(|e| wire_error(e, &format!("truncated header field {}", name)))
		};
		Ok(Self {
			type_tag: field("type_tag")?,
			unique_run_count: field("unique_run_count")?,
			total_logical_count: field("total_logical_count")?,
			values_len: field("values_len")?,
			runs_len: field("runs_len")?,
		})
	}

	/// Size of the full record this header introduces.
	pub fn record_len(&self) -> usize {
		WIRE_HEADER_SIZE + self.values_len as usize + self.runs_len as usize
	}
}

pub fn write_sparse_data<W: Write>(writer: &mut W, sdata: &SparseData) -> Result<usize> {
	let header = WireHeader::for_sparse_data(sdata)?;
	header.write(writer)?;
	writer.write_all(sdata.values_bytes())?;
	writer.write_all(sdata.runs_bytes())?;
	Ok(header.record_len())
}

pub fn read_sparse_data<R: Read>(reader: &mut R) -> Result<SparseData> {
	let header = WireHeader::read(reader)?;
	log::debug!(
		"decoding sparse data: {} runs, {} values, {}+{} payload bytes",
		header.unique_run_count,
		header.total_logical_count,
		header.values_len,
		header.runs_len
	);

	let values = read_payload(reader, header.values_len, "values")?;
	let runs = read_payload(reader, header.runs_len, "runs")?;

	SparseData::from_raw_parts(
		header.type_tag,
		header.unique_run_count as usize,
		header.total_logical_count as u64,
		values,
		runs,
	)
}

pub fn serialize(sdata: &SparseData) -> Result<Vec<u8>> {
	let len = WIRE_HEADER_SIZE + sdata.values_bytes().len() + sdata.runs_bytes().len();
	let mut out = Vec::with_capacity(len);
	write_sparse_data(&mut out, sdata)?;
	Ok(out)
}

/// Decodes exactly one record; trailing bytes are rejected.
pub fn deserialize(bytes: &[u8]) -> Result<SparseData> {
	let mut cursor = io::Cursor::new(bytes);
	let sdata = read_sparse_data(&mut cursor)?;
	let consumed = cursor.position() as usize;
	if consumed != bytes.len() {
		return Err(SvecError::MalformedWireFormat(format!(
			"{} trailing bytes after record",
			bytes.len() - consumed
		)));
	}
	Ok(sdata)
}

fn read_payload<R: Read>(reader: &mut R, len: u32, name: &str) -> Result<Vec<u8>> {
	// Read through `take` so a bogus declared length cannot force a huge allocation up front.
	let mut payload = Vec::new();
	reader.by_ref().take(len as u64).read_to_end(&mut payload)?;
	if payload.len() != len as usize {
		return Err(SvecError::MalformedWireFormat(format!(
			"{} payload declares {} bytes but only {} supplied",
			name,
			len,
			payload.len()
		)));
	}
	Ok(payload)
}

fn fit_u32(field: &'static str, value: u64) -> Result<u32> {
	u32::try_from(value).map_err(|_| SvecError::CountOverflow { field, value })
}

fn wire_error(e: io::Error, context: &str) -> SvecError {
	if e.kind() == io::ErrorKind::UnexpectedEof {
		SvecError::MalformedWireFormat(context.to_string())
	} else {
		SvecError::Io(e)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::convert::{from_dense, to_dense};
	use crate::sparse_data::FLOAT8_TYPE_TAG;
	use crate::value::nvp;

	fn sample() -> SparseData {
		let mut sdata = SparseData::new_empty(3).unwrap();
		sdata.append_run(1.25, 4).unwrap();
		sdata.append_run(nvp(), 300).unwrap();
		sdata.append_run(-8.0, 1).unwrap();
		sdata
	}

	#[test]
	fn test_wire_layout() {
		let sdata = sample();
		let bytes = serialize(&sdata).unwrap();

		assert_eq!(&bytes[0..4], &FLOAT8_TYPE_TAG.to_be_bytes());
		assert_eq!(&bytes[4..8], &3u32.to_be_bytes());
		assert_eq!(&bytes[8..12], &305u32.to_be_bytes());
		assert_eq!(&bytes[12..16], &24u32.to_be_bytes());
		assert_eq!(&bytes[16..20], &5u32.to_be_bytes());
		assert_eq!(&bytes[20..44], sdata.values_bytes());
		assert_eq!(&bytes[44..], sdata.runs_bytes());
		assert_eq!(bytes.len(), WIRE_HEADER_SIZE + 24 + 5);
	}

	#[test]
	fn test_wire_round_trip() {
		let sdata = sample();
		let decoded = deserialize(&serialize(&sdata).unwrap()).unwrap();
		assert_eq!(decoded, sdata);
		assert_eq!(decoded.total_logical_count(), 305);

		let expected: Vec<u64> = to_dense(&sdata).unwrap().iter().map(|v| v.to_bits()).collect();
		let actual: Vec<u64> = decoded.iter().map(|v| v.to_bits()).collect();
		assert_eq!(actual, expected);
	}

	#[test]
	fn test_empty_round_trip() {
		let sdata = from_dense(&[], None).unwrap();
		let bytes = serialize(&sdata).unwrap();
		assert_eq!(bytes.len(), WIRE_HEADER_SIZE);
		let decoded = deserialize(&bytes).unwrap();
		assert_eq!(decoded.total_logical_count(), 0);
		assert_eq!(decoded.unique_run_count(), 0);
	}

	#[test]
	fn test_truncated_input_rejected() {
		let bytes = serialize(&sample()).unwrap();
		for cut in [0, 3, WIRE_HEADER_SIZE - 1, WIRE_HEADER_SIZE + 10, bytes.len() - 1] {
			let result = deserialize(&bytes[..cut]);
			assert!(
				matches!(result, Err(SvecError::MalformedWireFormat(_))),
				"cut at {} gave {:?}",
				cut,
				result
			);
		}
	}

	#[test]
	fn test_trailing_bytes_rejected() {
		let mut bytes = serialize(&sample()).unwrap();
		bytes.push(0);
		assert!(matches!(deserialize(&bytes), Err(SvecError::MalformedWireFormat(_))));
	}

	#[test]
	fn test_inconsistent_header_rejected() {
		let mut bytes = serialize(&sample()).unwrap();
		// claim one more logical value than the runs hold
		bytes[8..12].copy_from_slice(&306u32.to_be_bytes());
		assert!(matches!(deserialize(&bytes), Err(SvecError::InvalidSparseData(_))));
	}

	#[test]
	fn test_streamed_records() {
		let first = sample();
		let second = from_dense(&[2.0, 2.0, 3.0], None).unwrap();
		let mut stream = Vec::new();
		write_sparse_data(&mut stream, &first).unwrap();
		write_sparse_data(&mut stream, &second).unwrap();

		let mut reader = io::Cursor::new(stream);
		assert_eq!(read_sparse_data(&mut reader).unwrap(), first);
		assert_eq!(read_sparse_data(&mut reader).unwrap(), second);
	}
}

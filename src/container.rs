use crate::error::SvecError;
use crate::svec::SparseVector;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

const MAGIC_NUMBER: &[u8; 4] = b"SVC1";
const VERSION: u8 = 1;
const RECORD_HEADER_SIZE: u64 = 4 + 4;

/// Writes `vectors` as a container: magic, version, then one
/// `len | crc32 | wire record` entry per vector.
pub fn write_svec_container<W: Write>(
	writer: &mut W,
	vectors: &[SparseVector],
) -> Result<u64, SvecError> {
	let mut total_bytes_written = 0;

	writer.write_all(MAGIC_NUMBER)?;
	writer.write_u8(VERSION)?;
	total_bytes_written += 5;

	for svec in vectors {
		let record = svec.to_wire()?;
		let len = u32::try_from(record.len())
			.map_err(|_| SvecError::CountOverflow { field: "record length", value: record.len() as u64 })?;
		writer.write_u32::<LittleEndian>(len)?;
		writer.write_u32::<LittleEndian>(crc32fast::hash(&record))?;
		writer.write_all(&record)?;
		total_bytes_written += RECORD_HEADER_SIZE + record.len() as u64;
	}

	log::debug!("wrote {} vectors, {} bytes", vectors.len(), total_bytes_written);
	Ok(total_bytes_written)
}

pub fn read_svec_container<R: Read>(reader: &mut R) -> Result<Vec<SparseVector>, SvecError> {
	let mut magic = [0u8; 4];
	reader.read_exact(&mut magic).map_err(|_| invalid("Missing magic number"))?;
	if magic != *MAGIC_NUMBER {
		return Err(invalid("Invalid magic number"));
	}

	let version = reader.read_u8().map_err(|_| invalid("Missing version"))?;
	if version != VERSION {
		return Err(SvecError::InvalidFormat(format!("Unsupported version: {}", version)));
	}

	let mut vectors = Vec::new();
	loop {
		let mut len_bytes = [0u8; 4];
		match reader.read(&mut len_bytes[..1]) {
			Ok(0) => break,
			Ok(_) => {}
			Err(e) => return Err(e.into()),
		}
		let record_id = vectors.len();
		let truncated =
			|_: std::io::Error| SvecError::InvalidFormat(format!("Truncated record {}", record_id));

		reader.read_exact(&mut len_bytes[1..]).map_err(truncated)?;
		let len = u32::from_le_bytes(len_bytes);
		let expected_crc = reader.read_u32::<LittleEndian>().map_err(truncated)?;

		let mut record = Vec::new();
		reader.by_ref().take(len as u64).read_to_end(&mut record)?;
		if record.len() != len as usize {
			return Err(SvecError::InvalidFormat(format!("Truncated record {}", record_id)));
		}
		if crc32fast::hash(&record) != expected_crc {
			return Err(SvecError::ChecksumMismatch { record: record_id });
		}

		vectors.push(SparseVector::from_wire(&record)?);
	}

	log::debug!("read {} vectors", vectors.len());
	Ok(vectors)
}

fn invalid(reason: &str) -> SvecError {
	SvecError::InvalidFormat(reason.to_string())
}

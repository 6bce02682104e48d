use crate::config::SvecConfig;
use crate::error::SvecError;
use crate::svec::SparseVector;
use crate::text;
use crate::value::is_nvp;
use crate::wire::WIRE_HEADER_SIZE;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;

/// Summary of a batch of vectors.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BatchStats {
	pub vectors: usize,
	pub logical_values: u64,
	pub unique_runs: u64,
	pub null_values: u64,
	pub dense_bytes: u64,
	pub encoded_bytes: u64,
	pub ratio: f64,
}

/// Parses one svec literal per line, in parallel, keeping input order.
pub fn parse_literals(input: &str, config: &SvecConfig) -> Result<Vec<SparseVector>, SvecError> {
	convert_lines(input, config, |line| line.parse::<SparseVector>())
}

/// Parses one dense array literal per line and run-merges each.
pub fn parse_dense_lines(input: &str, config: &SvecConfig) -> Result<Vec<SparseVector>, SvecError> {
	convert_lines(input, config, |line| {
		let values = text::parse_dense_array(line)?;
		SparseVector::from_options(&values)
	})
}

pub fn render_literals(
	vectors: &[SparseVector],
	config: &SvecConfig,
) -> Result<Vec<String>, SvecError> {
	let pool = build_pool(config)?;
	Ok(pool.install(|| vectors.par_iter().map(|svec| svec.to_string()).collect()))
}

pub fn render_dense(
	vectors: &[SparseVector],
	config: &SvecConfig,
) -> Result<Vec<Vec<Option<f64>>>, SvecError> {
	let pool = build_pool(config)?;
	pool.install(|| vectors.par_iter().map(|svec| svec.to_options()).collect())
}

pub fn batch_stats(vectors: &[SparseVector]) -> BatchStats {
	let mut stats = BatchStats {
		vectors: vectors.len(),
		logical_values: 0,
		unique_runs: 0,
		null_values: 0,
		dense_bytes: 0,
		encoded_bytes: 0,
		ratio: 0.0,
	};

	for svec in vectors {
		let data = svec.data();
		stats.logical_values += data.total_logical_count();
		stats.unique_runs += data.unique_run_count() as u64;
		stats.null_values += data
			.runs()
			.filter(|run| is_nvp(run.value))
			.map(|run| run.count)
			.sum::<u64>();
		let payload = data.values_bytes().len() + data.runs_bytes().len();
		stats.encoded_bytes += (WIRE_HEADER_SIZE + payload) as u64;
	}
	stats.dense_bytes = stats.logical_values * std::mem::size_of::<f64>() as u64;
	if stats.encoded_bytes > 0 {
		stats.ratio = stats.dense_bytes as f64 / stats.encoded_bytes as f64;
	}
	stats
}

fn convert_lines<F>(
	input: &str,
	config: &SvecConfig,
	convert: F,
) -> Result<Vec<SparseVector>, SvecError>
where
	F: Fn(&str) -> Result<SparseVector, SvecError> + Sync,
{
	let lines: Vec<(usize, &str)> = input
		.lines()
		.enumerate()
		.map(|(i, line)| (i + 1, line.trim()))
		.filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
		.collect();
	log::debug!("converting {} lines on {} threads", lines.len(), config.threads);

	let pool = build_pool(config)?;
	let pb = progress_bar(lines.len() as u64, config.progress);

	let results: Vec<Result<SparseVector, SvecError>> = pool.install(|| {
		lines
			.par_iter()
			.map(|&(line_no, line)| {
				let svec = convert(line).map_err(|e| SvecError::AtLine { line: line_no, source: Box::new(e) });
				pb.inc(1);
				svec
			})
			.collect()
	});
	pb.finish_and_clear();

	// results are in input order, so the first error is the earliest bad line
	results.into_iter().collect()
}

fn build_pool(config: &SvecConfig) -> Result<rayon::ThreadPool, SvecError> {
	rayon::ThreadPoolBuilder::new()
		.num_threads(config.threads)
		.build()
		.map_err(|e| SvecError::ConfigError(format!("Cannot build thread pool: {}", e)))
}

fn progress_bar(len: u64, enabled: bool) -> ProgressBar {
	if !enabled {
		return ProgressBar::hidden();
	}
	let pb = ProgressBar::new(len);
	if let Ok(style) = ProgressStyle::default_bar()
		.template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] Vectors {pos}/{len} ({eta})")
	{
		pb.set_style(style.progress_chars("#>-"));
	}
	pb
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config() -> SvecConfig {
		SvecConfig::default().with_threads(2)
	}

	#[test]
	fn test_parse_literals_keeps_order_and_skips_comments() {
		let input = "# header\n{1}:{1}\n\n{2}:{2}\n  {3}:{3}  \n";
		let vectors = parse_literals(input, &config()).unwrap();
		assert_eq!(vectors.len(), 3);
		for (i, svec) in vectors.iter().enumerate() {
			assert_eq!(svec.len(), i as u64 + 1);
			assert_eq!(svec.to_array().unwrap()[0], i as f64 + 1.0);
		}
	}

	#[test]
	fn test_errors_carry_line_numbers() {
		let input = "{1}:{1}\n{1,2}:{3}\n";
		match parse_literals(input, &config()) {
			Err(SvecError::AtLine { line, source }) => {
				assert_eq!(line, 2);
				assert!(matches!(*source, SvecError::RunCountMismatch { .. }));
			}
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn test_earliest_bad_line_wins() {
		let mut input = String::from("{1}:{1}\n{0}:{1}\n");
		for _ in 0..2000 {
			input.push_str("{1,2}:{1}\n");
		}
		let config = SvecConfig::default().with_threads(8);
		for _ in 0..10 {
			match parse_literals(&input, &config) {
				Err(SvecError::AtLine { line, source }) => {
					assert_eq!(line, 2);
					assert!(matches!(*source, SvecError::InvalidRunLength(0)));
				}
				other => panic!("unexpected result: {:?}", other),
			}
		}
	}

	#[test]
	fn test_dense_lines_are_merged() {
		let vectors = parse_dense_lines("{0,0,0,1}\n{NULL,NULL}\n", &config()).unwrap();
		assert_eq!(vectors[0].to_string(), "{3,1}:{0,1}");
		assert_eq!(vectors[1].to_string(), "{2}:{NVP}");

		let dense = render_dense(&vectors, &config()).unwrap();
		assert_eq!(dense[1], vec![None, None]);
	}

	#[test]
	fn test_render_literals() {
		let vectors = parse_literals("{2,1}:{5,NULL}\n{}:{}", &config()).unwrap();
		let rendered = render_literals(&vectors, &config()).unwrap();
		assert_eq!(rendered, vec!["{2,1}:{5,NVP}".to_string(), "{}:{}".to_string()]);
	}

	#[test]
	fn test_batch_stats() {
		let vectors = parse_literals("{100,2}:{0,NVP}\n{1}:{3}", &config()).unwrap();
		let stats = batch_stats(&vectors);
		assert_eq!(stats.vectors, 2);
		assert_eq!(stats.logical_values, 103);
		assert_eq!(stats.unique_runs, 3);
		assert_eq!(stats.null_values, 2);
		assert_eq!(stats.dense_bytes, 824);
		// (20 + 16 + 2) + (20 + 8 + 1)
		assert_eq!(stats.encoded_bytes, 67);
		assert!(stats.ratio > 1.0);
	}
}

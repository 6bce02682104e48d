use crate::config::{OutputFormat, SvecConfig};
use crate::container;
use crate::error::SvecError;
use crate::pipeline;
use crate::svec::SparseVector;
use crate::text;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(author, version, about, long_about = "Run-length encoded sparse float vectors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Number of threads to use (default: all available cores)
    #[arg(short, long, global = true)]
    threads: Option<usize>,

    /// Show a progress bar while converting
    #[arg(long, global = true)]
    progress: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Packs svec literals, one per line, into a container
    Pack {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
    /// Run-merges dense array literals, one per line, into a container
    FromDense {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
    /// Prints every vector of a container as an svec literal
    Unpack {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output format [text, json]
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
    /// Prints every vector of a container as a dense array
    Expand {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output format [text, json]
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
    /// Prints size statistics for a container
    Info {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output format [text, json]
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

pub fn run() -> Result<(), SvecError> {
    let cli = Cli::parse();
    let config = SvecConfig::default()
        .with_threads(cli.threads.unwrap_or_else(num_cpus::get))
        .with_progress(cli.progress);

    match cli.command {
        Commands::Pack { input, output } => {
            let text = fs::read_to_string(&input)?;
            let start = Instant::now();
            let vectors = pipeline::parse_literals(&text, &config)?;
            write_container(&vectors, &output, start)?;
        }
        Commands::FromDense { input, output } => {
            let text = fs::read_to_string(&input)?;
            let start = Instant::now();
            let vectors = pipeline::parse_dense_lines(&text, &config)?;
            write_container(&vectors, &output, start)?;
        }
        Commands::Unpack { input, format } => {
            let vectors = read_container(&input)?;
            let config = config.with_format(format);
            let mut out = BufWriter::new(io::stdout().lock());
            match config.format {
                OutputFormat::Text => {
                    for line in pipeline::render_literals(&vectors, &config)? {
                        writeln!(out, "{}", line)?;
                    }
                }
                OutputFormat::Json => {
                    let docs: Vec<Value> = vectors.iter().map(svec_to_json).collect();
                    serde_json::to_writer_pretty(&mut out, &docs)?;
                    writeln!(out)?;
                }
            }
            out.flush()?;
        }
        Commands::Expand { input, format } => {
            let vectors = read_container(&input)?;
            let config = config.with_format(format);
            let dense = pipeline::render_dense(&vectors, &config)?;
            let mut out = BufWriter::new(io::stdout().lock());
            match config.format {
                OutputFormat::Text => {
                    for values in &dense {
                        writeln!(out, "{}", text::render_dense_array(values))?;
                    }
                }
                OutputFormat::Json => {
                    let docs: Vec<Value> = dense.iter().map(|v| dense_to_json(v)).collect();
                    serde_json::to_writer(&mut out, &docs)?;
                    writeln!(out)?;
                }
            }
            out.flush()?;
        }
        Commands::Info { input, format } => {
            let vectors = read_container(&input)?;
            let stats = pipeline::batch_stats(&vectors);
            match format {
                OutputFormat::Text => {
                    println!("Container: {}", input.display());
                    println!("  Vectors:          {}", stats.vectors);
                    println!("  Logical Values:   {}", stats.logical_values);
                    println!("  Unique Runs:      {}", stats.unique_runs);
                    println!("  NULL Values:      {}", stats.null_values);
                    println!("  Dense Size:       {} bytes", stats.dense_bytes);
                    println!("  Encoded Size:     {} bytes", stats.encoded_bytes);
                    println!("  Ratio:            {:.2}x", stats.ratio);
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
            }
        }
    }

    Ok(())
}

/// One vector as `{"dimension", "counts", "values"}`.
pub fn svec_to_json(svec: &SparseVector) -> Value {
    let counts: Vec<i64> = crate::convert::run_lengths(svec.data());
    let values: Vec<Value> = svec
        .data()
        .unique_values()
        .map(|v| float_to_json(crate::value::to_option(v)))
        .collect();
    json!({
        "dimension": svec.dimension(),
        "counts": counts,
        "values": values,
    })
}

pub fn dense_to_json(values: &[Option<f64>]) -> Value {
    Value::Array(values.iter().map(|v| float_to_json(*v)).collect())
}

/// JSON has no NaN or infinities, so those fall back to their text spelling.
pub fn float_to_json(value: Option<f64>) -> Value {
    match value {
        None => Value::Null,
        Some(v) => match serde_json::Number::from_f64(v) {
            Some(n) => Value::Number(n),
            None => Value::String(text::format_float8(v)),
        },
    }
}

fn write_container(
    vectors: &[SparseVector],
    output: &Path,
    start: Instant,
) -> Result<(), SvecError> {
    let mut out_file = BufWriter::new(File::create(output)?);
    let written = container::write_svec_container(&mut out_file, vectors)?;
    out_file.flush()?;
    let stats = pipeline::batch_stats(vectors);

    println!("Packed {} vectors into {}", stats.vectors, output.display());
    println!("  Logical Values:   {}", stats.logical_values);
    println!("  Container Size:   {} bytes", written);
    println!("  Ratio:            {:.2}x", stats.ratio);
    println!("  Elapsed Time:     {:.2?}", start.elapsed());
    Ok(())
}

fn read_container(input: &Path) -> Result<Vec<SparseVector>, SvecError> {
    let mut in_file = BufReader::new(File::open(input)?);
    container::read_svec_container(&mut in_file)
}

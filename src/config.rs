use crate::error::SvecError;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct SvecConfig {
    pub threads: usize,
    pub format: OutputFormat,
    pub progress: bool,
}

impl Default for SvecConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            format: OutputFormat::Text,
            progress: false,
        }
    }
}

impl SvecConfig {
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }
}

impl FromStr for OutputFormat {
    type Err = SvecError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(SvecError::ConfigError(format!("Invalid output format: {}", s))),
        }
    }
}

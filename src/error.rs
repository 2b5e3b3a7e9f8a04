use std::process::ExitStatus;

use thiserror::Error;

pub type VisualizerResult<T> = Result<T, VisualizerError>;

/// Errors raised by the analysis, render and encode stages.
#[derive(Error, Debug)]
pub enum VisualizerError {
    /// Invalid dimension, rate or range values, rejected before any work starts
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Requested time range lies outside the signal, or the signal is empty
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// Silent input, nothing meaningful to render
    #[error("degenerate signal: {0}")]
    DegenerateSignal(String),

    /// A render/write worker failed partway through its frame block
    #[error("worker {worker} failed: {source}")]
    WorkerFailure {
        worker: usize,
        #[source]
        source: Box<VisualizerError>,
    },

    /// An external encoder process exited unsuccessfully
    #[error("{tool} exited with {status}: {stderr}")]
    ExternalTool {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl VisualizerError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn invalid_range(msg: impl Into<String>) -> Self {
        Self::InvalidRange(msg.into())
    }

    pub fn degenerate(msg: impl Into<String>) -> Self {
        Self::DegenerateSignal(msg.into())
    }

    pub fn worker(worker: usize, source: VisualizerError) -> Self {
        Self::WorkerFailure {
            worker,
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(VisualizerError::configuration("x")
            .to_string()
            .starts_with("configuration error:"));
        assert!(VisualizerError::invalid_range("x")
            .to_string()
            .starts_with("invalid range:"));
        assert!(VisualizerError::degenerate("x")
            .to_string()
            .starts_with("degenerate signal:"));
    }

    #[test]
    fn worker_failure_keeps_source() {
        let err = VisualizerError::worker(3, VisualizerError::configuration("boom"));
        let msg = err.to_string();
        assert!(msg.contains("worker 3"));
        assert!(msg.contains("boom"));
        assert!(std::error::Error::source(&err).is_some());
    }
}

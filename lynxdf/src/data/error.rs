use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while decoding a raw directory.
///
/// Every variant is fatal for the file it names; no partial result is kept.
#[derive(Debug, Error)]
pub enum RawDataError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is missing", .path.display())]
    MissingFile { path: PathBuf },

    #[error("unsupported record width of {width} bytes in {}", .path.display())]
    UnsupportedFormat { path: PathBuf, width: u64 },

    #[error("scan {scan} in {} carries the pre-calibrated flag, which is not supported", .path.display())]
    UnsupportedEncoding { path: PathBuf, scan: usize },

    #[error("corrupt file {}: {reason}", .path.display())]
    CorruptFile { path: PathBuf, reason: String },

    #[error("format assumption violated in {}: {reason}", .path.display())]
    FormatAssumption { path: PathBuf, reason: String },

    #[error("failed to build decode thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl RawDataError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RawDataError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        RawDataError::CorruptFile {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn assumption(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        RawDataError::FormatAssumption {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RawDataError>;

/// Reads a whole file into memory, tagging failures with the path.
pub fn read_file(path: &std::path::Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(RawDataError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    std::fs::read(path).map_err(|e| RawDataError::io(path, e))
}

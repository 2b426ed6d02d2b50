//! Error types for assigngen.
//!
//! Library crates use [`AssignGenError`] via `thiserror` for failures that
//! abort a run. Failures that a stage recovers from locally have their own
//! types ([`ScrapeFailure`], [`TranslationFailure`]) and never convert into
//! [`AssignGenError`].
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for pipeline-fatal failures.
#[derive(Debug, thiserror::Error)]
pub enum AssignGenError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The search request could not complete.
    #[error("search failed: {0}")]
    Search(String),

    /// The search completed but produced no usable URLs.
    #[error("no URLs found for \"{query}\"")]
    NoResults { query: String },

    /// HTTP client construction error.
    #[error("network error: {0}")]
    Network(String),

    /// Document rendering error.
    #[error("render error: {0}")]
    Render(String),

    /// Writing an output file failed.
    #[error("failed to write {path:?}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Filesystem I/O error outside of output persistence.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Another run is still in flight.
    #[error("a run is already in progress")]
    Busy,

    /// The background task running the pipeline panicked or was cancelled.
    #[error("pipeline worker stopped: {0}")]
    Worker(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AssignGenError>;

impl AssignGenError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a search error from any displayable message.
    pub fn search(msg: impl Into<String>) -> Self {
        Self::Search(msg.into())
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` raised while writing an output file.
    pub fn persist(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persist {
            path: path.into(),
            source,
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Stage-local failures
// ---------------------------------------------------------------------------

/// Why a single URL yielded no content. Recorded, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScrapeFailure {
    /// Host resolves to a private, loopback or otherwise reserved address.
    #[error("blocked host: {0}")]
    Blocked(String),

    /// Transport-level failure (DNS, connect, timeout).
    #[error("request failed: {0}")]
    Network(String),

    /// Server answered with a non-success status.
    #[error("HTTP {0}")]
    Status(u16),

    /// The response body could not be read.
    #[error("body read failed: {0}")]
    Body(String),
}

/// Why a single block kept its source text. Recorded, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslationFailure {
    /// Transport-level failure.
    #[error("request failed: {0}")]
    Request(String),

    /// Backend answered with a non-success status.
    #[error("HTTP {0}")]
    Status(u16),

    /// Backend response did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = AssignGenError::config("bad endpoint");
        assert_eq!(err.to_string(), "config error: bad endpoint");

        let err = AssignGenError::NoResults {
            query: "quantum computing".into(),
        };
        assert_eq!(err.to_string(), "no URLs found for \"quantum computing\"");

        let err = AssignGenError::search("HTTP 503");
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[test]
    fn persist_error_names_path() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = AssignGenError::persist("/out/urls.txt", io);
        let msg = err.to_string();
        assert!(msg.contains("urls.txt"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn stage_failures_display() {
        assert_eq!(ScrapeFailure::Status(404).to_string(), "HTTP 404");
        assert_eq!(
            TranslationFailure::Decode("empty".into()).to_string(),
            "unexpected response: empty"
        );
    }
}

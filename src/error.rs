//! Error types for the codesolver library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SolverError`]: **Session-level**: ingestion or the solve request
//!   failed. Returned from [`crate::ingest_path`] and
//!   [`crate::solve_problem`], and a failed solve moves the
//!   [`crate::Session`] into its `Error` phase.
//!
//! * [`ExportError`]: **Local**: building or writing one export artifact
//!   failed. The caller reports it as an alert; the session and its result
//!   are left exactly as they were.
//!
//! [`ProviderError`] sits one layer lower and describes what went wrong at
//! the remote boundary. It never reaches the user: the solve adapter logs it
//! and replaces it with [`SolverError::SolveFailed`].

use std::path::PathBuf;
use thiserror::Error;

/// User-facing message for any failed solve request.
pub const SOLVE_FAILED_MESSAGE: &str = "Có lỗi xảy ra khi xử lý bài tập. Vui lòng thử lại.";

/// Shown when a failure arrives without a message of its own.
pub const GENERIC_ERROR_MESSAGE: &str = "Đã có lỗi xảy ra.";

/// Alert text for a failed test-case archive.
pub const ZIP_FAILED_MESSAGE: &str = "Không thể tạo file zip.";

/// Alert text for a failed Word report.
pub const REPORT_FAILED_MESSAGE: &str = "Lỗi khi tạo file word.";

/// Errors that reach the session: ingestion failures and solve failures.
#[derive(Debug, Error)]
pub enum SolverError {
    // ── Ingestion errors ──────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but reading it failed part way.
    #[error("Failed to read '{name}': {reason}")]
    FileReadFailed { name: String, reason: String },

    /// The file has no content.
    #[error("File '{name}' is empty")]
    EmptyFile { name: String },

    /// The file is neither an image nor a PDF.
    #[error("Unsupported file '{name}' ({mime}): only images and PDF files are accepted")]
    UnsupportedFileType { name: String, mime: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The encoded payload is not a `data:<mime>;base64,<payload>` URL.
    #[error("Malformed data URL: {0}")]
    InvalidDataUrl(String),

    // ── Solve errors ──────────────────────────────────────────────────────
    /// The solve request failed. The message is the only thing shown to the
    /// user; the underlying cause is logged, not carried.
    #[error("{message}")]
    SolveFailed { message: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SolverError {
    /// The generic, localised solve failure.
    pub fn solve_failed() -> Self {
        SolverError::SolveFailed {
            message: SOLVE_FAILED_MESSAGE.to_string(),
        }
    }
}

/// What went wrong at the remote boundary.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport failure: DNS, TLS, connection reset, timeout.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The API answered with a non-success status.
    #[error("API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request was refused by the model's safety filter.
    #[error("Request blocked: {reason}")]
    Blocked { reason: String },

    /// The API answered but produced no text candidate.
    #[error("Response contained no text")]
    EmptyResponse,

    /// The response body was not the JSON envelope we expected.
    #[error("Malformed API response: {0}")]
    Malformed(String),
}

/// Which export produced an [`ExportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    TestArchive,
    Report,
}

impl std::fmt::Display for ExportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportKind::TestArchive => write!(f, "test archive"),
            ExportKind::Report => write!(f, "report"),
        }
    }
}

/// A failure local to one export action.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Building the artifact in memory failed.
    #[error("Failed to build {kind}: {detail}")]
    BuildFailed { kind: ExportKind, detail: String },

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    /// The alert text the user sees for this failure.
    pub fn alert_message(&self) -> &'static str {
        match self {
            ExportError::BuildFailed {
                kind: ExportKind::TestArchive,
                ..
            } => ZIP_FAILED_MESSAGE,
            ExportError::BuildFailed {
                kind: ExportKind::Report,
                ..
            } => REPORT_FAILED_MESSAGE,
            ExportError::WriteFailed { .. } => "Không thể lưu file.",
        }
    }
}

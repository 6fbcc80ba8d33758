//! Pipeline stages between a problem file and a [`crate::SolutionResult`].
//!
//! Each submodule implements exactly one transformation step, so each is
//! testable without the others or a live model.
//!
//! ## Data Flow
//!
//! ```text
//! ingest ──▶ encode ──▶ provider ──▶ postprocess
//! (path/URL/paste) (data URL) (Gemini)  (schema check + cleanup)
//! ```
//!
//! 1. [`ingest`]     : read the file, sniff its MIME type, reject non-image/PDF
//! 2. [`encode`]     : build the data URL and strip it back to bare base64
//! 3. [`crate::provider`]: the only stage with network I/O
//! 4. [`postprocess`]: validate the JSON answer, apply fallbacks, strip fences

pub mod encode;
pub mod ingest;
pub mod postprocess;

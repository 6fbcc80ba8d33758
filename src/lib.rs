//! # codesolver
//!
//! Solve competitive programming problems from a picture or a PDF of the
//! statement using Gemini.
//!
//! One request per solve: the file is sent inline with a JSON response
//! schema, and the answer comes back as an explanation in Vietnamese
//! Markdown, a complete C++ or Python program, and a set of test cases.
//! The result can then be exported as a source file, a zip of test cases,
//! or a Word report.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image / PDF
//!  │
//!  ├─ 1. Ingest   read a path, URL or stdin; sniff and check the MIME type
//!  ├─ 2. Encode   bytes → data URL → bare base64 payload
//!  ├─ 3. Solve    one generateContent call with a response schema
//!  ├─ 4. Polish   schema check, field fallbacks, strip code fences
//!  └─ 5. Export   solution.cpp|py, test_cases.zip, Giai_bai_tap_report.docx
//! ```
//!
//! [`Session`] wraps steps 1–4 in a small state machine
//! (`Idle → Analyzing → Solved | Error`) that drops late responses.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use codesolver::{export_code, ingest_path, IngestSource, Language, Session, SolverConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Key from API_KEY / GEMINI_API_KEY, or baked in at build time.
//!     let config = SolverConfig::default();
//!     let mut session = Session::new();
//!     session.select_file(ingest_path("bai1.png", IngestSource::Picker).await?);
//!     session.set_language(Language::Python);
//!     session.solve(&config).await;
//!     if let Some(result) = session.result() {
//!         let code = export_code(result, session.language());
//!         std::fs::write(&code.file_name, &code.bytes)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `codesolver` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! codesolver = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod export;
pub mod install;
pub mod model;
pub mod pipeline;
pub mod present;
pub mod progress;
pub mod prompts;
pub mod provider;
pub mod session;
pub mod solve;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{resolve_api_key, SolverConfig, SolverConfigBuilder};
pub use error::{ExportError, ExportKind, ProviderError, SolverError};
pub use export::{
    export_code, export_report, export_test_archive, report_blocks, write_artifact, Artifact,
    ReportBlock,
};
pub use install::{InstallOutcome, InstallPrompt, InstallPromptSlot};
pub use model::{Language, SolutionResult, TestCase, UploadedFile};
pub use pipeline::ingest::{ingest_bytes, ingest_path, ingest_url, IngestSource};
pub use present::{render_markdown, test_case_cards, Block, Span, TestCaseCard};
pub use progress::{NoopObserver, Observer, SessionObserver};
pub use provider::{GeminiProvider, GenerateRequest, SolveProvider};
pub use session::{Phase, Session, SolveTicket};
pub use solve::{build_request, solve_encoded, solve_path, solve_problem, solve_sync};

//! Observer trait for session lifecycle events.
//!
//! Attach an [`Arc<dyn SessionObserver>`] with
//! [`crate::Session::with_observer`] to hear about each solve as it starts
//! and resolves. The CLI uses it to drive its spinner; an embedder could
//! forward the events to a UI channel instead.
//!
//! # Example
//!
//! ```rust
//! use codesolver::{Session, SessionObserver, SolutionResult};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingObserver {
//!     solved: AtomicUsize,
//! }
//!
//! impl SessionObserver for CountingObserver {
//!     fn on_solve_complete(&self, result: &SolutionResult) {
//!         self.solved.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{} test cases", result.test_cases.len());
//!     }
//! }
//!
//! let observer = Arc::new(CountingObserver { solved: AtomicUsize::new(0) });
//! let session = Session::new().with_observer(observer as Arc<dyn SessionObserver>);
//! ```

use crate::model::{Language, SolutionResult};
use std::sync::Arc;

/// Called by [`crate::Session`] on each lifecycle transition of a solve.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait SessionObserver: Send + Sync {
    /// Called when the session enters `Analyzing`.
    ///
    /// # Arguments
    /// * `request_id`: id of the dispatched request
    /// * `file_name` : name of the file being solved
    /// * `language`  : target language of the request
    fn on_solve_start(&self, request_id: u64, file_name: &str, language: Language) {
        let _ = (request_id, file_name, language);
    }

    /// Called when the session enters `Solved`.
    fn on_solve_complete(&self, result: &SolutionResult) {
        let _ = result;
    }

    /// Called when the session enters `Error`.
    ///
    /// # Arguments
    /// * `message`: the user-facing message now held by the session
    fn on_solve_error(&self, message: &str) {
        let _ = message;
    }

    /// Called when a response arrives for a request the session no longer
    /// waits for (the file was replaced or the session was reset).
    fn on_stale_response(&self, request_id: u64) {
        let _ = request_id;
    }
}

/// Type alias for a shared observer.
pub type Observer = Arc<dyn SessionObserver>;

/// No-op implementation.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

//! The application state machine: one file, one language, one result.
//!
//! ```text
//!            select_file / reset                 begin_solve
//!   ┌──────────────────────────────┐   Idle ─────────────────▶ Analyzing
//!   │                              │    ▲                        │   │
//!   ▼                              │    │             complete Ok│   │complete Err
//! (any) ───────────────────────────┘    │                        ▼   ▼
//!                                       │                    Solved  Error
//!                                       └── begin_solve (retry) ─┴─────┘
//! ```
//!
//! Only the session writes lifecycle state. Each dispatched request gets a
//! [`SolveTicket`] tagged with a fresh request id; an outcome whose ticket no
//! longer matches the request the session is waiting for is discarded, so a
//! late answer can never overwrite a newer file or a reset.

use crate::config::SolverConfig;
use crate::error::{SolverError, GENERIC_ERROR_MESSAGE};
use crate::model::{Language, SolutionResult, UploadedFile};
use crate::progress::Observer;
use crate::solve::solve_problem;
use tracing::{debug, info, warn};

/// Observable lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Analyzing,
    Solved,
    Error,
}

#[derive(Debug, Clone, PartialEq, Default)]
enum Lifecycle {
    #[default]
    Idle,
    Analyzing { request_id: u64 },
    Solved(SolutionResult),
    Error(String),
}

/// Proof that a solve was dispatched, and what it was dispatched with.
#[derive(Debug, Clone)]
pub struct SolveTicket {
    request_id: u64,
    file: UploadedFile,
    language: Language,
}

impl SolveTicket {
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    pub fn file(&self) -> &UploadedFile {
        &self.file
    }

    pub fn language(&self) -> Language {
        self.language
    }
}

/// A single, in-memory solving session.
#[derive(Default)]
pub struct Session {
    file: Option<UploadedFile>,
    language: Language,
    lifecycle: Lifecycle,
    last_request_id: u64,
    observer: Option<Observer>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("file", &self.file.as_ref().map(|file| &file.name))
            .field("language", &self.language)
            .field("phase", &self.phase())
            .field("last_request_id", &self.last_request_id)
            .finish()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        match self.lifecycle {
            Lifecycle::Idle => Phase::Idle,
            Lifecycle::Analyzing { .. } => Phase::Analyzing,
            Lifecycle::Solved(_) => Phase::Solved,
            Lifecycle::Error(_) => Phase::Error,
        }
    }

    pub fn file(&self) -> Option<&UploadedFile> {
        self.file.as_ref()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// The result, present only in [`Phase::Solved`].
    pub fn result(&self) -> Option<&SolutionResult> {
        match &self.lifecycle {
            Lifecycle::Solved(result) => Some(result),
            _ => None,
        }
    }

    /// The error message, present only in [`Phase::Error`].
    pub fn error_message(&self) -> Option<&str> {
        match &self.lifecycle {
            Lifecycle::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Whether the solve action is enabled.
    pub fn can_solve(&self) -> bool {
        self.file.is_some() && self.phase() != Phase::Analyzing
    }

    // ── Transitions ──────────────────────────────────────────────────────

    /// Replace the current file. Any result, error or pending request is dropped.
    pub fn select_file(&mut self, file: UploadedFile) {
        info!("Selected '{}' ({})", file.name, file.mime_type);
        self.file = Some(file);
        self.lifecycle = Lifecycle::Idle;
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// Enter `Analyzing` and hand out a ticket for the request.
    ///
    /// Returns `None`, with no transition, when there is no file or a
    /// request is already in flight.
    pub fn begin_solve(&mut self) -> Option<SolveTicket> {
        if !self.can_solve() {
            debug!("Solve ignored in phase {:?} (file: {})", self.phase(), self.file.is_some());
            return None;
        }
        let file = self.file.clone()?;
        self.last_request_id += 1;
        let request_id = self.last_request_id;
        self.lifecycle = Lifecycle::Analyzing { request_id };

        if let Some(ref obs) = self.observer {
            obs.on_solve_start(request_id, &file.name, self.language);
        }
        Some(SolveTicket {
            request_id,
            file,
            language: self.language,
        })
    }

    /// Apply the outcome of a dispatched request.
    ///
    /// Returns `false` when the ticket is stale and the outcome was discarded.
    pub fn complete(
        &mut self,
        ticket: &SolveTicket,
        outcome: Result<SolutionResult, SolverError>,
    ) -> bool {
        let waiting = matches!(
            self.lifecycle,
            Lifecycle::Analyzing { request_id } if request_id == ticket.request_id
        );
        if !waiting {
            warn!("Discarding response for superseded request #{}", ticket.request_id);
            if let Some(ref obs) = self.observer {
                obs.on_stale_response(ticket.request_id);
            }
            return false;
        }

        match outcome {
            Ok(result) => {
                if let Some(ref obs) = self.observer {
                    obs.on_solve_complete(&result);
                }
                self.lifecycle = Lifecycle::Solved(result);
            }
            Err(e) => {
                let mut message = e.to_string();
                if message.trim().is_empty() {
                    message = GENERIC_ERROR_MESSAGE.to_string();
                }
                if let Some(ref obs) = self.observer {
                    obs.on_solve_error(&message);
                }
                self.lifecycle = Lifecycle::Error(message);
            }
        }
        true
    }

    /// Run one full solve: dispatch, await, apply.
    ///
    /// Returns the resulting phase, or `None` when the solve was not
    /// dispatched.
    pub async fn solve(&mut self, config: &SolverConfig) -> Option<Phase> {
        let ticket = self.begin_solve()?;
        let outcome = solve_problem(ticket.file(), ticket.language(), config).await;
        self.complete(&ticket, outcome);
        Some(self.phase())
    }

    /// Back to `Idle` with nothing selected.
    pub fn reset(&mut self) {
        debug!("Session reset from {:?}", self.phase());
        self.file = None;
        self.lifecycle = Lifecycle::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TestCase;

    fn png(name: &str) -> UploadedFile {
        UploadedFile {
            name: name.into(),
            mime_type: "image/png".into(),
            encoded_data: "data:image/png;base64,AA==".into(),
            preview_url: "data:image/png;base64,AA==".into(),
        }
    }

    fn solution(code: &str) -> SolutionResult {
        SolutionResult {
            markdown: "# x".into(),
            raw_code: code.into(),
            test_cases: vec![TestCase {
                input: "1".into(),
                output: "1".into(),
            }],
        }
    }

    #[test]
    fn starts_idle_with_default_language() {
        let s = Session::new();
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.language(), Language::Cpp);
        assert!(s.file().is_none());
        assert!(!s.can_solve());
    }

    #[test]
    fn solve_without_file_is_noop() {
        let mut s = Session::new();
        assert!(s.begin_solve().is_none());
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn solve_is_disabled_while_analyzing() {
        let mut s = Session::new();
        s.select_file(png("a.png"));
        let first = s.begin_solve().unwrap();
        assert_eq!(s.phase(), Phase::Analyzing);
        assert!(!s.can_solve());
        assert!(s.begin_solve().is_none());
        assert_eq!(first.request_id(), 1);
    }

    #[test]
    fn success_holds_result_verbatim() {
        let mut s = Session::new();
        s.select_file(png("a.png"));
        let t = s.begin_solve().unwrap();
        assert!(s.complete(&t, Ok(solution("code"))));
        assert_eq!(s.phase(), Phase::Solved);
        assert_eq!(s.result(), Some(&solution("code")));
        assert!(s.error_message().is_none());
    }

    #[test]
    fn failure_holds_message() {
        let mut s = Session::new();
        s.select_file(png("a.png"));
        let t = s.begin_solve().unwrap();
        s.complete(&t, Err(SolverError::solve_failed()));
        assert_eq!(s.phase(), Phase::Error);
        assert!(!s.error_message().unwrap().is_empty());
        assert!(s.result().is_none());
    }

    #[test]
    fn empty_error_message_falls_back() {
        let mut s = Session::new();
        s.select_file(png("a.png"));
        let t = s.begin_solve().unwrap();
        s.complete(
            &t,
            Err(SolverError::SolveFailed {
                message: String::new(),
            }),
        );
        assert_eq!(s.error_message(), Some(GENERIC_ERROR_MESSAGE));
    }

    #[test]
    fn retry_from_solved_and_error() {
        let mut s = Session::new();
        s.select_file(png("a.png"));
        let t1 = s.begin_solve().unwrap();
        s.complete(&t1, Err(SolverError::solve_failed()));

        let t2 = s.begin_solve().unwrap();
        assert_eq!(s.phase(), Phase::Analyzing);
        assert!(s.error_message().is_none());
        s.complete(&t2, Ok(solution("v1")));

        let t3 = s.begin_solve().unwrap();
        assert!(s.result().is_none());
        s.complete(&t3, Ok(solution("v2")));
        assert_eq!(s.result().unwrap().raw_code, "v2");
    }

    #[test]
    fn new_file_clears_result() {
        let mut s = Session::new();
        s.select_file(png("a.png"));
        let t = s.begin_solve().unwrap();
        s.complete(&t, Ok(solution("x")));
        s.select_file(png("b.png"));
        assert_eq!(s.phase(), Phase::Idle);
        assert!(s.result().is_none());
        assert_eq!(s.file().unwrap().name, "b.png");
    }

    #[test]
    fn late_response_after_reset_is_discarded() {
        let mut s = Session::new();
        s.select_file(png("a.png"));
        let t = s.begin_solve().unwrap();
        s.reset();
        assert!(!s.complete(&t, Ok(solution("late"))));
        assert_eq!(s.phase(), Phase::Idle);
        assert!(s.result().is_none());
    }

    #[test]
    fn late_response_for_old_file_is_discarded() {
        let mut s = Session::new();
        s.select_file(png("a.png"));
        let old = s.begin_solve().unwrap();
        s.select_file(png("b.png"));
        let new = s.begin_solve().unwrap();

        assert!(!s.complete(&old, Ok(solution("for a"))));
        assert_eq!(s.phase(), Phase::Analyzing);
        assert!(s.complete(&new, Ok(solution("for b"))));
        assert_eq!(s.result().unwrap().raw_code, "for b");
    }

    #[test]
    fn ticket_keeps_language_at_dispatch() {
        let mut s = Session::new();
        s.select_file(png("a.png"));
        s.set_language(Language::Python);
        let t = s.begin_solve().unwrap();
        s.set_language(Language::Cpp);
        assert_eq!(t.language(), Language::Python);
    }

    #[test]
    fn reset_clears_everything() {
        let mut s = Session::new();
        s.select_file(png("a.png"));
        let t = s.begin_solve().unwrap();
        s.complete(&t, Err(SolverError::solve_failed()));
        s.reset();
        assert_eq!(s.phase(), Phase::Idle);
        assert!(s.file().is_none());
        assert!(s.result().is_none());
        assert!(s.error_message().is_none());
    }
}

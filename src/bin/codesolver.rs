//! CLI binary for codesolver.
//!
//! A thin shim over the library crate: maps flags to `SolverConfig`, drives
//! one `Session`, and prints or saves what comes back.

use anyhow::{bail, Context, Result};
use clap::Parser;
use codesolver::{
    export_code, export_report, export_test_archive, ingest_bytes, ingest_path, ingest_url,
    error::GENERIC_ERROR_MESSAGE, pipeline::ingest::is_url, present::NO_TEST_CASES_MESSAGE,
    render_markdown, test_case_cards, write_artifact, Artifact, Block, ExportError, IngestSource,
    Language, Session, SessionObserver, SolutionResult, SolverConfig, UploadedFile,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── Spinner observer using indicatif ─────────────────────────────────────────

/// Shows a spinner while the session is `Analyzing`.
struct CliSpinner {
    bar: Mutex<Option<ProgressBar>>,
    started: Mutex<Option<Instant>>,
}

impl CliSpinner {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
            started: Mutex::new(None),
        })
    }

    fn finish(&self) -> f64 {
        if let Ok(mut bar) = self.bar.lock() {
            if let Some(bar) = bar.take() {
                bar.finish_and_clear();
            }
        }
        self.started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl SessionObserver for CliSpinner {
    fn on_solve_start(&self, _request_id: u64, file_name: &str, language: Language) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Đang phân tích");
        bar.set_message(format!("{file_name} → {language}"));
        bar.enable_steady_tick(Duration::from_millis(80));

        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
        if let Ok(mut t) = self.started.lock() {
            *t = Some(Instant::now());
        }
    }

    fn on_solve_complete(&self, result: &SolutionResult) {
        let secs = self.finish();
        eprintln!(
            "{} Solved  {}  {}",
            green("✔"),
            dim(&format!("{} test cases", result.test_cases.len())),
            dim(&format!("{secs:.1}s")),
        );
    }

    fn on_solve_error(&self, _message: &str) {
        let secs = self.finish();
        eprintln!("{} Failed  {}", red("✘"), dim(&format!("{secs:.1}s")));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Solve in C++ and print explanation + code
  codesolver bai1.png

  # Python, save every export into ./out
  codesolver --language python --all --out-dir out de_thi.pdf

  # Paste an image from the clipboard
  wl-paste --type image/png | codesolver -

  # Solve from a URL, JSON output
  codesolver --json https://example.com/problem.png > result.json

  # Interactive session
  codesolver --interactive

EXPORTS:
  --code     solution.cpp / solution.py
  --tests    test_cases.zip (test_cases/test01.inp, test01.out, ...)
  --report   Giai_bai_tap_report.docx

ENVIRONMENT VARIABLES:
  API_KEY / GEMINI_API_KEY   Gemini API key
  CODESOLVER_MODEL           Override model ID
  CODESOLVER_LANGUAGE        Default target language (cpp, python)
  RUST_LOG                   Override log filter
"#;

const INTERACTIVE_HELP: &str = "\
  open <path|url>            select a problem file
  lang <cpp|python>          set the target language
  solve                      analyse the selected file
  show                       print explanation and code
  tests                      print test cases
  export <code|tests|report|all>
  reset                      clear file and result
  status                     show current state
  help                       this list
  quit                       exit";

/// Solve programming problems from an image or PDF with Gemini.
#[derive(Parser, Debug)]
#[command(
    name = "codesolver",
    version,
    about = "Solve programming problems from an image or PDF with Gemini",
    long_about = "Send a picture or PDF of a competitive programming problem to Gemini and get \
back an explanation, a complete C++ or Python solution, and a set of test cases. Results can be \
exported as a source file, a zip of test cases, or a Word report.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image or PDF path, HTTP/HTTPS URL, or `-` to read a pasted image from stdin.
    #[arg(required_unless_present = "interactive")]
    input: Option<String>,

    /// Target language: cpp or python.
    #[arg(short, long, env = "CODESOLVER_LANGUAGE", default_value = "cpp")]
    language: Language,

    /// Directory for exported files.
    #[arg(short, long, env = "CODESOLVER_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Save the solution as solution.cpp / solution.py.
    #[arg(long)]
    code: bool,

    /// Save the test cases as test_cases.zip.
    #[arg(long)]
    tests: bool,

    /// Save a Word report.
    #[arg(long)]
    report: bool,

    /// Save every export.
    #[arg(long)]
    all: bool,

    /// Print the result as JSON instead of formatted text.
    #[arg(long, env = "CODESOLVER_JSON")]
    json: bool,

    /// Gemini model ID.
    #[arg(long, env = "CODESOLVER_MODEL")]
    model: Option<String>,

    /// Gemini API key (falls back to API_KEY, GEMINI_API_KEY, then the build-time key).
    #[arg(long)]
    api_key: Option<String>,

    /// API base URL.
    #[arg(long, env = "CODESOLVER_BASE_URL")]
    base_url: Option<String>,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "CODESOLVER_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Reasoning token budget.
    #[arg(long, env = "CODESOLVER_THINKING_BUDGET", default_value_t = 2048)]
    thinking_budget: u32,

    /// Number of test cases to request.
    #[arg(long, env = "CODESOLVER_TEST_CASES", default_value_t = 20,
          value_parser = clap::value_parser!(u32).range(1..))]
    test_cases: u32,

    /// Per-request timeout in seconds (none by default).
    #[arg(long, env = "CODESOLVER_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "CODESOLVER_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable the spinner.
    #[arg(long, env = "CODESOLVER_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CODESOLVER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CODESOLVER_QUIET")]
    quiet: bool,

    /// Read commands from stdin and drive one session.
    #[arg(short, long)]
    interactive: bool,
}

impl Cli {
    fn wants_export(&self) -> bool {
        self.all || self.code || self.tests || self.report
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the feedback; library INFO logs would tear it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;

    let mut session = Session::new();
    if show_progress {
        session = session.with_observer(CliSpinner::new());
    }
    session.set_language(cli.language);

    if cli.interactive {
        return run_interactive(&cli, &config, session).await;
    }

    let input = cli.input.as_deref().context("No input given")?;
    let file = load_input(input, &config).await?;
    session.select_file(file);
    session.solve(&config).await;

    let Some(result) = session.result() else {
        bail!(
            "{}",
            session.error_message().unwrap_or(GENERIC_ERROR_MESSAGE)
        );
    };

    if cli.json {
        let json = serde_json::to_string_pretty(result).context("Failed to serialise result")?;
        println!("{json}");
    } else if !cli.wants_export() || !cli.quiet {
        print_solution(result, session.language())?;
    }

    if cli.wants_export() {
        let kinds = [
            (cli.all || cli.code, "code"),
            (cli.all || cli.tests, "tests"),
            (cli.all || cli.report, "report"),
        ];
        for (_, kind) in kinds.iter().filter(|(on, _)| *on) {
            save_export(kind, result, session.language(), &cli.out_dir, cli.quiet);
        }
    }

    Ok(())
}

/// Map CLI args to `SolverConfig`.
fn build_config(cli: &Cli) -> Result<SolverConfig> {
    let mut builder = SolverConfig::builder()
        .temperature(cli.temperature)
        .thinking_budget(cli.thinking_budget)
        .test_case_count(cli.test_cases as usize)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref url) = cli.base_url {
        builder = builder.base_url(url.clone());
    }
    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }

    builder.build().context("Invalid configuration")
}

/// Resolve a path, URL or `-` into an uploaded file.
async fn load_input(input: &str, config: &SolverConfig) -> Result<UploadedFile> {
    if input == "-" {
        let mut bytes = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut bytes)
            .await
            .context("Failed to read stdin")?;
        return ingest_bytes("pasted-image", None, &bytes, IngestSource::Paste)
            .context("Không thể đọc ảnh từ clipboard");
    }
    if is_url(input) {
        return ingest_url(input, config.download_timeout_secs)
            .await
            .with_context(|| format!("Failed to download {input}"));
    }
    ingest_path(input, IngestSource::Picker)
        .await
        .with_context(|| format!("Failed to open {input}"))
}

// ── Rendering ────────────────────────────────────────────────────────────────

fn print_solution(result: &SolutionResult, language: Language) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "{}", bold(&cyan("━━ Lời giải ━━")))?;
    for block in render_markdown(&result.markdown) {
        match block {
            Block::Heading { text, .. } => writeln!(out, "{}", bold(&cyan(text.trim())))?,
            Block::Paragraph(spans) => {
                let line: String = spans
                    .iter()
                    .map(|s| if s.bold { bold(&s.text) } else { s.text.clone() })
                    .collect();
                writeln!(out, "{line}")?;
            }
        }
    }

    writeln!(out)?;
    writeln!(out, "{}", bold(&cyan(&format!("━━ Mã nguồn ({language}) ━━"))))?;
    out.write_all(result.raw_code.as_bytes())?;
    if !result.raw_code.ends_with('\n') {
        writeln!(out)?;
    }
    Ok(())
}

fn print_tests(result: &SolutionResult) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let cards = test_case_cards(result);
    if cards.is_empty() {
        writeln!(out, "{}", dim(NO_TEST_CASES_MESSAGE))?;
        return Ok(());
    }
    for card in cards {
        writeln!(out, "{}", bold(&card.title))?;
        writeln!(out, "  {}", dim("Input:"))?;
        for line in card.input.lines() {
            writeln!(out, "    {line}")?;
        }
        writeln!(out, "  {}", dim("Output:"))?;
        for line in card.output.lines() {
            writeln!(out, "    {line}")?;
        }
    }
    Ok(())
}

// ── Exports ──────────────────────────────────────────────────────────────────

fn build_export(
    kind: &str,
    result: &SolutionResult,
    language: Language,
) -> Result<Artifact, ExportError> {
    match kind {
        "code" => Ok(export_code(result, language)),
        "tests" => export_test_archive(result),
        _ => export_report(result, language),
    }
}

/// Build and save one export; failures are reported and do not abort.
fn save_export(kind: &str, result: &SolutionResult, language: Language, dir: &Path, quiet: bool) {
    match build_export(kind, result, language).and_then(|a| write_artifact(&a, dir)) {
        Ok(path) => {
            if !quiet {
                eprintln!("{} {}", green("✓"), bold(&path.display().to_string()));
            }
        }
        Err(e) => {
            tracing::error!("Export failed: {}", e);
            eprintln!("{} {}", red("✗"), red(e.alert_message()));
        }
    }
}

// ── Interactive mode ─────────────────────────────────────────────────────────

async fn run_interactive(cli: &Cli, config: &SolverConfig, mut session: Session) -> Result<()> {
    if let Some(ref input) = cli.input {
        if input == "-" {
            bail!("stdin is used for commands in interactive mode");
        }
        open_file(&mut session, input, config).await;
    }
    eprintln!("{}", dim("Type `help` for commands."));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("{} ", cyan("›"));
        io::stderr().flush().ok();

        let Some(line) = lines.next_line().await.context("Failed to read command")? else {
            break;
        };
        let line = line.trim();
        let (cmd, arg) = line.split_once(' ').unwrap_or((line, ""));
        let arg = arg.trim();

        match cmd {
            "" => {}
            "open" if !arg.is_empty() => open_file(&mut session, arg, config).await,
            "lang" => match arg.parse::<Language>() {
                Ok(lang) => {
                    session.set_language(lang);
                    eprintln!("{} {}", green("✓"), lang);
                }
                Err(e) => eprintln!("{} {}", red("✗"), e),
            },
            "solve" => {
                if session.solve(config).await.is_none() {
                    eprintln!("{}", dim("Chọn file trước khi giải."));
                } else if let Some(message) = session.error_message() {
                    eprintln!("{} {}", red("✗"), red(message));
                }
            }
            "show" => match session.result() {
                Some(result) => print_solution(result, session.language())?,
                None => eprintln!("{}", dim("Chưa có lời giải.")),
            },
            "tests" => match session.result() {
                Some(result) => print_tests(result)?,
                None => eprintln!("{}", dim("Chưa có lời giải.")),
            },
            "export" => match session.result() {
                Some(result) => {
                    let kinds: &[&str] = match arg {
                        "all" | "" => &["code", "tests", "report"],
                        "code" | "tests" | "report" => std::slice::from_ref(&arg),
                        other => {
                            eprintln!("{} unknown export '{other}'", red("✗"));
                            continue;
                        }
                    };
                    for kind in kinds {
                        save_export(kind, result, session.language(), &cli.out_dir, false);
                    }
                }
                None => eprintln!("{}", dim("Chưa có lời giải.")),
            },
            "reset" => {
                session.reset();
                eprintln!("{}", dim("Đã xoá."));
            }
            "status" => print_status(&session),
            "help" => eprintln!("{INTERACTIVE_HELP}"),
            "quit" | "exit" => break,
            other => eprintln!("{} unknown command '{other}' (try `help`)", red("✗")),
        }
    }
    Ok(())
}

async fn open_file(session: &mut Session, input: &str, config: &SolverConfig) {
    match load_input(input, config).await {
        Ok(file) => {
            let kind = if file.is_pdf() { "PDF" } else { "ảnh" };
            eprintln!(
                "{} {} {}",
                green("✓"),
                bold(&file.name),
                dim(&format!("{kind}, {}", file.mime_type))
            );
            session.select_file(file);
        }
        Err(e) => eprintln!("{} {:#}", red("✗"), e),
    }
}

fn print_status(session: &Session) {
    let file = session
        .file()
        .map(|f| format!("{} ({})", f.name, f.mime_type))
        .unwrap_or_else(|| "-".to_string());
    eprintln!("File:      {}", file);
    eprintln!("Language:  {}", session.language());
    eprintln!("Phase:     {:?}", session.phase());
    if let Some(result) = session.result() {
        eprintln!("Tests:     {}", result.test_cases.len());
    }
    if let Some(message) = session.error_message() {
        eprintln!("Error:     {}", red(message));
    }
}

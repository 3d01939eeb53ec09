//! CLI binary for studygen.
//!
//! A thin shim over the library crate that maps subcommands and flags to
//! `StudyConfig`, drives ingestion with a terminal progress bar, and prints
//! generated markdown.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use studygen::{
    generate_with, GroqClient, HistoryStore, IngestProgress, Ingestor, Mode, StudyConfig,
};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress for the OCR fallback: a 0–100 bar plus status lines.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Ingesting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl IngestProgress for CliProgress {
    fn on_status(&self, message: &str) {
        self.bar.println(format!("{} {}", dim("·"), message));
    }

    fn on_percent(&self, percent: u8) {
        self.bar.set_position(percent as u64);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Quiz from a text file
  studygen run notes.txt --mode quiz

  # Explain a scanned PDF (OCR fallback, needs tesseract on PATH)
  studygen run scanned-lecture.pdf --mode explain -o explained.md

  # Pipe notes in
  cat notes.txt | studygen run - --mode practice

  # Just extract the text of a PDF, no model call
  studygen ingest slides.pdf > slides.txt

  # Run the HTTP API
  studygen serve --addr 127.0.0.1:3000

  # Past runs
  studygen history list
  studygen history show 6f9a...
  studygen history clear

ENVIRONMENT VARIABLES:
  GROQ_API_KEY     Credential for the completion provider (required to generate)
  STUDYGEN_MODEL   Override the model ID

SETUP:
  1. Set API key:   export GROQ_API_KEY=gsk_...
  2. Generate:      studygen run notes.txt --mode quiz
"#;

/// Generate study material (explanations, quizzes, practice problems) from notes.
#[derive(Parser, Debug)]
#[command(
    name = "studygen",
    version,
    about = "Generate study material from notes (.txt, .pdf, scanned PDFs) with an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "STUDYGEN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest notes and generate a study artifact.
    Run {
        /// Notes file (.txt or .pdf), or `-` to read plain text from stdin.
        input: String,

        /// Generation mode.
        #[arg(short, long, value_enum)]
        mode: ModeArg,

        /// Write markdown to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Model ID on the provider.
        #[arg(long, env = "STUDYGEN_MODEL")]
        model: Option<String>,

        /// Sampling temperature (0.0–2.0).
        #[arg(long)]
        temperature: Option<f32>,

        /// Do not record this run in history.
        #[arg(long)]
        no_history: bool,

        /// Disable the OCR progress bar.
        #[arg(long)]
        no_progress: bool,
    },

    /// Extract note text from a file and print it, without calling the model.
    Ingest {
        /// Notes file (.txt or .pdf).
        input: PathBuf,

        /// Disable the OCR progress bar.
        #[arg(long)]
        no_progress: bool,
    },

    /// Serve the HTTP API (POST /api/study, GET /health).
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: std::net::SocketAddr,

        /// Model ID on the provider.
        #[arg(long, env = "STUDYGEN_MODEL")]
        model: Option<String>,
    },

    /// Inspect or edit the local history of past runs.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// List past runs, newest first.
    List,
    /// Print the stored output of one run.
    Show { id: Uuid },
    /// Delete one run by identifier.
    Delete { id: Uuid },
    /// Delete all past runs.
    Clear,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Explain,
    Quiz,
    Practice,
}

impl From<ModeArg> for Mode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Explain => Mode::Explain,
            ModeArg::Quiz => Mode::Quiz,
            ModeArg::Practice => Mode::Practice,
        }
    }
}

fn build_config(model: Option<String>, temperature: Option<f32>) -> Result<StudyConfig> {
    let mut builder = StudyConfig::builder();
    if let Some(model) = model {
        builder = builder.model(model);
    }
    if let Some(t) = temperature {
        builder = builder.temperature(t);
    }
    builder.build().context("Invalid configuration")
}

/// Read note text: stdin for `-`, the ingestion pipeline otherwise.
async fn load_notes(input: &str, config: &StudyConfig, show_progress: bool) -> Result<String> {
    if input == "-" {
        let mut notes = String::new();
        io::stdin()
            .read_to_string(&mut notes)
            .context("Failed to read notes from stdin")?;
        return Ok(notes);
    }

    let ingestor = Ingestor::new(config);
    let notes = if show_progress {
        let progress = CliProgress::new();
        let result = ingestor
            .with_progress(progress.clone())
            .ingest_file(input.as_ref())
            .await;
        progress.finish();
        result
    } else {
        ingestor.ingest_file(input.as_ref()).await
    };
    notes.with_context(|| format!("Failed to ingest {input}"))
}

fn load_history(config: &StudyConfig) -> HistoryStore {
    HistoryStore::load(config.resolved_history_path(), config.history_capacity)
}

fn print_result(markdown: &str, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, markdown)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{} wrote {}", green("✔"), bold(&path.display().to_string()));
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(markdown.as_bytes())
                .context("Failed to write to stdout")?;
            if !markdown.ends_with('\n') {
                writeln!(handle)?;
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress bars and results go to the terminal; logs stay on stderr and
    // default to errors-only so they never interleave with the bar.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Run {
            input,
            mode,
            output,
            model,
            temperature,
            no_history,
            no_progress,
        } => {
            let config = build_config(model, temperature)?;
            let show_progress = !cli.quiet && !no_progress;
            let notes = load_notes(&input, &config, show_progress).await?;
            if notes.trim().is_empty() {
                bail!("No notes found in {input}");
            }

            let mode = Mode::from(mode);
            let client = GroqClient::from_config(&config);
            let markdown = generate_with(&notes, mode, &client)
                .await
                .context("Generation failed")?;

            print_result(&markdown, output.as_ref())?;

            if !no_history {
                let mut history = load_history(&config);
                history.append(mode, notes, markdown);
            }
        }

        Command::Ingest { input, no_progress } => {
            let config = StudyConfig::default();
            let show_progress = !cli.quiet && !no_progress;
            let notes = load_notes(&input.display().to_string(), &config, show_progress).await?;
            print_result(&notes, None)?;
        }

        Command::Serve { addr, model } => {
            let config = build_config(model, None)?;
            let client = GroqClient::from_config(&config);
            if !client.has_credential() {
                eprintln!(
                    "{} GROQ_API_KEY is not set; /api/study will answer 500 until it is",
                    red("✗")
                );
            }
            let history = load_history(&config);
            let state = studygen::server::AppState::new(Arc::new(client), history);
            studygen::server::serve(addr, state).await?;
        }

        Command::History { action } => {
            let config = StudyConfig::default();
            let mut history = load_history(&config);
            match action {
                HistoryAction::List => {
                    if history.entries().is_empty() {
                        eprintln!("{}", dim("history is empty"));
                    }
                    for entry in history.entries() {
                        let preview: String = entry.notes.chars().take(48).collect();
                        println!(
                            "{}  {}  {:<8}  {}",
                            entry.id,
                            dim(&entry.created_at.to_rfc3339()),
                            entry.mode.as_str(),
                            preview.replace('\n', " "),
                        );
                    }
                }
                HistoryAction::Show { id } => match history.get(&id) {
                    Some(entry) => print_result(&entry.output, None)?,
                    None => bail!("No history entry with id {id}"),
                },
                HistoryAction::Delete { id } => {
                    if history.remove(&id) {
                        eprintln!("{} deleted {id}", green("✔"));
                    } else {
                        bail!("No history entry with id {id}");
                    }
                }
                HistoryAction::Clear => {
                    let n = history.entries().len();
                    history.clear();
                    eprintln!("{} cleared {n} entries", green("✔"));
                }
            }
        }
    }

    Ok(())
}

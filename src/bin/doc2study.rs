//! CLI binary for edgequake-doc2study.
//!
//! A thin shim over the library crate: extracts a local document, runs the
//! requested generation task(s) and prints the result.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_doc2study::{
    Artifact, ArtifactOrigin, DocumentFormat, GenerationConfig, GenerationOutcome,
    GenerationRequest, GenerationTask, Generator, PdfiumExtractor, TextExtractor,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summary of a PDF
  doc2study lecture.pdf

  # Everything, as JSON
  doc2study --task all --json notes.txt > study.json

  # No network: deterministic local generation only
  doc2study --offline --task quiz notes.md

PROVIDER ORDER:
  summarize   facebook/bart-large-cnn  →  chat model
  flashcards  microsoft/DialoGPT-medium →  chat model
  quiz        chat model
  Every task falls back to local generation when all providers fail.

ENVIRONMENT VARIABLES:
  HUGGINGFACE_API_KEY      Enables the Hugging Face tiers
  HUGGINGFACE_API_URL      Inference endpoint base URL
  OPENAI_API_KEY           Enables the chat tier (openai) when no provider is named
  DOC2STUDY_CHAT_PROVIDER  Chat provider (openai, anthropic, gemini, ollama, …)
  DOC2STUDY_CHAT_MODEL     Chat model ID (default gpt-3.5-turbo)
  DOC2STUDY_TIMEOUT_SECS   Per-request timeout (default 30)
  DOC2STUDY_MAX_RETRIES    Attempts per provider (default 3)
  PDFIUM_LIB_PATH          Directory containing libpdfium

  Variables are also read from a .env file in the working directory.
"#;

/// Generate summaries, flashcards and quizzes from documents.
#[derive(Parser, Debug)]
#[command(
    name = "doc2study",
    version,
    about = "Generate summaries, flashcards and quizzes from documents",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF, plain-text or Markdown file.
    input: PathBuf,

    /// What to generate.
    #[arg(short, long, value_enum, default_value = "summarize")]
    task: TaskArg,

    /// Output structured JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Skip all providers and use local generation only.
    #[arg(long)]
    offline: bool,

    /// Chat provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long)]
    chat_provider: Option<String>,

    /// Chat model ID.
    #[arg(long)]
    chat_model: Option<String>,

    /// Attempts per provider.
    #[arg(long)]
    max_retries: Option<u32>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Disable the spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum TaskArg {
    Summarize,
    Flashcards,
    Quiz,
    All,
}

impl TaskArg {
    /// Spinner message shown while the first generation runs.
    fn first_stage(self) -> &'static str {
        match self {
            TaskArg::Summarize | TaskArg::All => "summary",
            TaskArg::Flashcards => "flashcards",
            TaskArg::Quiz => "quiz",
        }
    }
}

/// One generated artifact as printed by `--json`.
#[derive(Serialize)]
struct TaskReport {
    task: GenerationTask,
    origin: ArtifactOrigin,
    duration_ms: u64,
    failed_attempts: usize,
    artifact: Artifact,
}

impl From<GenerationOutcome> for TaskReport {
    fn from(o: GenerationOutcome) -> Self {
        Self {
            task: o.artifact.task(),
            origin: o.origin,
            duration_ms: o.duration_ms,
            failed_attempts: o.attempts.len(),
            artifact: o.artifact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing, so .env values behave like real environment variables.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
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

    // ── Extract text ─────────────────────────────────────────────────────
    let filename = cli
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let format = DocumentFormat::detect("", &filename).context("Unsupported input")?;
    let bytes = tokio::fs::read(&cli.input)
        .await
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let text = PdfiumExtractor::from_env()
        .extract(format, bytes)
        .await
        .context("Text extraction failed")?;

    // ── Build generator ──────────────────────────────────────────────────
    let generator = if cli.offline {
        Generator::offline()
    } else {
        Generator::from_config(&build_config(&cli)?).context("Failed to set up providers")?
    };

    let spinner = show_progress.then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Generating");
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });
    let status = |msg: &str| {
        if let Some(ref bar) = spinner {
            bar.set_message(msg.to_string());
        }
    };

    // ── Run ──────────────────────────────────────────────────────────────
    status(cli.task.first_stage());
    let outcomes: Vec<GenerationOutcome> = match cli.task {
        TaskArg::Summarize => {
            vec![run_one(&generator, GenerationTask::Summarize, &text, None).await]
        }
        TaskArg::Flashcards => {
            vec![run_one(&generator, GenerationTask::Flashcards, &text, None).await]
        }
        TaskArg::Quiz => vec![run_one(&generator, GenerationTask::Quiz, &text, None).await],
        TaskArg::All => {
            let summary = run_one(&generator, GenerationTask::Summarize, &text, None).await;
            let stored = summary.artifact.as_summary().map(str::to_string);

            status("flashcards + quiz");
            let (cards, quiz) = futures::future::join(
                run_one(&generator, GenerationTask::Flashcards, &text, stored.clone()),
                run_one(&generator, GenerationTask::Quiz, &text, stored),
            )
            .await;
            vec![summary, cards, quiz]
        }
    };

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    // ── Print ────────────────────────────────────────────────────────────
    if cli.json {
        let reports: Vec<TaskReport> = outcomes.into_iter().map(TaskReport::from).collect();
        let json = serde_json::to_string_pretty(&reports).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    for outcome in &outcomes {
        print_artifact(&outcome.artifact);
        if !cli.quiet {
            let origin = match outcome.origin {
                ArtifactOrigin::Provider(id) => green(&format!("✔ {id}")),
                ArtifactOrigin::Fallback => yellow("⚠ local fallback"),
            };
            eprintln!(
                "{}  {}",
                origin,
                dim(&format!("{}ms", outcome.duration_ms))
            );
            for attempt in &outcome.attempts {
                eprintln!("   {}", dim(&format!("{}: {}", attempt.provider, attempt.error)));
            }
        }
    }

    Ok(())
}

async fn run_one(
    generator: &Generator,
    task: GenerationTask,
    text: &str,
    summary: Option<String>,
) -> GenerationOutcome {
    let mut request = GenerationRequest::new(task, text);
    if let Some(summary) = summary {
        request = request.with_summary(summary);
    }
    generator.generate(request).await
}

/// Environment first, CLI flags on top.
fn build_config(cli: &Cli) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::from_env()
        .context("Invalid environment configuration")?
        .into_builder();

    if let Some(ref name) = cli.chat_provider {
        builder = builder.chat_provider_name(name);
    }
    if let Some(ref model) = cli.chat_model {
        builder = builder.chat_model(model);
    }
    if let Some(n) = cli.max_retries {
        builder = builder.max_retries(n);
    }
    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }

    builder.build().context("Invalid configuration")
}

fn print_artifact(artifact: &Artifact) {
    match artifact {
        Artifact::Summary(text) => {
            println!("{}\n", bold("Summary"));
            println!("{text}\n");
        }
        Artifact::Flashcards(cards) => {
            println!("{}\n", bold(&format!("Flashcards ({})", cards.len())));
            for (i, card) in cards.iter().enumerate() {
                println!("{:>2}. Q: {}", i + 1, card.question);
                println!("    A: {}", card.answer);
            }
            println!();
        }
        Artifact::Quiz(questions) => {
            println!("{}\n", bold(&format!("Quiz ({})", questions.len())));
            for (i, q) in questions.iter().enumerate() {
                println!("{:>2}. {}", i + 1, q.question);
                for (j, option) in q.options.iter().enumerate() {
                    let marker = if j == q.correct_answer as usize { "*" } else { " " };
                    println!("   {marker} {}) {}", (b'a' + j as u8) as char, option);
                }
            }
            println!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_task_names_its_first_stage() {
        assert_eq!(TaskArg::Summarize.first_stage(), "summary");
        assert_eq!(TaskArg::All.first_stage(), "summary");
        assert_eq!(TaskArg::Flashcards.first_stage(), "flashcards");
        assert_eq!(TaskArg::Quiz.first_stage(), "quiz");
    }
}

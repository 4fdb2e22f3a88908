//! coursekit - render course quizzes and markup as HTML

use std::fs;
use std::io::Write;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coursekit::{AssetCache, MarkupToHtmlConverter, QuizMarkupConverter, decode_text, extract_xml_encoding};

#[derive(Parser)]
#[command(name = "coursekit")]
#[command(version, about = "Render course quizzes and markup as HTML", long_about = None)]
#[command(after_help = "EXAMPLES:
    coursekit quiz quiz.json > quiz.html        Render a quiz as HTML
    coursekit quiz --markup-only quiz.json      Print the intermediate markup
    coursekit markup instructions.xml           Render instructional markup

Runs offline: images are rendered without inlined content.")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a quiz JSON document
    Quiz {
        #[arg(value_name = "FILE")]
        input: String,

        /// Print markup instead of HTML
        #[arg(long)]
        markup_only: bool,
    },
    /// Convert a course markup document
    Markup {
        #[arg(value_name = "FILE")]
        input: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("coursekit={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match &cli.command {
        Command::Quiz { input, markup_only } => quiz(input, *markup_only),
        Command::Markup { input } => markup(input),
    };

    match result.and_then(|output| emit(&output)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn read_input(path: &str) -> Result<String, String> {
    let bytes = fs::read(path).map_err(|e| format!("{path}: {e}"))?;
    let declared = extract_xml_encoding(&bytes);
    Ok(decode_text(&bytes, declared.as_deref()).into_owned())
}

fn quiz(path: &str, markup_only: bool) -> Result<String, String> {
    let text = read_input(path)?;
    let markup = QuizMarkupConverter::new()
        .convert_str(&text)
        .map_err(|e| format!("{path}: {e}"))?;
    if markup_only {
        return Ok(markup);
    }
    render(path, &markup)
}

fn markup(path: &str) -> Result<String, String> {
    let text = read_input(path)?;
    render(path, &text)
}

fn render(path: &str, markup: &str) -> Result<String, String> {
    MarkupToHtmlConverter::new(AssetCache::new())
        .convert(markup)
        .map_err(|e| format!("{path}: {e}"))
}

fn emit(output: &str) -> Result<(), String> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(output.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|e| e.to_string())
}

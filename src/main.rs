//! Adaptiq CLI
//!
//! Usage:
//!   adaptiq                                   # Interactive mode (default)
//!   adaptiq --interactive --profile me.json   # Interactive, profile-tailored prompts
//!   adaptiq --serve                           # HTTP API server
//!   adaptiq --json                            # JSON snapshots instead of status lines

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::error;

use adaptiq::config::{AdaptiveConfig, Config};
use adaptiq::core::{
    latest_report, run_server, AppState, ContentGenerator, HttpContentGenerator, QuestionContext, SessionHandle,
    SessionUpdate,
};
use adaptiq::logging::init_tracing;
use adaptiq::types::{CognitiveProfile, ControllerSnapshot, ExpressionScores, QuizPhase};
use adaptiq::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "adaptiq",
    version = VERSION,
    about = "Adaptiq - Emotion-aware adaptive quiz difficulty",
    long_about = "Adaptiq turns facial-expression scores into a difficulty level for a\n\
                  generated multiple-choice quiz.\n\n\
                  Modes:\n  \
                  --interactive  Type expression scores and quiz commands on stdin\n  \
                  --serve        HTTP + WebSocket API server\n\n\
                  Interactive commands:\n  \
                  happy=0.8 sad=0.1  One camera tick of expression scores\n  \
                  none               A tick with no face detected\n  \
                  start <topic>      Start a quiz\n  \
                  answer <option>    Answer by option text or 1-based number\n  \
                  status             Show the current state\n  \
                  reset              Back to idle\n  \
                  report             Save a session report\n  \
                  last               Show the latest saved report\n  \
                  quit               Exit"
)]
struct Args {
    /// Interactive mode - read commands from stdin
    #[arg(short, long)]
    interactive: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: HOST:PORT from the environment)
    #[arg(long)]
    addr: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Directory for session reports (default: REPORT_DIR or ./reports)
    #[arg(long)]
    report_dir: Option<String>,

    /// Content generator base URL (default: GENERATOR_URL)
    #[arg(long)]
    generator_url: Option<String>,

    /// Cognitive profile JSON used to tailor questions
    #[arg(long)]
    profile: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(url) = &args.generator_url {
        config.generator_url = url.clone();
    }
    if let Some(dir) = &args.report_dir {
        config.report_dir = dir.clone();
    }
    init_tracing(&config.log_level);

    if args.no_color {
        colored::control::set_override(false);
    }

    let generator: Arc<dyn ContentGenerator> = match HttpContentGenerator::from_config(&config) {
        Ok(generator) => Arc::new(generator),
        Err(e) => {
            error!(error = %e, "could not build generator client");
            eprintln!("{} {}", "Generator client error:".red(), e);
            std::process::exit(1);
        }
    };

    if args.serve {
        run_serve(&args, &config, generator).await;
    } else {
        run_interactive(&args, &config, generator).await;
    }
}

/// Run the API server
async fn run_serve(args: &Args, config: &Config, generator: Arc<dyn ContentGenerator>) {
    let addr = args
        .addr
        .clone()
        .unwrap_or_else(|| config.bind_addr().to_string());
    let state = Arc::new(AppState::new(
        generator,
        AdaptiveConfig::default(),
        config.report_dir.clone(),
    ));

    if let Err(e) = run_server(&addr, state).await {
        error!(error = %e, "server failed");
        eprintln!("{} {}", "Server error:".red(), e);
        std::process::exit(1);
    }
}

/// Run interactive mode
async fn run_interactive(args: &Args, config: &Config, generator: Arc<dyn ContentGenerator>) {
    let profile = match args.profile.as_deref().map(load_profile).transpose() {
        Ok(profile) => profile,
        Err(e) => {
            eprintln!("{} {}", "Could not load profile:".red(), e);
            std::process::exit(1);
        }
    };

    let context = QuestionContext { theory: None, profile };
    let handle = SessionHandle::spawn("interactive", AdaptiveConfig::default(), generator, context);

    print_header(config);

    let printer = tokio::spawn(print_updates(handle.subscribe(), args.json, args.no_color));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) | Err(_) => break,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        if let Err(msg) = run_command(&handle, line, args, config).await {
            println!("{} {}", "!".yellow(), msg.yellow());
        }
    }

    if let Ok(snapshot) = handle.snapshot().await {
        println!(
            "\nSession ended. Score: {}/{} at level {}",
            snapshot.score, snapshot.total_answered, snapshot.level
        );
    }
    printer.abort();
}

/// Execute one interactive command
async fn run_command(
    handle: &SessionHandle,
    line: &str,
    args: &Args,
    config: &Config,
) -> Result<(), String> {
    let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    match cmd.to_ascii_lowercase().as_str() {
        "start" => handle.start(rest).await.map_err(|e| e.to_string()),
        "answer" => {
            let snapshot = handle.snapshot().await.map_err(|e| e.to_string())?;
            let option = resolve_option(&snapshot, rest);
            let correct = handle.answer(option).await.map_err(|e| e.to_string())?;
            if correct {
                println!("{}", "  ✓ Correct".green());
            } else {
                let answer = snapshot.question.map(|q| q.answer).unwrap_or_default();
                println!("{} {}", "  ✗ Incorrect, answer:".red(), answer);
            }
            Ok(())
        }
        "reset" => handle.reset().await.map_err(|e| e.to_string()),
        "status" => {
            let snapshot = handle.snapshot().await.map_err(|e| e.to_string())?;
            if args.json {
                println!("{}", serde_json::to_string(&snapshot).map_err(|e| e.to_string())?);
            } else if args.no_color {
                println!("{}", snapshot.to_parseable_string());
            } else {
                println!("{}", snapshot.to_terminal_string());
            }
            Ok(())
        }
        "report" => {
            let path = handle
                .save_report(&config.report_dir)
                .await
                .map_err(|e| e.to_string())?;
            println!("{} {}", "  Report saved:".cyan(), path.display());
            Ok(())
        }
        "last" => {
            match latest_report(&config.report_dir).map_err(|e| e.to_string())? {
                Some(report) => println!(
                    "{}",
                    serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?
                ),
                None => println!("{}", "  No reports saved yet".cyan()),
            }
            Ok(())
        }
        "none" => handle.observe(None).await.map_err(|e| e.to_string()),
        _ => {
            let scores = parse_scores(line)?;
            handle.observe(Some(scores)).await.map_err(|e| e.to_string())
        }
    }
}

/// Option text, or the option at a 1-based index
fn resolve_option(snapshot: &ControllerSnapshot, input: &str) -> String {
    let options = snapshot.question.as_ref().map(|q| q.options.as_slice()).unwrap_or(&[]);
    match input.parse::<usize>() {
        Ok(n) if n >= 1 && n <= options.len() && !options.iter().any(|o| o == input) => {
            options[n - 1].clone()
        }
        _ => input.to_string(),
    }
}

/// Parse `label=score` pairs separated by whitespace or commas
fn parse_scores(line: &str) -> Result<ExpressionScores, String> {
    let mut scores = BTreeMap::new();
    for pair in line.split(|c: char| c.is_whitespace() || c == ',').filter(|p| !p.is_empty()) {
        let (label, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("unknown command '{}'", pair))?;
        let value: f64 = value
            .parse()
            .map_err(|_| format!("invalid score for '{}': {}", label, value))?;
        scores.insert(label.to_ascii_lowercase(), value);
    }
    Ok(scores)
}

fn load_profile(path: &Path) -> Result<CognitiveProfile, String> {
    let json = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    serde_json::from_str(&json).map_err(|e| format!("{}: {}", path.display(), e))
}

/// Print every update; the question block only when it changes
async fn print_updates(mut rx: broadcast::Receiver<SessionUpdate>, json: bool, no_color: bool) {
    let mut shown: Option<String> = None;
    loop {
        let update = match rx.recv().await {
            Ok(update) => update,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        };
        let snapshot = &update.snapshot;

        if json {
            if let Ok(line) = serde_json::to_string(&update) {
                println!("{}", line);
            }
            continue;
        }

        if let Some(err) = &snapshot.error {
            println!("{} {}", "  ⚠ Could not load a new question:".yellow(), err);
        }

        let current = snapshot.question.as_ref().map(|q| q.question.clone());
        if snapshot.phase == QuizPhase::AwaitingAnswer && current != shown {
            if let Some(question) = &snapshot.question {
                println!();
                println!("{} {}", format!("[{}]", snapshot.level.label()).bold(), question.question.bold());
                for (i, option) in question.options.iter().enumerate() {
                    println!("  {}. {}", i + 1, option);
                }
            }
            shown = current;
        }

        if no_color {
            println!("{}", snapshot.to_parseable_string());
        } else {
            println!("{}", snapshot.to_terminal_string());
        }
    }
}

/// Print header
fn print_header(config: &Config) {
    println!("{}", "========================================".bold());
    println!("{}", format!("  Adaptiq v{} - Interactive", VERSION).bold());
    println!("{}", "========================================".bold());
    println!("Generator: {}", config.generator_url);
    println!("Type 'start <topic>' to begin, expression scores like 'happy=0.8 sad=0.1',");
    println!("'answer <option>', 'status', 'reset', 'report', 'last' or 'quit'.");
    println!();
}

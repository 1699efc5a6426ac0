//! Gavel CLI
//!
//! A command-line tool for running code and grading it against problem files.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gavel::{
    Config, EXAMPLE_CONFIG, ExecutionLimits, GradeReport, Grader, InMemoryProblemSet,
    InMemorySubmissionStore, ProblemFile, Runner, SubmissionRequest, SubmissionStatus,
};
use tokio::io::AsyncReadExt;
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gavel")]
#[command(about = "A tool for running and grading submitted code")]
#[command(version)]
struct Cli {
    /// Config file to load instead of the built-in table
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration to a file
    Init {
        /// Output path (default: gavel.toml)
        #[arg(short, long, default_value = "gavel.toml")]
        output: PathBuf,

        /// Replace the file if it already exists
        #[arg(short, long)]
        force: bool,
    },

    /// Compile if needed and run a program once
    Run {
        /// Program source
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Language ID (e.g., cpp, python)
        #[arg(short, long)]
        language: String,

        /// Input file (default: stdin when piped)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Run timeout in seconds
        #[arg(short, long)]
        timeout: Option<f64>,
    },

    /// Grade a program against a problem file
    Grade {
        /// Source file to grade
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Language ID (e.g., cpp, python)
        #[arg(short, long)]
        language: String,

        /// Problem file with test cases
        #[arg(short, long)]
        problem: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the language table
    Languages,

    /// Print limits and other settings
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    // Logs go to stderr so program output can be piped
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = if let Some(ref path) = cli.config {
        info!(path = %path.display(), "reading config file");
        Config::from_file(path).with_context(|| format!("could not load {}", path.display()))?
    } else {
        debug!("no config file given, using built-in languages");
        Config::default()
    };

    match cli.command {
        Commands::Init { output, force } => init_config(&output, force).await,
        Commands::Run {
            source,
            language,
            input,
            timeout,
        } => run_execute(config, &source, &language, input.as_deref(), timeout).await,
        Commands::Grade {
            source,
            language,
            problem,
            json,
        } => run_grade(config, &source, &language, &problem, json).await,
        Commands::Languages => {
            list_languages(&config);
            Ok(())
        }
        Commands::ShowConfig => {
            show_config(&config);
            Ok(())
        }
    }
}

async fn run_execute(
    mut config: Config,
    source: &Path,
    language_id: &str,
    input: Option<&Path>,
    timeout: Option<f64>,
) -> Result<()> {
    let language = config
        .languages
        .get_mut(language_id)
        .with_context(|| format!("unknown language '{language_id}'"))?;

    if let Some(seconds) = timeout {
        if ExecutionLimits::timeout_from_secs(seconds).is_none() {
            anyhow::bail!("--timeout must be a positive number of seconds, got {seconds}");
        }
        let limits = language.limits.take().unwrap_or_else(ExecutionLimits::unset);
        language.limits = Some(limits.with_run_timeout(seconds));
    }
    info!(language = %language.name, "starting run");

    let source_content = tokio::fs::read(source)
        .await
        .context("failed to read source file")?;

    let input_data = match input {
        Some(path) => tokio::fs::read(path)
            .await
            .context("failed to read input file")?,
        None if !std::io::stdin().is_terminal() => {
            let mut data = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut data)
                .await
                .context("failed to read stdin")?;
            data
        }
        None => Vec::new(),
    };

    let runner = Runner::new(config);
    let result = runner
        .execute(language_id, &source_content, &input_data)
        .await
        .context("could not run program")?;

    if !result.stdout.is_empty() {
        print!("{}", result.stdout);
    }
    if !result.stderr.is_empty() {
        eprint!("{}", result.stderr);
    }

    info!(
        status = ?result.status,
        wall_time = format_args!("{:.3}s", result.wall_time),
        exit_code = result.exit_code,
        signal = result.signal,
        truncated = result.truncated,
        message = result.message.as_deref(),
        "run finished"
    );

    if result.is_success() {
        Ok(())
    } else {
        std::process::exit(result.exit_code.filter(|&code| code != 0).unwrap_or(1));
    }
}

async fn run_grade(
    config: Config,
    source: &Path,
    language_id: &str,
    problem_path: &Path,
    json: bool,
) -> Result<()> {
    let code = tokio::fs::read_to_string(source)
        .await
        .context("failed to read source file")?;
    let problem = ProblemFile::from_file(problem_path).context("failed to load problem")?;
    let problem_id = problem.id.clone();
    info!(problem = %problem_id, cases = problem.test_cases.len(), "grading");

    let problems = Arc::new(InMemoryProblemSet::new());
    problems.add_file(problem).await;
    let grader = Grader::new(
        Runner::new(config),
        problems,
        Arc::new(InMemorySubmissionStore::new()),
    );

    let submission = grader
        .submit_and_grade(SubmissionRequest {
            user_id: "cli".to_owned(),
            problem_id,
            code,
            language: language_id.to_owned(),
        })
        .await
        .context("grading failed")?;

    let report = GradeReport {
        status: submission.status,
        test_results: submission.test_case_results,
        runtime: submission.runtime,
        memory: submission.memory,
    };

    if json {
        let rendered =
            serde_json::to_string_pretty(&report).context("failed to serialize report")?;
        println!("{rendered}");
    } else {
        print_report(&report);
    }

    if report.status == SubmissionStatus::Accepted {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn print_report(report: &GradeReport) {
    println!("Verdict: {}", report.status);
    if let Some(runtime) = report.runtime {
        println!("Runtime: {runtime:.3}s");
    }
    println!();

    for result in &report.test_results {
        let mark = if result.passed { "PASS" } else { "FAIL" };
        println!("  #{:<4} {mark}", result.test_case_id);
        if !result.passed {
            match result.error {
                Some(ref error) => println!("        error: {}", error.trim_end()),
                None => {
                    println!("        expected: {:?}", result.expected_output.trim());
                    println!("        actual:   {:?}", result.actual_output);
                }
            }
        }
    }
}

fn list_languages(config: &Config) {
    let mut ids: Vec<&String> = config.languages.keys().collect();
    ids.sort();

    for id in ids {
        let language = &config.languages[id];
        let kind = match language.compile {
            Some(_) => "compiled",
            None => "interpreted",
        };
        println!("{id:<12} {:<24} {kind}, .{}", language.name, language.extension);
    }
}

fn show_config(config: &Config) {
    let limits = &config.default_limits;
    println!("Default limits:");
    println!("  Run timeout: {:.1}s", limits.run_duration().as_secs_f64());
    println!(
        "  Compile timeout: {:.1}s",
        limits.compile_duration().as_secs_f64()
    );
    println!("  Max output: {} KB", limits.max_output_bytes() / 1024);
    println!();
    println!("Work directory: {}", config.work_root().display());
    println!("Max concurrent gradings: {}", config.max_concurrent_gradings);
    println!();
    println!("Languages: {}", config.languages.len());
}

async fn init_config(output: &Path, force: bool) -> Result<()> {
    if !force && tokio::fs::try_exists(output).await.unwrap_or(false) {
        anyhow::bail!("{} exists; pass --force to replace it", output.display());
    }

    tokio::fs::write(output, EXAMPLE_CONFIG)
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(path = %output.display(), "wrote default configuration");
    Ok(())
}

mod report;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use wordfreq::{
    backend::{create_backend, WorkerTask},
    config::{CliOverrides, MAX_WORKERS},
    count::{BoundaryMode, CountOptions, Partition},
    count_with,
    progress::ProgressSink,
    BackendKind, Corpus, CountConfig, CountOutput, WordFreqError,
};

type Result<T> = std::result::Result<T, WordFreqError>;

#[derive(Parser)]
#[command(
    name = "wordfreq",
    author,
    version,
    about = "Count word frequencies in a text corpus with parallel workers",
    long_about = None,
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    count: CountArgs,
}

#[derive(Args)]
struct CountArgs {
    /// Number of workers (1-8)
    #[arg(required = true, value_parser = clap::value_parser!(u8).range(1..=MAX_WORKERS as i64))]
    workers: Option<u8>,

    /// Corpus file to count
    #[arg(short = 'f', long = "file")]
    corpus: Option<PathBuf>,

    /// Worker backend (threads|processes)
    #[arg(short = 'b', long)]
    backend: Option<String>,

    /// Number of top words to report
    #[arg(short = 'k', long = "top")]
    top_k: Option<usize>,

    /// Truncate words longer than this many bytes
    #[arg(long)]
    max_word_len: Option<usize>,

    /// How to count words cut by a partition boundary (stitch|split)
    #[arg(long)]
    boundary: Option<String>,

    /// Maximum distinct words per worker
    #[arg(long)]
    word_limit: Option<usize>,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Show per-worker statistics
    #[arg(short, long)]
    verbose: bool,

    /// Do not show the progress spinner
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Count one partition and write its table to a transfer file
    #[command(hide = true)]
    Worker(WorkerArgs),
}

#[derive(Args)]
struct WorkerArgs {
    #[arg(long)]
    corpus: PathBuf,
    #[arg(long)]
    index: usize,
    #[arg(long)]
    start: usize,
    #[arg(long)]
    len: usize,
    #[arg(long)]
    max_word_len: usize,
    #[arg(long)]
    boundary: String,
    #[arg(long)]
    word_limit: Option<usize>,
    #[arg(long)]
    counter: PathBuf,
    #[arg(long)]
    output: PathBuf,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Usage errors exit with 1, help and version with 0
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Worker(args)) => run_worker(args),
        None => run_count(cli.count),
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run_worker(args: WorkerArgs) -> Result<()> {
    init_logging("warn");
    let task = WorkerTask {
        corpus: args.corpus,
        partition: Partition {
            index: args.index,
            start: args.start,
            len: args.len,
        },
        options: CountOptions {
            max_word_len: args.max_word_len,
            boundary_mode: args.boundary.parse()?,
            word_limit: args.word_limit,
        },
        counter: args.counter,
        output: args.output,
    };
    task.run()?;
    Ok(())
}

fn cli_overrides(args: &CountArgs) -> Result<CliOverrides> {
    let workers = args
        .workers
        .ok_or_else(|| WordFreqError::invalid_config("worker count is required"))?;
    let worker_count = std::num::NonZeroUsize::new(usize::from(workers))
        .ok_or_else(|| WordFreqError::invalid_config("worker count must be at least 1"))?;

    Ok(CliOverrides {
        corpus_path: args.corpus.clone(),
        worker_count: Some(worker_count),
        backend: args
            .backend
            .as_deref()
            .map(str::parse::<BackendKind>)
            .transpose()?,
        top_k: args.top_k,
        max_word_len: args.max_word_len,
        boundary_mode: args
            .boundary
            .as_deref()
            .map(str::parse::<BoundaryMode>)
            .transpose()?,
        word_limit: args.word_limit,
        log_level: args.log_level.clone(),
    })
}

fn run_count(args: CountArgs) -> Result<()> {
    let file_config = CountConfig::load_from(args.config.as_deref())
        .map_err(|e| WordFreqError::invalid_config(e.to_string()))?;
    let config = file_config.merge_with_cli(cli_overrides(&args)?);
    config.validate()?;
    init_logging(&config.log_level);
    debug!("Effective configuration: {:?}", config);

    let corpus = Corpus::open(&config.corpus_path)?;
    let backend = create_backend(config.backend, None)?;

    let show_progress = !args.quiet && !args.json;
    let done = AtomicBool::new(false);
    let output: CountOutput = std::thread::scope(|s| {
        if show_progress {
            let progress = backend.progress();
            let done = &done;
            s.spawn(move || report_progress(progress, done));
        }
        let result = count_with(&config, &corpus, backend.as_ref());
        done.store(true, Ordering::Relaxed);
        result
    })?;

    if args.json {
        report::print_json(&output)
            .map_err(|e| WordFreqError::IoError(std::io::Error::other(e)))?;
    } else {
        report::print_report(&output, args.verbose);
    }
    Ok(())
}

fn report_progress(progress: Arc<dyn ProgressSink>, done: &AtomicBool) {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    while !done.load(Ordering::Relaxed) {
        spinner.set_message(format!("{} words counted", progress.words_processed()));
        spinner.tick();
        std::thread::sleep(Duration::from_millis(100));
    }
    spinner.finish_and_clear();
}

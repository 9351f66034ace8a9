//! FileOps - Command-line interface for the document job engine.
//!
//! Serves a local directory as a document endpoint and runs one copy, move or
//! delete job against it on a worker thread, reporting progress to stderr.

mod progress;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use crossbeam_channel::unbounded;
use engine::{
    DocumentInfo, DocumentStack, Job, JobError, JobFactory, LocalResolver, Notification, OpType,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::progress::{ChannelListener, JobEvent};

/// FileOps - Copy, move and delete documents
#[derive(Parser, Debug)]
#[command(name = "fileops")]
#[command(version = "0.1.0")]
#[command(about = "Run a copy, move or delete job over a local document root")]
struct Args {
    /// Directory served as the document root
    #[arg(long, value_name = "PATH")]
    root: PathBuf,

    /// Authority name the root is served under
    #[arg(long, value_name = "NAME", default_value = "local")]
    authority: String,

    /// Operation: copy, move, or delete
    #[arg(long, value_name = "OP", default_value = "copy")]
    op: String,

    /// Source document id, relative to the root (repeatable)
    #[arg(long = "src", value_name = "ID", required = true)]
    srcs: Vec<String>,

    /// Destination directory id, relative to the root
    #[arg(long, value_name = "ID")]
    dst: Option<String>,

    /// Job id (defaults to a random UUID)
    #[arg(long, value_name = "ID")]
    id: Option<String>,

    /// Print progress and notifications as JSON lines on stdout
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(long)]
    verbose: bool,
}

/// What the worker hands back once the job has been cleaned up.
struct JobReport {
    outcome: Result<(), JobError>,
    failed: Vec<DocumentInfo>,
    failure: Option<Notification>,
    warning: Option<Notification>,
}

/// CLI rendering of job events and notifications
struct CliRenderer {
    json: bool,
    verbose: bool,
    start_time: Instant,
}

impl CliRenderer {
    fn new(json: bool, verbose: bool) -> Self {
        CliRenderer {
            json,
            verbose,
            start_time: Instant::now(),
        }
    }

    fn format_duration(elapsed: std::time::Duration) -> String {
        let secs = elapsed.as_secs();
        let mins = secs / 60;
        let secs = secs % 60;

        if mins > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}s", secs)
        }
    }

    fn print_progress_bar(percent: u32) -> String {
        let filled = (percent.min(100) / 5) as usize;
        let empty = 20 - filled;
        format!(
            "[{}{}] {}%",
            "=".repeat(filled),
            " ".repeat(empty),
            percent
        )
    }

    fn event(&self, event: &JobEvent) -> anyhow::Result<()> {
        match event {
            JobEvent::Started { job_id, label } => {
                if self.json {
                    println!("{}", serde_json::json!({ "event": "started", "job_id": job_id }));
                } else {
                    eprintln!("{} ({})", label, job_id);
                }
            }
            JobEvent::Progress(progress) => {
                if self.json {
                    println!("{}", serde_json::to_string(progress)?);
                } else {
                    eprint!(
                        "\rProgress: {} | {}/{} documents",
                        Self::print_progress_bar(progress.percent()),
                        progress.completed,
                        progress.total
                    );
                    let _ = std::io::Write::flush(&mut std::io::stderr());
                }
            }
            JobEvent::Finished {
                job_id,
                state,
                failed,
                canceled,
            } => {
                if self.json {
                    println!(
                        "{}",
                        serde_json::json!({
                            "event": "finished",
                            "job_id": job_id,
                            "state": state.to_string(),
                            "failed": failed,
                            "canceled": canceled,
                        })
                    );
                } else {
                    eprintln!();
                    eprintln!(
                        "Job {}: {} failed{}",
                        state,
                        failed,
                        if *canceled { " (canceled)" } else { "" }
                    );
                    eprintln!("Elapsed: {}", Self::format_duration(self.start_time.elapsed()));
                }
            }
        }
        Ok(())
    }

    fn notification(&self, notification: &Notification) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(notification)?);
            return Ok(());
        }

        eprintln!("{}", notification.title);
        if let Some(ref text) = notification.content_text {
            eprintln!("  {}", text);
        }
        if self.verbose {
            if let Some(ref intent) = notification.content_intent {
                for doc in &intent.documents {
                    eprintln!("  {}", doc.derived_uri);
                }
            }
        }
        Ok(())
    }
}

/// Parse arguments, run the job, and map failures to exit code 2
fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let exit_code = match run_cli(&args) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Parent directory id of a document id; the root's id is `""`.
fn parent_id(document_id: &str) -> &str {
    document_id
        .trim_matches('/')
        .rsplit_once('/')
        .map(|(parent, _)| parent)
        .unwrap_or("")
}

/// Main CLI logic - separated for testability
fn run_cli(args: &Args) -> anyhow::Result<()> {
    if !args.root.is_dir() {
        bail!("Root is not a directory: {}", args.root.display());
    }

    let op_type = args.op.parse().unwrap_or(OpType::Unknown);
    if !op_type.is_known() {
        bail!(
            "Invalid operation '{}'. Must be 'copy', 'move', or 'delete'",
            args.op
        );
    }

    let resolver = LocalResolver::new().with_root(&args.authority, &args.root);

    let srcs = args
        .srcs
        .iter()
        .map(|id| {
            resolver
                .document(&args.authority, id)
                .with_context(|| format!("Source document not found: {}", id))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let src_parent = match op_type {
        OpType::Move | OpType::Delete => {
            let parent = parent_id(&args.srcs[0]);
            Some(
                resolver
                    .document(&args.authority, parent)
                    .with_context(|| format!("Source parent not found: '{}'", parent))?,
            )
        }
        _ => None,
    };

    let mut stack = DocumentStack::new(Some(args.authority.clone()), Vec::new());
    match (&args.dst, op_type) {
        (Some(dst), _) => {
            let dest = resolver
                .document(&args.authority, dst)
                .with_context(|| format!("Destination not found: {}", dst))?;
            if !dest.is_directory() {
                bail!("Destination is not a directory: {}", dst);
            }
            stack.push(dest);
        }
        (None, OpType::Copy | OpType::Move) => {
            bail!("--dst is required for {}", op_type);
        }
        (None, _) => {}
    }

    let id = args
        .id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let (tx, rx) = unbounded::<JobEvent>();
    let job = JobFactory::new().create(
        op_type,
        Arc::new(resolver),
        Arc::new(ChannelListener::new(tx)),
        id,
        stack,
        srcs,
        src_parent,
    )?;

    let renderer = CliRenderer::new(args.json, args.verbose);
    renderer.notification(&job.setup_notification())?;

    let handle = thread::Builder::new()
        .name(format!("job-{}", job.id()))
        .spawn(move || execute(job))
        .context("Failed to spawn worker thread")?;

    // The channel closes when the worker drops the job.
    for event in rx.iter() {
        renderer.event(&event)?;
    }

    let report = handle
        .join()
        .map_err(|_| anyhow!("Worker thread panicked"))?;
    report.outcome?;

    if let Some(ref warning) = report.warning {
        renderer.notification(warning)?;
    }
    if let Some(ref failure) = report.failure {
        renderer.notification(failure)?;
    }

    if report.failed.is_empty() {
        Ok(())
    } else {
        bail!("{} document(s) failed", report.failed.len())
    }
}

/// Worker thread body: run, release clients, and collect the results.
fn execute(mut job: Job) -> JobReport {
    let outcome = job.run();
    let released = job.cleanup();
    debug!(job_id = %job.id(), released, "released endpoint clients");

    JobReport {
        outcome,
        failed: job.failed_files().to_vec(),
        failure: job.has_failures().then(|| job.failure_notification()),
        warning: job.warning_notification(),
    }
}

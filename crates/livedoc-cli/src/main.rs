//! livedoc - documentation for code changes
//!
//! The `livedoc` command turns a diff into reviewed Markdown documentation.
//!
//! ## Commands
//!
//! - `process`: Run the documentation pipeline on a diff
//! - `diff`: Show the diff `process` would document
//! - `commit`: Commit a documentation file
//! - `log`: Show recent commits
//! - `config`: Show the effective configuration
//! - `replay`: Print a recorded run report after verifying its digest

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn, Level};

use livedoc_core::{
    commit_documentation, diff_against, diff_between, is_git_repo, read_run_report,
    recent_commits, uncommitted_diff, write_run_report, DocumentationUpdate, LivedocConfig,
    Orchestrator, PipelineRun, RunReport, DEFAULT_COMMIT_MESSAGE, METRICS,
};

#[derive(Parser)]
#[command(name = "livedoc")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Self-correcting documentation for code changes", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// TOML configuration file
    #[arg(short, long, global = true, env = "LIVEDOC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Document a diff: draft, execute snippets, evaluate, revise
    Process(ProcessArgs),

    /// Print the diff `process` would use for a repository
    Diff {
        /// Repository path (default: git.repo_path)
        #[arg(short, long)]
        repo: Option<PathBuf>,

        /// Branch to diff against when the work tree is clean
        #[arg(short, long, conflicts_with = "from")]
        branch: Option<String>,

        /// Diff between two revisions instead, starting at this one
        #[arg(long, requires = "to")]
        from: Option<String>,

        /// End revision for --from
        #[arg(long, requires = "from")]
        to: Option<String>,
    },

    /// Commit a file's content as documentation
    Commit {
        /// Path of the documentation file, relative to the repository
        path: String,

        /// File holding the documentation content
        #[arg(long)]
        content: PathBuf,

        /// Repository path (default: git.repo_path)
        #[arg(short, long)]
        repo: Option<PathBuf>,

        /// Commit message
        #[arg(short, long, default_value = DEFAULT_COMMIT_MESSAGE)]
        message: String,
    },

    /// Show recent commits
    Log {
        /// Repository path (default: git.repo_path)
        #[arg(short, long)]
        repo: Option<PathBuf>,

        /// Maximum number of commits to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show the effective configuration with secrets redacted
    Config,

    /// Print a recorded run report by run ID
    Replay {
        /// Run ID to replay
        #[arg(long)]
        run: String,

        /// Directory containing run reports
        #[arg(long, default_value = ".livedoc/runs")]
        report_dir: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
struct ProcessArgs {
    /// Read the diff from a file (`-` for stdin) instead of the repository
    #[arg(short, long)]
    diff_file: Option<PathBuf>,

    /// Repository path (default: git.repo_path)
    #[arg(short, long)]
    repo: Option<PathBuf>,

    /// Branch to diff against when the work tree is clean
    #[arg(short, long)]
    branch: Option<String>,

    /// Write the documentation file into the repository
    #[arg(short, long)]
    write: bool,

    /// Commit the documentation file (only when it cleared the quality gate)
    #[arg(long)]
    commit: bool,

    /// Commit even when the quality gate was not met
    #[arg(long, requires = "commit")]
    force: bool,

    /// Commit message
    #[arg(short, long, default_value = DEFAULT_COMMIT_MESSAGE)]
    message: String,

    /// Write a run report under this directory
    #[arg(long)]
    report_dir: Option<PathBuf>,

    /// Output format for the result
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct ProcessOutput<'a> {
    update: &'a DocumentationUpdate,
    run: &'a PipelineRun,
    #[serde(skip_serializing_if = "Option::is_none")]
    commit: Option<&'a str>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    livedoc_core::init_tracing(cli.json, level);

    let config = LivedocConfig::load(cli.config.as_deref())
        .context("Failed to load livedoc configuration")?;

    let result = match cli.command {
        Commands::Process(args) => cmd_process(&config, &args).await,
        Commands::Diff {
            repo,
            branch,
            from,
            to,
        } => {
            let range = from.as_deref().zip(to.as_deref());
            cmd_diff(&config, repo.as_deref(), branch.as_deref(), range)
        }
        Commands::Commit {
            path,
            content,
            repo,
            message,
        } => cmd_commit(&config, repo.as_deref(), &path, &content, &message),
        Commands::Log { repo, limit } => cmd_log(&config, repo.as_deref(), limit),
        Commands::Config => cmd_config(&config),
        Commands::Replay { run, report_dir } => cmd_replay(&run, &report_dir),
    };

    METRICS.flush();
    result
}

fn repo_dir(config: &LivedocConfig, repo: Option<&Path>) -> PathBuf {
    repo.map(Path::to_path_buf)
        .unwrap_or_else(|| config.git.repo_path.clone())
}

/// Uncommitted changes first, then the diff against `branch`.
fn repository_diff(repo: &Path, branch: &str) -> Result<String> {
    if !is_git_repo(repo) {
        anyhow::bail!("Not a git repository: {:?}", repo);
    }
    let diff = uncommitted_diff(repo).context("Failed to read uncommitted changes")?;
    if !diff.trim().is_empty() {
        return Ok(diff);
    }
    diff_against(repo, branch).with_context(|| format!("Failed to diff against {branch}"))
}

fn revision_diff(repo: &Path, from: &str, to: &str) -> Result<String> {
    if !is_git_repo(repo) {
        anyhow::bail!("Not a git repository: {:?}", repo);
    }
    diff_between(repo, from, to).with_context(|| format!("Failed to diff {from}..{to}"))
}

fn read_diff(args: &ProcessArgs, repo: &Path, branch: &str) -> Result<String> {
    match &args.diff_file {
        Some(path) if path.as_os_str() == "-" => {
            let mut diff = String::new();
            std::io::stdin()
                .read_to_string(&mut diff)
                .context("Failed to read diff from stdin")?;
            Ok(diff)
        }
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read diff file: {:?}", path)),
        None => repository_diff(repo, branch),
    }
}

/// Run the documentation pipeline
async fn cmd_process(config: &LivedocConfig, args: &ProcessArgs) -> Result<()> {
    let repo = repo_dir(config, args.repo.as_deref());
    let branch = args.branch.as_deref().unwrap_or(&config.git.branch);
    let diff = read_diff(args, &repo, branch)?;

    let orchestrator =
        Orchestrator::from_config(config).context("Failed to set up the pipeline")?;
    let outcome = orchestrator
        .process_traced(&diff, &repo.display().to_string())
        .await;
    orchestrator.shutdown().await;
    let (update, run) = outcome.context("Documentation pipeline failed")?;

    if let Some(dir) = &args.report_dir {
        let path = write_run_report(&RunReport::new(run.clone(), &update), dir)
            .context("Failed to write run report")?;
        info!(path = %path.display(), "run report written");
    }

    let mut commit_sha = None;
    if args.commit {
        if !update.ready_to_commit() && !args.force {
            anyhow::bail!(
                "Documentation scored {:.2}, below the {:.2} threshold; not committing (use --force to override)",
                update.evaluation_score(),
                config.quality.min_quality_threshold
            );
        }
        if !update.ready_to_commit() {
            warn!(
                score = update.evaluation_score(),
                "committing documentation below the quality threshold"
            );
        }
        let sha = commit_documentation(&repo, update.file_path(), update.content(), &args.message)
            .context("Failed to commit documentation")?;
        commit_sha = Some(sha);
    } else if args.write {
        let path = repo.join(update.file_path());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
        std::fs::write(&path, update.content())
            .with_context(|| format!("Failed to write documentation to {:?}", path))?;
        info!(path = %path.display(), "documentation written");
    }

    match args.format {
        OutputFormat::Json => {
            let output = ProcessOutput {
                update: &update,
                run: &run,
                commit: commit_sha.as_deref(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            print!("{}", render_summary(&update, &run));
            if let Some(sha) = &commit_sha {
                println!("Commit:     {}", sha);
            }
            println!();
            println!("{}", update.content());
        }
    }

    Ok(())
}

fn render_summary(update: &DocumentationUpdate, run: &PipelineRun) -> String {
    let failed = update
        .code_snippets()
        .iter()
        .filter(|s| !s.succeeded())
        .count();
    let mut out = String::new();
    out.push_str(&format!("Run:        {}\n", run.run_id));
    out.push_str(&format!("File:       {}\n", update.file_path()));
    out.push_str(&format!("Score:      {:.2}\n", update.evaluation_score()));
    out.push_str(&format!(
        "Ready:      {}\n",
        if update.ready_to_commit() { "yes" } else { "no" }
    ));
    out.push_str(&format!(
        "Revisions:  {} ({:?})\n",
        run.revisions_used, run.stop_reason
    ));
    out.push_str(&format!(
        "Snippets:   {} run, {} failed\n",
        update.code_snippets().len(),
        failed
    ));
    out
}

/// Print the diff that `process` would document
fn cmd_diff(
    config: &LivedocConfig,
    repo: Option<&Path>,
    branch: Option<&str>,
    range: Option<(&str, &str)>,
) -> Result<()> {
    let repo = repo_dir(config, repo);
    let diff = match range {
        Some((from, to)) => revision_diff(&repo, from, to)?,
        None => repository_diff(&repo, branch.unwrap_or(&config.git.branch))?,
    };
    if diff.trim().is_empty() {
        println!("No changes in {:?}", repo);
    } else {
        print!("{}", diff);
    }
    Ok(())
}

/// Commit a documentation file
fn cmd_commit(
    config: &LivedocConfig,
    repo: Option<&Path>,
    path: &str,
    content: &Path,
    message: &str,
) -> Result<()> {
    let repo = repo_dir(config, repo);
    let body = std::fs::read_to_string(content)
        .with_context(|| format!("Failed to read documentation content: {:?}", content))?;
    let sha = commit_documentation(&repo, path, &body, message)
        .with_context(|| format!("Failed to commit {path}"))?;
    println!("Committed {} as {}", path, sha);
    Ok(())
}

/// Show recent commits
fn cmd_log(config: &LivedocConfig, repo: Option<&Path>, limit: usize) -> Result<()> {
    let repo = repo_dir(config, repo);
    let commits = recent_commits(&repo, limit).context("Failed to read commit history")?;

    if commits.is_empty() {
        println!("No commits found in {:?}", repo);
        return Ok(());
    }

    for commit in commits {
        println!("commit {}", commit.hash);
        println!("Author: {}", commit.author);
        println!("Date:   {}", commit.date.format("%Y-%m-%d %H:%M:%S %z"));
        println!();
        for line in commit.message.lines() {
            println!("    {}", line);
        }
        println!();
    }

    Ok(())
}

/// Show the effective configuration
fn cmd_config(config: &LivedocConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&config.redacted())?);
    Ok(())
}

/// Print a recorded run report
fn cmd_replay(run_id: &str, report_dir: &Path) -> Result<()> {
    let report = read_run_report(run_id, report_dir)
        .with_context(|| format!("Failed to replay run {run_id} from {:?}", report_dir))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    println!("Report digest verified for run {}", run_id);
    Ok(())
}

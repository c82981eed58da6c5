use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use etz::build::{BuildTracker, Platform};
use etz::cleanup::CleanRequest;
use etz::commands::{self, new::NewArgs, parse_repo_branch, Context};
use etz::validation::{clap_branch_validator, clap_label_validator};
use etz::EtzError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, trace};

/// Exit code used when the user interrupts a running command
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Parser)]
#[command(name = "etz")]
#[command(about = "One label, one worktree per repository", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the config file (default: $ETZ_CONFIG, ./.etz.yaml, ~/.etz/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a worktree in every repository under one label
    New {
        /// Label naming the worktree group
        #[arg(value_parser = clap_label_validator)]
        label: String,

        /// Branch for every repository (default: the label)
        #[arg(short, long, value_parser = clap_branch_validator)]
        branch: Option<String>,

        /// Branch for one repository, as REPO=BRANCH
        #[arg(long = "repo-branch", value_parser = parse_repo_branch)]
        repo_branches: Vec<(String, String)>,

        /// Base branch for one repository, as REPO=BRANCH
        #[arg(long = "base", value_parser = parse_repo_branch)]
        base_branches: Vec<(String, String)>,

        /// Only create the worktree for this repository
        #[arg(long)]
        repo: Option<String>,

        /// Show what would happen without touching anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show worktree groups and their git state
    Status {
        /// Show only this label
        #[arg(value_parser = clap_label_validator)]
        label: Option<String>,
    },

    /// Remove the worktrees of a label
    Clean {
        #[arg(value_parser = clap_label_validator)]
        label: String,

        /// Only remove the worktree of this repository
        #[arg(long)]
        repo: Option<String>,

        /// Remove even when git refuses or the directory is not a worktree
        #[arg(short, long)]
        force: bool,

        /// Also delete the local branch of each removed worktree
        #[arg(long)]
        delete_branches: bool,

        /// Show what would happen without touching anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Check whether a repository worktree is ready to build
    Check {
        #[arg(value_parser = clap_label_validator)]
        label: String,
        repo: String,

        /// ios or android (default: detected from the repository)
        #[arg(long)]
        platform: Option<Platform>,
    },

    /// Build the app in a repository worktree
    Build {
        #[arg(value_parser = clap_label_validator)]
        label: String,
        repo: String,

        /// ios or android (default: detected from the repository)
        #[arg(long)]
        platform: Option<Platform>,
    },

    /// Run a fix action reported by `etz check`
    Fix {
        #[arg(value_parser = clap_label_validator)]
        label: String,
        repo: String,

        /// pod_install or build_infra_ios
        action: String,
    },

    /// Show the detected type of each repository
    Detect {
        /// Inspect the worktrees of this label instead of the primary clones
        #[arg(value_parser = clap_label_validator)]
        label: Option<String>,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .init();
}

fn run(cli: Cli) -> Result<bool> {
    let builds = BuildTracker::new();

    // Builds run in their own process groups, so a terminal Ctrl+C does not
    // reach them; kill them before leaving.
    let handler_builds = builds.clone();
    ctrlc::set_handler(move || {
        let killed = handler_builds.kill_all();
        if killed > 0 {
            eprintln!("\nInterrupted, killed {killed} running build(s)");
        }
        std::process::exit(INTERRUPTED_EXIT_CODE);
    })
    .context("Failed to set Ctrl+C handler")?;

    let ctx = Context::load(cli.config.as_deref(), builds, cli.json)?;

    let ok = match cli.command {
        Commands::New {
            label,
            branch,
            repo_branches,
            base_branches,
            repo,
            dry_run,
        } => commands::new::execute(
            &ctx,
            NewArgs {
                label,
                branch,
                repo_branches,
                base_branches,
                repo,
                dry_run,
            },
        )?,
        Commands::Status { label } => commands::status::execute(&ctx, label.as_deref())?,
        Commands::Clean {
            label,
            repo,
            force,
            delete_branches,
            dry_run,
        } => {
            let mut request = CleanRequest::new(label)
                .force(force)
                .delete_branches(delete_branches)
                .dry_run(dry_run);
            if let Some(repo) = repo {
                request = request.only_repo(repo);
            }
            commands::clean::execute(&ctx, request)?
        }
        Commands::Check {
            label,
            repo,
            platform,
        } => commands::build::check(&ctx, &label, &repo, platform)?,
        Commands::Build {
            label,
            repo,
            platform,
        } => commands::build::build(&ctx, &label, &repo, platform)?,
        Commands::Fix {
            label,
            repo,
            action,
        } => commands::build::fix(&ctx, &label, &repo, &action)?,
        Commands::Detect { label } => commands::detect::execute(&ctx, label.as_deref())?,
    };
    Ok(ok)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    debug!("etz started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            let code = e
                .downcast_ref::<EtzError>()
                .map(EtzError::exit_code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

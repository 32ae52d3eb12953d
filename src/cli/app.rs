//! CLI definitions and entry point

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands;
use kwalitee::config::Config;
use kwalitee::output::OutputMode;

/// kwalitee - commit message and license header quality gate
#[derive(Parser, Debug)]
#[command(
    name = "kwalitee",
    version,
    about = "Commit message and license header quality gate",
    long_about = "Check commit messages and changed files against project conventions.\n\n\
                  Run `kwalitee serve` to receive GitHub webhooks and report verdicts\n\
                  back as comments, statuses and labels, or use `kwalitee check`\n\
                  on a local repository."
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output in JSON format (machine-readable)
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (default: $KWALITEE_CONFIG, then the user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Receive webhooks and run the worker pool
    Serve {
        /// Listen address, overrides `server.bind`
        #[arg(short, long)]
        bind: Option<String>,

        /// Worker threads, overrides `server.workers`
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Check commit messages or files locally
    Check {
        #[command(subcommand)]
        action: CheckAction,
    },

    /// Assist with the release process
    Prepare {
        #[command(subcommand)]
        action: PrepareAction,
    },

    /// Manage hosting accounts
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },

    /// Manage registered repositories
    Repository {
        #[command(subcommand)]
        action: RepositoryAction,
    },

    /// Show version
    Version,
}

#[derive(Subcommand, Debug)]
pub enum CheckAction {
    /// Check commit messages of the current repository
    Message {
        /// Revision or range (`origin/master..HEAD`)
        #[arg(default_value = "HEAD", conflicts_with = "file")]
        range: String,

        /// Check the message stored in a file instead (e.g. from a commit-msg hook)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Check license headers and run analyzers on files and directories
    Files {
        /// Files or directories, walked recursively
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Expected copyright year (default: current year)
        #[arg(long)]
        year: Option<i32>,
    },
}

#[derive(Subcommand, Debug)]
pub enum PrepareAction {
    /// Print release notes built from labelled bullets
    Release {
        /// Revision or range; a single revision takes its whole history
        #[arg(default_value = "HEAD")]
        range: String,

        /// Group bullets by component
        #[arg(short = 'C', long)]
        components: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum AccountAction {
    /// Register an account, or update its email and token
    Add {
        /// Account name on the hosting platform
        name: String,

        /// Contact address
        #[arg(short, long)]
        email: Option<String>,

        /// API token used for this account's repositories
        #[arg(short, long)]
        token: Option<String>,
    },

    /// List accounts
    List,
}

#[derive(Subcommand, Debug)]
pub enum RepositoryAction {
    /// Register `owner/name`, creating the owner when needed
    Add {
        /// Repository as `owner/name`
        repository: String,
    },

    /// List the repositories of an account
    List {
        /// Account name
        owner: String,
    },

    /// Remove `owner/name` with all its verdicts
    Remove {
        /// Repository as `owner/name`
        repository: String,
    },
}

/// Run the CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let Some(command) = cli.command else {
        if output_mode == OutputMode::Json {
            println!(
                "{}",
                serde_json::json!({
                    "version": env!("CARGO_PKG_VERSION"),
                    "hint": "Use --help for usage"
                })
            );
        } else {
            println!("kwalitee v{}", env!("CARGO_PKG_VERSION"));
            println!("\nRun 'kwalitee --help' for usage");
        }
        return Ok(());
    };

    if let Command::Version = command {
        if output_mode == OutputMode::Json {
            println!("{}", serde_json::json!({ "version": env!("CARGO_PKG_VERSION") }));
        } else {
            println!("kwalitee v{}", env!("CARGO_PKG_VERSION"));
        }
        return Ok(());
    }

    let config = Config::load(cli.config)?;
    match command {
        Command::Serve { bind, workers } => commands::serve(config, bind, workers),
        Command::Check {
            action: CheckAction::Message { range, file },
        } => commands::check_message(&config, &range, file.as_deref(), output_mode),
        Command::Check {
            action: CheckAction::Files { paths, year },
        } => commands::check_files(&config, &paths, year, output_mode),
        Command::Prepare {
            action: PrepareAction::Release { range, components },
        } => commands::release(&config, &range, components, output_mode),
        Command::Account { action } => commands::account(&config, action, output_mode),
        Command::Repository { action } => commands::repository(&config, action, output_mode),
        Command::Version => Ok(()),
    }
}

use clap::{Parser, Subcommand};
use colored::Colorize;
use git_light::areas::repository::Repository;
use git_light::artifacts::core::PagerWriter;
use git_light::commands::porcelain::log::LogOptions;
use git_light::config::{Config, DEFAULT_LOG_FILTER, LOG_ENV};
use is_terminal::IsTerminal;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "git-light",
    version = "0.1.0",
    about = "A small, git-inspired version-control engine",
    long_about = "git-light tracks snapshots of a file tree as line-based deltas \
    in a content-addressed store, organised into branches.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "This command initializes a new repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<String>,
    },
    #[command(
        name = "add",
        about = "Stage files for the next commit",
        long_about = "This command stages files, directories or, with '*' or '.', the whole working tree."
    )]
    Add {
        #[arg(index = 1, required = true, help = "Files, directories, '*' or '.'")]
        paths: Vec<String>,
    },
    #[command(
        name = "commit",
        about = "Create a new commit from the staged changes",
        long_about = "This command finalizes the staged changes into a commit on the current branch."
    )]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
        #[arg(short, long, help = "The committer, defaults to GIT_LIGHT_COMMITTER")]
        committer: Option<String>,
    },
    #[command(
        name = "checkout",
        about = "Restore the working tree from a branch, commit or ancestor",
        long_about = "This command accepts a branch name, a full commit hash or HEAD~<n>."
    )]
    Checkout {
        #[arg(index = 1, help = "Branch, commit hash or HEAD~<n>")]
        target: String,
    },
    #[command(
        name = "log",
        about = "Show the commit history",
        long_about = "This command shows the commits from HEAD, or from the given branch, back to the root."
    )]
    Log {
        #[arg(long, help = "Show each commit on a single line")]
        oneline: bool,
        #[arg(long = "abbrev-commit", help = "Show abbreviated commit IDs")]
        abbrev_commit: bool,
        #[arg(index = 1, help = "Branch to show instead of HEAD")]
        branch: Option<String>,
    },
    #[command(
        name = "branch",
        about = "Create, delete or list branches",
        long_about = "Without flags this command creates a branch at HEAD."
    )]
    Branch {
        #[arg(index = 1, required_unless_present = "all", help = "The branch name")]
        name: Option<String>,
        #[arg(short, long, requires = "name", help = "Delete the branch")]
        delete: bool,
        #[arg(short, long, conflicts_with = "delete", help = "List every branch")]
        all: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();

    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

fn open_repository(path: Option<&str>) -> anyhow::Result<Repository> {
    let pwd = std::env::current_dir()?;
    let path = path
        .map(str::to_string)
        .unwrap_or_else(|| pwd.to_string_lossy().to_string());

    Ok(Repository::new(&path, Box::new(std::io::stdout()))?)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Init { path } => open_repository(path.as_deref())?.init()?,
        Commands::Add { paths } => open_repository(None)?.add(&paths)?,
        Commands::Commit { message, committer } => {
            open_repository(None)?.commit(&message, committer.as_deref())?
        }
        Commands::Checkout { target } => open_repository(None)?.checkout(&target)?,
        Commands::Log {
            oneline,
            abbrev_commit,
            branch,
        } => {
            let opts = LogOptions {
                oneline,
                abbrev_commit,
                branch,
            };
            run_log(&opts)?
        }
        Commands::Branch { name, delete, all } => {
            let mut repository = open_repository(None)?;

            match name {
                _ if all => repository.list_branches()?,
                Some(name) if delete => repository.delete_branch(&name)?,
                Some(name) => repository.branch(&name)?,
                None => repository.list_branches()?,
            }
        }
    }

    Ok(())
}

fn run_log(opts: &LogOptions) -> anyhow::Result<()> {
    let config = Config::load_from_env();

    if !config.use_pager() || !std::io::stdout().is_terminal() {
        return open_repository(None)?.log(opts);
    }

    let pager = minus::Pager::new();
    let pwd = std::env::current_dir()?;
    let repository = Repository::with_config(
        &pwd.to_string_lossy(),
        Box::new(PagerWriter::new(pager.clone())),
        config,
    )?;
    repository.log(opts)?;
    drop(repository);

    minus::page_all(pager)?;

    Ok(())
}

//! CLI for the gh-fanout tool.

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use gh_fanout::config::CONFIG_ENV;
use gh_fanout::prelude::*;
use gh_fanout::select::{filter_by_globs, prompt_selection};
use std::fmt::Display;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "gh-fanout")]
#[command(author, version, about = "Create branches and pull requests across GitHub repositories", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Account that owns the repositories (defaults to GITHUB_OWNER)
    #[arg(long, global = true)]
    owner: Option<String>,

    /// Access token (defaults to GITHUB_TOKEN)
    #[arg(long, global = true, hide = true)]
    token: Option<String>,

    /// GitHub API root
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Path to a YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Which repositories to run against.
#[derive(Args)]
struct Targets {
    /// Repositories, as `name` or `owner/name` (comma-separated or repeated)
    #[arg(short = 'r', long = "repo", value_delimiter = ',')]
    repos: Vec<String>,

    /// Add every visible repository matching this glob
    #[arg(short = 'm', long = "match")]
    patterns: Vec<String>,

    /// Pick repositories from a numbered list
    #[arg(short, long)]
    interactive: bool,

    /// Undo earlier successes and stop on the first failure
    #[arg(short = 'R', long, overrides_with = "no_rollback")]
    rollback: bool,

    /// Keep going after failures, even if the config file enables rollback
    #[arg(long, overrides_with = "rollback")]
    no_rollback: bool,
}

impl Targets {
    /// Rollback choice from the command line, if one was made.
    fn rollback_override(&self) -> Option<bool> {
        match (self.rollback, self.no_rollback) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a branch in each selected repository
    CreateBranch {
        /// Name of the branch to create
        #[arg(short, long)]
        branch: String,

        /// Branch to create it from
        #[arg(short = 'B', long)]
        base: Option<String>,

        #[command(flatten)]
        targets: Targets,
    },

    /// Open a pull request in each selected repository
    CreatePr {
        /// Branch containing the changes
        #[arg(short, long)]
        branch: String,

        /// Pull request title
        #[arg(short, long)]
        title: String,

        /// Pull request description
        #[arg(short = 'd', long, default_value = "")]
        body: String,

        /// Branch to merge into
        #[arg(short = 'B', long)]
        base: Option<String>,

        /// Open as a draft
        #[arg(long)]
        draft: bool,

        #[command(flatten)]
        targets: Targets,
    },

    /// List repositories visible to the token
    ListRepos {
        /// Only show repositories matching this glob
        #[arg(short = 'm', long = "match")]
        patterns: Vec<String>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    gh_fanout::logging::init(cli.verbose);

    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    let file = FileConfig::discover(config_path.as_deref()).context("Failed to load config")?;

    let mut overrides = Overrides {
        token: cli.token,
        owner: cli.owner,
        api_url: cli.api_url,
        timeout_secs: cli.timeout,
        ..Default::default()
    };

    match cli.command {
        Commands::CreateBranch {
            branch,
            base,
            targets,
        } => {
            overrides.base_branch = base;
            overrides.rollback = targets.rollback_override();
            let settings = Settings::from_env(&overrides, &file)?;
            cmd_create_branch(&settings, branch, &targets)
        }
        Commands::CreatePr {
            branch,
            title,
            body,
            base,
            draft,
            targets,
        } => {
            overrides.base_branch = base;
            overrides.rollback = targets.rollback_override();
            let settings = Settings::from_env(&overrides, &file)?;
            cmd_create_pr(&settings, branch, title, body, draft, &targets)
        }
        Commands::ListRepos { patterns } => {
            let settings = Settings::from_env(&overrides, &file)?;
            cmd_list_repos(&settings, &patterns)
        }
    }
}

fn cmd_create_branch(settings: &Settings, branch: String, targets: &Targets) -> Result<ExitCode> {
    let client = settings.client()?;
    let spec = BranchSpec::new(branch, &settings.base_branch);
    let mut op = CreateBranches::new(&client, &spec)?;

    let repos = resolve_targets(&client, targets, "create a branch")?;
    println!(
        "Creating branch '{}' from '{}' in {} repositories",
        spec.new_name,
        spec.base,
        repos.len()
    );

    let outcome = Batch::new(repos)
        .default_owner(client.owner())
        .rollback(settings.rollback)
        .run(&mut op)
        .context("Branch creation failed")?;

    Ok(report(&outcome))
}

fn cmd_create_pr(
    settings: &Settings,
    branch: String,
    title: String,
    body: String,
    draft: bool,
    targets: &Targets,
) -> Result<ExitCode> {
    let client = settings.client()?;
    let mut spec = PullRequestSpec::new(title, branch)
        .body(body)
        .base(&settings.base_branch);
    if draft {
        spec = spec.draft();
    }
    let mut op = OpenPullRequests::new(&client, &spec)?;

    let repos = resolve_targets(&client, targets, "open a pull request")?;
    println!(
        "Opening pull request '{}' ({} -> {}) in {} repositories",
        spec.title,
        spec.head,
        spec.base,
        repos.len()
    );

    let outcome = Batch::new(repos)
        .default_owner(client.owner())
        .rollback(settings.rollback)
        .run(&mut op)
        .context("Pull request creation failed")?;

    Ok(report(&outcome))
}

fn cmd_list_repos(settings: &Settings, patterns: &[String]) -> Result<ExitCode> {
    let client = settings.client()?;
    let mut repos = client
        .list_repositories()
        .context("Failed to list repositories")?;
    if !patterns.is_empty() {
        repos = filter_by_globs(&repos, patterns)?;
    }

    for repo in &repos {
        println!("{}", repo);
    }
    Ok(ExitCode::SUCCESS)
}

/// Merge explicit names, glob matches and the interactive pick into one list.
fn resolve_targets(
    client: &GitHubClient,
    targets: &Targets,
    action: &str,
) -> Result<Vec<RepositoryRef>> {
    let mut selected = targets
        .repos
        .iter()
        .filter(|r| !r.trim().is_empty())
        .map(|r| RepositoryRef::parse(r))
        .collect::<gh_fanout::Result<Vec<_>>>()?;

    let prompt = targets.interactive || (selected.is_empty() && targets.patterns.is_empty());

    if prompt || !targets.patterns.is_empty() {
        let mut available = client
            .list_repositories()
            .context("Failed to list repositories")?;
        if !targets.patterns.is_empty() {
            available = filter_by_globs(&available, &targets.patterns)?;
        }

        if prompt {
            let stdin = std::io::stdin();
            let picked = prompt_selection(&available, action, stdin.lock(), std::io::stdout())?;
            selected.extend(picked);
        } else {
            selected.extend(available);
        }
    }

    let repos = dedupe_for_owner(selected, client.owner());
    if repos.is_empty() {
        anyhow::bail!(FanoutError::InvalidInput(
            "no valid repositories selected".into()
        ));
    }
    Ok(repos)
}

/// Print the outcome and map it to an exit status.
fn report<H: Display>(outcome: &BatchOutcome<H>) -> ExitCode {
    for (repo, result) in &outcome.entries {
        match result {
            OperationResult::Created(handle) => println!("  created   {} ({})", repo, handle),
            OperationResult::AlreadyExisted(handle) => {
                println!("  exists    {} ({})", repo, handle)
            }
            OperationResult::Failed { kind, message } => {
                println!("  FAILED    {} [{}] {}", repo, kind, message)
            }
        }
    }

    for handle in &outcome.rolled_back {
        println!("  rolled back {}", handle);
    }

    if outcome.rollback_partial_failure() {
        eprintln!("{}:", ErrorKind::RollbackPartialFailure);
        for failure in &outcome.rollback_failures {
            eprintln!(
                "  {} ({}) [{}] {}",
                failure.repo, failure.handle, failure.kind, failure.message
            );
        }
    }

    for repo in &outcome.skipped {
        println!("  skipped   {}", repo);
    }

    println!("\n{}", outcome.summary());

    if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

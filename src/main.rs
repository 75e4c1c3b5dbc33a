use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use release_keeper::component::{self, ExecutionMode, Runner};
use release_keeper::config::{self, Config, RepoConfig};
use release_keeper::domain::{parse_backport_label, parse_version, MinorVersion, ReleaseIntent};
use release_keeper::git::{Git2Repository, SystemGit};
use release_keeper::hosting::GitHubClient;
use release_keeper::ui;
use release_keeper::workflow::Workflow;

#[derive(Parser)]
#[command(
    name = "release-keeper",
    version,
    about = "Release branch automation: release candidates, release branches, backports, forwardports and syncs"
)]
struct Cli {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(long, global = true, help = "Repository owner (defaults to GITHUB_REPOSITORY)")]
    owner: Option<String>,

    #[arg(long, global = true, help = "Repository name (defaults to GITHUB_REPOSITORY)")]
    repo: Option<String>,

    #[arg(long, global = true, help = "Preview what would happen without making changes")]
    dry_run: bool,

    #[arg(
        long,
        global = true,
        default_value = ".",
        help = "Working copy used for cherry-picks and merges"
    )]
    workdir: PathBuf,

    #[arg(
        long,
        global = true,
        help = "Read and write refs through the local clone, pushing created refs to the remote"
    )]
    local: bool,

    #[arg(short, long, global = true, action = ArgAction::Count, help = "Increase log verbosity")]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Tag the next release candidate and publish a draft prerelease
    CreateRc {
        #[arg(long, help = "Version to tag (defaults to the open release-please PR's version)")]
        version: Option<String>,

        #[arg(long, help = "Ref to tag (defaults to trunk, or the release PR's head)")]
        source: Option<String>,
    },

    /// Cut the next release branch from trunk
    CreateReleaseBranch {
        #[arg(long, help = "Release line, e.g. v1.16 (defaults to the manifest's next minor)")]
        version: Option<String>,

        #[arg(long, help = "Ref to branch from (defaults to trunk)")]
        source: Option<String>,
    },

    /// Cherry-pick a merged trunk PR onto a release branch
    Backport {
        #[arg(long, help = "Pull request number")]
        pr: u64,

        #[arg(long, help = "Backport label, e.g. backport/v1.15")]
        label: String,
    },

    /// Merge a release branch into trunk with the ours strategy after a release
    Forwardport {
        #[arg(long, help = "Merged release-please pull request number")]
        pr: u64,
    },

    /// Sync a release branch's content back to trunk as one commit
    SyncReleaseBranch {
        #[arg(long, help = "Release tag, e.g. v1.15.1")]
        tag: String,
    },

    /// Cherry-pick a merged release-please PR from its release branch onto trunk
    SyncReleasePr {
        #[arg(long, help = "Merged release-please pull request number")]
        pr: u64,
    },

    /// List the registered components
    Components,

    /// Run registered components
    RunComponents {
        #[arg(help = "Component names (defaults to all)")]
        names: Vec<String>,

        #[arg(long, help = "Run components in parallel, stopping at the first failure")]
        concurrent: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "release_keeper=info",
        _ => "release_keeper=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Components => {
            let registry = component::install(component::builtin()?)?;
            ui::display_components(registry);
            return Ok(());
        }
        Command::RunComponents { names, concurrent } => {
            return run_components(names, *concurrent);
        }
        _ => {}
    }

    let config = config::load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    let intent = intent_from_command(&cli.command, &config)?;
    let repo_config = RepoConfig::from_env(cli.owner.as_deref(), cli.repo.as_deref())?;

    let client = GitHubClient::new(&repo_config, &config.github)?;
    let worktree = SystemGit::new(&cli.workdir, config.branches.remote.clone());

    ui::display_intent(&intent, cli.dry_run);

    let outcome = if cli.local {
        let local = Git2Repository::open(&cli.workdir)
            .context("Failed to open the local repository")?
            .with_remote(config.branches.remote.clone(), Some(repo_config.token.clone()))
            .with_identity(config.identity.clone());
        Workflow::new(&local, &client, &worktree, &config)
            .dry_run(cli.dry_run)
            .run(&intent)?
    } else {
        Workflow::new(&client, &client, &worktree, &config)
            .dry_run(cli.dry_run)
            .run(&intent)?
    };

    ui::display_outcome(&outcome);
    Ok(())
}

/// Turn the subcommand into an intent, rejecting malformed versions and labels up front
fn intent_from_command(command: &Command, config: &Config) -> Result<ReleaseIntent> {
    let intent = match command {
        Command::CreateRc { version, source } => ReleaseIntent::CreateReleaseCandidate {
            version: version.as_deref().map(parse_version).transpose()?,
            source: source.clone(),
        },
        Command::CreateReleaseBranch { version, source } => ReleaseIntent::CreateReleaseBranch {
            version: version.as_deref().map(MinorVersion::parse).transpose()?,
            source: source.clone().unwrap_or_else(|| config.branches.trunk.clone()),
        },
        Command::Backport { pr, label } => ReleaseIntent::Backport {
            pr_number: *pr,
            target: parse_backport_label(label)?,
        },
        Command::Forwardport { pr } => ReleaseIntent::Forwardport { pr_number: *pr },
        Command::SyncReleaseBranch { tag } => ReleaseIntent::SyncReleaseBranchToMain { tag: tag.clone() },
        Command::SyncReleasePr { pr } => ReleaseIntent::SyncReleasePr { pr_number: *pr },
        Command::Components | Command::RunComponents { .. } => {
            anyhow::bail!("component commands are not release workflows")
        }
    };
    Ok(intent)
}

fn run_components(names: &[String], concurrent: bool) -> Result<()> {
    let registry = component::install(component::builtin()?)?;

    let selected: Vec<&str> = if names.is_empty() {
        registry.names()
    } else {
        names.iter().map(String::as_str).collect()
    };
    let mode = if concurrent {
        ExecutionMode::Concurrent
    } else {
        ExecutionMode::Sequential
    };

    let runner = Runner::from_registry(registry, &selected, mode)?;
    runner.run()?;
    ui::display_success(&format!("{} component(s) completed", runner.len()));
    Ok(())
}

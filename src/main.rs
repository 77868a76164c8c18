use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use plugin_center::config::{OutputMode, RegistryConfig};

mod cli;

#[derive(Parser)]
#[command(name = "plugin-center")]
#[command(about = "Build a versioned plugin registry from a plugins directory", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct GlobalArgs {
    /// Workspace root containing plugins/ (overrides GITHUB_WORKSPACE)
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    /// Repository full name recorded in entries (overrides REPO_FULL_NAME)
    #[arg(long, global = true)]
    repo: Option<String>,

    /// Branch or tag recorded as `ref` (overrides DEFAULT_REF)
    #[arg(long = "ref", global = true)]
    reference: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan plugins/ and write the registry document (default)
    Generate {
        /// Version entry shape: packaged or reference (overrides REGISTRY_MODE)
        #[arg(short, long)]
        mode: Option<OutputMode>,

        /// Registry document path (default: <workspace>/index.yaml)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Base URL for artifact sources (overrides ARTIFACT_BASE_URL)
        #[arg(long)]
        base_url: Option<String>,

        /// Abort on malformed manifests instead of skipping them
        #[arg(long)]
        strict: bool,
    },
    /// Recompute artifact digests and compare them with a registry document
    Verify {
        /// Registry document to check (default: <workspace>/index.yaml)
        #[arg(long)]
        registry: Option<PathBuf>,

        /// Directory holding the artifacts (default: <workspace>/artifacts)
        #[arg(long)]
        artifacts: Option<PathBuf>,
    },
    /// Show version information
    Version,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

fn resolve_config(global: &GlobalArgs) -> Result<RegistryConfig> {
    let mut config = RegistryConfig::from_env().with_context(|| "Failed to read configuration")?;
    if let Some(workspace) = &global.workspace {
        config.workspace = workspace.clone();
    }
    if let Some(repo) = &global.repo {
        config.repo = repo.clone();
    }
    if let Some(reference) = &global.reference {
        config.default_ref = reference.clone();
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    // Only commands that need configuration read the environment.
    match cli.command {
        Some(Commands::Version) => {
            println!("plugin-center {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        None => cli::cmd_generate(resolve_config(&cli.global)?),
        Some(Commands::Generate {
            mode,
            output,
            base_url,
            strict,
        }) => {
            let mut config = resolve_config(&cli.global)?;
            if let Some(mode) = mode {
                config.mode = mode;
            }
            if output.is_some() {
                config.output = output;
            }
            if base_url.is_some() {
                config.artifact_base_url = base_url;
            }
            config.strict |= strict;
            cli::cmd_generate(config)
        }
        Some(Commands::Verify {
            registry,
            artifacts,
        }) => cli::cmd_verify(resolve_config(&cli.global)?, registry, artifacts),
    }
}

fn main() -> Result<()> {
    // Missing .env is fine; the environment and defaults still apply.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.global.json_logs);
    run(cli)
}

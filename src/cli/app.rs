//! CLI definitions and entry point

use clap::{Args, Parser, Subcommand};

use super::commands;
use qualities::core::models::RunScope;
use qualities::output::OutputMode;

/// qualities - Staged verification pipeline
#[derive(Parser, Debug)]
#[command(
    name = "qualities",
    version,
    about = "Staged verification pipeline with selective scoping and drift detection",
    long_about = "Run policy scans, type checks, linters and tests as one ordered pipeline.\n\n\
                  Gate runs stop at the first failing stage. Stages bound to a configuration\n\
                  unit refuse to run while the unit's manifest has drifted."
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output in JSON format (machine-readable)
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a starter .qualities.toml
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Run the pipeline
    Run {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Narrow lint stages to changed files
        #[arg(long)]
        changed_only: bool,
    },

    /// Scan source files for banned patterns
    Scan {
        /// Files to scan (default: the project's source globs)
        paths: Vec<String>,

        /// Only run these rules
        #[arg(short, long = "rule")]
        rules: Vec<String>,

        /// Only scan files changed since the baseline revision
        #[arg(long)]
        changed_only: bool,

        /// Apply rule replacements to the reported lines
        #[arg(long)]
        fix: bool,
    },

    /// Generate and verify configuration-unit manifests
    Manifest {
        #[command(subcommand)]
        action: ManifestAction,
    },

    /// Show the secondary-suite decision and changed-only file sets
    Scope {
        /// Also show narrowed lint file sets
        #[arg(long)]
        changed_only: bool,
    },

    /// Read or update the last-verified marker
    Baseline {
        #[command(subcommand)]
        action: BaselineAction,
    },

    /// Show version
    Version,
}

/// Mutually exclusive run scopes; preflight when none is given
#[derive(Args, Debug)]
#[group(multiple = false)]
pub struct ScopeArgs {
    /// Enforced gate, CI stages
    #[arg(long)]
    ci: bool,

    /// Enforced gate, local stages (default)
    #[arg(long)]
    preflight: bool,

    /// Non-blocking diagnostics pass
    #[arg(long)]
    diagnostics: bool,
}

impl ScopeArgs {
    /// Selected run scope
    pub const fn run_scope(&self) -> RunScope {
        if self.ci {
            RunScope::Ci
        } else if self.diagnostics {
            RunScope::Diagnostics
        } else {
            RunScope::Preflight
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ManifestAction {
    /// Compute and store manifests
    Generate {
        /// Unit id
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        unit: Option<String>,

        /// Every declared unit
        #[arg(long)]
        all: bool,
    },

    /// Verify manifests against the live files
    Check {
        /// Unit id
        #[arg(conflicts_with = "all")]
        unit: Option<String>,

        /// Every declared unit (default)
        #[arg(long)]
        all: bool,

        /// Delete the manifest and artifact of expired units
        #[arg(long)]
        expire: bool,
    },

    /// Print a stored manifest
    Show {
        /// Unit id
        unit: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum BaselineAction {
    /// Record now as the last verification
    Mark,

    /// Print the stored marker
    Show,
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

    match cli.command {
        Some(Command::Init { force }) => commands::init(force, output_mode),
        Some(Command::Run {
            scope,
            changed_only,
        }) => commands::run(scope.run_scope(), changed_only, output_mode),
        Some(Command::Scan {
            paths,
            rules,
            changed_only,
            fix,
        }) => commands::scan(&paths, &rules, changed_only, fix, output_mode),
        Some(Command::Manifest { action }) => commands::manifest(action, output_mode),
        Some(Command::Scope { changed_only }) => commands::scope(changed_only, output_mode),
        Some(Command::Baseline { action }) => commands::baseline(&action, output_mode),
        Some(Command::Version) => {
            if output_mode == OutputMode::Json {
                println!(
                    "{}",
                    serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION")
                    })
                );
            } else {
                println!("qualities v{}", env!("CARGO_PKG_VERSION"));
            }
            Ok(())
        },
        None => {
            if output_mode == OutputMode::Json {
                println!(
                    "{}",
                    serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION"),
                        "hint": "Use --help for usage"
                    })
                );
            } else {
                println!("qualities v{}", env!("CARGO_PKG_VERSION"));
                println!("\nRun 'qualities --help' for usage");
                println!("Run 'qualities init' to get started");
            }
            Ok(())
        },
    }
}

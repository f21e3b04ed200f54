//! scriptbox — a personal library of Python scripts with isolated,
//! self-reconciling dependency environments.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use scriptbox_platform::Paths;

mod cmd;
mod output;
mod prompts;

/// scriptbox - run Python scripts in per-script environments
#[derive(Parser)]
#[command(name = "scriptbox")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// List all available scripts
  List,

  /// Run a script, reconciling its environment first
  Run {
    /// Script name
    script: String,

    /// Arguments passed through to the script
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
  },

  /// Add a local Python script to the library
  Add {
    /// Path to the Python script
    script_path: PathBuf,

    /// Manifest JSON file for the script
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Script description
    #[arg(short, long)]
    description: Option<String>,

    /// Dependencies as "pkg=version pkg2" (quote the whole list)
    #[arg(short = 'p', long)]
    deps: Option<String>,
  },

  /// Download scripts from the remote registry
  Download {
    /// One or more scripts to download
    scripts: Vec<String>,

    /// Download every script of a category
    #[arg(short, long)]
    category: Option<String>,

    /// Skip confirmation prompts
    #[arg(short = 'y', long)]
    yes: bool,
  },

  /// Remove a script or one of its components
  Remove {
    /// Script name
    script: String,

    /// Only delete the manifest record
    #[arg(long)]
    manifest: bool,

    /// Only delete the virtual environment
    #[arg(long)]
    venv: bool,

    /// Uninstall specific dependencies, "pkg pkg2" (quote the whole list)
    #[arg(short = 'p', long)]
    deps: Option<String>,

    /// Skip confirmation prompts
    #[arg(short = 'y', long)]
    yes: bool,
  },

  /// Update a script and/or its manifest
  Update {
    /// Script name
    script: Option<String>,

    /// Path to a replacement script file
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Path to a replacement manifest JSON file
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Update all standard scripts from the registry
    #[arg(short, long)]
    all: bool,

    /// Skip confirmation prompts
    #[arg(short = 'y', long)]
    yes: bool,
  },

  /// Remove orphaned manifests and environments
  Clean,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  // Initialize logging; --verbose turns on our own debug output.
  let filter = if cli.verbose {
    EnvFilter::new("scriptbox=debug,scriptbox_core=debug,scriptbox_platform=debug")
  } else {
    EnvFilter::from_default_env()
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .without_time()
    .with_writer(std::io::stderr)
    .init();

  let paths = Paths::from_env()?;
  paths.init()?;

  match cli.command {
    Commands::List => cmd::cmd_list(&paths),
    Commands::Run { script, args } => cmd::cmd_run(&paths, &script, &args),
    Commands::Add {
      script_path,
      manifest,
      description,
      deps,
    } => cmd::cmd_add(&paths, &script_path, manifest.as_deref(), description, deps.as_deref()),
    Commands::Download {
      scripts,
      category,
      yes,
    } => cmd::cmd_download(&paths, &scripts, category.as_deref(), yes),
    Commands::Remove {
      script,
      manifest,
      venv,
      deps,
      yes,
    } => cmd::cmd_remove(&paths, &script, manifest, venv, deps.as_deref(), yes),
    Commands::Update {
      script,
      path,
      manifest,
      all,
      yes,
    } => cmd::cmd_update(&paths, script.as_deref(), path.as_deref(), manifest.as_deref(), all, yes),
    Commands::Clean => cmd::cmd_clean(&paths),
  }
}

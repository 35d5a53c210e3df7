use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use linker_core::{GitignoreTemplate, InstructionSet};

use crate::config::ProbeKind;

#[derive(Parser)]
#[command(
    name = "repo-linker",
    version = env!("CARGO_PKG_VERSION"),
    about = "Link a local folder to a GitHub repository",
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Config file (default: ./repo_linker.ron when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging, mirrored to the terminal
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log file (overrides the config file)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize, reconcile, commit and push a folder to a remote
    Link(LinkArgs),

    /// Check the folder and the remote without changing anything
    Check(TargetArgs),

    /// Print the steps for preparing the remote repository
    Instructions {
        #[arg(value_enum)]
        kind: InstructionKind,
    },

    /// Write a config file with default values
    InitConfig {
        /// Destination (default: ./repo_linker.ron)
        path: Option<PathBuf>,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
pub struct TargetArgs {
    /// Local folder to link
    pub path: PathBuf,

    /// Repository: name, owner/name, URL or path to a bare repository.
    /// Defaults to the folder's name under your account.
    pub repo: Option<String>,

    /// How to find out whether the remote exists
    #[arg(long, value_enum)]
    pub probe: Option<ProbeKind>,
}

#[derive(Args)]
pub struct LinkArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Commit message
    #[arg(short, long)]
    pub message: Option<String>,

    /// Branch for a freshly initialized repository
    #[arg(long)]
    pub branch: Option<String>,

    /// Write a .gitignore template when the folder has none
    #[arg(long, value_enum)]
    pub gitignore: Option<TemplateArg>,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InstructionKind {
    /// Create a new, empty repository
    New,
    /// Link a repository that already has commits
    Existing,
}

impl From<InstructionKind> for InstructionSet {
    fn from(kind: InstructionKind) -> Self {
        match kind {
            InstructionKind::New => InstructionSet::NewRepository,
            InstructionKind::Existing => InstructionSet::ExistingRepository,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TemplateArg {
    Python,
    Node,
    Rust,
}

impl From<TemplateArg> for GitignoreTemplate {
    fn from(arg: TemplateArg) -> Self {
        match arg {
            TemplateArg::Python => GitignoreTemplate::Python,
            TemplateArg::Node => GitignoreTemplate::Node,
            TemplateArg::Rust => GitignoreTemplate::Rust,
        }
    }
}

//! CLI command definitions.

use crate::styles::styles;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

const TOOLS_EXAMPLES: &str = "\
Examples:
  mtbenv tools                       Active tool of each id
  mtbenv tools --all                 Every installation found
  mtbenv tools --json                JSON output for parsing";

const APP_EXAMPLES: &str = "\
Examples:
  mtbenv app                         Resolve the application in the current directory
  mtbenv app ./Hello_World           Resolve a specific application
  mtbenv app --json                  JSON output for parsing";

const EXAMPLES_EXAMPLES: &str = "\
Examples:
  mtbenv examples CY8CKIT-062S2-43012            Examples for the latest board version
  mtbenv examples CY8CKIT-062S2-43012 -v 4.0.0   Examples for one board version";

const RUN_EXAMPLES: &str = "\
Examples:
  mtbenv run make -- getlibs         Run make with the filtered PATH
  mtbenv run fw-loader -- --device-list";

const CLI_EXAMPLES: &str = "\
Examples:
  mtbenv tools                       List active ModusToolbox tools
  mtbenv packs                       List installed content packs
  mtbenv app ./Hello_World           Show projects, search paths and missing assets
  mtbenv boards                      List boards from the manifests
  mtbenv examples KIT_A              List code examples for a board";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// mtbenv - Inspect a ModusToolbox installation and its applications.
#[derive(Debug, Parser)]
#[command(name = "mtbenv", author, version, styles=styles())]
#[command(
    about = "Inspect ModusToolbox tools, packs, manifests and applications",
    after_help = CLI_EXAMPLES
)]
pub struct Cli {
    /// Configuration file (defaults to ~/.modustoolbox/mtbenv.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Tools directory to use instead of searching for one.
    #[arg(long, global = true)]
    pub tools_dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List ModusToolbox tools.
    #[command(after_help = TOOLS_EXAMPLES)]
    Tools {
        /// Show every installation, not only the active ones.
        #[arg(short, long)]
        all: bool,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List installed content packs.
    Packs {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Resolve an application and its projects.
    #[command(after_help = APP_EXAMPLES)]
    App {
        /// Application directory (defaults to current directory).
        path: Option<PathBuf>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List boards from the manifest database.
    Boards {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List code examples compatible with a board.
    #[command(after_help = EXAMPLES_EXAMPLES)]
    Examples {
        /// Board id.
        board: String,

        /// Board version number (defaults to the latest).
        #[arg(short = 'v', long = "version")]
        board_version: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Run a program, streaming its output.
    #[command(after_help = RUN_EXAMPLES)]
    Run {
        /// Program to run.
        program: String,

        /// Arguments passed to the program.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,

        /// Working directory (defaults to current directory).
        #[arg(short = 'C', long)]
        cwd: Option<PathBuf>,
    },
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

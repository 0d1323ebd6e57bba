//! `mtbenv` is the command line front end of the environment library.

use clap::Parser;
use colored::Colorize;
use mtb_env::handlers::{self, EnvOptions};
use mtb_env::{Cli, Command, MtbError, MtbResult};
use tracing_subscriber::EnvFilter;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Trailing command output lines shown on failure.
const COMMAND_OUTPUT_TAIL: usize = 10;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print an error with appropriate formatting based on error type.
fn print_error(e: &MtbError) {
    println!();
    match e {
        MtbError::MalformedAssets { errors } => {
            println!("  {} Malformed asset files", "error".bright_red().bold());
            println!();
            for err in errors {
                println!("    {}", err);
            }
        }
        MtbError::Command {
            command,
            code,
            output,
        } => {
            println!(
                "  {} {} {}",
                "error".bright_red().bold(),
                command.bright_white(),
                format!("(exit code {})", code).dimmed()
            );
            if !output.is_empty() {
                println!();
                let start = output.len().saturating_sub(COMMAND_OUTPUT_TAIL);
                for line in &output[start..] {
                    println!("    {}", line.dimmed());
                }
            }
        }
        MtbError::ToolsDirNotFound => {
            println!(
                "  {} No ModusToolbox tools directory found",
                "error".bright_red().bold()
            );
            println!();
            println!(
                "    {}: Pass {} or set {}",
                "hint".bright_blue().bold(),
                "--tools-dir".bright_white(),
                "CY_TOOLS_PATHS".bright_white()
            );
        }
        MtbError::AlreadyLoading => {
            println!("  {} Environment is already loading", "✗".bright_red());
        }
        // For all other errors, use a consistent styled format
        _ => {
            let msg = e.to_string();
            match msg.split_once(": ") {
                Some((prefix, rest)) if prefix.ends_with("error") => {
                    println!(
                        "  {} {}",
                        format!("error[{}]", prefix.to_lowercase().replace(" error", ""))
                            .bright_red()
                            .bold(),
                        rest.dimmed()
                    );
                }
                _ => println!("  {} {}", "error".bright_red().bold(), msg),
            }
        }
    }
    println!();
}

/// Initialize tracing. Only enables logging when RUST_LOG is set.
fn init_tracing() {
    let rust_log_set = std::env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.is_empty())
        .is_some();

    if !rust_log_set {
        return;
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .without_time()
        .init();
}

async fn run() -> MtbResult<()> {
    let cli = Cli::parse();
    let options = EnvOptions {
        config: cli.config,
        tools_dir: cli.tools_dir,
    };

    match cli.command {
        Command::Tools { all, json } => handlers::list_tools(&options, all, json).await,

        Command::Packs { json } => handlers::list_packs(&options, json).await,

        Command::App { path, json } => handlers::show_app(&options, path, json).await,

        Command::Boards { json } => handlers::list_boards(&options, json).await,

        Command::Examples {
            board,
            board_version,
            json,
        } => handlers::list_examples(&options, &board, board_version.as_deref(), json).await,

        Command::Run { program, args, cwd } => {
            handlers::run_program(&options, &program, &args, cwd).await
        }
    }
}

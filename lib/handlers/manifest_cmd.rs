//! Board and code example handlers.

use super::common::{EnvOptions, load_environment, plural, print_json};
use crate::env::LoadFlags;
use crate::error::{MtbError, MtbResult};
use crate::manifest::{MtbItem, latest_version};
use colored::Colorize;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// List boards from the manifest database.
pub async fn list_boards(options: &EnvOptions, json_output: bool) -> MtbResult<()> {
    let env = load_environment(options, LoadFlags::MANIFEST_DATA, None, json_output).await?;
    let db = env.manifest().await;
    let boards: Vec<&MtbItem> = db.boards().collect();

    if json_output {
        return print_json(&boards);
    }

    println!(
        "\n  {} Found {}\n",
        "✓".bright_green(),
        plural(boards.len(), "board").bold()
    );
    for board in boards {
        let latest = latest_version(board)
            .map(|v| v.num.as_str())
            .unwrap_or("-");
        println!("    {} {}", board.id.bright_cyan(), latest.bold());
        println!(
            "    └── {}  {}",
            board.name.dimmed(),
            board.details.chips().join(", ").dimmed()
        );
    }
    println!();

    if !db.rejected_ids().is_empty() {
        println!(
            "  {} {} dropped after conflicting definitions",
            "!".bright_yellow(),
            plural(db.rejected_ids().len(), "item")
        );
        println!();
    }

    Ok(())
}

/// List code examples compatible with a board version.
pub async fn list_examples(
    options: &EnvOptions,
    board: &str,
    version: Option<&str>,
    json_output: bool,
) -> MtbResult<()> {
    let env = load_environment(options, LoadFlags::MANIFEST_DATA, None, json_output).await?;
    let db = env.manifest().await;

    let Some(item) = db.board(board) else {
        return Err(MtbError::Generic(format!("Board '{}' not found", board)));
    };
    if let Some(num) = version
        && item.version(num).is_none()
    {
        return Err(MtbError::Generic(format!(
            "Board '{}' has no version '{}'",
            board, num
        )));
    }

    let examples = db.code_examples_for_board(board, version);
    if json_output {
        return print_json(&examples);
    }

    if examples.is_empty() {
        println!("  {} No code examples for {}", "✗".bright_red(), board.bold());
        return Ok(());
    }

    println!(
        "\n  {} {} for {}\n",
        "✓".bright_green(),
        plural(examples.len(), "code example").bold(),
        board.bright_cyan()
    );
    for app in examples {
        let category = app.category().unwrap_or("uncategorized");
        println!("    {}  {}", app.id.bright_cyan(), category.dimmed());
        if app.name != app.id {
            println!("    └── {}", app.name.dimmed());
        }
    }
    println!();

    Ok(())
}

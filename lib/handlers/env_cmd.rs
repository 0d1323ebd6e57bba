//! Tool and pack listing handlers.

use super::common::{EnvOptions, load_environment, plural, print_json};
use crate::env::LoadFlags;
use crate::error::MtbResult;
use crate::tools::MtbTool;
use colored::Colorize;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// List the active tools, or every installation with `all`.
pub async fn list_tools(options: &EnvOptions, all: bool, json_output: bool) -> MtbResult<()> {
    let env = load_environment(options, LoadFlags::TOOLS, None, json_output).await?;
    let db = env.tools().await;

    let tools: Vec<&MtbTool> = if all {
        db.all_tools().iter().collect()
    } else {
        db.active_set()
    };

    if json_output {
        return print_json(&tools);
    }

    if tools.is_empty() {
        println!("  {} No tools found", "✗".bright_red());
        println!("\n    {}", "Searched:".dimmed());
        for (root, _) in db.roots() {
            println!("      {}", root.display().to_string().dimmed());
        }
        return Ok(());
    }

    println!(
        "\n  {} Found {}\n",
        "✓".bright_green(),
        plural(tools.len(), "tool").bold()
    );
    if let Some(dir) = env.tools_dir().await {
        println!("    {} {}\n", "Tools directory:".dimmed(), dir.display());
    }

    for tool in tools {
        let eap = if tool.is_eap() {
            format!("  {}", "early access".bright_yellow())
        } else {
            String::new()
        };
        println!(
            "    {} {}{}",
            tool.name().bright_cyan(),
            tool.version.to_string().bold(),
            eap
        );
        println!(
            "    └── {}  {}",
            tool.source.to_string().dimmed(),
            tool.path.display().to_string().dimmed()
        );
        println!();
    }

    Ok(())
}

/// List installed content packs.
pub async fn list_packs(options: &EnvOptions, json_output: bool) -> MtbResult<()> {
    let env = load_environment(options, LoadFlags::PACKS, None, json_output).await?;
    let db = env.packs().await;

    if json_output {
        return print_json(&*db);
    }

    if db.packs().is_empty() {
        println!("  {} No content packs installed", "✗".bright_red());
        return Ok(());
    }

    println!(
        "\n  {} Found {}\n",
        "✓".bright_green(),
        plural(db.packs().len(), "pack").bold()
    );

    let active_eap = db.active_eap().map(|p| p.feature_id.as_str());
    for pack in db.packs() {
        let label = match (pack.is_eap(), active_eap == Some(pack.feature_id.as_str())) {
            (true, true) => format!("  {}", "early access (enabled)".bright_yellow()),
            (true, false) => format!("  {}", "early access".dimmed()),
            _ => String::new(),
        };
        println!(
            "    {} {}{}",
            pack.name.as_deref().unwrap_or(&pack.feature_id).bright_cyan(),
            pack.version.as_deref().unwrap_or("").bold(),
            label
        );
        println!("    └── {}", pack.path.display().to_string().dimmed());
        println!();
    }

    if !db.idc_tool_roots().is_empty() {
        println!("  {}", "Registered tool directories:".dimmed());
        for root in db.idc_tool_roots() {
            println!("    {}", root.display());
        }
        println!();
    }

    Ok(())
}

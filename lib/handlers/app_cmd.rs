//! Application handler.

use super::common::{EnvOptions, absolute_dir, load_environment, plural, print_json};
use crate::app::MtbProjectInfo;
use crate::env::LoadFlags;
use crate::error::{MtbError, MtbResult};
use colored::Colorize;
use std::path::PathBuf;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Resolve an application and print its projects.
pub async fn show_app(options: &EnvOptions, path: Option<PathBuf>, json_output: bool) -> MtbResult<()> {
    let dir = absolute_dir(path)?;
    let env = load_environment(options, LoadFlags::APP_INFO, Some(&dir), json_output).await?;
    let guard = env.app_info().await;
    let info = guard
        .as_ref()
        .ok_or_else(|| MtbError::AppInfo(format!("{} was not loaded", dir.display())))?;

    if json_output {
        return print_json(info);
    }

    println!(
        "\n  {} {} {}",
        "✓".bright_green(),
        info.app_dir().display().to_string().bold(),
        format!("({}, {})", info.app_type(), plural(info.projects().len(), "project")).dimmed()
    );

    for project in info.projects() {
        print_project(project);
    }

    if info.has_missing_assets() {
        println!(
            "  {}: Run {} to fetch missing assets",
            "hint".bright_blue().bold(),
            "make getlibs".bright_white()
        );
        println!();
    }

    Ok(())
}

fn print_project(project: &MtbProjectInfo) {
    println!();
    println!(
        "    {} {}",
        project.name().bright_cyan().bold(),
        project.target().unwrap_or("no target").dimmed()
    );

    match project.target_bsp() {
        Some(bsp) => println!(
            "      {} {} {}",
            "BSP:".dimmed(),
            bsp.board_name(),
            bsp.root.display().to_string().dimmed()
        ),
        None => println!("      {} {}", "BSP:".dimmed(), "not found".bright_red()),
    }

    println!("      {}", "Search path:".dimmed());
    for dir in project.search_path() {
        let marker = if project.is_ignored(dir) {
            " (ignored)".dimmed().to_string()
        } else {
            String::new()
        };
        println!("        {}{}", dir.display(), marker);
    }

    if !project.ignore_path().is_empty() {
        println!(
            "      {} {}",
            "Ignored:".dimmed(),
            plural(project.ignore_path().len(), "entry")
        );
    }

    println!("      {}", "Assets:".dimmed());
    for asset in project.assets() {
        println!(
            "        {} {} {}",
            "✓".bright_green(),
            asset.name(),
            asset.version.as_deref().unwrap_or(asset.request.commit()).dimmed()
        );
    }
    for request in project.missing_assets() {
        println!(
            "        {} {} {}",
            "✗".bright_red(),
            request.name(),
            request.full_path(project.dirs()).display().to_string().dimmed()
        );
    }
    println!();
}

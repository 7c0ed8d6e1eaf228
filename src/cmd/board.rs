//! Board view and status-change commands (`taskboard board`).

use anyhow::{Context, Result};
use console::style;
use std::path::Path;
use std::sync::Arc;

use taskboard::board::mutator::MoveOutcome;
use taskboard::board::{BoardSync, GatewayClient, StatusCode};
use taskboard::gateway_config::TaskboardConfig;
use taskboard::ui::board::color_style;
use taskboard::ui::{LoadSpinner, render_board, render_move_outcome};

use super::super::{BoardCommands, Cli};

pub async fn cmd_board(cli: &Cli, project_dir: &Path, command: Option<BoardCommands>) -> Result<()> {
    let config = TaskboardConfig::with_cli_args(
        project_dir.to_path_buf(),
        cli.config.clone(),
        cli.workspace,
        cli.gateway_url.clone(),
    )?;
    let ctx = config.board_context()?;
    let client = GatewayClient::new(config.endpoints()?, config.timeout())
        .context("Failed to build gateway client")?;
    let sync = BoardSync::new(Arc::new(client));

    let command = command.unwrap_or(BoardCommands::Show { json: false });
    let quiet = matches!(command, BoardCommands::Show { json: true });

    let spinner = LoadSpinner::start(&format!("Loading workspace {}...", ctx.workspace_id), quiet);
    let workspace_id = ctx.workspace_id;
    if let Err(e) = sync.switch_context(ctx).await {
        spinner.fail("Failed to load board");
        return Err(e).context("Could not load the board");
    }
    spinner.clear();

    match command {
        BoardCommands::Show { json: true } => {
            let snapshot = sync.board().snapshot();
            let out = serde_json::to_string_pretty(snapshot.groups()).context("Failed to serialize board")?;
            println!("{}", out);
        }
        BoardCommands::Show { json: false } => {
            println!();
            println!("{}", render_board(workspace_id, &sync.view()));
            println!();
        }
        BoardCommands::Statuses => {
            let catalog = sync.catalog();
            if catalog.is_empty() {
                println!("No statuses configured for workspace {}.", workspace_id);
                return Ok(());
            }
            for def in catalog.statuses() {
                println!(
                    "  {:<16} {}",
                    color_style(def.color).apply_to(def.code()),
                    def.status.description
                );
            }
        }
        BoardCommands::Move {
            task_id,
            status,
            assignee,
        } => {
            let code = StatusCode::from(status.as_str());
            let spinner = LoadSpinner::start(
                &format!("Moving task #{} to {}...", task_id, style(&code).bold()),
                false,
            );
            let outcome = match sync.change_status(task_id, &code, assignee).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    spinner.fail("Move rejected");
                    return Err(e.into());
                }
            };
            spinner.clear();
            println!("{}", render_move_outcome(&outcome));
            if let MoveOutcome::RolledBack { reason, .. } = outcome {
                return Err(reason).with_context(|| format!("Task #{} was not moved", task_id));
            }
        }
    }

    Ok(())
}

//! Plain-terminal rendering of a `BoardView`.

use console::{Style, style};

use crate::board::catalog::StatusColor;
use crate::board::models::WorkItem;
use crate::board::mutator::{MoveOutcome, RollbackKind};
use crate::board::view::{BoardView, ColumnView};
use crate::ui::icons::{BOARD, CHECK, COLUMN, PERSON, ROLLBACK};

/// Tags shown per card before collapsing the rest into `+N`.
pub const MAX_VISIBLE_TAGS: usize = 2;

const TITLE_WIDTH: usize = 40;

pub fn color_style(color: StatusColor) -> Style {
    match color {
        StatusColor::Blue => Style::new().blue(),
        StatusColor::Yellow => Style::new().yellow(),
        StatusColor::Purple => Style::new().magenta(),
        StatusColor::Green => Style::new().green(),
        StatusColor::Red => Style::new().red(),
        StatusColor::Gray => Style::new().dim(),
    }
}

/// Shortens `text` to `max` characters, marking the cut with `…`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

/// First tags in brackets, then `+N` for the remainder.
pub fn format_tags(item: &WorkItem) -> String {
    let mut parts: Vec<String> = item
        .tags
        .iter()
        .take(MAX_VISIBLE_TAGS)
        .map(|t| format!("[{}]", t.tag_name))
        .collect();
    let hidden = item.tags.len().saturating_sub(MAX_VISIBLE_TAGS);
    if hidden > 0 {
        parts.push(format!("+{}", hidden));
    }
    parts.join(" ")
}

fn render_card(item: &WorkItem) -> String {
    let mut line = format!(
        "    {} {:<width$} {}{}",
        style(format!("#{:<5}", item.task_id)).dim(),
        truncate(&item.task_title, TITLE_WIDTH),
        PERSON,
        item.assignee_name(),
        width = TITLE_WIDTH
    );
    if let Some(priority) = &item.task_priority {
        line.push_str(&format!("  {}", style(&priority.description).bold()));
    }
    let tags = format_tags(item);
    if !tags.is_empty() {
        line.push_str(&format!("  {}", style(tags).cyan()));
    }
    if let Some(created) = item.created_at() {
        line.push_str(&format!("  {}", style(created.format("%Y-%m-%d")).dim()));
    }
    line
}

fn render_column(column: &ColumnView) -> Vec<String> {
    let mut lines = vec![format!(
        "{}{} {}",
        color_style(column.color).apply_to(COLUMN.to_string()),
        color_style(column.color).bold().apply_to(column.title()),
        style(format!("({})", column.count())).dim()
    )];
    if column.items.is_empty() {
        lines.push(format!("    {}", style("No tasks").dim()));
    } else {
        lines.extend(column.items.iter().map(render_card));
    }
    lines
}

/// Renders every column in order, separated by blank lines.
pub fn render_board(workspace_id: i64, view: &BoardView) -> String {
    let mut lines = vec![format!(
        "{}{} {}",
        BOARD,
        style(format!("Workspace {}", workspace_id)).bold(),
        style(format!("{} tasks", view.total_items())).dim()
    )];
    if view.columns.is_empty() {
        lines.push(String::new());
        lines.push(format!("{}", style("No statuses configured for this workspace.").dim()));
    }
    for column in &view.columns {
        lines.push(String::new());
        lines.extend(render_column(column));
    }
    lines.join("\n")
}

/// One-line summary of a move's result.
pub fn render_move_outcome(outcome: &MoveOutcome) -> String {
    match outcome {
        MoveOutcome::Confirmed { item } => format!(
            "{}Task #{} is now {}",
            CHECK,
            item.task_id,
            style(item.status_code()).green().bold()
        ),
        MoveOutcome::RolledBack {
            task_id,
            rollback,
            reason,
        } => {
            let undone = match rollback {
                RollbackKind::Restored | RollbackKind::Reverted => "change undone",
                RollbackKind::Skipped => "board already reloaded",
            };
            format!(
                "{}Task #{} was not moved ({}): {}",
                ROLLBACK,
                task_id,
                undone,
                style(reason).red()
            )
        }
    }
}

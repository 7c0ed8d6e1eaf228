use super::catalog::{StatusCatalog, StatusColor};
use super::models::{ReferenceItem, StatusCode, WorkItem};
use super::store::BoardSnapshot;

/// One rendered column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnView {
    pub status: ReferenceItem,
    pub color: StatusColor,
    pub items: Vec<WorkItem>,
}

impl ColumnView {
    pub fn code(&self) -> &StatusCode {
        self.status.code()
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Column heading; falls back to the code when the description is empty.
    pub fn title(&self) -> &str {
        if self.status.description.is_empty() {
            self.status.code().as_str()
        } else {
            &self.status.description
        }
    }
}

/// Read-only projection of the board for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardView {
    pub columns: Vec<ColumnView>,
}

impl BoardView {
    /// Columns follow catalog order, one per status even when empty. Groups
    /// for statuses outside the catalog are appended after them in store
    /// order so no item is hidden.
    pub fn project(catalog: &StatusCatalog, snapshot: &BoardSnapshot) -> Self {
        let mut columns: Vec<ColumnView> = catalog
            .statuses()
            .iter()
            .map(|def| ColumnView {
                status: def.status.clone(),
                color: def.color,
                items: snapshot
                    .group(def.code())
                    .map(|g| g.tasks.clone())
                    .unwrap_or_default(),
            })
            .collect();

        columns.extend(
            snapshot
                .groups()
                .iter()
                .filter(|g| !catalog.contains(g.code()))
                .map(|g| ColumnView {
                    status: g.status.clone(),
                    color: StatusColor::for_code(g.code()),
                    items: g.tasks.clone(),
                }),
        );

        Self { columns }
    }

    pub fn column(&self, code: &StatusCode) -> Option<&ColumnView> {
        self.columns.iter().find(|c| c.code() == code)
    }

    pub fn total_items(&self) -> usize {
        self.columns.iter().map(ColumnView::count).sum()
    }
}

use std::fmt;

use tracing::{debug, warn};

use super::gateway::TaskService;
use super::models::{BoardContext, ReferenceItem, StatusCode};
use crate::errors::GatewayError;

/// Display color associated with a status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusColor {
    Blue,
    Yellow,
    Purple,
    Green,
    Red,
    Gray,
}

impl StatusColor {
    /// Parses a color name as stored in reference metadata.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "blue" => Some(Self::Blue),
            "yellow" => Some(Self::Yellow),
            "purple" => Some(Self::Purple),
            "green" => Some(Self::Green),
            "red" => Some(Self::Red),
            "gray" | "grey" => Some(Self::Gray),
            _ => None,
        }
    }

    /// Conventional color for the well-known status codes.
    pub fn for_code(code: &StatusCode) -> Self {
        match code.as_str() {
            "TODO" => Self::Blue,
            "IN_PROGRESS" => Self::Yellow,
            "REVIEW" => Self::Purple,
            "DONE" => Self::Green,
            "BLOCKED" => Self::Red,
            _ => Self::Gray,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Purple => "purple",
            Self::Green => "green",
            Self::Red => "red",
            Self::Gray => "gray",
        }
    }
}

impl fmt::Display for StatusColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status column definition: the reference item plus its display color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusDefinition {
    pub status: ReferenceItem,
    pub color: StatusColor,
}

impl StatusDefinition {
    pub fn from_item(status: ReferenceItem) -> Self {
        let color = color_from_metadata(&status).unwrap_or_else(|| StatusColor::for_code(status.code()));
        Self { status, color }
    }

    pub fn code(&self) -> &StatusCode {
        self.status.code()
    }
}

/// Metadata entry named `color` may carry the value under `value` or `color`.
fn color_from_metadata(status: &ReferenceItem) -> Option<StatusColor> {
    let entry = status.metadata_named("color")?;
    let raw = entry
        .metadata
        .get("value")
        .or_else(|| entry.metadata.get("color"))?
        .as_str()?;
    let color = StatusColor::parse(raw);
    if color.is_none() {
        debug!(status = %status.code(), value = raw, "ignoring unknown status color");
    }
    color
}

/// Ordered set of statuses valid for the current workspace. Defines the
/// columns and the valid drop targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusCatalog {
    statuses: Vec<StatusDefinition>,
}

impl StatusCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog preserving server order. Duplicate codes keep the
    /// first definition.
    pub fn from_items(items: Vec<ReferenceItem>) -> Self {
        let mut statuses: Vec<StatusDefinition> = Vec::with_capacity(items.len());
        for item in items {
            if statuses.iter().any(|s| s.code() == item.code()) {
                warn!(status = %item.code(), "duplicate status in catalog, keeping the first");
                continue;
            }
            statuses.push(StatusDefinition::from_item(item));
        }
        Self { statuses }
    }

    /// Fetches the workspace's statuses from the reference service.
    pub async fn load<S>(service: &S, ctx: &BoardContext) -> Result<Self, GatewayError>
    where
        S: TaskService + ?Sized,
    {
        let items = service.fetch_statuses(ctx).await?;
        Ok(Self::from_items(items))
    }

    pub fn get(&self, code: &StatusCode) -> Option<&StatusDefinition> {
        self.statuses.iter().find(|s| s.code() == code)
    }

    pub fn contains(&self, code: &StatusCode) -> bool {
        self.get(code).is_some()
    }

    pub fn statuses(&self) -> &[StatusDefinition] {
        &self.statuses
    }

    pub fn references(&self) -> impl Iterator<Item = &ReferenceItem> {
        self.statuses.iter().map(|s| &s.status)
    }

    pub fn codes(&self) -> impl Iterator<Item = &StatusCode> {
        self.statuses.iter().map(StatusDefinition::code)
    }

    /// Color for `code`, gray when it is not in the catalog.
    pub fn color_of(&self, code: &StatusCode) -> StatusColor {
        self.get(code).map_or(StatusColor::Gray, |s| s.color)
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

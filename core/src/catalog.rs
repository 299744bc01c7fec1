use tracing::{info, warn};

use crate::model::ToolCatalogEntry;

pub const UNAVAILABLE_REASON: &str = "Tool Server unavailable";

/// What we advertise when the Tool Server cannot tell us itself.
pub fn fallback_catalog() -> Vec<ToolCatalogEntry> {
    vec![
        ToolCatalogEntry::new("github_repository", "Get repository information")
            .unavailable(UNAVAILABLE_REASON),
        ToolCatalogEntry::new("github_issues", "Manage GitHub issues")
            .unavailable(UNAVAILABLE_REASON),
    ]
}

/// Turns whatever the Tool Server listed into a catalog we can serve.
/// A missing or empty listing becomes the fallback catalog.
pub fn resolve(listing: Option<Vec<ToolCatalogEntry>>) -> Vec<ToolCatalogEntry> {
    match listing {
        Some(tools) if !tools.is_empty() => {
            info!("Retrieved {} MCP tools", tools.len());
            for tool in tools.iter().filter(|t| !t.available) {
                warn!(
                    "Tool '{}' listed as unavailable: {}",
                    tool.name,
                    tool.reason.as_deref().unwrap_or("no reason given")
                );
            }
            tools
        }
        _ => {
            warn!("No tools returned from MCP server, using fallback catalog");
            fallback_catalog()
        }
    }
}

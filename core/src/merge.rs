use serde_json::Value;

use crate::model::ToolResult;

pub const SECTION_HEADER: &str = "**GitHub Data from MCP Server:**";

/// Appends the Tool Server's findings to the model's answer.
///
/// Only `repositories`, `issues` and `status` are rendered, in that order,
/// and only when present. Values are printed as-is, without schema checks.
pub fn merge_tool_data(answer: &str, result: &ToolResult) -> String {
    let mut merged = String::from(answer);
    merged.push_str("\n\n");
    merged.push_str(SECTION_HEADER);
    merged.push('\n');

    if let Some(repositories) = result.get("repositories") {
        merged.push_str("\n📁 **Repositories Found:**\n");
        merged.push_str(&render(&repositories));
    }

    if let Some(issues) = result.get("issues") {
        merged.push_str("\n🎯 **Issues:**\n");
        merged.push_str(&render(&issues));
    }

    if let Some(status) = result.get("status") {
        merged.push_str("\n📊 **Status:** ");
        merged.push_str(&render(&status));
    }

    merged
}

// Strings print bare, everything else as compact JSON
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

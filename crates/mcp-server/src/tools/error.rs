use super::report_doc::ReportDocBuilder;
use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Serialize, Clone)]
pub(crate) struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

pub(crate) fn tool_error_envelope(error: ErrorEnvelope) -> CallToolResult {
    let mut doc = ReportDocBuilder::new();
    doc.push_line(&format!("Error: {}", error.message));
    if let Some(hint) = error.hint.as_deref() {
        if !hint.trim().is_empty() {
            doc.push_line(hint);
        }
    }
    if let Some(details) = error.details.as_deref() {
        doc.push_blank();
        doc.push_note(&format!("details: {details}"));
    }

    let mut result = CallToolResult::error(vec![Content::text(doc.finish())]);
    result.structured_content = Some(json!({ "error": error }));
    result
}

pub(crate) fn tool_error(code: &'static str, message: impl Into<String>) -> CallToolResult {
    tool_error_envelope(ErrorEnvelope {
        code: code.to_string(),
        message: message.into(),
        details: None,
        hint: None,
    })
}

pub(crate) fn internal_error(message: impl Into<String>) -> CallToolResult {
    tool_error("internal", message)
}

/// Serialize `payload` into `structured_content`, or fail the call if that is impossible.
pub(crate) fn attach_structured_content<T: Serialize>(
    mut result: CallToolResult,
    payload: &T,
    tool: &'static str,
) -> CallToolResult {
    match serde_json::to_value(payload) {
        Ok(value) => {
            result.structured_content = Some(value);
            result
        }
        Err(err) => internal_error(format!(
            "failed to serialize {tool} structured_content ({err})"
        )),
    }
}

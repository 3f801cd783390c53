//! Composite project verification.
//!
//! [`verify_project`] runs the `audit` and `init_check` tools against a
//! project path and, when an `ast_impact` tool is installed, attaches an
//! impact context to every audit failure it can extract symbols from.
//!
//! Unlike plain tool endpoints, the composer never propagates a tool error:
//! a missing tool yields `null`, and a failing or raising tool yields
//! `{"error": ...}` in place of its data.

mod enrich;


use anvil_tools::{Arguments, ResultData, ToolSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

pub use self::enrich::{EnrichmentContext, enrich_failure, extract_symbols};

/// Tracing target for verification.
pub(crate) const VERIFY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::verify");

/// Tool that audits project quality.
pub const AUDIT_TOOL: &str = "audit";

/// Tool that checks project governance.
pub const GOVERNANCE_TOOL: &str = "init_check";

/// Tool that reports the impact of changing a symbol.
pub const IMPACT_TOOL: &str = "ast_impact";

/// Combined outcome of [`verify_project`].
///
/// Each field is `None` when the corresponding tool is not installed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Data returned by `audit`, possibly enriched, or `{"error": ...}`.
    pub audit: Option<ResultData>,
    /// Data returned by `init_check`, or `{"error": ...}`.
    pub governance: Option<ResultData>,
}

/// Verifies the project at `path` using the discovered `tools`.
///
/// Never fails: every tool outcome is folded into the report.
#[must_use]
pub fn verify_project(path: &str, tools: &ToolSet) -> VerifyReport {
    let arguments = path_arguments(path);
    let mut audit = run_tool(tools, AUDIT_TOOL, &arguments);
    let governance = run_tool(tools, GOVERNANCE_TOOL, &arguments);

    if let Some(audit_data) = audit.as_mut() {
        enrich_audit_failures(tools, path, audit_data);
    }

    VerifyReport { audit, governance }
}

/// Runs the tool named `name`, returning its data or an error placeholder.
///
/// Returns `None` when the tool is not installed.
#[must_use]
pub fn run_tool(tools: &ToolSet, name: &str, arguments: &Arguments) -> Option<ResultData> {
    let Some(tool) = tools.get(name) else {
        info!(target: VERIFY_TARGET, tool = name, "tool not installed, skipping");
        return None;
    };

    match tool.execute(arguments) {
        Ok(result) if result.success => Some(result.data),
        Ok(result) => {
            warn!(
                target: VERIFY_TARGET,
                tool = name,
                error = result.error.as_deref().unwrap_or_default(),
                "tool reported failure"
            );
            Some(error_data(result.error.map_or(Value::Null, Value::String)))
        }
        Err(error) => {
            warn!(target: VERIFY_TARGET, tool = name, %error, "tool raised");
            Some(error_data(Value::String(error.to_string())))
        }
    }
}

fn error_data(message: Value) -> ResultData {
    let mut data = ResultData::new();
    data.insert("error".to_owned(), message);
    data
}

fn path_arguments(path: &str) -> Arguments {
    let mut arguments = Arguments::new();
    arguments.insert("path".to_owned(), Value::String(path.to_owned()));
    arguments
}

/// Attaches a `context` to each entry of the audit's `failed` list.
///
/// Entries are enriched in their original order; entries that are not
/// objects, or for which no context can be built, are left untouched.
fn enrich_audit_failures(tools: &ToolSet, path: &str, audit: &mut ResultData) {
    let Some(Value::Array(failed)) = audit.get_mut("failed") else {
        return;
    };
    if failed.is_empty() {
        return;
    }
    if !tools.contains(IMPACT_TOOL) {
        debug!(target: VERIFY_TARGET, "impact tool not installed, skipping enrichment");
        return;
    }

    for failure in failed.iter_mut().filter_map(Value::as_object_mut) {
        if let Some(context) = enrich_failure(tools, path, failure) {
            failure.insert("context".to_owned(), Value::from(context));
        }
    }
}

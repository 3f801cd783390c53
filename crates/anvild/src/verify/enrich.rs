//! Symbol extraction and impact enrichment for audit failures.

use std::collections::HashSet;

use anvil_tools::{Arguments, ResultData, ToolSet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value, json};
use tracing::debug;

use super::{IMPACT_TOOL, VERIFY_TARGET};

/// Rule whose failures list type-checker errors by file.
const TYPE_RULE: &str = "QUALITY_TYPE";

/// Rule whose failures list the most complex functions.
const COMPLEXITY_RULE: &str = "QUALITY_COMPLEXITY";

/// Message prefixes followed by a symbol name.
const SYMBOL_PREFIXES: [&str; 3] = ["Function ", "Class ", "Method "];

/// Punctuation trimmed from a symbol taken from a message.
const SYMBOL_PUNCTUATION: [char; 5] = ['(', ')', '\'', '"', ':'];

/// Aggregated impact data attached to an audit failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentContext {
    /// Symbols that were analysed, unique in first-seen order.
    pub affected_modules: Vec<String>,
    /// Callers reported for every symbol, concatenated.
    pub callers: Vec<Value>,
    /// Test files reported for every symbol, unique in first-seen order.
    pub test_files: Vec<String>,
    /// Highest impact score reported, or zero, as the tool wrote it.
    pub impact_score: Number,
    /// Number of symbols for which the impact tool returned data.
    pub symbols_analyzed: usize,
}

impl From<EnrichmentContext> for Value {
    fn from(context: EnrichmentContext) -> Self {
        json!({
            "affected_modules": context.affected_modules,
            "callers": context.callers,
            "test_files": context.test_files,
            "impact_score": context.impact_score,
            "symbols_analyzed": context.symbols_analyzed,
        })
    }
}

/// Extracts the symbols an audit failure refers to.
///
/// The strategy depends on `rule_id`:
///
/// - `QUALITY_TYPE` with a non-empty `details.errors` list: each error's
///   `file` becomes a dotted module path (`src/foo/bar.py` -> `foo.bar`).
/// - `QUALITY_COMPLEXITY` with a non-empty `details.top_offenders` list:
///   each offender's `function`.
/// - Otherwise, a message starting with `Function `, `Class `, or
///   `Method ` yields the next word with surrounding punctuation removed.
///
/// Results are unique and keep first-seen order. Returns an empty list when
/// nothing applies.
#[must_use]
pub fn extract_symbols(failure: &Map<String, Value>) -> Vec<String> {
    let rule_id = failure.get("rule_id").and_then(Value::as_str).unwrap_or_default();
    let details = failure.get("details").and_then(Value::as_object);

    if let Some(details) = details {
        match rule_id {
            TYPE_RULE => {
                if let Some(errors) = non_empty_list(details.get("errors")) {
                    return unique_in_order(errors.iter().filter_map(module_from_error));
                }
            }
            COMPLEXITY_RULE => {
                if let Some(offenders) = non_empty_list(details.get("top_offenders")) {
                    return unique_in_order(
                        offenders
                            .iter()
                            .filter_map(|offender| offender.get("function"))
                            .filter_map(Value::as_str)
                            .map(str::to_owned),
                    );
                }
            }
            _ => {}
        }
    }

    symbol_from_message(failure.get("message").and_then(Value::as_str).unwrap_or_default())
}

/// Builds an impact context for `failure` from the `ast_impact` tool.
///
/// Calls the tool once per extracted symbol. A call counts only when it
/// succeeds with non-empty data; errors raised for one symbol are logged
/// and do not stop the others. Returns `None` when the tool is missing, no
/// symbols were found, or no call counted.
#[must_use]
pub fn enrich_failure(
    tools: &ToolSet,
    path: &str,
    failure: &Map<String, Value>,
) -> Option<EnrichmentContext> {
    let impact = tools.get(IMPACT_TOOL)?;
    let symbols = extract_symbols(failure);
    if symbols.is_empty() {
        return None;
    }

    let mut callers = Vec::new();
    let mut test_files = Vec::new();
    let mut impact_score = Number::from(0);
    let mut symbols_analyzed = 0_usize;

    for symbol in &symbols {
        let data = match impact.execute(&impact_arguments(path, symbol)) {
            Ok(result) if result.success && !result.data.is_empty() => result.data,
            Ok(_) => continue,
            Err(error) => {
                debug!(target: VERIFY_TARGET, symbol = %symbol, %error, "impact lookup failed");
                continue;
            }
        };

        symbols_analyzed += 1;
        callers.extend(list_field(&data, "callers").iter().cloned());
        test_files.extend(
            list_field(&data, "test_files")
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned),
        );
        if let Some(score) = data.get("score").and_then(Value::as_number)
            && exceeds(score, &impact_score)
        {
            impact_score = score.clone();
        }
    }

    if symbols_analyzed == 0 {
        return None;
    }

    Some(EnrichmentContext {
        affected_modules: unique_in_order(symbols),
        callers,
        test_files: unique_in_order(test_files),
        impact_score,
        symbols_analyzed,
    })
}

fn exceeds(candidate: &Number, current: &Number) -> bool {
    match (candidate.as_f64(), current.as_f64()) {
        (Some(candidate), Some(current)) => candidate > current,
        _ => false,
    }
}

fn impact_arguments(path: &str, symbol: &str) -> Arguments {
    let mut arguments = Arguments::new();
    arguments.insert("path".to_owned(), Value::String(path.to_owned()));
    arguments.insert("symbol".to_owned(), Value::String(symbol.to_owned()));
    arguments
}

fn list_field<'a>(data: &'a ResultData, key: &str) -> &'a [Value] {
    data.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn non_empty_list(value: Option<&Value>) -> Option<&Vec<Value>> {
    value
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
}

fn module_from_error(error: &Value) -> Option<String> {
    let file = error.get("file").and_then(Value::as_str)?;
    if file.is_empty() {
        return None;
    }
    let relative = file.strip_prefix("src/").unwrap_or(file);
    let stem = relative.strip_suffix(".py").unwrap_or(relative);
    Some(stem.replace('/', "."))
}

fn symbol_from_message(message: &str) -> Vec<String> {
    SYMBOL_PREFIXES
        .iter()
        .find_map(|prefix| message.strip_prefix(prefix))
        .and_then(|rest| rest.split_whitespace().next())
        .map(|token| vec![token.trim_matches(SYMBOL_PUNCTUATION).to_owned()])
        .unwrap_or_default()
}

fn unique_in_order(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

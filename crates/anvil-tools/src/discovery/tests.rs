//! Unit tests for tool discovery.

use std::path::PathBuf;
use std::sync::Arc;

use mockall::mock;
use rstest::{fixture, rstest};

use super::*;
use crate::catalog::{Advertisement, DEFAULT_TOOL_GROUP, StaticCatalog};
use crate::contract::{Arguments, ExecutionResult};
use crate::error::{CatalogError, ToolError};
use crate::manifest::ComponentManifest;

mock! {
    CountedTool {}
    impl Tool for CountedTool {
        fn name(&self) -> &str;
        fn execute(&self, arguments: &Arguments) -> Result<ExecutionResult, ToolError>;
    }
}

struct Labelled {
    name: &'static str,
    label: &'static str,
}

impl Tool for Labelled {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> Option<&str> {
        Some(self.label)
    }

    fn execute(&self, _arguments: &Arguments) -> Result<ExecutionResult, ToolError> {
        Ok(ExecutionResult::default())
    }
}

fn labelled(name: &'static str, label: &'static str) -> Result<Box<dyn Tool>, ToolError> {
    Ok(Box::new(Labelled { name, label }))
}

/// Source that interleaves unreadable entries with valid ones.
struct PartlyBroken {
    inner: StaticCatalog,
}

impl CatalogSource for PartlyBroken {
    fn label(&self) -> &str {
        "partly-broken"
    }

    fn advertisements(&self, group: &str) -> Vec<Result<Advertisement, CatalogError>> {
        let mut entries = vec![Err(CatalogError::InvalidManifest {
            path: PathBuf::from("/plugins/broken.json"),
            source: ComponentManifest::new("", "0.1.0", Vec::new())
                .validate()
                .expect_err("empty component is invalid"),
        })];
        entries.extend(self.inner.advertisements(group));
        entries
    }
}

#[fixture]
fn healthy() -> StaticCatalog {
    StaticCatalog::new("anvil-core")
        .advertise(DEFAULT_TOOL_GROUP, "audit", || labelled("audit", "core audit"))
        .advertise(DEFAULT_TOOL_GROUP, "init_check", || {
            labelled("init_check", "core init")
        })
}

#[rstest]
fn discovers_every_advertised_tool(healthy: StaticCatalog) {
    let tools = discover(&[&healthy], DEFAULT_TOOL_GROUP);
    assert_eq!(tools.names().collect::<Vec<_>>(), vec!["audit", "init_check"]);
}

#[rstest]
fn ignores_other_groups(healthy: StaticCatalog) {
    let tools = discover(&[&healthy], "anvil.formatters");
    assert!(tools.is_empty());
}

#[test]
fn empty_catalog_yields_empty_set() {
    let catalog = StaticCatalog::new("nothing");
    assert!(discover(&[&catalog], DEFAULT_TOOL_GROUP).is_empty());
}

#[rstest]
fn failing_factory_does_not_affect_siblings(healthy: StaticCatalog) {
    let catalog = healthy
        .advertise(DEFAULT_TOOL_GROUP, "lean_check", || {
            Err(ToolError::construction("lean_check", "lean toolchain missing"))
        })
        .advertise(DEFAULT_TOOL_GROUP, "z3_check", || labelled("z3_check", "z3"));

    let tools = discover(&[&catalog], DEFAULT_TOOL_GROUP);

    assert_eq!(
        tools.names().collect::<Vec<_>>(),
        vec!["audit", "init_check", "z3_check"]
    );
    assert!(!tools.contains("lean_check"));
}

#[rstest]
fn unreadable_entry_is_skipped(healthy: StaticCatalog) {
    let source = PartlyBroken { inner: healthy };
    let tools = discover(&[&source], DEFAULT_TOOL_GROUP);
    assert_eq!(tools.len(), 2);
}

#[test]
fn later_advertisement_wins_within_a_source() {
    let catalog = StaticCatalog::new("anvil-core")
        .advertise(DEFAULT_TOOL_GROUP, "audit", || labelled("audit", "first"))
        .advertise(DEFAULT_TOOL_GROUP, "audit", || labelled("audit", "second"));

    let tools = discover(&[&catalog], DEFAULT_TOOL_GROUP);

    assert_eq!(tools.len(), 1);
    let audit = tools.get("audit").expect("audit registered");
    assert_eq!(audit.description(), Some("second"));
}

#[rstest]
fn later_source_wins_across_sources(healthy: StaticCatalog) {
    let override_catalog = StaticCatalog::new("anvil-local")
        .advertise(DEFAULT_TOOL_GROUP, "audit", || labelled("audit", "local audit"));

    let tools = discover(&[&healthy, &override_catalog], DEFAULT_TOOL_GROUP);

    let audit = tools.get("audit").expect("audit registered");
    assert_eq!(audit.description(), Some("local audit"));
    assert_eq!(tools.len(), 2);
}

#[test]
fn advertised_name_is_authoritative() {
    let catalog = StaticCatalog::new("anvil-core")
        .advertise(DEFAULT_TOOL_GROUP, "audit_v2", || labelled("audit", "renamed"));

    let tools = discover(&[&catalog], DEFAULT_TOOL_GROUP);

    assert!(tools.contains("audit_v2"));
    assert!(!tools.contains("audit"));
}

#[rstest]
fn debug_lists_names_only(healthy: StaticCatalog) {
    let tools = discover(&[&healthy], DEFAULT_TOOL_GROUP);
    assert_eq!(format!("{tools:?}"), r#"{"audit", "init_check"}"#);
}

#[rstest]
fn repeated_discovery_yields_same_names_and_fresh_instances(healthy: StaticCatalog) {
    let first = discover(&[&healthy], DEFAULT_TOOL_GROUP);
    let second = discover(&[&healthy], DEFAULT_TOOL_GROUP);

    assert_eq!(
        first.names().collect::<Vec<_>>(),
        second.names().collect::<Vec<_>>()
    );
    for (name, tool) in &first {
        let again = second.get(name).expect("tool rediscovered");
        assert!(!Arc::ptr_eq(tool, again), "{name} was reused");
    }
}

#[test]
fn discovery_constructs_without_executing() {
    let catalog = StaticCatalog::new("anvil-core").advertise(DEFAULT_TOOL_GROUP, "audit", || {
        let mut tool = MockCountedTool::new();
        tool.expect_execute()
            .times(1)
            .returning(|_| Ok(ExecutionResult::success(serde_json::Map::new())));
        Ok(Box::new(tool))
    });

    let tools = discover(&[&catalog], DEFAULT_TOOL_GROUP);

    let audit = tools.get("audit").expect("audit registered");
    assert!(audit.execute(&Arguments::new()).expect("execute").success);
}

//! Crate-level integration and BDD tests.

use serde_json::json;

use crate::catalog::{DEFAULT_TOOL_GROUP, StaticCatalog};
use crate::contract::{Arguments, ResultData, Tool};
use crate::discovery::discover;
use crate::testing::ScriptedTool;


fn scripted(name: &str, data: ResultData) -> Result<Box<dyn Tool>, crate::ToolError> {
    Ok(Box::new(ScriptedTool::succeeding(name, data)))
}

#[test]
fn end_to_end_discovery_and_execution() {
    let catalog = StaticCatalog::new("anvil-core").advertise(DEFAULT_TOOL_GROUP, "audit", || {
        let mut data = ResultData::new();
        data.insert("score".into(), json!(92));
        scripted("audit", data)
    });

    let tools = discover(&[&catalog], DEFAULT_TOOL_GROUP);
    let audit = tools.get("audit").expect("audit discovered");
    let result = audit.execute(&Arguments::new()).expect("execute");

    assert!(result.success);
    assert_eq!(result.data.get("score"), Some(&json!(92)));
}

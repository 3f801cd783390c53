//! Shared doubles for bootstrap and behaviour tests.

use std::ffi::OsString;
use std::sync::{Arc, Mutex, PoisonError};

use anvil_config::Config;
use anvil_tools::testing::ScriptedTool;
use anvil_tools::{DEFAULT_TOOL_GROUP, ResultData, StaticCatalog, Tool};
use ortho_config::OrthoError;
use serde_json::Value;

use crate::bootstrap::{BootstrapError, ConfigLoader};
use crate::health::HealthReporter;
use crate::server::ToolServer;

/// Startup events observed by [`RecordingHealthReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HealthEvent {
    Starting,
    Succeeded { endpoints: Vec<String> },
    Failed(String),
}

/// Reporter that records every event for later assertions.
#[derive(Debug, Default)]
pub(crate) struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    pub(crate) fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::Starting);
    }

    fn bootstrap_succeeded(&self, _config: &Config, server: &ToolServer) {
        self.record(HealthEvent::Succeeded {
            endpoints: server.names().map(str::to_owned).collect(),
        });
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::Failed(error.to_string()));
    }
}

/// Loader that fails by passing an unparsable listening socket.
pub(crate) struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter([
            OsString::from("anvild"),
            OsString::from("--listen"),
            OsString::from("invalid://socket"),
        ])
    }
}

/// Configuration that scans no manifest directories and serves stdio.
pub(crate) fn isolated_config() -> Config {
    Config {
        plugin_dirs: Vec::new(),
        ..Config::default()
    }
}

/// Catalog advertising one succeeding tool per name, documented with
/// `"<name> summary."`.
pub(crate) fn catalog_of(names: &[&str]) -> StaticCatalog {
    names.iter().fold(StaticCatalog::new("test-component"), |catalog, name| {
        let tool_name = (*name).to_owned();
        catalog.advertise(DEFAULT_TOOL_GROUP, *name, move || {
            let tool = ScriptedTool::succeeding(tool_name.clone(), ResultData::new())
                .with_description(format!("{tool_name} summary."));
            Ok(Box::new(tool) as Box<dyn Tool>)
        })
    })
}

/// Unwraps a JSON object.
pub(crate) fn object(value: Value) -> ResultData {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

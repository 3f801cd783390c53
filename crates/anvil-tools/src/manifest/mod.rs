//! Manifest types for tools shipped as external executables.
//!
//! A component that does not link against `anvil-tools` can still contribute
//! tools by installing a JSON manifest into one of the configured plugin
//! directories. A [`ComponentManifest`] names the component and lists its
//! [`ToolManifest`] entries; each entry advertises one tool under an
//! extension-point group and describes how to launch it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::DEFAULT_TOOL_GROUP;
use crate::error::ToolError;

/// Default timeout in seconds for tool execution.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Manifest file contributed by one installed component.
///
/// # Example
///
/// ```
/// use anvil_tools::ComponentManifest;
///
/// let manifest: ComponentManifest = serde_json::from_str(r#"{
///     "component": "anvil-bib",
///     "version": "0.3.0",
///     "tools": [
///         {"name": "bib_lookup", "executable": "/opt/anvil-bib/bin/lookup"}
///     ]
/// }"#).unwrap();
///
/// assert_eq!(manifest.component(), "anvil-bib");
/// assert_eq!(manifest.tools().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentManifest {
    component: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    tools: Vec<ToolManifest>,
}

impl ComponentManifest {
    /// Creates a component manifest with the given tool entries.
    #[must_use]
    pub fn new(
        component: impl Into<String>,
        version: impl Into<String>,
        tools: Vec<ToolManifest>,
    ) -> Self {
        Self {
            component: component.into(),
            version: version.into(),
            tools,
        }
    }

    /// Validates the component name and every tool entry.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Manifest`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), ToolError> {
        if self.component.trim().is_empty() {
            return Err(ToolError::Manifest {
                message: String::from("component name must not be empty"),
            });
        }
        self.tools.iter().try_for_each(ToolManifest::validate)
    }

    /// Returns the component name.
    #[must_use]
    pub const fn component(&self) -> &str {
        self.component.as_str()
    }

    /// Returns the component version, empty when undeclared.
    #[must_use]
    pub const fn version(&self) -> &str {
        self.version.as_str()
    }

    /// Returns the advertised tool entries in declaration order.
    #[must_use]
    pub fn tools(&self) -> &[ToolManifest] {
        &self.tools
    }
}

/// Declarative description of one executable tool.
///
/// # Example
///
/// ```
/// use anvil_tools::ToolManifest;
/// use std::path::PathBuf;
///
/// let manifest = ToolManifest::new("audit", PathBuf::from("/usr/bin/anvil-audit"))
///     .with_description("Audit a project.");
///
/// assert_eq!(manifest.group(), "anvil.tools");
/// assert_eq!(manifest.timeout_secs(), 30);
/// assert!(manifest.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolManifest {
    #[serde(default = "default_group")]
    group: String,
    name: String,
    executable: PathBuf,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

fn default_group() -> String {
    String::from(DEFAULT_TOOL_GROUP)
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ToolManifest {
    /// Creates a manifest in the default group with default timeout.
    #[must_use]
    pub fn new(name: impl Into<String>, executable: PathBuf) -> Self {
        Self {
            group: default_group(),
            name: name.into(),
            executable,
            args: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            description: None,
        }
    }

    /// Moves the entry to a different extension-point group.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Sets default arguments passed to the executable.
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Overrides the default timeout.
    #[must_use]
    pub const fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the documentation reported by `list_tools`.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validates the manifest, returning an error if it is malformed.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Manifest`] if the name or group is empty, the
    /// executable path is not absolute, or the timeout is zero.
    pub fn validate(&self) -> Result<(), ToolError> {
        if self.name.trim().is_empty() {
            return Err(ToolError::Manifest {
                message: String::from("tool name must not be empty"),
            });
        }
        if self.group.trim().is_empty() {
            return Err(ToolError::Manifest {
                message: format!("tool '{}' declares an empty group", self.name),
            });
        }
        if !self.executable.is_absolute() {
            return Err(ToolError::Manifest {
                message: format!(
                    "tool executable must be an absolute path, got '{}'",
                    self.executable.display()
                ),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ToolError::Manifest {
                message: format!("tool '{}' declares a zero timeout", self.name),
            });
        }
        Ok(())
    }

    /// Returns the extension-point group.
    #[must_use]
    pub const fn group(&self) -> &str {
        self.group.as_str()
    }

    /// Returns the advertised tool name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the absolute path to the tool executable.
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Returns the default arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the timeout in seconds.
    #[must_use]
    pub const fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Returns the declared documentation.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

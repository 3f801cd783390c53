use std::cell::RefCell;
use std::ffi::OsString;
use std::fs;
use std::sync::{Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

use anvil_config::{
    Config, SocketEndpoint, default_log_filter, default_log_format, default_tool_group,
};

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

const TOOL_GROUP_VAR: &str = "ANVIL_TOOL_GROUP";

struct Harness {
    temp_dir: TempDir,
    cli_args: RefCell<Vec<OsString>>,
    env_overrides: RefCell<Vec<(String, Option<OsString>)>>,
    loaded: RefCell<Option<Config>>,
    error: RefCell<Option<String>>,
    _env_guard: MutexGuard<'static, ()>,
}

impl Harness {
    fn new() -> Self {
        let guard = ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
        let temp_dir = match TempDir::new() {
            Ok(dir) => dir,
            Err(error) => panic!("failed to create temporary directory: {error}"),
        };
        let harness = Self {
            temp_dir,
            cli_args: RefCell::new(vec![OsString::from("anvild")]),
            env_overrides: RefCell::new(Vec::new()),
            loaded: RefCell::new(None),
            error: RefCell::new(None),
            _env_guard: guard,
        };
        harness.clear_env(TOOL_GROUP_VAR);
        harness
    }

    fn write_config(&self, tool_group: &str) {
        let path = self.temp_dir.path().join("anvil.toml");
        let toml = format!("tool_group = \"{tool_group}\"\n");
        if let Err(error) = fs::write(&path, toml) {
            panic!("failed to write configuration: {error}");
        }

        let mut args = self.cli_args.borrow_mut();
        args.push(OsString::from("--config-path"));
        args.push(path.into_os_string());
    }

    fn set_env(&self, key: &str, value: &str) {
        let previous = std::env::var_os(key);
        // Environment mutation is `unsafe` in edition 2024; the harness holds
        // the environment mutex and restores overrides in `Drop`.
        unsafe { std::env::set_var(key, value) };
        self.env_overrides
            .borrow_mut()
            .push((key.to_owned(), previous));
    }

    fn clear_env(&self, key: &str) {
        let previous = std::env::var_os(key);
        unsafe { std::env::remove_var(key) };
        self.env_overrides
            .borrow_mut()
            .push((key.to_owned(), previous));
    }

    fn push_cli_arg(&self, arg: impl Into<OsString>) {
        self.cli_args.borrow_mut().push(arg.into());
    }

    fn load(&self) {
        if self.loaded.borrow().is_some() || self.error.borrow().is_some() {
            return;
        }

        let args = self.cli_args.borrow().clone();
        match Config::load_from_iter(args) {
            Ok(config) => *self.loaded.borrow_mut() = Some(config),
            Err(error) => *self.error.borrow_mut() = Some(error.to_string()),
        }
    }

    fn loaded_config(&self) -> Config {
        self.load();
        if let Some(error) = self.error.borrow().as_ref() {
            panic!("configuration failed to load: {error}");
        }
        match self.loaded.borrow().as_ref() {
            Some(config) => config.clone(),
            None => panic!("configuration was not loaded"),
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let mut overrides = self.env_overrides.borrow_mut();
        while let Some((key, value)) = overrides.pop() {
            match value {
                Some(os_value) => unsafe { std::env::set_var(&key, os_value) },
                None => unsafe { std::env::remove_var(&key) },
            }
        }
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[given("a configuration file setting the tool group to \"{group}\"")]
fn given_configuration_file(harness: &Harness, group: String) {
    harness.write_config(&group);
}

#[given("the environment overrides the tool group to \"{group}\"")]
fn given_environment_override(harness: &Harness, group: String) {
    harness.set_env(TOOL_GROUP_VAR, &group);
}

#[when("the CLI sets the tool group to \"{group}\"")]
fn when_cli_tool_group(harness: &Harness, group: String) {
    harness.push_cli_arg("--tool-group");
    harness.push_cli_arg(group);
}

#[when("the CLI sets the listening socket to \"{socket}\"")]
fn when_cli_listen(harness: &Harness, socket: String) {
    harness.push_cli_arg("--listen");
    harness.push_cli_arg(socket);
}

#[when("the configuration loads without overrides")]
fn when_load_without_overrides(harness: &Harness) {
    harness.load();
}

#[then("loading the configuration resolves the tool group to \"{group}\"")]
fn then_resolved_group(harness: &Harness, group: String) {
    assert_eq!(harness.loaded_config().tool_group(), group);
}

#[then("loading the configuration listens on \"{socket}\"")]
fn then_listens_on(harness: &Harness, socket: String) {
    let expected = match socket.parse::<SocketEndpoint>() {
        Ok(endpoint) => endpoint,
        Err(error) => panic!("invalid expected socket '{socket}': {error}"),
    };
    assert_eq!(harness.loaded_config().listen(), Some(&expected));
}

#[then("loading the configuration applies the built-in defaults")]
fn then_defaults_applied(harness: &Harness) {
    let config = harness.loaded_config();
    assert_eq!(config.log_filter(), default_log_filter());
    assert_eq!(config.log_format(), default_log_format());
    assert_eq!(config.tool_group(), default_tool_group());
    assert!(config.listen().is_none());
}

#[scenario(path = "tests/features/configuration_precedence.feature")]
fn configuration_precedence(#[from(harness)] harness: Harness) {
    let _ = harness;
}

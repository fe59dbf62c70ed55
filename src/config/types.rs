use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{DEFAULT_SKIP_DIRS, FILE_PLACEHOLDER};

/// One external checker or fixer, as written in `language_tools`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "tool")]
    pub name: String,
    /// Argument vector; the first element is the executable.
    pub command: Vec<String>,
    pub check: bool,
    pub fix: bool,
    /// Per-tool timeout in seconds; falls back to `default_timeout`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl ToolDefinition {
    #[must_use]
    pub fn checker(name: &str, command: &[&str]) -> Self {
        Self::build(name, command, true, false)
    }

    #[must_use]
    pub fn fixer(name: &str, command: &[&str]) -> Self {
        Self::build(name, command, false, true)
    }

    fn build(name: &str, command: &[&str], check: bool, fix: bool) -> Self {
        Self {
            name: name.to_string(),
            command: command.iter().map(|s| (*s).to_string()).collect(),
            check,
            fix,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Some(secs);
        self
    }

    #[must_use]
    pub fn is_checker(&self) -> bool {
        self.check && !self.command.is_empty()
    }

    #[must_use]
    pub fn is_fixer(&self) -> bool {
        self.fix && !self.command.is_empty()
    }

    #[must_use]
    pub fn program(&self) -> Option<&str> {
        self.command.first().map(String::as_str)
    }

    #[must_use]
    pub fn timeout_or(&self, default: Duration) -> Duration {
        self.timeout.map_or(default, Duration::from_secs)
    }

    /// Arguments after the executable with the target path substituted.
    ///
    /// Every `{file}` occurrence is replaced; without a placeholder the path
    /// is appended as the final argument.
    #[must_use]
    pub fn args_for(&self, file: &Path) -> Vec<String> {
        let file_str = file.to_string_lossy();
        let rest = self.command.get(1..).unwrap_or_default();
        let templated = rest.iter().any(|a| a.contains(FILE_PLACEHOLDER));

        let mut args: Vec<String> = rest
            .iter()
            .map(|a| a.replace(FILE_PLACEHOLDER, &file_str))
            .collect();
        if !templated {
            args.push(file_str.into_owned());
        }
        args
    }
}

/// Language key -> ordered tool list.
pub type ToolMap = BTreeMap<String, Vec<ToolDefinition>>;

/// Built-in tools used when no config file provides `language_tools`.
#[must_use]
pub fn default_tool_map() -> ToolMap {
    let mut map = ToolMap::new();
    map.insert(
        "python".to_string(),
        vec![
            ToolDefinition::checker("pylint", &["pylint", "--output-format=json", "--score=n"])
                .with_timeout(30),
            ToolDefinition::fixer("black", &["black", "-q"]).with_timeout(30),
        ],
    );
    map.insert(
        "javascript".to_string(),
        vec![
            ToolDefinition::checker("eslint", &["eslint", "--format=json"]).with_timeout(30),
            ToolDefinition::fixer("prettier", &["prettier", "--write"]).with_timeout(30),
        ],
    );
    map
}

/// `app_settings` exactly as written on disk. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettingsFile {
    pub max_workers: Option<usize>,
    pub history_file: Option<String>,
    pub output_dir: Option<String>,
    pub default_timeout: Option<u64>,
    pub skip_dirs: Vec<String>,
}

/// Effective run-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub max_workers: usize,
    pub history_file: PathBuf,
    pub output_dir: PathBuf,
    pub default_timeout: u64,
    pub skip_dirs: BTreeSet<String>,
    pub fix_mode: bool,
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_workers: 4,
            history_file: PathBuf::from("codex_history.json"),
            output_dir: PathBuf::from("reports"),
            default_timeout: 30,
            skip_dirs: default_skip_dirs(),
            fix_mode: false,
            verbose: false,
        }
    }
}

impl Settings {
    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout)
    }
}

#[must_use]
pub fn default_skip_dirs() -> BTreeSet<String> {
    DEFAULT_SKIP_DIRS.iter().map(|s| (*s).to_string()).collect()
}

/// Effective configuration: settings plus the validated tool map.
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub tools: ToolMap,
    /// File the configuration was read from, if any.
    pub source: Option<PathBuf>,
    /// Validation problems encountered while loading.
    pub diagnostics: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            tools: default_tool_map(),
            source: None,
            diagnostics: Vec::new(),
        }
    }
}

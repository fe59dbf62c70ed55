// src/config/io.rs
//! Config file discovery, parsing, and per-entry validation.
//!
//! TOML and JSON documents are both normalised to `serde_json::Value`
//! so the validation below is format-agnostic.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::types::{AppSettingsFile, Config, ToolDefinition, ToolMap};
use crate::constants::CONFIG_FILES;

/// Returns the first existing config file in `dir`.
#[must_use]
pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

/// Reads a config document into a JSON value.
///
/// # Errors
/// Returns error if the file cannot be read or parsed.
pub fn read_document(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let is_toml = path.extension().is_some_and(|e| e == "toml");
    if is_toml {
        let doc: toml::Value = toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in {}", path.display()))?;
        serde_json::to_value(doc).context("Failed to normalise TOML document")
    } else {
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
    }
}

/// Merges a parsed document into `config`, recording every rejected
/// section or entry in `config.diagnostics`.
pub fn apply_document(config: &mut Config, doc: &Value) {
    if let Some(section) = doc.get("app_settings") {
        apply_app_settings(config, section);
    }
    if let Some(section) = doc.get("language_tools") {
        apply_language_tools(config, section);
    }
}

fn apply_app_settings(config: &mut Config, section: &Value) {
    let parsed: AppSettingsFile = match serde_json::from_value(section.clone()) {
        Ok(p) => p,
        Err(e) => {
            report(config, format!("Invalid 'app_settings' in config: {e}. Using defaults."));
            return;
        }
    };

    match parsed.max_workers {
        Some(0) => report(config, "max_workers must be at least 1; using default".into()),
        Some(n) => config.settings.max_workers = n,
        None => {}
    }
    match parsed.default_timeout {
        Some(0) => report(config, "default_timeout must be at least 1s; using default".into()),
        Some(t) => config.settings.default_timeout = t,
        None => {}
    }

    let settings = &mut config.settings;
    if let Some(h) = parsed.history_file {
        settings.history_file = PathBuf::from(h);
    }
    if let Some(o) = parsed.output_dir {
        settings.output_dir = PathBuf::from(o);
    }
    settings.skip_dirs.extend(parsed.skip_dirs);
}

fn apply_language_tools(config: &mut Config, section: &Value) {
    let Some(languages) = section.as_object() else {
        report(config, "Invalid 'language_tools' in config: expected a table. Using defaults.".into());
        return;
    };

    let mut map = ToolMap::new();
    for (lang, entries) in languages {
        let Some(entries) = entries.as_array() else {
            report(config, format!("Invalid 'language_tools' in config: '{lang}' is not a list"));
            continue;
        };
        let valid = validate_entries(config, lang, entries);
        if !valid.is_empty() {
            map.insert(lang.clone(), valid);
        }
    }
    config.tools = map;
}

fn validate_entries(config: &mut Config, lang: &str, entries: &[Value]) -> Vec<ToolDefinition> {
    let mut valid = Vec::new();
    for (idx, entry) in entries.iter().enumerate() {
        match serde_json::from_value::<ToolDefinition>(entry.clone()) {
            Ok(def) if def.command.is_empty() => report(
                config,
                format!("Invalid 'language_tools' in config: {lang}[{idx}] has an empty command"),
            ),
            Ok(def) => valid.push(def),
            Err(e) => report(
                config,
                format!("Invalid 'language_tools' in config: {lang}[{idx}]: {e}"),
            ),
        }
    }
    valid
}

fn report(config: &mut Config, message: String) {
    warn!("{message}");
    config.diagnostics.push(message);
}

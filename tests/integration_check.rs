// tests/integration_check.rs
use codex_core::config::{Config, ToolDefinition, ToolMap};
use codex_core::engine::Engine;
use std::fs;

fn config_for(lang: &str, tools: Vec<ToolDefinition>) -> Config {
    let mut config = Config::default();
    config.tools = ToolMap::new();
    config.tools.insert(lang.into(), tools);
    config
}

#[test]
fn unsupported_language_fails_the_file() {
    let d = tempfile::tempdir().unwrap();
    fs::write(d.path().join("main.go"), "package main\n").unwrap();

    let results = Engine::new(Config::default())
        .scan_and_process(d.path())
        .unwrap();

    assert_eq!(results.len(), 1);
    assert!(!results[0].success);
    assert_eq!(results[0].language, "Go");
    assert_eq!(results[0].errors, vec!["Unsupported language/extension"]);
}

#[test]
fn missing_checker_is_only_a_warning() {
    let d = tempfile::tempdir().unwrap();
    fs::write(d.path().join("a.py"), "x = 1\n").unwrap();
    let config = config_for(
        "python",
        vec![ToolDefinition::checker("ghostlint", &["codex-no-such-linter-xyz"])],
    );

    let results = Engine::new(config).scan_and_process(d.path()).unwrap();

    assert!(results[0].success);
    assert_eq!(results[0].warnings, vec!["ghostlint not available. Install it."]);
}

#[cfg(unix)]
mod with_tools {
    use super::*;

    fn sh(name: &str, script: &str) -> ToolDefinition {
        ToolDefinition::checker(name, &["sh", "-c", script, "sh"])
    }

    #[test]
    fn stderr_from_failing_checker_becomes_tagged_error() {
        let d = tempfile::tempdir().unwrap();
        fs::write(d.path().join("a.py"), "x = 1\n").unwrap();
        let config = config_for("python", vec![sh("tool", "echo 'line too long' >&2; exit 1")]);

        let results = Engine::new(config).scan_and_process(d.path()).unwrap();

        assert_eq!(results.len(), 1);
        assert!(!results[0].success);
        assert_eq!(results[0].errors, vec!["[tool] line too long"]);
        assert!(!results[0].was_fixed);
    }

    #[test]
    fn checkers_run_in_order_and_accumulate() {
        let d = tempfile::tempdir().unwrap();
        fs::write(d.path().join("a.js"), "let x\n").unwrap();
        let config = config_for(
            "javascript",
            vec![
                sh("first", "echo 'missing semicolon'; exit 1"),
                sh("ok", "exit 0"),
                sh("silent", "exit 4"),
            ],
        );

        let results = Engine::new(config).scan_and_process(d.path()).unwrap();

        assert_eq!(
            results[0].errors,
            vec!["[first] missing semicolon", "Exit code 4 from silent"]
        );
        assert_eq!(results[0].language, "Javascript");
    }

    #[test]
    fn checker_that_hangs_is_reported_as_timeout() {
        let d = tempfile::tempdir().unwrap();
        fs::write(d.path().join("a.py"), "").unwrap();
        let config = config_for("python", vec![sh("hang", "sleep 5").with_timeout(1)]);

        let results = Engine::new(config).scan_and_process(d.path()).unwrap();

        assert!(!results[0].success);
        assert_eq!(results[0].errors, vec!["[hang] timed out after 1s"]);
    }

    #[test]
    fn placeholder_controls_file_position() {
        let d = tempfile::tempdir().unwrap();
        let file = d.path().join("a.py");
        fs::write(&file, "").unwrap();
        let config = config_for(
            "python",
            vec![ToolDefinition::checker(
                "echoer",
                &["sh", "-c", "echo \"$1|$2\" >&2; exit 1", "sh", "{file}", "--flag"],
            )],
        );

        let results = Engine::new(config).scan_and_process(d.path()).unwrap();

        let canonical = fs::canonicalize(&file).unwrap();
        assert_eq!(
            results[0].errors,
            vec![format!("[echoer] {}|--flag", canonical.display())]
        );
    }
}

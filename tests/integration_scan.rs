// tests/integration_scan.rs
use codex_core::config::{default_skip_dirs, Config};
use codex_core::discovery::scan;
use codex_core::engine::Engine;
use codex_core::lang::Lang;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

fn write(root: &Path, rel: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, "").unwrap();
}

#[test]
fn skipped_directory_is_never_descended() {
    let d = tempfile::tempdir().unwrap();
    write(d.path(), "src/app.py");
    for i in 0..1000 {
        write(d.path(), &format!("node_modules/pkg/file_{i}.js"));
    }

    let mut walk = scan(d.path(), &default_skip_dirs()).unwrap();
    let tasks: Vec<_> = walk.by_ref().collect();

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].lang, Lang::Python);
    // root, src, src/app.py, node_modules (pruned before descent)
    assert_eq!(walk.stats().visited(), 4);
}

#[test]
fn configured_skip_dirs_extend_the_defaults() {
    let d = tempfile::tempdir().unwrap();
    write(d.path(), "generated/a.py");
    write(d.path(), "venv/lib/b.py");
    write(d.path(), "lib/generated_not_exact/c.py");

    let mut skip: BTreeSet<String> = default_skip_dirs();
    skip.insert("generated".into());

    let tasks: Vec<_> = scan(d.path(), &skip).unwrap().collect();
    assert_eq!(tasks.len(), 1);
    assert!(tasks[0].path.ends_with("lib/generated_not_exact/c.py"));
}

#[test]
fn only_known_extensions_become_tasks() {
    let d = tempfile::tempdir().unwrap();
    for rel in ["a.py", "b.js", "c.ts", "d.go", "e.rs", "f.c", "g.cpp", "README.md", "h.txt"] {
        write(d.path(), rel);
    }

    let tasks: Vec<_> = scan(d.path(), &default_skip_dirs()).unwrap().collect();
    assert_eq!(tasks.len(), 7);
}

#[test]
fn skipped_files_produce_no_results() {
    let d = tempfile::tempdir().unwrap();
    for i in 0..50 {
        write(d.path(), &format!(".venv/site/mod_{i}.py"));
    }

    let results = Engine::new(Config::default())
        .scan_and_process(d.path())
        .unwrap();
    assert!(results.is_empty());
}

#[cfg(unix)]
#[test]
fn symlinked_directories_are_not_followed() {
    let d = tempfile::tempdir().unwrap();
    let outside = tempfile::tempdir().unwrap();
    write(outside.path(), "secret.py");
    write(d.path(), "real.py");
    std::os::unix::fs::symlink(outside.path(), d.path().join("linked")).unwrap();

    let tasks: Vec<_> = scan(d.path(), &default_skip_dirs()).unwrap().collect();
    assert_eq!(tasks.len(), 1);
}

#[cfg(unix)]
#[test]
fn run_reports_unreadable_directories() {
    use codex_core::signal::CancelToken;
    use std::os::unix::fs::PermissionsExt;

    let d = tempfile::tempdir().unwrap();
    let locked = d.path().join("private");
    fs::create_dir(&locked).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read_dir(&locked).is_ok() {
        // Privileged users bypass directory permissions.
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let outcome = Engine::new(Config::default())
        .run(d.path(), &CancelToken::new(), |_| {})
        .unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(outcome.results.is_empty());
    assert_eq!(outcome.unreadable, 1);
    assert!(!outcome.interrupted);
}

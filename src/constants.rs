// src/constants.rs
//! Shared constants: pruned directories, backup naming, config file names.

/// Directory names that are always pruned from traversal, in addition to
/// whatever `skip_dirs` the configuration adds.
pub const DEFAULT_SKIP_DIRS: &[&str] = &[
    "node_modules",
    "venv",
    ".venv",
    "__pycache__",
    ".git",
    "build",
    "dist",
    ".ipynb_checkpoints",
    "site-packages",
];

/// Reserved suffix appended to a file name to form its backup artifact.
/// `src/app.py` is backed up as `src/app.py.codex.bak`.
pub const BACKUP_SUFFIX: &str = ".codex.bak";

/// Config files looked up in the working directory, first match wins.
pub const CONFIG_FILES: &[&str] = &["codex.toml", ".codexrc.json", "codex.json"];

/// Placeholder in a command template replaced by the target file path.
pub const FILE_PLACEHOLDER: &str = "{file}";

/// Number of combined output lines kept per failing checker.
pub const MAX_ERROR_LINES_PER_TOOL: usize = 5;

/// Number of history rows shown by `codex history`.
pub const HISTORY_DISPLAY_WINDOW: usize = 10;

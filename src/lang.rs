// src/lang.rs
//! Extension to language-key mapping.
//!
//! The language key is the lookup key into the configured tool map, so it is
//! kept as the plain lowercase string users write in their config.

use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    Python,
    JavaScript,
    Go,
    Rust,
    Cpp,
}

impl Lang {
    #[must_use]
    pub fn from_ext(ext: &str) -> Option<Self> {
        match ext {
            "py" => Some(Self::Python),
            "js" | "ts" => Some(Self::JavaScript),
            "go" => Some(Self::Go),
            "rs" => Some(Self::Rust),
            "c" | "cpp" => Some(Self::Cpp),
            _ => None,
        }
    }

    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_ext)
    }

    /// Key used in `language_tools`.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Cpp => "c/c++",
        }
    }

    /// Display label used in reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Python => "Python",
            Self::JavaScript => "Javascript",
            Self::Go => "Go",
            Self::Rust => "Rust",
            Self::Cpp => "C/c++",
        }
    }
}

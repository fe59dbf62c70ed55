// src/tools/mod.rs
//! External tool execution.
//!
//! Tools are opaque: a command template, an exit code, and two output
//! streams. Mutation safety for fixers is layered on top in `crate::fix`.

mod invoker;

pub use invoker::{ToolInvoker, ToolOutcome, ToolOutput};

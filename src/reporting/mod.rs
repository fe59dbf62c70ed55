// src/reporting/mod.rs
//! Console and file output for a run.

pub mod console;
pub mod json;

pub use console::{
    print_config, print_final_report, print_history, print_progress, print_sweep, print_trend,
};
pub use json::export_results;

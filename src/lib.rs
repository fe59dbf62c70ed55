pub mod cli;
pub mod config;
pub mod constants;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod events;
pub mod exit;
pub mod fix;
pub mod history;
pub mod lang;
pub mod pipeline;
pub mod pool;
pub mod reporting;
pub mod signal;
pub mod tools;
pub mod types;

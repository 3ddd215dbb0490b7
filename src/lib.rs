pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod master;
pub mod merge;
pub mod panel;
pub mod tasks;
pub mod types;

//! tmxdedup CLI library
//!
//! Command-line interface around the `tmxdedup-core` pipeline: argument
//! parsing, file-backed chunk sourcing, encoding detection, progress
//! reporting and report rendering.

pub mod codec;
pub mod commands;
pub mod config;
pub mod input;
pub mod output;
pub mod progress;
pub mod report;

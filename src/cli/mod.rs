//! CLI module for pigen - command-line interface and progress output.
//!
//! Provides the argument definitions and the observer that renders each
//! pipeline iteration to the terminal as it completes.

pub mod commands;

pub use commands::{Cli, ProgressObserver};

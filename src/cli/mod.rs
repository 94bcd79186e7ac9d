//! CLI module for dmdrip - command-line argument parsing.

pub mod commands;

pub use commands::Cli;

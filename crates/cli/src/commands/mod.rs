//! CLI subcommand implementations.

pub mod billing;

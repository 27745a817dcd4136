//! CLI subcommand implementations.

pub mod chat;
pub mod init;
pub mod serve;

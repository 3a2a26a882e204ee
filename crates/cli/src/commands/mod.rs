//! Subcommand implementations

pub mod chat;
pub mod knowledge;
pub mod models;
pub mod predict;
pub mod settings;
pub mod status;

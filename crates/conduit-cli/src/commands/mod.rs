//! CLI commands

pub mod cache;
pub mod chat;
pub mod config;
pub mod history;
pub mod query;

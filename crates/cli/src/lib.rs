//! Lending CLI - operator tooling
//!
//! This crate provides the `lendctl` binary and the commands behind it.

pub mod commands;
pub mod context;

pub use context::AppContext;

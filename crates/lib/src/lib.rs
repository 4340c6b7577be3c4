//! Reminders bridge core — auth token, request validation, script sanitizing and building,
//! interpreter execution, and the loopback HTTP listener used by the CLI.

pub mod bridge;
pub mod config;
pub mod due;
pub mod error;
pub mod exec;
pub mod reminder;
pub mod sanitize;
pub mod script;
pub mod token;

//! Core library for opening Coder workspaces in VS Code Desktop.

pub mod api;
pub mod auth;
pub mod config;
pub mod launch;

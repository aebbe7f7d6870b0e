//! lap-slotgen library - exposes the command handlers for the binary and for testing

pub mod commands;
pub mod common;
pub mod errors;

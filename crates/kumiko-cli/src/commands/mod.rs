//! CLI command implementations.

pub mod common;
pub mod console;
pub mod objects;
pub mod patches;
pub mod render;
pub mod run;

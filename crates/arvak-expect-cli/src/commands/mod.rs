//! CLI command implementations.

pub mod common;
pub mod example;
pub mod run;

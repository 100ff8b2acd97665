//! Command line study diary. Log study sessions into a local table and
//! review how the time was spent across days, weeks, months, and subjects,
//! straight from a terminal.
//!

pub mod cli;
pub mod config;
pub mod store;
pub mod utils;

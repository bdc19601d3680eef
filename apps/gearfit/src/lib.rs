//! # gearfit
//!
//! Command-line front end for `gearfit-core`: configuration layering, the
//! concrete item sources and the CLI commands.

pub mod cli;
pub mod config;
pub mod source;

//! Command-line front end for `forgefetch`.
//!
//! The binary is a thin shell over these modules: argument parsing, settings
//! loading, local file collection, and output writing.

pub mod cli;
pub mod config;
pub mod error;
pub mod local;
pub mod output;

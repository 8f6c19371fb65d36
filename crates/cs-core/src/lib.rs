//! cs-core: Command-line front end for streamed chat replies.
//!
//! Configuration, logging setup and terminal output around `cs-backend`.
//! Exposed as a library for integration testing.

pub mod config;
pub mod logging;
pub mod output;
pub mod run;

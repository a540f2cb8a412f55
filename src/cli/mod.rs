//! Command-line front end.
//!
//! Plays the presentation role: it turns subcommands into store operations
//! and prints what the store holds afterwards.
mod app;
mod args;

pub use app::App;
pub use args::Cli;

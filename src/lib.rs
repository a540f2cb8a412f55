//! SageNote note store library
//!
//! This library keeps a collection of markdown notes with tags, todos,
//! attachments, sharing and version history, persists the whole collection
//! as one record, and exports notes as markdown, HTML or zip archives.

mod cli;
mod clock;
mod config;
mod errors;
mod events;
mod export;
mod helper;
mod import;
mod note;
pub mod stats;
mod storage;
mod store;
mod template;
mod types;
mod versions;

// Re-export key components
pub use cli::*;
pub use clock::*;
pub use config::*;
pub use errors::*;
pub use events::*;
pub use export::*;
pub use helper::*;
pub use import::*;
pub use note::*;
pub use stats::NoteStats;
pub use storage::*;
pub use store::*;
pub use template::*;
pub use types::*;
pub use versions::*;

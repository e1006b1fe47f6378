//! Confluence backend for wiki-publish.
//!
//! - `ConfluenceClient`: basic-auth REST transport
//! - `ConfluenceDirectory`: `RemoteDirectory` over the content and attachment APIs
//! - `MarkdownConverter`: Markdown to Confluence wiki markup
//! - `run_until`: one sync under a deadline and a shutdown signal

pub mod client;
pub mod config;
pub mod directory;
pub mod model;
pub mod run;
pub mod wiki;

pub use client::ConfluenceClient;
pub use config::Config;
pub use directory::ConfluenceDirectory;
pub use run::{run_sync, run_until, shutdown_signal};
pub use wiki::{render_wiki, MarkdownConverter};

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Configuration for the wiki-publish command.
#[derive(Parser, Debug, Clone)]
#[command(name = "wiki-publish")]
#[command(about = "Publish README.md and doc/*.md as Confluence pages under an ancestor page")]
pub struct Config {
    /// Confluence base URL, e.g. https://wiki.example.com
    #[arg(long, env = "CONFLUENCE_URL")]
    pub url: String,

    /// Confluence user name
    #[arg(long, env = "CONFLUENCE_LOGIN")]
    pub login: String,

    /// Confluence password or API token
    #[arg(long, env = "CONFLUENCE_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Key of the space pages are published to
    #[arg(long, env = "CONFLUENCE_SPACE")]
    pub space: String,

    /// File holding the ancestor page id, relative to the root directory
    #[arg(long, default_value = "confluence.ancestor", env = "WIKI_PUBLISH_ANCESTOR_FILE")]
    pub ancestor_file: PathBuf,

    /// Directory containing README.md and doc/
    #[arg(long, default_value = ".", env = "WIKI_PUBLISH_ROOT_DIR")]
    pub root_dir: PathBuf,

    /// Abort the sync after this many seconds
    #[arg(long, env = "WIKI_PUBLISH_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

impl Config {
    pub fn ancestor_path(&self) -> PathBuf {
        self.root_dir.join(&self.ancestor_file)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

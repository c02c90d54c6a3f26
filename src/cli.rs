use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fileforged")]
#[command(
    author,
    version,
    about = "Serve a directory over HTTP with listings, a video player and read-only WebDAV"
)]
pub struct Cli {
    /// Path to config file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve a directory
    Serve {
        /// Directory to serve (overrides server.root)
        dir: Option<PathBuf>,

        /// Host to bind to
        #[arg(long, env = "FILEFORGED_HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,
    },

    /// Validate configuration file
    CheckConfig {
        /// Config file to validate (uses --config or the default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

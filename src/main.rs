mod cli;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use ff_core::config::Config;

/// Looked up in the working directory when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "fileforged.json";

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "fileforged=debug,ff_server=debug,ff_core=debug,ff_media=debug,tower_http=debug"
                .to_string()
        } else {
            "fileforged=info,ff_server=info,ff_core=info,tower_http=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Serve { dir, host, port } => {
            let mut config = load_config(cli.config.as_deref())?;

            // CLI values override the file.
            if let Some(dir) = dir {
                config.server.root = expand(&dir);
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(ff_server::start(config))
                .context("server failed")
        }
        Commands::CheckConfig { config } => check_config(config.or(cli.config).as_deref()),
        Commands::Version => {
            println!("fileforged {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

/// An explicit config file must exist and parse; the default one may be
/// absent.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let path = expand(path);
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            Config::from_json(&contents)
                .with_context(|| format!("invalid config file {}", path.display()))
        }
        None => Ok(Config::load_or_default(Some(Path::new(DEFAULT_CONFIG_FILE)))),
    }
}

fn check_config(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    let warnings = config.validate();

    match path {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: {DEFAULT_CONFIG_FILE} (defaults if absent)"),
    }
    println!("  root:   {}", config.server.root.display());
    println!("  listen: {}:{}", config.server.host, config.server.port);
    println!("  api:    {}", config.routes.api_prefix());
    println!("  assets: {}", config.routes.assets_prefix());

    if warnings.is_empty() {
        println!("Configuration OK");
    } else {
        for warning in &warnings {
            println!("warning: {warning}");
        }
        println!("Configuration OK with {} warning(s)", warnings.len());
    }
    Ok(())
}

// CLI module for framewatch
// Author: kelexine (https://github.com/kelexine)

use clap::Parser;
use std::path::PathBuf;

/// framewatch - Rate-limited, caching vision classifier gateway for video frames
#[derive(Parser, Debug)]
#[command(name = "framewatch", version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML config file (default: ~/.framewatch/config.toml)
    #[arg(short, long, env = "FRAMEWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind, overrides server.host
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on, overrides server.port
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl Args {
    /// Apply command line overrides on top of loaded configuration
    pub fn apply(&self, config: &mut crate::config::AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

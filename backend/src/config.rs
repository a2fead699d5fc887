use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// Server configuration, from flags or the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "aoi-backend", version, about = "Area-of-interest mapping server")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "AOI_ADDR", default_value = "127.0.0.1:3000")]
    pub addr: SocketAddr,

    /// Directory holding the persisted features and view state
    #[arg(long, env = "AOI_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Front-end files served at `/`
    #[arg(long, env = "AOI_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// trace, debug, info, warn or error
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("aoi-mapper")))
            .unwrap_or_else(|| PathBuf::from("./aoi-data"))
    }

    /// Unknown level names fall back to `info`.
    pub fn level(&self) -> Level {
        self.log_level.trim().parse().unwrap_or(Level::INFO)
    }
}

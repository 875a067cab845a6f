use std::net::SocketAddr;

use clap::{Parser, ValueEnum};

/// rust-redis-stats — time-slotted counters, timings and gauges on Redis.
#[derive(Debug, Clone, Parser)]
#[command(name = "rust-redis-stats", version, about)]
pub struct Config {
    /// Redis connection URL.
    #[arg(long, env = "STATS_REDIS_URL", default_value = "redis://127.0.0.1:6379/")]
    pub redis_url: String,

    /// Address the HTTP API binds to.
    #[arg(long, env = "STATS_LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// Where measurements are kept.
    #[arg(long, env = "STATS_BACKEND", value_enum, default_value_t = Backend::Redis)]
    pub backend: Backend,

    /// Log filter, overridden by `RUST_LOG` when set.
    #[arg(long, env = "STATS_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format.
    #[arg(long, env = "STATS_LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Shared Redis server (synchronized clock via TIME).
    Redis,
    /// Process-local maps; data is lost on exit.
    Memory,
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

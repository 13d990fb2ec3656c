//! Environment configuration.

use anyhow::Context;
use std::{env, net::SocketAddr};

const REDIS_HOST_DEFAULT: &str = "localhost";
const REDIS_PORT_DEFAULT: u16 = 6379;
const REDIS_DB_DEFAULT: i64 = 0;
const BIND_ADDR_DEFAULT: &str = "0.0.0.0:5000";

/// Runtime settings, read once at startup.
#[derive(Debug)]
pub struct Config {
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_db: i64,
    pub bind_addr: SocketAddr,
}

impl Config {
    /// Reads `REDIS_HOST`, `REDIS_PORT`, `REDIS_DB` and `BIND_ADDR`,
    /// defaulting each unset variable. A set but malformed value is an error.
    pub fn from_env() -> anyhow::Result<Self> {
        let redis_host =
            env::var("REDIS_HOST").unwrap_or_else(|_| REDIS_HOST_DEFAULT.to_string());
        let redis_port = match env::var("REDIS_PORT") {
            Ok(port) => port
                .parse()
                .with_context(|| format!("invalid REDIS_PORT {port:?}"))?,
            Err(_) => REDIS_PORT_DEFAULT,
        };
        let redis_db = match env::var("REDIS_DB") {
            Ok(db) => db
                .parse()
                .with_context(|| format!("invalid REDIS_DB {db:?}"))?,
            Err(_) => REDIS_DB_DEFAULT,
        };
        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| BIND_ADDR_DEFAULT.to_string())
            .parse()
            .context("invalid BIND_ADDR")?;

        Ok(Self {
            redis_host,
            redis_port,
            redis_db,
            bind_addr,
        })
    }

    /// Connection URL for the `redis` crate.
    pub fn redis_url(&self) -> String {
        format!(
            "redis://{}:{}/{}",
            self.redis_host, self.redis_port, self.redis_db
        )
    }
}

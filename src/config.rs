use std::{str::FromStr, time::Duration};

const DEFAULT_LISTEN_PORT: u16 = 8080;
const DEFAULT_SERVER_HOST: &str = "mc.proxycraft.ru";
const DEFAULT_SERVER_PORT: u16 = 25565;
const DEFAULT_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Port the HTTP service listens on.
    pub port: u16,
    /// Server queried when the request names no host.
    pub default_host: String,
    /// Port queried when the request names no port.
    pub default_port: u16,
    /// Deadline for connecting and for each read and write of an exchange.
    pub timeout: Duration,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("invalid value `{value}` for {name}")]
pub struct ConfigError {
    name: &'static str,
    value: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_LISTEN_PORT,
            default_host: DEFAULT_SERVER_HOST.to_owned(),
            default_port: DEFAULT_SERVER_PORT,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            port: parse(&lookup, "PORT", defaults.port)?,
            default_host: lookup("DEFAULT_HOST")
                .filter(|host| !host.trim().is_empty())
                .unwrap_or(defaults.default_host),
            default_port: parse(&lookup, "DEFAULT_PORT", defaults.default_port)?,
            timeout: Duration::from_millis(parse(&lookup, "PING_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?),
        })
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    lookup(name).map_or(Ok(default), |value| {
        value
            .trim()
            .parse()
            .map_err(|_| ConfigError { name, value })
    })
}

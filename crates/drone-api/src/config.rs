//! Environment-based configuration, grounded on the teacher's
//! `drone-graphql-api/src/config.rs` env-var-with-fallback pattern and
//! on `original_source/configs/config.go` for the exact variable names
//! (spec.md §6.4).

use std::env;
use std::str::FromStr;

use drone_auth::JwtConfig;
use drone_events::NatsConfig;
use drone_persistence::{CacheConfig, CacheTtl, PgConfig};

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_prefix: String,
}

impl ServerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            host: env_or("SERVER_HOST", "0.0.0.0"),
            port: env_or_parse("SERVER_PORT", 8080),
            api_prefix: env_or("API_PREFIX", "/api/v1"),
        }
    }

    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: PgConfig,
    pub redis: CacheConfig,
    pub nats: NatsConfig,
    pub jwt: JwtConfig,
}

impl Config {
    #[must_use]
    pub fn from_env() -> Self {
        let database = PgConfig {
            host: env_or("DB_HOST", "localhost"),
            port: env_or_parse("DB_PORT", 5432),
            user: env_or("DB_USER", "postgres"),
            password: env_or("DB_PASSWORD", "password"),
            dbname: env_or("DB_NAME", "drones_db"),
            ssl_mode: env_or("DB_SSL_MODE", "disable"),
            max_connections: env_or_parse("DB_MAX_CONNECTIONS", 10),
        };

        let redis = CacheConfig {
            url: format!(
                "redis://{}{}:{}/{}",
                env::var("REDIS_PASSWORD")
                    .ok()
                    .filter(|p| !p.is_empty())
                    .map(|p| format!(":{p}@"))
                    .unwrap_or_default(),
                env_or("REDIS_HOST", "127.0.0.1"),
                env_or_parse::<u16>("REDIS_PORT", 6379),
                env_or_parse::<u8>("REDIS_DB", 0),
            ),
            ttl: CacheTtl::default(),
        };

        Self {
            server: ServerConfig::from_env(),
            database,
            redis,
            nats: NatsConfig::from_env(),
            jwt: JwtConfig::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_defaults_to_the_documented_bind_address() {
        env::remove_var("SERVER_HOST");
        env::remove_var("SERVER_PORT");
        let config = ServerConfig::from_env();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }
}

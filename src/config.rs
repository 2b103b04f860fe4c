use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub comment_max: usize,
    pub denylist: Vec<String>,
    pub catalog_path: Option<String>,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "1111"),
            comment_max: try_load("COMMENT_MAX", "500"),
            denylist: load_denylist(),
            catalog_path: env::var("CATALOG_PATH").ok(),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn load_denylist() -> Vec<String> {
    let raw = var("DENYLIST").unwrap_or_else(|_| "damn,hell,crap".to_string());

    raw.split(',')
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !term.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::load_denylist;

    #[test]
    fn denylist_defaults_to_launch_terms() {
        // DENYLIST is unset under cargo test.
        assert_eq!(load_denylist(), vec!["damn", "hell", "crap"]);
    }
}

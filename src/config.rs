// Copyright 2023 Remi Bernotavicius

use crate::Result;
use log::info;
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

pub struct Config {
    pub bind_address: String,
    pub port: u16,
    pub database_path: PathBuf,
}

impl Config {
    /// Values come from the environment (a `.env` file is honored), with
    /// working defaults for a local run.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            bind_address: try_load("BIND_ADDRESS", "127.0.0.1"),
            port: try_load("PORT", "8000"),
            database_path: match env::var("DATABASE_URL") {
                Ok(path) => path.into(),
                Err(_) => default_database_path()?,
            },
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| format!("invalid {key}: {e}"))
        .expect("environment misconfigured")
}

/// This is where the database lives when `DATABASE_URL` says nothing. On
/// Linux it should be like: `~/.local/share/recipe_catalog/`
fn default_database_path() -> Result<PathBuf> {
    let dirs = directories::BaseDirs::new().expect("failed to get user home directory");
    let path = dirs.data_dir().join("recipe_catalog");
    std::fs::create_dir_all(&path)?;
    Ok(path.join("catalog.sqlite"))
}

#[test]
fn unset_variables_fall_back_to_defaults() {
    assert_eq!(try_load::<u16>("CATALOG_SURELY_UNSET_PORT", "8000"), 8000);
    assert_eq!(
        try_load::<String>("CATALOG_SURELY_UNSET_BIND", "127.0.0.1"),
        "127.0.0.1"
    );
}

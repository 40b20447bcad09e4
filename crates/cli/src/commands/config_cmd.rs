//! `finctx config` — Configuration management commands.

use std::path::{Path, PathBuf};

use finctx_config::{AppConfig, ConfigError};
use finctx_core::Error;

/// Load from `path` when given, else the default location. Env overrides apply either way.
pub fn load(path: Option<&Path>) -> finctx_core::Result<AppConfig> {
    load_config(path).map_err(|e| Error::Config {
        message: e.to_string(),
    })
}

fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => {
            let mut config = AppConfig::load_from(path)?;
            config.apply_env_overrides(|key| std::env::var(key).ok())?;
            Ok(config)
        }
        None => AppConfig::load(),
    }
}

fn resolved_path(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

pub fn show(path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load(path)?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

pub fn path(path: Option<&Path>) {
    println!("{}", resolved_path(path).display());
}

pub fn validate(path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load(path)?;
    println!("Configuration OK: {}", resolved_path(path).display());
    println!("  token_budget:       {}", config.context.token_budget);
    println!("  max_items:          {}", config.context.max_items);
    println!("  include_aggregates: {}", config.context.include_aggregates);
    println!("  reserve ratio:      {}", config.packing.aggregate_reserve_ratio);
    Ok(())
}

pub fn init() {
    print!("{}", AppConfig::default_toml());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn malformed_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[packing\nsame_kind_penalty = ").unwrap();
        let err = load(Some(file.path())).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().starts_with("Configuration error:"));
    }

    #[test]
    fn out_of_range_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[context]\ntoken_budget = 50").unwrap();
        let err = load(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("token_budget"));
    }
}

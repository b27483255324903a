//! `rpcretry config` – print config location and effective settings.

use anyhow::Result;
use rpcretry_core::config::{self, Config};

pub fn run_config(cfg: &Config, service: Option<&str>) -> Result<()> {
    println!("Config file: {}", config::config_path()?.display());
    match service {
        Some(name) => {
            if !cfg.services.contains_key(name) {
                println!("No section for service {name:?}; using the default policy.");
            }
            println!("{}", toml::to_string_pretty(cfg.for_service(name))?);
        }
        None => println!("{}", toml::to_string_pretty(cfg)?),
    }
    Ok(())
}

//! Configuration command implementations

use std::path::Path;

use anyhow::Result;
use recur_core::config::default_config_path;

use super::load_config;

pub fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    print!("{}", config.to_toml()?);
    Ok(())
}

pub fn cmd_config_path(config_path: Option<&Path>) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .or_else(default_config_path);

    match path {
        Some(path) => {
            let state = if path.exists() {
                "in use"
            } else {
                "not present, using built-in defaults"
            };
            println!("{} ({})", path.display(), state);
        }
        None => println!("No data directory on this platform; using built-in defaults"),
    }
    Ok(())
}

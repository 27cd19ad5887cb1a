//! Show or initialize the config file.

use framedoc_common::config::{config_file_path, AppConfig};

pub fn run(init: bool) -> anyhow::Result<()> {
    let path = config_file_path();

    if init {
        if path.exists() {
            println!("Config already exists at {}", path.display());
        } else {
            AppConfig::default()
                .save_to(&path)
                .map_err(|e| anyhow::anyhow!("Failed to write config: {e}"))?;
            println!("Wrote default config to {}", path.display());
        }
        return Ok(());
    }

    let config = AppConfig::load_from(&path);
    println!("Config file: {}", path.display());
    if !path.exists() {
        println!("  (not found; showing defaults)");
    }
    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}

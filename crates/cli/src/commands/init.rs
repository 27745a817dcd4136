//! `switchyard init` — Write a starter configuration file.

use switchyard_config::AppConfig;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        return Ok(());
    }

    std::fs::create_dir_all(&config_dir)?;
    std::fs::write(&config_path, AppConfig::default_toml())?;

    println!("Wrote starter config to {}", config_path.display());
    println!("Edit the [agents.*] sections to point at your tool servers,");
    println!("then set SWITCHYARD_API_KEY and run `switchyard chat`.");
    Ok(())
}

use anyhow::Result;

use sitekit_core::SiteConfig;

pub fn run(config: &SiteConfig, init: bool) -> Result<()> {
    if init {
        let path = SiteConfig::config_path();
        if path.exists() {
            println!("Configuration already exists at {}", path.display());
            return Ok(());
        }
        let path = SiteConfig::default().save()?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    print!("{}", config.to_toml_string()?);
    Ok(())
}

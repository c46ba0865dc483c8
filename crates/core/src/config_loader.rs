use crate::config::ArbitrageConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Toml},
    Figment,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads engine configuration by merging TOML, environment variables, and JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load() -> Result<ArbitrageConfig> {
        let config: ArbitrageConfig = Figment::from(figment::providers::Serialized::defaults(
            ArbitrageConfig::default(),
        ))
        .merge(Toml::file("config/Config.toml"))
        .merge(Env::prefixed("ARB_"))
        .join(Json::file("config/Config.json"))
        .extract()?;

        Ok(config)
    }

    /// Loads engine configuration with a specific profile layered on top of the base file.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_with_profile(profile: &str) -> Result<ArbitrageConfig> {
        let config: ArbitrageConfig = Figment::from(figment::providers::Serialized::defaults(
            ArbitrageConfig::default(),
        ))
        .merge(Toml::file("config/Config.toml"))
        .merge(Toml::file(format!("config/Config.{profile}.toml")))
        .merge(Env::prefixed("ARB_"))
        .join(Json::file("config/Config.json"))
        .extract()?;

        Ok(config)
    }
}

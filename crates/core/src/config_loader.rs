use crate::config::EngineConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Toml},
    Figment,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads engine configuration by merging TOML, environment variables, and JSON.
    ///
    /// Missing files are skipped; every field falls back to its default.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be parsed or the result is invalid.
    pub fn load() -> Result<EngineConfig> {
        let config: EngineConfig = Self::base()
            .merge(Toml::file("config/Engine.toml"))
            .merge(Env::prefixed("IMPACT_").split("__"))
            .join(Json::file("config/Engine.json"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Loads engine configuration from a specific TOML file, then environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or the result is invalid.
    pub fn load_from(path: &str) -> Result<EngineConfig> {
        let config: EngineConfig = Self::base()
            .merge(Toml::file(path))
            .merge(Env::prefixed("IMPACT_").split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from an in-memory TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be parsed or the result is invalid.
    pub fn from_toml_str(toml: &str) -> Result<EngineConfig> {
        let config: EngineConfig = Self::base().merge(Toml::string(toml)).extract()?;
        config.validate()?;
        Ok(config)
    }

    fn base() -> Figment {
        Figment::from(figment::providers::Serialized::defaults(EngineConfig::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OffHoursPolicy;

    #[test]
    fn from_toml_overrides_selected_fields() {
        let config = ConfigLoader::from_toml_str(
            r#"
            symbols = ["TSLA", "NVDA"]

            [alignment]
            horizons_hours = [1, 24]
            off_hours_policy = "MARK_MISSING"

            [analysis]
            primary_horizon = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.symbols.len(), 2);
        assert_eq!(config.alignment.horizons_hours, vec![1, 24]);
        assert_eq!(config.alignment.off_hours_policy, OffHoursPolicy::MarkMissing);
        assert_eq!(config.alignment.tolerance_minutes, 5);
        assert_eq!(config.partition.min_bucket_size, 5);
    }

    #[test]
    fn from_toml_rejects_invalid_weights() {
        let result = ConfigLoader::from_toml_str(
            r#"
            [quality.weights]
            completeness = 0.5
            consistency = 0.5
            statistical_validity = 0.5
            market_integration = 0.0
            temporal_coverage = 0.0
            methodology = 0.0
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn from_toml_parses_calendar_holidays() {
        let config = ConfigLoader::from_toml_str(
            r#"
            [calendar]
            holidays = ["2024-07-04", "2024-12-25"]
            "#,
        )
        .unwrap();

        assert_eq!(config.calendar.holidays.len(), 2);
        assert_eq!(config.calendar.timezone, chrono_tz::US::Eastern);
    }
}

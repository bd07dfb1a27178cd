// Configuration — environment variables with sensible defaults.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::model::{BackgroundPrior, EmParams};
use crate::tiling::Tiling;

/// Default tile edge in degrees (roughly 1 km north-south).
pub const DEFAULT_TILE_SIZE: f64 = 0.01;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Every
/// value has a default; CLI flags override whatever is loaded here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the crawler's place JSON files
    pub data_dir: PathBuf,
    pub tiling: Tiling,
    pub em: EmParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            tiling: Tiling::Coordinates {
                tile_size: DEFAULT_TILE_SIZE,
            },
            em: EmParams::default(),
        }
    }
}

/// Read and parse `name`, falling back to `default` when unset.
fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Invalid value for {name}: '{raw}'")),
        Err(_) => Ok(default),
    }
}

/// Parse a tiling mode name. `tile_size` is used for coordinate tiling.
pub fn parse_tiling(name: &str, tile_size: f64) -> Result<Tiling> {
    match name.to_ascii_lowercase().as_str() {
        "coordinates" | "grid" => Ok(Tiling::Coordinates { tile_size }),
        "city" => Ok(Tiling::City),
        other => anyhow::bail!("Unknown tiling '{other}' (expected coordinates or city)"),
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let defaults = Self::default();
        let em_defaults = defaults.em;

        let tile_size = env_or("TOPONYM_TILE_SIZE", DEFAULT_TILE_SIZE)?;
        let tiling_name = env::var("TOPONYM_TILING").unwrap_or_else(|_| "coordinates".to_string());
        let tiling = parse_tiling(&tiling_name, tile_size).context("Invalid TOPONYM_TILING")?;

        let em = EmParams {
            max_steps: env_or("TOPONYM_MAX_STEPS", em_defaults.max_steps)?,
            threshold: env_or("TOPONYM_THRESHOLD", em_defaults.threshold)?,
            mixture_weight: env_or("TOPONYM_MIXTURE_WEIGHT", em_defaults.mixture_weight)?,
            tile_smoothing: env_or("TOPONYM_TILE_SMOOTHING", em_defaults.tile_smoothing)?,
            background_prior: env_or::<BackgroundPrior>(
                "TOPONYM_BACKGROUND_PRIOR",
                em_defaults.background_prior,
            )?,
        };

        let config = Self {
            data_dir: env::var("TOPONYM_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            tiling,
            em,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check ranges that the parsers alone cannot.
    pub fn validate(&self) -> Result<()> {
        if let Tiling::Coordinates { tile_size } = self.tiling {
            if !(tile_size.is_finite() && tile_size > 0.0) {
                anyhow::bail!("TOPONYM_TILE_SIZE must be a positive number of degrees, got {tile_size}");
            }
        }
        self.em.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tiling() {
        assert_eq!(
            parse_tiling("Coordinates", 0.5).unwrap(),
            Tiling::Coordinates { tile_size: 0.5 }
        );
        assert_eq!(parse_tiling("city", 0.5).unwrap(), Tiling::City);
        assert!(parse_tiling("hexagons", 0.5).is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_tile_size() {
        let config = Config {
            tiling: Tiling::Coordinates { tile_size: 0.0 },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}

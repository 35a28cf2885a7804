use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Tolerance '{name}' is out of range: {value}")]
    InvalidTolerance { name: &'static str, value: f64 },
}

/// Numerical tolerances for every geometric decision made while building and
/// querying a hull.
///
/// Distances are absolute, in the units of the hull coordinates (composition
/// fractions and eV/atom). `plane_distance` and the simplex residual derived
/// from `affine_rank` are additionally scaled by the coordinate extent of the
/// point set when it exceeds one.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tolerances {
    /// A point is outside a facet (and the facet visible from it) only when its
    /// signed distance to the facet hyperplane exceeds this value.
    pub plane_distance: f64,
    /// Minimum residual distance for a point to extend the affine span of the
    /// initial simplex. Unscaled, it is also the minimum ratio of a facet's raw
    /// normal magnitude to the product of its edge lengths.
    pub affine_rank: f64,
    /// A facet belongs to the lower hull only when the energy component of its
    /// unit normal is below `-lower_normal`.
    pub lower_normal: f64,
    /// Slack allowed on barycentric weights when testing facet containment.
    pub barycentric: f64,
    /// Entries whose energy above hull does not exceed this value count as stable.
    pub stability: f64,
    /// Height above the highest formation energy at which a virtual ceiling
    /// point is placed when a hull of three or more elements is built for
    /// queries. Must be strictly positive.
    pub energy_ceiling_margin: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            plane_distance: 1e-10,
            affine_rank: 1e-12,
            lower_normal: 1e-9,
            barycentric: 1e-9,
            stability: 1e-6,
            energy_ceiling_margin: 1.0,
        }
    }
}

impl Tolerances {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("plane_distance", self.plane_distance),
            ("affine_rank", self.affine_rank),
            ("lower_normal", self.lower_normal),
            ("barycentric", self.barycentric),
            ("stability", self.stability),
            ("energy_ceiling_margin", self.energy_ceiling_margin),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidTolerance { name, value });
            }
        }
        if self.energy_ceiling_margin <= 0.0 {
            return Err(ConfigError::InvalidTolerance {
                name: "energy_ceiling_margin",
                value: self.energy_ceiling_margin,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HullConfig {
    pub tolerances: Tolerances,
}

impl HullConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::parse(&content, &path.to_string_lossy())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, "<string>")
    }

    fn parse(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: HullConfig = toml::from_str(content).map_err(|e| ConfigError::Toml {
            path: origin.to_string(),
            source: e,
        })?;
        config.tolerances.validate()?;
        Ok(config)
    }
}

#[derive(Default)]
pub struct HullConfigBuilder {
    plane_distance: Option<f64>,
    affine_rank: Option<f64>,
    lower_normal: Option<f64>,
    barycentric: Option<f64>,
    stability: Option<f64>,
    energy_ceiling_margin: Option<f64>,
}

impl HullConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plane_distance(mut self, value: f64) -> Self {
        self.plane_distance = Some(value);
        self
    }
    pub fn affine_rank(mut self, value: f64) -> Self {
        self.affine_rank = Some(value);
        self
    }
    pub fn lower_normal(mut self, value: f64) -> Self {
        self.lower_normal = Some(value);
        self
    }
    pub fn barycentric(mut self, value: f64) -> Self {
        self.barycentric = Some(value);
        self
    }
    pub fn stability(mut self, value: f64) -> Self {
        self.stability = Some(value);
        self
    }
    pub fn energy_ceiling_margin(mut self, value: f64) -> Self {
        self.energy_ceiling_margin = Some(value);
        self
    }

    /// Builds the configuration; unset tolerances keep their defaults.
    pub fn build(self) -> Result<HullConfig, ConfigError> {
        let defaults = Tolerances::default();
        let tolerances = Tolerances {
            plane_distance: self.plane_distance.unwrap_or(defaults.plane_distance),
            affine_rank: self.affine_rank.unwrap_or(defaults.affine_rank),
            lower_normal: self.lower_normal.unwrap_or(defaults.lower_normal),
            barycentric: self.barycentric.unwrap_or(defaults.barycentric),
            stability: self.stability.unwrap_or(defaults.stability),
            energy_ceiling_margin: self
                .energy_ceiling_margin
                .unwrap_or(defaults.energy_ceiling_margin),
        };
        tolerances.validate()?;
        Ok(HullConfig { tolerances })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn builder_without_overrides_yields_defaults() {
        let config = HullConfigBuilder::new().build().unwrap();
        assert_eq!(config, HullConfig::default());
    }

    #[test]
    fn builder_overrides_selected_tolerances() {
        let config = HullConfigBuilder::new()
            .plane_distance(1e-8)
            .stability(0.025)
            .build()
            .unwrap();
        assert_eq!(config.tolerances.plane_distance, 1e-8);
        assert_eq!(config.tolerances.stability, 0.025);
        assert_eq!(
            config.tolerances.barycentric,
            Tolerances::default().barycentric
        );
    }

    #[test]
    fn builder_rejects_negative_tolerance() {
        let result = HullConfigBuilder::new().barycentric(-1.0).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidTolerance {
                name: "barycentric",
                ..
            })
        ));
    }

    #[test]
    fn builder_rejects_non_finite_tolerance() {
        let result = HullConfigBuilder::new().lower_normal(f64::NAN).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidTolerance {
                name: "lower_normal",
                ..
            })
        ));
    }

    #[test]
    fn builder_rejects_zero_ceiling_margin() {
        let result = HullConfigBuilder::new().energy_ceiling_margin(0.0).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidTolerance {
                name: "energy_ceiling_margin",
                ..
            })
        ));
    }

    #[test]
    fn from_toml_str_fills_missing_fields_with_defaults() {
        let config = HullConfig::from_toml_str(
            r#"
            [tolerances]
            stability = 0.01
            "#,
        )
        .unwrap();
        assert_eq!(config.tolerances.stability, 0.01);
        assert_eq!(
            config.tolerances.plane_distance,
            Tolerances::default().plane_distance
        );
    }

    #[test]
    fn from_toml_str_rejects_unknown_fields() {
        let result = HullConfig::from_toml_str(
            r#"
            [tolerances]
            epsilon = 0.01
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Toml { .. })));
    }

    #[test]
    fn load_reads_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hull.toml");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "[tolerances]\nplane_distance = 1e-7").unwrap();

        let config = HullConfig::load(&path).unwrap();
        assert_eq!(config.tolerances.plane_distance, 1e-7);
    }

    #[test]
    fn load_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let result = HullConfig::load(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn load_rejects_invalid_tolerance_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hull.toml");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "[tolerances]\nstability = -0.5").unwrap();

        let result = HullConfig::load(&path);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidTolerance {
                name: "stability",
                ..
            })
        ));
    }
}

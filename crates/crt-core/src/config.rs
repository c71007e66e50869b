use std::path::{Path, PathBuf};

use serde::Deserialize;

// ---------------------------------------------------------------------------
// CrtConfig
// ---------------------------------------------------------------------------

/// The full set of effect parameters. Built once from defaults plus
/// overrides; replaced wholesale, never edited field by field by the filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrtConfig {
    pub barrel_distortion: f32,
    pub chromatic_aberration: f32,
    pub static_noise: f32,
    pub horizontal_tearing: f32,
    pub glow_bloom: f32,
    pub vertical_jitter: f32,
    pub retrace_lines: bool,
    pub dot_mask: bool,
    /// Accepted and carried, but no shader stage reads it.
    pub motion_blur: f32,
}

impl Default for CrtConfig {
    fn default() -> Self {
        Self {
            barrel_distortion: 0.01,
            chromatic_aberration: 0.002,
            static_noise: 0.1,
            horizontal_tearing: 0.0012,
            glow_bloom: 0.01,
            vertical_jitter: 0.1,
            retrace_lines: true,
            dot_mask: false,
            motion_blur: 0.0,
        }
    }
}

impl CrtConfig {
    /// Defaults with every `Some` field of `overrides` taking precedence.
    pub fn with_overrides(overrides: &CrtOverrides) -> Self {
        let d = Self::default();
        Self {
            barrel_distortion: overrides.barrel_distortion.unwrap_or(d.barrel_distortion),
            chromatic_aberration: overrides
                .chromatic_aberration
                .unwrap_or(d.chromatic_aberration),
            static_noise: overrides.static_noise.unwrap_or(d.static_noise),
            horizontal_tearing: overrides.horizontal_tearing.unwrap_or(d.horizontal_tearing),
            glow_bloom: overrides.glow_bloom.unwrap_or(d.glow_bloom),
            vertical_jitter: overrides.vertical_jitter.unwrap_or(d.vertical_jitter),
            retrace_lines: overrides.retrace_lines.unwrap_or(d.retrace_lines),
            dot_mask: overrides.dot_mask.unwrap_or(d.dot_mask),
            motion_blur: overrides.motion_blur.unwrap_or(d.motion_blur),
        }
    }

    pub fn get(&self, key: ConfigKey) -> ConfigValue {
        use ConfigValue::{Scalar, Toggle};
        match key {
            ConfigKey::BarrelDistortion => Scalar(self.barrel_distortion),
            ConfigKey::ChromaticAberration => Scalar(self.chromatic_aberration),
            ConfigKey::StaticNoise => Scalar(self.static_noise),
            ConfigKey::HorizontalTearing => Scalar(self.horizontal_tearing),
            ConfigKey::GlowBloom => Scalar(self.glow_bloom),
            ConfigKey::VerticalJitter => Scalar(self.vertical_jitter),
            ConfigKey::RetraceLines => Toggle(self.retrace_lines),
            ConfigKey::DotMask => Toggle(self.dot_mask),
            ConfigKey::MotionBlur => Scalar(self.motion_blur),
        }
    }

    /// Parse a flat TOML table of overrides and merge it into the defaults.
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let overrides: CrtOverrides = toml::from_str(src)?;
        overrides.validate()?;
        Ok(Self::with_overrides(&overrides))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&src)?;
        log::debug!("Loaded CRT config from {}: {:?}", path.display(), config);
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// CrtOverrides — caller-supplied partial configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrtOverrides {
    #[serde(alias = "barrelDistortion")]
    pub barrel_distortion: Option<f32>,
    #[serde(alias = "chromaticAberration")]
    pub chromatic_aberration: Option<f32>,
    #[serde(alias = "staticNoise")]
    pub static_noise: Option<f32>,
    #[serde(alias = "horizontalTearing")]
    pub horizontal_tearing: Option<f32>,
    #[serde(alias = "glowBloom")]
    pub glow_bloom: Option<f32>,
    #[serde(alias = "verticalJitter")]
    pub vertical_jitter: Option<f32>,
    #[serde(alias = "retraceLines")]
    pub retrace_lines: Option<bool>,
    #[serde(alias = "dotMask")]
    pub dot_mask: Option<bool>,
    #[serde(alias = "motionBlur")]
    pub motion_blur: Option<f32>,
}

impl CrtOverrides {
    pub fn get(&self, key: ConfigKey) -> Option<ConfigValue> {
        use ConfigValue::{Scalar, Toggle};
        match key {
            ConfigKey::BarrelDistortion => self.barrel_distortion.map(Scalar),
            ConfigKey::ChromaticAberration => self.chromatic_aberration.map(Scalar),
            ConfigKey::StaticNoise => self.static_noise.map(Scalar),
            ConfigKey::HorizontalTearing => self.horizontal_tearing.map(Scalar),
            ConfigKey::GlowBloom => self.glow_bloom.map(Scalar),
            ConfigKey::VerticalJitter => self.vertical_jitter.map(Scalar),
            ConfigKey::RetraceLines => self.retrace_lines.map(Toggle),
            ConfigKey::DotMask => self.dot_mask.map(Toggle),
            ConfigKey::MotionBlur => self.motion_blur.map(Scalar),
        }
    }

    /// Set one key. The value must be of the key's kind and, for scalars,
    /// finite.
    pub fn set(&mut self, key: ConfigKey, value: ConfigValue) -> Result<(), ConfigError> {
        match (key, value) {
            (ConfigKey::RetraceLines, ConfigValue::Toggle(b)) => self.retrace_lines = Some(b),
            (ConfigKey::DotMask, ConfigValue::Toggle(b)) => self.dot_mask = Some(b),
            (_, ConfigValue::Scalar(v)) => {
                let Some(slot) = self.scalar_slot(key) else {
                    return Err(ConfigError::TypeMismatch {
                        key: key.name(),
                        expected: "boolean",
                    });
                };
                if !v.is_finite() {
                    return Err(ConfigError::NonFinite { key: key.name() });
                }
                *slot = Some(v);
            }
            (_, ConfigValue::Toggle(_)) => {
                return Err(ConfigError::TypeMismatch {
                    key: key.name(),
                    expected: "number",
                })
            }
        }
        Ok(())
    }

    fn scalar_slot(&mut self, key: ConfigKey) -> Option<&mut Option<f32>> {
        match key {
            ConfigKey::BarrelDistortion => Some(&mut self.barrel_distortion),
            ConfigKey::ChromaticAberration => Some(&mut self.chromatic_aberration),
            ConfigKey::StaticNoise => Some(&mut self.static_noise),
            ConfigKey::HorizontalTearing => Some(&mut self.horizontal_tearing),
            ConfigKey::GlowBloom => Some(&mut self.glow_bloom),
            ConfigKey::VerticalJitter => Some(&mut self.vertical_jitter),
            ConfigKey::MotionBlur => Some(&mut self.motion_blur),
            ConfigKey::RetraceLines | ConfigKey::DotMask => None,
        }
    }

    /// Keys carrying a value.
    pub fn keys(&self) -> impl Iterator<Item = ConfigKey> + '_ {
        ConfigKey::ALL.into_iter().filter(|&k| self.get(k).is_some())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for key in self.keys() {
            if let Some(ConfigValue::Scalar(v)) = self.get(key) {
                if !v.is_finite() {
                    return Err(ConfigError::NonFinite { key: key.name() });
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Keys and values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    BarrelDistortion,
    ChromaticAberration,
    StaticNoise,
    HorizontalTearing,
    GlowBloom,
    VerticalJitter,
    RetraceLines,
    DotMask,
    MotionBlur,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 9] = [
        ConfigKey::BarrelDistortion,
        ConfigKey::ChromaticAberration,
        ConfigKey::StaticNoise,
        ConfigKey::HorizontalTearing,
        ConfigKey::GlowBloom,
        ConfigKey::VerticalJitter,
        ConfigKey::RetraceLines,
        ConfigKey::DotMask,
        ConfigKey::MotionBlur,
    ];

    /// The key as written in a config file.
    pub fn name(self) -> &'static str {
        match self {
            ConfigKey::BarrelDistortion => "barrel_distortion",
            ConfigKey::ChromaticAberration => "chromatic_aberration",
            ConfigKey::StaticNoise => "static_noise",
            ConfigKey::HorizontalTearing => "horizontal_tearing",
            ConfigKey::GlowBloom => "glow_bloom",
            ConfigKey::VerticalJitter => "vertical_jitter",
            ConfigKey::RetraceLines => "retrace_lines",
            ConfigKey::DotMask => "dot_mask",
            ConfigKey::MotionBlur => "motion_blur",
        }
    }

    pub fn is_toggle(self) -> bool {
        matches!(self, ConfigKey::RetraceLines | ConfigKey::DotMask)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigValue {
    Scalar(f32),
    Toggle(bool),
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("`{key}` expects a {expected}")]
    TypeMismatch {
        key: &'static str,
        expected: &'static str,
    },
    #[error("`{key}` must be a finite number")]
    NonFinite { key: &'static str },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = CrtConfig::default();
        assert_eq!(c.barrel_distortion, 0.01);
        assert_eq!(c.chromatic_aberration, 0.002);
        assert_eq!(c.static_noise, 0.1);
        assert_eq!(c.horizontal_tearing, 0.0012);
        assert_eq!(c.glow_bloom, 0.01);
        assert_eq!(c.vertical_jitter, 0.1);
        assert!(c.retrace_lines);
        assert!(!c.dot_mask);
        assert_eq!(c.motion_blur, 0.0);
    }

    #[test]
    fn empty_overrides_yield_defaults() {
        assert_eq!(
            CrtConfig::with_overrides(&CrtOverrides::default()),
            CrtConfig::default()
        );
    }

    #[test]
    fn override_wins_and_unset_keys_keep_defaults() {
        let mut o = CrtOverrides::default();
        o.set(ConfigKey::StaticNoise, ConfigValue::Scalar(0.5)).unwrap();
        o.set(ConfigKey::DotMask, ConfigValue::Toggle(true)).unwrap();
        let merged = CrtConfig::with_overrides(&o);
        let defaults = CrtConfig::default();

        for key in ConfigKey::ALL {
            match o.get(key) {
                Some(v) => assert_eq!(merged.get(key), v, "{}", key.name()),
                None => assert_eq!(merged.get(key), defaults.get(key), "{}", key.name()),
            }
        }
        let set: Vec<_> = o.keys().collect();
        assert_eq!(set, vec![ConfigKey::StaticNoise, ConfigKey::DotMask]);
    }

    #[test]
    fn every_key_can_be_overridden() {
        for key in ConfigKey::ALL {
            let value = if key.is_toggle() {
                ConfigValue::Toggle(!matches!(
                    CrtConfig::default().get(key),
                    ConfigValue::Toggle(true)
                ))
            } else {
                ConfigValue::Scalar(0.75)
            };
            let mut o = CrtOverrides::default();
            o.set(key, value).unwrap();
            assert_eq!(CrtConfig::with_overrides(&o).get(key), value, "{}", key.name());
        }
    }

    #[test]
    fn set_rejects_wrong_kind() {
        let mut o = CrtOverrides::default();
        let err = o
            .set(ConfigKey::RetraceLines, ConfigValue::Scalar(1.0))
            .unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { key: "retrace_lines", .. }));
        let err = o
            .set(ConfigKey::GlowBloom, ConfigValue::Toggle(true))
            .unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { key: "glow_bloom", .. }));
        assert_eq!(o, CrtOverrides::default());
    }

    #[test]
    fn set_rejects_non_finite() {
        let mut o = CrtOverrides::default();
        let err = o
            .set(ConfigKey::VerticalJitter, ConfigValue::Scalar(f32::NAN))
            .unwrap_err();
        assert!(matches!(err, ConfigError::NonFinite { key: "vertical_jitter" }));
    }

    #[test]
    fn key_names_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for key in ConfigKey::ALL {
            assert!(seen.insert(key.name()), "duplicate key name {}", key.name());
        }
    }

    // --- TOML ----------------------------------------------------------------

    #[test]
    fn toml_overrides_merge_into_defaults() {
        let c = CrtConfig::from_toml_str(
            r#"
            barrel_distortion = 0.05
            retrace_lines = false
            "#,
        )
        .unwrap();
        assert_eq!(c.barrel_distortion, 0.05);
        assert!(!c.retrace_lines);
        assert_eq!(c.static_noise, CrtConfig::default().static_noise);
    }

    #[test]
    fn toml_accepts_camel_case_names() {
        let c = CrtConfig::from_toml_str("dotMask = true\nglowBloom = 0.3").unwrap();
        assert!(c.dot_mask);
        assert_eq!(c.glow_bloom, 0.3);
    }

    #[test]
    fn empty_toml_is_defaults() {
        assert_eq!(CrtConfig::from_toml_str("").unwrap(), CrtConfig::default());
    }

    #[test]
    fn toml_rejects_unknown_keys() {
        let err = CrtConfig::from_toml_str("curvature = 1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
    }

    #[test]
    fn toml_rejects_wrong_types() {
        assert!(CrtConfig::from_toml_str("dot_mask = 1.0").is_err());
        assert!(CrtConfig::from_toml_str("static_noise = \"lots\"").is_err());
    }

    #[test]
    fn toml_rejects_non_finite() {
        let err = CrtConfig::from_toml_str("static_noise = nan").unwrap_err();
        assert!(matches!(err, ConfigError::NonFinite { key: "static_noise" }));
    }

    #[test]
    fn load_reports_missing_file_path() {
        let err = CrtConfig::load("/definitely/not/here/crt.toml").unwrap_err();
        match err {
            ConfigError::Io { path, .. } => assert!(path.ends_with("crt.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_reads_file_from_disk() {
        let path = std::env::temp_dir().join(format!("crt-config-{}.toml", std::process::id()));
        std::fs::write(&path, "horizontal_tearing = 0.01\n").unwrap();
        let c = CrtConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(c.horizontal_tearing, 0.01);
    }
}

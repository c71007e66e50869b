use crate::CrtConfig;

/// Named looks, each a full `CrtConfig` built on top of the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Standard,
    Clean,
    Arcade,
    BrokenSignal,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::Standard,
        Preset::Clean,
        Preset::Arcade,
        Preset::BrokenSignal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Standard => "Standard",
            Preset::Clean => "Clean",
            Preset::Arcade => "Arcade",
            Preset::BrokenSignal => "Broken Signal",
        }
    }

    pub fn config(self) -> CrtConfig {
        let base = CrtConfig::default();
        match self {
            Preset::Standard => base,
            // Every stage degenerate: only the tearing multiply remains.
            Preset::Clean => CrtConfig {
                barrel_distortion: 0.0,
                chromatic_aberration: 0.0,
                static_noise: 0.0,
                horizontal_tearing: 0.0,
                glow_bloom: 0.0,
                vertical_jitter: 0.0,
                retrace_lines: false,
                dot_mask: false,
                motion_blur: 0.0,
            },
            Preset::Arcade => CrtConfig {
                barrel_distortion: 0.08,
                chromatic_aberration: 0.001,
                static_noise: 0.04,
                glow_bloom: 0.25,
                vertical_jitter: 0.0,
                dot_mask: true,
                ..base
            },
            Preset::BrokenSignal => CrtConfig {
                chromatic_aberration: 0.006,
                static_noise: 0.35,
                horizontal_tearing: 0.01,
                vertical_jitter: 0.3,
                ..base
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_contains_four_presets() {
        assert_eq!(Preset::ALL.len(), 4);
    }

    #[test]
    fn all_names_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for p in Preset::ALL {
            assert!(!p.name().is_empty(), "{p:?} has empty name");
            assert!(seen.insert(p.name()), "duplicate preset name: {}", p.name());
        }
    }

    #[test]
    fn standard_is_the_default_config() {
        assert_eq!(Preset::Standard.config(), CrtConfig::default());
    }

    #[test]
    fn clean_turns_every_stage_off() {
        let c = Preset::Clean.config();
        assert_eq!(c.barrel_distortion, 0.0);
        assert_eq!(c.chromatic_aberration, 0.0);
        assert_eq!(c.static_noise, 0.0);
        assert_eq!(c.horizontal_tearing, 0.0);
        assert_eq!(c.glow_bloom, 0.0);
        assert_eq!(c.vertical_jitter, 0.0);
        assert!(!c.retrace_lines);
        assert!(!c.dot_mask);
    }

    #[test]
    fn arcade_enables_dot_mask() {
        assert!(Preset::Arcade.config().dot_mask);
    }

    #[test]
    fn broken_signal_is_noisier_than_standard() {
        let broken = Preset::BrokenSignal.config();
        let standard = Preset::Standard.config();
        assert!(broken.static_noise > standard.static_noise);
        assert!(broken.horizontal_tearing > standard.horizontal_tearing);
        assert!(broken.vertical_jitter > standard.vertical_jitter);
    }

    #[test]
    fn presets_are_distinct() {
        for (i, a) in Preset::ALL.iter().enumerate() {
            for b in &Preset::ALL[i + 1..] {
                assert_ne!(a.config(), b.config(), "{a:?} and {b:?} collide");
            }
        }
    }
}

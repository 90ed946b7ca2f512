//! Session configuration, loaded from TOML
//!
//! Every field has a default, so a missing file or a partial one is fine:
//!
//! ```toml
//! [assets]
//! card_image = "assets/card.png"
//! model = "assets/card.glb"
//!
//! [timing]
//! tear_to_slide_ms = 1000
//!
//! [card.face]
//! kind = "uv_split"
//! top_ratio = 0.06
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tearline_card::CardConfig;
use tearline_core::{Result, TearlineError};
use tearline_overlay::GrailCard;
use tearline_particles::SunburstConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub assets: AssetConfig,
    pub video: VideoConfig,
    pub timing: TimingConfig,
    pub grail: GrailConfig,
    pub card: CardConfig,
    /// Raw table, read leniently by [`SunburstConfig::from_toml`]
    pub sunburst: toml::Table,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub card_image: PathBuf,
    pub model: PathBuf,
    pub logo: Option<PathBuf>,
    pub flip_front: Option<PathBuf>,
    pub flip_back: Option<PathBuf>,
    pub grail_image: Option<PathBuf>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            card_image: PathBuf::from("assets/card.png"),
            model: PathBuf::from("assets/card.glb"),
            logo: None,
            flip_front: None,
            flip_back: None,
            grail_image: None,
        }
    }
}

impl AssetConfig {
    /// Optional images that exist in the config
    pub fn optional_images(&self) -> Vec<PathBuf> {
        [&self.logo, &self.flip_front, &self.flip_back, &self.grail_image]
            .into_iter()
            .flatten()
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Length of the synthetic intro video in seconds
    pub duration_secs: f64,
    pub playback_rate: f64,
    pub autoplay_allowed: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            duration_secs: 10.0,
            playback_rate: 1.2,
            autoplay_allowed: true,
        }
    }
}

/// Delays between choreography steps, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub show_card_ms: f64,
    pub appear_ms: f64,
    pub tear_to_slide_ms: f64,
    pub intro_spin_ms: f64,
    pub pokedex_reveal_ms: f64,
    pub entrance_ms: f64,
    pub flip_guard_ms: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            show_card_ms: 1000.0,
            appear_ms: 1500.0,
            tear_to_slide_ms: 1000.0,
            intro_spin_ms: 1500.0,
            pokedex_reveal_ms: 1500.0,
            entrance_ms: 1500.0,
            flip_guard_ms: 500.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrailConfig {
    /// Seconds before the video ends at which the grail card appears
    pub start_before_end: f64,
    #[serde(flatten)]
    pub card: GrailCard,
}

impl Default for GrailConfig {
    fn default() -> Self {
        Self {
            start_before_end: 1.4,
            card: GrailCard::default(),
        }
    }
}

impl SessionConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;
        config.resolve_relative_to(path.parent().unwrap_or(Path::new(".")));
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.video.duration_secs <= 0.0 {
            return Err(TearlineError::Config(
                "video.duration_secs must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.card_top_ratio()) {
            return Err(TearlineError::Config(
                "card.face.top_ratio must be within [0, 1]".into(),
            ));
        }
        Ok(())
    }

    fn card_top_ratio(&self) -> f32 {
        match self.card.face {
            tearline_card::FaceVariant::UvSplit { top_ratio } => top_ratio,
            _ => 0.0,
        }
    }

    /// Asset paths in a config file are relative to the file itself
    fn resolve_relative_to(&mut self, base: &Path) {
        let fix = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        fix(&mut self.assets.card_image);
        fix(&mut self.assets.model);
        for p in [
            &mut self.assets.logo,
            &mut self.assets.flip_front,
            &mut self.assets.flip_back,
            &mut self.assets.grail_image,
        ]
        .into_iter()
        .flatten()
        {
            fix(p);
        }
    }

    pub fn sunburst(&self) -> SunburstConfig {
        SunburstConfig::from_toml(&self.sunburst)
    }

    /// Card settings with the shared appear duration applied
    pub fn card_config(&self) -> CardConfig {
        CardConfig {
            appear_ms: self.timing.appear_ms,
            ..self.card.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = SessionConfig::parse("").unwrap();
        assert_eq!(config.timing.show_card_ms, 1000.0);
        assert_eq!(config.video.playback_rate, 1.2);
        assert_eq!(config.grail.start_before_end, 1.4);
        assert_eq!(config.grail.card.appearance, 1.4);
        assert_eq!(config.sunburst().pool_size, 520);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = SessionConfig::parse(
            r#"
            [timing]
            tear_to_slide_ms = 800

            [grail]
            appearance = 2.0

            [card.face]
            kind = "uv_split"
            top_ratio = 0.06

            [sunburst]
            pool_size = 128
            "#,
        )
        .unwrap();
        assert_eq!(config.timing.tear_to_slide_ms, 800.0);
        assert_eq!(config.timing.pokedex_reveal_ms, 1500.0);
        assert_eq!(config.grail.card.appearance, 2.0);
        assert_eq!(config.grail.start_before_end, 1.4);
        assert!((config.card_top_ratio() - 0.06).abs() < 1e-6);
        assert_eq!(config.sunburst().pool_size, 128);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = SessionConfig::parse("[video]\nduration_secs = 0").unwrap_err();
        assert!(matches!(err, TearlineError::Config(_)));
        let err = SessionConfig::parse("[timing]\nshow_card_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, TearlineError::TomlParse(_)));
    }

    #[test]
    fn relative_asset_paths_follow_config_file() {
        let mut config = SessionConfig::default();
        config.assets.logo = Some(PathBuf::from("logo.png"));
        config.resolve_relative_to(Path::new("/srv/pack"));
        assert_eq!(config.assets.model, PathBuf::from("/srv/pack/assets/card.glb"));
        assert_eq!(config.assets.logo, Some(PathBuf::from("/srv/pack/logo.png")));
    }
}

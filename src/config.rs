//! Optional YAML profile with default codec settings.
//!
//! ```yaml
//! image:
//!   predictor: jpeg-ls
//! audio:
//!   block_size: 1024
//!   adaptive: true
//! video:
//!   block_size: 16
//!   lossy: true
//!   quantization: 4
//! ```
//!
//! Every field is optional. Command-line flags take precedence over the
//! profile, which takes precedence over the library defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use grcodec::codec::audio::AudioConfig;
use grcodec::codec::video::{LossyParams, VideoConfig};
use grcodec::predict::Predictor;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Profile {
    pub image: ImageProfile,
    pub audio: AudioProfile,
    pub video: VideoProfile,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ImageProfile {
    pub predictor: Option<String>,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AudioProfile {
    pub block_size: Option<usize>,
    pub initial_m: Option<u32>,
    pub quantization: Option<u8>,
    pub adaptive: Option<bool>,
    pub lossy: Option<bool>,
    pub strict: Option<bool>,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct VideoProfile {
    pub block_size: Option<u8>,
    pub i_frame_interval: Option<u8>,
    pub search_range: Option<u8>,
    pub fps: Option<u16>,
    pub lossy: Option<bool>,
    pub quantization: Option<u8>,
    pub target_bitrate: Option<u32>,
    pub intra_predictor: Option<String>,
}

impl Profile {
    /// Loads the profile at `path`, or the empty profile when none is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid profile {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(text)?)
    }
}

fn parse_predictor(name: Option<&str>) -> Result<Option<Predictor>> {
    name.map(|n| n.parse::<Predictor>().map_err(anyhow::Error::from))
        .transpose()
}

impl ImageProfile {
    pub fn predictor(&self) -> Result<Predictor> {
        Ok(parse_predictor(self.predictor.as_deref())?.unwrap_or_default())
    }
}

impl AudioProfile {
    /// Library defaults with the profile applied. The strict profile starts
    /// from [`AudioConfig::strict`].
    pub fn config(&self) -> AudioConfig {
        let mut config = if self.strict.unwrap_or(false) {
            AudioConfig::strict()
        } else {
            AudioConfig::default()
        };
        if let Some(n) = self.block_size {
            config.block_size = n;
        }
        if let Some(m) = self.initial_m {
            config.initial_m = m;
        }
        if let Some(q) = self.quantization {
            config.quantization_level = q;
        }
        if let Some(adaptive) = self.adaptive {
            config.adaptive = adaptive;
        }
        if let Some(lossy) = self.lossy {
            config.lossy = lossy;
        }
        config
    }
}

impl VideoProfile {
    pub fn config(&self) -> Result<VideoConfig> {
        let mut config = VideoConfig::default();
        if let Some(n) = self.block_size {
            config.block_size = n;
        }
        if let Some(k) = self.i_frame_interval {
            config.i_frame_interval = k;
        }
        if let Some(s) = self.search_range {
            config.search_range = s;
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        let lossy = self.lossy.unwrap_or(false)
            || self.quantization.is_some()
            || self.target_bitrate.is_some();
        if lossy {
            let defaults = LossyParams::default();
            config.lossy = Some(LossyParams {
                quantization_level: self.quantization.unwrap_or(defaults.quantization_level),
                target_bitrate: self.target_bitrate.unwrap_or(defaults.target_bitrate),
            });
        }
        config.intra_predictor = parse_predictor(self.intra_predictor.as_deref())?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_profile_uses_library_defaults() {
        let profile = Profile::parse("").unwrap();
        assert_eq!(profile, Profile::default());
        assert_eq!(profile.audio.config(), AudioConfig::default());
        assert_eq!(profile.video.config().unwrap(), VideoConfig::default());
        assert_eq!(profile.image.predictor().unwrap(), Predictor::JpegLs);
    }

    #[test]
    fn sections_are_independent() {
        let profile = Profile::parse(
            "image:\n  predictor: pl\nvideo:\n  search_range: 4\n  quantization: 3\n",
        )
        .unwrap();
        assert_eq!(profile.image.predictor().unwrap(), Predictor::Left);
        assert_eq!(profile.audio, AudioProfile::default());

        let video = profile.video.config().unwrap();
        assert_eq!(video.search_range, 4);
        assert_eq!(video.block_size, 16);
        assert_eq!(
            video.lossy,
            Some(LossyParams {
                quantization_level: 3,
                target_bitrate: 0
            })
        );
    }

    #[test]
    fn strict_audio_profile() {
        let profile = Profile::parse("audio:\n  strict: true\n  block_size: 256\n").unwrap();
        let config = profile.audio.config();
        assert!(config.is_strict());
        assert!(config.adaptive);
        assert_eq!(config.block_size, 256);
    }

    #[test]
    fn rejects_unknown_fields_and_predictors() {
        assert!(Profile::parse("audio:\n  blocksize: 12\n").is_err());
        let profile = Profile::parse("image:\n  predictor: median\n").unwrap();
        assert!(profile.image.predictor().is_err());
    }
}

//! Runtime configuration.
//!
//! Every field has a default, so a settings file only needs the values it
//! changes:
//!
//! ```json
//! { "width": 1920, "height": 1080, "shadow_bias": 0.002 }
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Holds `shaders/`, meshes and textures.
    pub asset_dir: PathBuf,
    /// Linear RGBA.
    pub clear_colour: [f64; 4],
    pub shadow_map_size: u32,
    pub shadow_bias: f32,
    /// Change per key press.
    pub shadow_bias_step: f32,
    /// Radians per pixel of pointer movement.
    pub camera_angular_speed: f32,
    /// Distance per scroll line.
    pub camera_zoom_speed: f32,
    pub camera_distance: f32,
    /// Radians per second.
    pub light_orbit_speed: f32,
    pub particle_seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: "Shading Sandbox".to_owned(),
            width: 1280,
            height: 720,
            asset_dir: PathBuf::from("assets"),
            clear_colour: [0.1, 0.1, 0.12, 1.0],
            shadow_map_size: 2048,
            shadow_bias: 0.005,
            shadow_bias_step: 0.0005,
            camera_angular_speed: 0.005,
            camera_zoom_speed: 0.02,
            camera_distance: 1.0,
            light_orbit_speed: 0.6,
            particle_seed: 7,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json).context("parsing settings")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("in {}", path.display()))
    }

    /// `path` if given, the defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn shader_dir(&self) -> PathBuf {
        self.asset_dir.join("shaders")
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.shadow_map_size > 0, "shadow_map_size must be positive");
        anyhow::ensure!(self.shadow_bias >= 0.0, "shadow_bias must not be negative");
        anyhow::ensure!(self.camera_distance > 0.0, "camera_distance must be positive");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_keep_the_defaults() {
        let settings = Settings::from_json(r#"{ "width": 1920, "shadow_bias": 0.002 }"#).unwrap();
        assert_eq!(settings.width, 1920);
        assert_eq!(settings.shadow_bias, 0.002);
        assert_eq!(settings.height, Settings::default().height);
        assert_eq!(settings.shadow_map_size, 2048);
    }

    #[test]
    fn malformed_files_are_errors() {
        assert!(Settings::from_json("{ width: }").is_err());
        assert!(Settings::from_json(r#"{ "shadow_map_size": 0 }"#).is_err());
    }

    #[test]
    fn no_path_means_defaults() {
        assert_eq!(Settings::load(None).unwrap(), Settings::default());
    }

    #[test]
    fn unreadable_file_is_an_error() {
        assert!(Settings::load(Some(Path::new("/definitely/not/here.json"))).is_err());
    }

    #[test]
    fn shaders_live_under_the_asset_dir() {
        assert_eq!(Settings::default().shader_dir(), PathBuf::from("assets/shaders"));
    }
}

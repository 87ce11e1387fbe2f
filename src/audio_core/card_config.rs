//! Per-sound-card configuration.
//!
//! A card config is an INI file named after the card, found in a config
//! directory. Each volume control gets its own section:
//!
//! ```ini
//! [Speaker]
//! volume_curve = simple_step
//! max_volume = -300
//! volume_step = 75
//!
//! [Headphone]
//! volume_curve = explicit
//! dB_at_0 = -6000
//! ; ... dB_at_1 through dB_at_100
//! ```
//!
//! A missing file, a missing section or an unknown curve type is not an
//! error: lookups return `None` and the caller falls back to the default
//! curve.

use std::fs;
use std::path::{Path, PathBuf};

use configparser::ini::Ini;

use crate::audio_core::constants::{
    CONFIG_DEFAULT_DB_AT, CONFIG_DEFAULT_MAX_VOLUME, CONFIG_DEFAULT_VOLUME_STEP, NUM_VOLUME_STEPS,
};
use crate::audio_core::errors::CardConfigError;
use crate::audio_core::volume_curve::VolumeCurve;

const CURVE_TYPE_KEY: &str = "volume_curve";
const CURVE_SIMPLE_STEP: &str = "simple_step";
const CURVE_EXPLICIT: &str = "explicit";

/// Parsed configuration for one sound card.
#[derive(Debug, Clone)]
pub struct CardConfig {
    ini: Ini,
    path: Option<PathBuf>,
}

impl CardConfig {
    /// Looks up `<config_dir>/<card_name>` and parses it.
    ///
    /// Returns `None` when the file is absent or unreadable, which callers
    /// treat as "no card-specific configuration".
    pub fn create(config_dir: &Path, card_name: &str) -> Option<Self> {
        let path = config_dir.join(card_name);
        if !path.is_file() {
            log::debug!("no card config for {card_name} at {}", path.display());
            return None;
        }

        match Self::load(&path) {
            Ok(config) => {
                log::info!("loaded card config {}", path.display());
                Some(config)
            }
            Err(err) => {
                log::warn!("ignoring card config {}: {err}", path.display());
                None
            }
        }
    }

    /// Reads and parses a config file.
    pub fn load(path: &Path) -> Result<Self, CardConfigError> {
        let contents = fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parses config contents held in memory.
    pub fn parse(contents: &str) -> Result<Self, CardConfigError> {
        let mut ini = Ini::new();
        ini.read(contents.to_owned())
            .map_err(CardConfigError::Parse)?;
        Ok(Self { ini, path: None })
    }

    /// File this config was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Builds the volume curve configured for `control`.
    ///
    /// Returns `None` when the control has no `volume_curve` key or names a
    /// curve type other than `simple_step` or `explicit`.
    pub fn volume_curve_for_control(&self, control: &str) -> Option<VolumeCurve> {
        let curve_type = self.ini.get(control, CURVE_TYPE_KEY)?;

        match curve_type.trim() {
            CURVE_SIMPLE_STEP => {
                let max_volume = self.read_int(control, "max_volume", CONFIG_DEFAULT_MAX_VOLUME);
                let volume_step =
                    self.read_int(control, "volume_step", CONFIG_DEFAULT_VOLUME_STEP);
                Some(VolumeCurve::create_simple_step(max_volume, volume_step))
            }
            CURVE_EXPLICIT => {
                let values: [i64; NUM_VOLUME_STEPS] = std::array::from_fn(|i| {
                    self.read_int(control, &format!("dB_at_{i}"), CONFIG_DEFAULT_DB_AT)
                });
                Some(VolumeCurve::create_explicit(&values))
            }
            other => {
                log::debug!("unknown volume curve type {other:?} for control {control}");
                None
            }
        }
    }

    fn read_int(&self, control: &str, key: &str, default: i64) -> i64 {
        match self.ini.getint(control, key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(err) => {
                log::warn!("{control}:{key} is not an integer ({err}), using {default}");
                default
            }
        }
    }
}

/// Looks up the curve for `control` in an optional card config.
///
/// A missing config yields `None`, the same as a missing control.
pub fn volume_curve_for_control(
    config: Option<&CardConfig>,
    control: &str,
) -> Option<VolumeCurve> {
    config?.volume_curve_for_control(control)
}

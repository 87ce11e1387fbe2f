//! Volume curve selection and softvol state for an output node.
//!
//! A node (speaker, headphone jack, ...) uses its own configured curve when
//! the card config has one under one of the node's names, and the card's
//! default curve otherwise.

use crate::audio_core::card_config::{CardConfig, volume_curve_for_control};
use crate::audio_core::constants::{DEFAULT_CONTROL_NAME, MAX_VOLUME};
use crate::audio_core::errors::SoftvolError;
use crate::audio_core::softvol::SoftvolTable;
use crate::audio_core::volume_curve::VolumeCurve;

/// The card-wide curve: the `Default` control's curve, or the system
/// default when the card does not configure one.
pub fn default_curve_for_card(config: Option<&CardConfig>) -> VolumeCurve {
    volume_curve_for_control(config, DEFAULT_CONTROL_NAME).unwrap_or_default()
}

/// The first curve configured under any of `names`, tried in order.
pub fn curve_for_node(config: Option<&CardConfig>, names: &[&str]) -> Option<VolumeCurve> {
    names
        .iter()
        .find_map(|name| volume_curve_for_control(config, name))
}

/// A node's resolved curve and its softvol table.
#[derive(Debug, Clone)]
pub struct OutputNodeVolume {
    curve: VolumeCurve,
    scalers: SoftvolTable,
    software_volume_needed: bool,
}

impl OutputNodeVolume {
    /// Resolves the curve for a node known by `names` and builds its table.
    pub fn new(
        config: Option<&CardConfig>,
        names: &[&str],
        software_volume_needed: bool,
    ) -> Result<Self, SoftvolError> {
        let curve =
            curve_for_node(config, names).unwrap_or_else(|| default_curve_for_card(config));
        Self::with_curve(curve, software_volume_needed)
    }

    pub fn with_curve(curve: VolumeCurve, software_volume_needed: bool) -> Result<Self, SoftvolError> {
        let scalers = SoftvolTable::from_curve(&curve)?;
        Ok(Self {
            curve,
            scalers,
            software_volume_needed,
        })
    }

    /// Replaces the curve, rebuilding the table.
    pub fn rebuild(&mut self, curve: VolumeCurve) -> Result<(), SoftvolError> {
        self.scalers = SoftvolTable::from_curve(&curve)?;
        self.curve = curve;
        Ok(())
    }

    pub fn curve(&self) -> &VolumeCurve {
        &self.curve
    }

    pub fn scalers(&self) -> &SoftvolTable {
        &self.scalers
    }

    pub fn software_volume_needed(&self) -> bool {
        self.software_volume_needed
    }

    /// `(min, max)` in centi-dB: the curve at index 1 and at full volume.
    pub fn volume_limits(&self) -> (i64, i64) {
        (self.curve.dbfs(1), self.curve.dbfs(MAX_VOLUME))
    }

    /// Level for the hardware mixer. With software volume the mixer stays at
    /// full volume and attenuation happens in [`softvol_scaler`](Self::softvol_scaler).
    pub fn mixer_dbfs(&self, system_volume: usize) -> i64 {
        if self.software_volume_needed {
            self.curve.dbfs(MAX_VOLUME)
        } else {
            self.curve.dbfs(system_volume)
        }
    }

    /// Gain to apply in software; unity when the hardware mixer attenuates.
    pub fn softvol_scaler(&self, system_volume: usize) -> f32 {
        if self.software_volume_needed {
            self.scalers.scaler(system_volume)
        } else {
            1.0
        }
    }
}

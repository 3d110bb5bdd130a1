//! Energy-binned flux reweighting tables
//!
//! These tables are produced elsewhere by the beam group as ratios of a tuned
//! flux prediction to the nominal one used at generation time. We only ever
//! look values up in them.

use crate::{config::Flavor, error::ConfigError, histogram::Binning};

use serde::Deserialize;

use std::{collections::BTreeMap, fs, path::Path};

/// Multiplicative reweighting factor as a function of true neutrino energy
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "FluxTuneData")]
pub struct FluxTune {
    /// Energy axis of the table
    binning: Binning,

    /// Factor associated with each energy bin
    ratios: Box<[f64]>,
}
//
impl FluxTune {
    /// Build a table from its energy range and per-bin factors
    pub fn new(low: f64, high: f64, ratios: Vec<f64>) -> Result<Self, ConfigError> {
        let binning = Binning::new(ratios.len(), low, high);
        if !binning.is_valid() {
            return Err(ConfigError::InvalidTable(format!(
                "reweighting table needs a non-empty range and at least one bin, got \
                 {} bins over [{low}, {high})",
                ratios.len()
            )));
        }
        if let Some(bad) = ratios.iter().find(|r| !(**r >= 0.) || !r.is_finite()) {
            return Err(ConfigError::InvalidTable(format!(
                "reweighting factors must be finite and non-negative, found {bad}"
            )));
        }
        Ok(Self {
            binning,
            ratios: ratios.into_boxed_slice(),
        })
    }

    /// Energy axis of the table
    pub fn binning(&self) -> Binning {
        self.binning
    }

    /// Reweighting factor for a given true neutrino energy
    ///
    /// Energies outside of the table use the closest edge bin.
    ///
    pub fn factor(&self, energy: f64) -> f64 {
        self.ratios[self.binning.find_clamped_bin(energy)]
    }
}

/// On-disk representation of a reweighting table
#[derive(Deserialize)]
struct FluxTuneData {
    low: f64,
    high: f64,
    ratios: Vec<f64>,
}

impl TryFrom<FluxTuneData> for FluxTune {
    type Error = ConfigError;

    fn try_from(data: FluxTuneData) -> Result<Self, Self::Error> {
        Self::new(data.low, data.high, data.ratios)
    }
}

/// Reweighting tables of one run period, keyed by flavor
pub type RunFluxTunes = BTreeMap<Flavor, FluxTune>;

/// Load the reweighting tables of one run period from a JSON file
///
/// The file maps flavor tags to `{ "low", "high", "ratios" }` objects.
/// Flavors without a table are simply not reweighted.
///
pub fn load_run_tunes(path: &Path) -> Result<RunFluxTunes, ConfigError> {
    let failure = |reason: String| ConfigError::FluxTune {
        path: path.to_owned(),
        reason,
    };
    let text = fs::read_to_string(path).map_err(|e| failure(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| failure(e.to_string()))
}

//! Mechanism for loading and sharing the analysis configuration
//!
//! The raw numbers (exposures, cut thresholds, cross-section normalizations,
//! which run periods belong to which analysis mode...) live in a JSON document
//! so that they can be reviewed and versioned independently of the code. A
//! default copy is embedded into the binary. For a given analysis mode, these
//! tables are resolved into an immutable [`RunConfiguration`].

use crate::{
    error::ConfigError,
    fluxtune::{self, RunFluxTunes},
    linalg::Direction,
    oscillation::Oscillation,
    Result,
};

use eyre::WrapErr;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use std::{
    collections::BTreeMap,
    fmt::{self, Display},
    fs,
    path::Path,
    str::FromStr,
};

/// Analysis tables shipped with the program
const BUILTIN_TABLES: &str = include_str!("../data/analysis.json");

/// Identifier of an analysis mode (flux version, tuning and run range)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisMode(pub u8);
//
impl Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a run period, like "4" or "9b"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunPeriod(String);
//
impl RunPeriod {
    /// Identifier as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
//
impl From<&str> for RunPeriod {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}
//
impl Display for RunPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Neutrino flavor of a simulated sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Flavor {
    /// Muon neutrinos
    #[serde(rename = "numu")]
    Numu,
    /// Electron neutrinos
    #[serde(rename = "nue")]
    Nue,
    /// Muon antineutrinos
    #[serde(rename = "numubar")]
    Numubar,
    /// Electron antineutrinos
    #[serde(rename = "nuebar")]
    Nuebar,
    /// Electron neutrinos generated with the muon neutrino flux (appearance)
    #[serde(rename = "nue_x_numuflx")]
    NueXNumuflx,
}
//
impl Flavor {
    /// Tag used in file names and tables
    pub fn tag(self) -> &'static str {
        match self {
            Flavor::Numu => "numu",
            Flavor::Nue => "nue",
            Flavor::Numubar => "numubar",
            Flavor::Nuebar => "nuebar",
            Flavor::NueXNumuflx => "nue_x_numuflx",
        }
    }
}
//
impl FromStr for Flavor {
    type Err = ConfigError;

    fn from_str(tag: &str) -> std::result::Result<Self, ConfigError> {
        match tag {
            "numu" => Ok(Flavor::Numu),
            "nue" => Ok(Flavor::Nue),
            "numubar" => Ok(Flavor::Numubar),
            "nuebar" => Ok(Flavor::Nuebar),
            "nue_x_numuflx" => Ok(Flavor::NueXNumuflx),
            other => Err(ConfigError::UnknownFlavor(other.to_owned())),
        }
    }
}
//
impl Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Cut threshold which varies linearly with reconstructed energy
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LinearCut {
    /// Change of the threshold per MeV
    pub slope: f64,

    /// Threshold at zero energy
    pub intercept: f64,
}
//
impl LinearCut {
    /// Threshold at a given reconstructed energy
    pub fn threshold(&self, energy: f64) -> f64 {
        self.slope * energy + self.intercept
    }
}

/// Energy-dependent fit quality cuts optimized for one run period
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CutThresholds {
    /// Cut on the distance to the closest wall (cm)
    pub dwall: LinearCut,

    /// Cut on the distance to the wall along the track direction (cm)
    pub effwall: LinearCut,

    /// Cut on the vertex and direction fit quality (ovaQ)
    pub ovaq: LinearCut,
}

/// Neutrino oscillation parameters
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct OscillationParameters {
    /// Distance from the neutrino source to the detector (km)
    pub baseline_km: f64,

    /// sin²(θ₁₃), with reactor constraint
    pub sin2_theta13: f64,

    /// sin²(θ₂₃)
    pub sin2_theta23: f64,

    /// Δm²₃₂ in the normal hierarchy (eV²)
    pub delta_m2_32: f64,
}

/// Tables which are specific to one analysis mode
#[derive(Debug, Clone, Deserialize)]
pub struct ModeTables {
    /// Human-readable summary of the flux, tuning and generator versions
    #[serde(default)]
    pub description: String,

    /// Run periods which are analyzed in this mode
    pub runs: Vec<RunPeriod>,

    /// Cross-section normalization of each simulated flavor
    pub cross_section_scales: BTreeMap<Flavor, f64>,

    /// Energy-dependent Cherenkov angle cut, if this mode defines one
    #[serde(default)]
    pub cherenkov_cut: Option<LinearCut>,

    /// Reweighting table file of each run period (relative to the flux dir)
    #[serde(default)]
    pub flux_tunes: BTreeMap<RunPeriod, String>,
}

/// Every analysis table, as read from the configuration document
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisTables {
    /// Oscillation parameters
    pub oscillation: OscillationParameters,

    /// Neutrino beam direction in detector coordinates
    pub beam_direction: [f64; 3],

    /// Number of generated events per simulated file group
    pub generated_sample_size: f64,

    /// Exposure of each run period (protons on target)
    pub exposures: BTreeMap<RunPeriod, f64>,

    /// Fit quality cut thresholds of each run period
    pub cut_thresholds: BTreeMap<RunPeriod, CutThresholds>,

    /// Settings of each analysis mode
    pub modes: BTreeMap<AnalysisMode, ModeTables>,
}
//
impl AnalysisTables {
    /// Tables embedded into the program
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_TABLES).wrap_err("Built-in analysis tables are broken")
    }

    /// Load tables from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read analysis tables from {}", path.display()))?;
        Self::parse(&text)
            .wrap_err_with(|| format!("Failed to load analysis tables from {}", path.display()))
    }

    /// Parse tables from JSON text and check their consistency
    pub fn parse(text: &str) -> Result<Self> {
        let tables: Self = serde_json::from_str(text)?;
        tables.validate()?;
        Ok(tables)
    }

    /// Look for inconsistencies that would otherwise bite in the middle of a run
    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !(self.generated_sample_size > 0.) {
            return Err(ConfigError::InvalidTable(format!(
                "generated sample size must be positive, got {}",
                self.generated_sample_size
            )));
        }
        if let Some((run, pot)) = self.exposures.iter().find(|(_, pot)| !(**pot > 0.)) {
            return Err(ConfigError::InvalidTable(format!(
                "exposure of run {run} must be positive, got {pot}"
            )));
        }
        for (mode, tables) in &self.modes {
            if tables.runs.is_empty() {
                return Err(ConfigError::InvalidTable(format!(
                    "analysis mode {mode} has no run period"
                )));
            }
        }
        Ok(())
    }

    /// Settings of an analysis mode
    pub fn mode(&self, mode: AnalysisMode) -> std::result::Result<&ModeTables, ConfigError> {
        self.modes
            .get(&mode)
            .ok_or(ConfigError::UnknownAnalysisMode(mode))
    }
}

/// Fully resolved configuration of one analysis mode
///
/// Everything that the weighting needs is looked up and checked here, once,
/// so that no event is ever processed against an incomplete configuration.
///
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    /// Analysis mode which this configuration was resolved for
    pub mode: AnalysisMode,

    /// Oscillation probability calculator
    pub oscillation: Oscillation,

    /// Neutrino beam direction in detector coordinates
    pub beam_direction: Direction,

    /// Number of generated events per simulated file group
    pub generated_sample_size: f64,

    /// Analyzed run periods, in table order, with their exposure
    runs: Vec<(RunPeriod, f64)>,

    /// Cross-section normalization of each simulated flavor
    cross_section_scales: BTreeMap<Flavor, f64>,

    /// Reweighting tables of each run period
    flux_tunes: BTreeMap<RunPeriod, RunFluxTunes>,
}
//
impl RunConfiguration {
    /// Resolve the configuration of an analysis mode
    ///
    /// Reweighting tables are read from `flux_dir`. Without one, no run gets
    /// reweighted.
    ///
    pub fn new(
        tables: &AnalysisTables,
        mode: AnalysisMode,
        flux_dir: Option<&Path>,
    ) -> std::result::Result<Self, ConfigError> {
        let mode_tables = tables.mode(mode)?;

        // Every analyzed run must have a known exposure
        let runs = mode_tables
            .runs
            .iter()
            .map(|run| {
                tables
                    .exposures
                    .get(run)
                    .map(|&pot| (run.clone(), pot))
                    .ok_or_else(|| ConfigError::UnknownRunPeriod(run.clone()))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // Load the reweighting tables, if we know where they are
        let mut flux_tunes = BTreeMap::new();
        match flux_dir {
            Some(dir) => {
                for (run, _pot) in &runs {
                    if let Some(file) = mode_tables.flux_tunes.get(run) {
                        let tunes = fluxtune::load_run_tunes(&dir.join(file))?;
                        flux_tunes.insert(run.clone(), tunes);
                    }
                }
            }
            None if !mode_tables.flux_tunes.is_empty() => {
                warn!("No flux directory provided, events will not be flux-reweighted");
            }
            None => {}
        }

        let [x, y, z] = tables.beam_direction;
        Ok(Self {
            mode,
            oscillation: Oscillation::new(&tables.oscillation),
            beam_direction: Direction::new(x, y, z),
            generated_sample_size: tables.generated_sample_size,
            runs,
            cross_section_scales: mode_tables.cross_section_scales.clone(),
            flux_tunes,
        })
    }

    /// Add or replace the reweighting table of one (run, flavor) pair
    pub fn set_flux_tune(&mut self, run: &RunPeriod, flavor: Flavor, tune: fluxtune::FluxTune) {
        self.flux_tunes
            .entry(run.clone())
            .or_default()
            .insert(flavor, tune);
    }

    /// Analyzed run periods, with their exposure
    pub fn runs(&self) -> impl ExactSizeIterator<Item = (&RunPeriod, f64)> + '_ {
        self.runs.iter().map(|(run, pot)| (run, *pot))
    }

    /// Number of analyzed run periods
    pub fn num_runs(&self) -> usize {
        self.runs.len()
    }

    /// Exposure of an analyzed run period
    pub fn exposure(&self, run: &RunPeriod) -> std::result::Result<f64, ConfigError> {
        self.runs
            .iter()
            .find(|(r, _)| r == run)
            .map(|(_, pot)| *pot)
            .ok_or_else(|| ConfigError::UnknownRunPeriod(run.clone()))
    }

    /// Cross-section normalization of a flavor
    pub fn cross_section_scale(&self, flavor: Flavor) -> std::result::Result<f64, ConfigError> {
        self.cross_section_scales
            .get(&flavor)
            .copied()
            .ok_or(ConfigError::MissingCrossSectionScale {
                flavor,
                mode: self.mode,
            })
    }

    /// Reweighting table of a (run, flavor) pair, if there is one
    pub fn flux_tune(&self, run: &RunPeriod, flavor: Flavor) -> Option<&fluxtune::FluxTune> {
        self.flux_tunes.get(run).and_then(|tunes| tunes.get(&flavor))
    }

    /// Log the configuration
    pub fn log_summary(&self) {
        info!("Analysis mode          : {}", self.mode);
        info!("Generated sample size  : {}", self.generated_sample_size);
        info!(
            "Beam direction         : ({}, {}, {})",
            self.beam_direction[0], self.beam_direction[1], self.beam_direction[2]
        );
        for (run, pot) in self.runs() {
            let tuned = self
                .flux_tunes
                .get(run)
                .map(|tunes| {
                    tunes
                        .keys()
                        .map(|flavor| flavor.tag())
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_else(|| "none".to_owned());
            info!("Run {run:<4} POT {pot:e}, reweighted flavors: {tuned}");
        }
        for (flavor, scale) in &self.cross_section_scales {
            info!("Cross-section scale    : {flavor} = {scale:e}");
        }
    }
}

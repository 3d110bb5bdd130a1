//! Per-run statistical weights of simulated events
//!
//! A simulated event stands for `scale × POT / N_gen` real events in each run
//! period, further corrected by the flux reweighting table of its flavor in
//! that run when there is one.

use crate::{
    config::{Flavor, RunConfiguration, RunPeriod},
    error::ConfigError,
    fluxtune::FluxTune,
};

/// Weight calculator for every run of an analysis mode
pub struct WeightCalculator<'cfg> {
    cfg: &'cfg RunConfiguration,
}
//
impl<'cfg> WeightCalculator<'cfg> {
    /// Set up weight computations for a run configuration
    pub fn new(cfg: &'cfg RunConfiguration) -> Self {
        Self { cfg }
    }

    /// Weight of an event of some flavor and true energy in one run period
    pub fn weight(&self, flavor: Flavor, energy: f64, run: &RunPeriod) -> Result<f64, ConfigError> {
        let scale = self.cfg.cross_section_scale(flavor)?;
        let exposure = self.cfg.exposure(run)?;
        let tune = self.cfg.flux_tune(run, flavor);
        Ok(RunWeighting::new(scale, exposure, self.cfg.generated_sample_size, tune).weight(energy))
    }

    /// Resolve everything that the weights of one flavor depend on
    ///
    /// This is where a flavor without cross-section normalization gets
    /// reported, before any event of that flavor is processed.
    ///
    pub fn for_flavor(&self, flavor: Flavor) -> Result<FlavorWeights<'cfg>, ConfigError> {
        let scale = self.cfg.cross_section_scale(flavor)?;
        let runs = self
            .cfg
            .runs()
            .map(|(run, exposure)| {
                let tune = self.cfg.flux_tune(run, flavor);
                RunWeighting::new(scale, exposure, self.cfg.generated_sample_size, tune)
            })
            .collect();
        Ok(FlavorWeights { flavor, runs })
    }
}

/// Weighting of one flavor in one run period
#[derive(Debug, Clone, Copy)]
struct RunWeighting<'cfg> {
    /// Weight before flux reweighting
    base: f64,

    /// Flux reweighting table, if any
    tune: Option<&'cfg FluxTune>,
}
//
impl<'cfg> RunWeighting<'cfg> {
    fn new(scale: f64, exposure: f64, n_gen: f64, tune: Option<&'cfg FluxTune>) -> Self {
        Self {
            base: scale * exposure / n_gen,
            tune,
        }
    }

    fn weight(&self, energy: f64) -> f64 {
        match self.tune {
            Some(tune) => self.base * tune.factor(energy),
            None => self.base,
        }
    }
}

/// Weights of one flavor, for every run period of the configuration
#[derive(Debug, Clone)]
pub struct FlavorWeights<'cfg> {
    flavor: Flavor,
    runs: Vec<RunWeighting<'cfg>>,
}
//
impl FlavorWeights<'_> {
    /// Flavor which these weights apply to
    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// Weight of an event in each run period, in configuration order
    pub fn weights(&self, energy: f64) -> Vec<f64> {
        self.runs.iter().map(|run| run.weight(energy)).collect()
    }
}

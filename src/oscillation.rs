//! Two-flavor-dominated νμ oscillation probabilities used as a diagnostic

use crate::config::OscillationParameters;

use prefix_num_ops::real::*;

/// Oscillation probability calculator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oscillation {
    /// Baseline (km)
    baseline: f64,

    /// Δm²₃₂ (eV²)
    delta_m2: f64,

    /// Amplitude of the νμ → νe appearance term, sin²(2θ₁₃)·sin²(θ₂₃)
    appearance: f64,

    /// Amplitude of the νμ disappearance term, cos⁴(θ₁₃)·sin²(2θ₂₃)
    disappearance: f64,
}
//
impl Oscillation {
    /// Precompute the oscillation amplitudes from the mixing parameters
    pub fn new(params: &OscillationParameters) -> Self {
        let s13 = params.sin2_theta13;
        let s23 = params.sin2_theta23;
        let sin2_2th13 = 4. * s13 * (1. - s13);
        let sin2_2th23 = 4. * s23 * (1. - s23);
        Self {
            baseline: params.baseline_km,
            delta_m2: params.delta_m2_32,
            appearance: sin2_2th13 * s23,
            disappearance: (1. - s13).powi(2) * sin2_2th23,
        }
    }

    /// Squared oscillation phase factor sin²(1.267·Δm²·L/E)
    fn phase(&self, energy: f64) -> f64 {
        sin(1.267 * self.delta_m2 * self.baseline / energy).powi(2)
    }

    /// νμ → νe appearance probability
    pub fn appearance(&self, energy: f64) -> f64 {
        self.appearance * self.phase(energy)
    }

    /// νμ → νμ survival probability
    pub fn survival(&self, energy: f64) -> f64 {
        1. - (self.disappearance + self.appearance) * self.phase(energy)
    }

    /// Probability for a νμ to still be seen as νμ or νe
    ///
    /// The energy is taken in the unit of the simulated sample (MeV), and
    /// used as-is in the phase.
    ///
    pub fn probability(&self, energy: f64) -> f64 {
        self.appearance(energy) + self.survival(energy)
    }
}

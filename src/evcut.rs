//! Mechanism to apply the NCQE selection cuts to events

use crate::{
    config::{AnalysisMode, AnalysisTables, CutThresholds, LinearCut, RunPeriod},
    error::ConfigError,
    event::Event,
};

use serde::Serialize;

use std::fmt::{self, Display};

/// Lower bound of the reconstructed energy window (MeV, inclusive)
pub const MIN_ENERGY: f64 = 4.;

/// Upper bound of the reconstructed energy window (MeV, exclusive)
pub const MAX_ENERGY: f64 = 30.;

/// Fiducial volume cut on both wall distances (cm)
pub const MIN_WALL: f64 = 200.;

/// Successive stages of the selection, in the order they are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "&'static str")]
pub enum CutStage {
    /// Reconstructed energy window
    Energy,
    /// Fiducial volume
    Fiducial,
    /// Energy-dependent wall distance cut
    Dwall,
    /// Energy-dependent effective wall distance cut
    Effwall,
    /// Energy-dependent fit quality cut
    Ovaq,
    /// Energy-dependent Cherenkov angle cut, the last one
    Angle,
}
//
impl CutStage {
    /// Every stage, in application order
    pub const ALL: [CutStage; 6] = [
        CutStage::Energy,
        CutStage::Fiducial,
        CutStage::Dwall,
        CutStage::Effwall,
        CutStage::Ovaq,
        CutStage::Angle,
    ];

    /// Short name used in histogram names and summaries
    pub fn name(self) -> &'static str {
        match self {
            CutStage::Energy => "energy",
            CutStage::Fiducial => "wallfv",
            CutStage::Dwall => "dwall",
            CutStage::Effwall => "effwall",
            CutStage::Ovaq => "ovaq",
            CutStage::Angle => "angle",
        }
    }
}
//
impl From<CutStage> for &'static str {
    fn from(stage: CutStage) -> Self {
        stage.name()
    }
}
//
impl Display for CutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cuts on reconstructed events
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionCuts {
    /// Run period whose optimized thresholds are used
    pub run: RunPeriod,

    /// Energy-dependent fit quality thresholds of that run period
    pub thresholds: CutThresholds,

    /// Energy-dependent Cherenkov angle threshold of the analysis mode
    pub cherenkov: LinearCut,
}
//
impl SelectionCuts {
    /// Setup the cuts for the thresholds of a run period and analysis mode
    pub fn new(
        tables: &AnalysisTables,
        run: &RunPeriod,
        mode: AnalysisMode,
    ) -> Result<Self, ConfigError> {
        let thresholds = *tables
            .cut_thresholds
            .get(run)
            .ok_or_else(|| ConfigError::MissingCutThreshold(run.clone()))?;
        let cherenkov = tables
            .mode(mode)?
            .cherenkov_cut
            .ok_or(ConfigError::MissingCherenkovCut(mode))?;
        Ok(Self {
            run: run.clone(),
            thresholds,
            cherenkov,
        })
    }

    /// Run the cuts in order, reporting the first one which the event fails
    pub fn evaluate(&self, event: &Event) -> Result<(), CutStage> {
        let erec = event.reco_energy;

        // Reconstructed energy window [4, 30) MeV, which NaNs are not part of
        if !(MIN_ENERGY..MAX_ENERGY).contains(&erec) {
            return Err(CutStage::Energy);
        }

        // Fiducial volume
        if event.dwall < MIN_WALL || event.effwall < MIN_WALL {
            return Err(CutStage::Fiducial);
        }

        // Fit quality, with thresholds optimized per run period
        if event.dwall < self.thresholds.dwall.threshold(erec) {
            return Err(CutStage::Dwall);
        }
        if event.effwall < self.thresholds.effwall.threshold(erec) {
            return Err(CutStage::Effwall);
        }
        if event.ovaq < self.thresholds.ovaq.threshold(erec) {
            return Err(CutStage::Ovaq);
        }

        // Cherenkov angle, which rejects muons and pions
        if event.angle < self.cherenkov.threshold(erec) {
            return Err(CutStage::Angle);
        }

        Ok(())
    }

    /// Decide whether an event passes the selection
    pub fn passes(&self, event: &Event) -> bool {
        self.evaluate(event).is_ok()
    }
}

/// Number of events rejected by each cut stage, and accepted overall
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CutFlow {
    /// Events rejected at each stage, indexed like [`CutStage::ALL`]
    rejected: [usize; CutStage::ALL.len()],

    /// Events which passed every stage
    accepted: usize,
}
//
impl CutFlow {
    /// Account for an event rejected by some stage
    pub fn reject(&mut self, stage: CutStage) {
        self.rejected[stage as usize] += 1;
    }

    /// Account for an event which passed every stage
    pub fn accept(&mut self) {
        self.accepted += 1;
    }

    /// Number of events rejected by some stage
    pub fn rejected(&self, stage: CutStage) -> usize {
        self.rejected[stage as usize]
    }

    /// Number of events which passed every stage
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    /// Number of events which reached the selection
    pub fn total(&self) -> usize {
        self.accepted + self.rejected.iter().sum::<usize>()
    }

    /// Number of events still selected after each stage
    pub fn surviving(&self) -> impl Iterator<Item = (CutStage, usize)> + '_ {
        let mut remaining = self.total();
        CutStage::ALL.into_iter().map(move |stage| {
            remaining -= self.rejected(stage);
            (stage, remaining)
        })
    }

    /// Add the counts of another cut flow
    pub fn merge(&mut self, other: &Self) {
        for (dst, src) in self.rejected.iter_mut().zip(&other.rejected) {
            *dst += src;
        }
        self.accepted += other.accepted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::NeutronMultiplicity,
        linalg::{Direction, Position},
    };

    fn cuts() -> SelectionCuts {
        let tables = AnalysisTables::builtin().unwrap();
        SelectionCuts::new(&tables, &RunPeriod::from("11"), AnalysisMode(6)).unwrap()
    }

    fn event(erec: f64, dwall: f64, effwall: f64, ovaq: f64, angle: f64) -> Event {
        Event {
            true_energy: 6.,
            reco_energy: erec,
            dwall,
            effwall,
            ovaq,
            angle,
            vertex: Position::zeros(),
            true_vertex: Position::zeros(),
            direction: Direction::new(0., 0., 1.),
            interaction_mode: 51,
            multiplicity: NeutronMultiplicity::default(),
            candidates: Vec::new(),
        }
    }

    #[test]
    fn reference_event_passes() {
        assert_eq!(cuts().evaluate(&event(10., 600., 2500., 0.2, 40.)), Ok(()));
    }

    #[test]
    fn energy_window_is_half_open() {
        let cuts = cuts();
        // At 4 MeV, the angle threshold is 1.67832 * 4 + 15 = 21.71 degrees
        assert!(cuts.passes(&event(4., 2000., 4000., 0.9, 80.)));
        assert_eq!(
            cuts.evaluate(&event(30., 2000., 4000., 0.9, 89.)),
            Err(CutStage::Energy)
        );
        assert_eq!(
            cuts.evaluate(&event(3.999, 2000., 4000., 0.9, 89.)),
            Err(CutStage::Energy)
        );
        assert!(cuts.passes(&event(29.999, 2000., 4000., 0.9, 89.)));
    }

    #[test]
    fn stage_names_follow_the_cut_flow_table() {
        let names = CutStage::ALL.map(CutStage::name);
        assert_eq!(names, ["energy", "wallfv", "dwall", "effwall", "ovaq", "angle"]);
        assert_eq!(
            serde_json::to_string(&CutStage::Fiducial).unwrap(),
            r#""wallfv""#
        );
    }

    #[test]
    fn fiducial_boundary_is_inclusive() {
        // At 20 MeV, the run 11 dwall threshold is -80 * 20 + 580 = -1020 cm
        let cuts = cuts();
        assert!(cuts.passes(&event(20., 200., 2500., 0.5, 60.)));
        assert_eq!(
            cuts.evaluate(&event(20., 199.999, 2500., 0.5, 60.)),
            Err(CutStage::Fiducial)
        );
        assert_eq!(
            cuts.evaluate(&event(20., 600., 199.999, 0.5, 60.)),
            Err(CutStage::Fiducial)
        );
    }

    #[test]
    fn linear_cuts_apply_in_order() {
        let cuts = cuts();
        // At 4 MeV: dwall >= 260, effwall >= 685.5, ovaq >= 0.2445
        assert_eq!(
            cuts.evaluate(&event(4., 259., 600., 0.1, 10.)),
            Err(CutStage::Dwall)
        );
        assert_eq!(
            cuts.evaluate(&event(4., 260., 685., 0.1, 10.)),
            Err(CutStage::Effwall)
        );
        assert_eq!(
            cuts.evaluate(&event(4., 260., 685.5, 0.24, 10.)),
            Err(CutStage::Ovaq)
        );
        assert_eq!(
            cuts.evaluate(&event(4., 260., 685.5, 0.25, 10.)),
            Err(CutStage::Angle)
        );
    }

    #[test]
    fn cherenkov_cut_depends_on_mode() {
        let tables = AnalysisTables::builtin().unwrap();
        let run = RunPeriod::from("11");
        let mode4 = SelectionCuts::new(&tables, &run, AnalysisMode(4)).unwrap();
        let mode6 = SelectionCuts::new(&tables, &run, AnalysisMode(6)).unwrap();
        // At 10 MeV: 34.51 degrees in mode 4, 31.78 degrees in mode 6
        let ev = event(10., 600., 2500., 0.2, 33.);
        assert_eq!(mode4.evaluate(&ev), Err(CutStage::Angle));
        assert_eq!(mode6.evaluate(&ev), Ok(()));
    }

    #[test]
    fn unknown_run_is_a_configuration_error() {
        let tables = AnalysisTables::builtin().unwrap();
        let err = SelectionCuts::new(&tables, &RunPeriod::from("12"), AnalysisMode(6)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCutThreshold(_)));
    }

    #[test]
    fn cut_flow_counts_survivors() {
        let cuts = cuts();
        let mut flow = CutFlow::default();
        for ev in [
            event(10., 600., 2500., 0.2, 40.),
            event(2., 600., 2500., 0.2, 40.),
            event(10., 100., 2500., 0.2, 40.),
            event(10., 600., 2500., 0.2, 5.),
        ] {
            match cuts.evaluate(&ev) {
                Ok(()) => flow.accept(),
                Err(stage) => flow.reject(stage),
            }
        }
        let mut other = CutFlow::default();
        other.accept();
        flow.merge(&other);

        assert_eq!(flow.total(), 5);
        assert_eq!(flow.accepted(), 2);
        assert_eq!(flow.rejected(CutStage::Energy), 1);
        assert_eq!(flow.rejected(CutStage::Dwall), 0);
        let surviving = flow.surviving().map(|(_, n)| n).collect::<Vec<_>>();
        assert_eq!(surviving, [4, 3, 3, 3, 3, 2]);
    }

    #[test]
    fn modes_without_cherenkov_cut_are_rejected() {
        let tables = AnalysisTables::builtin().unwrap();
        let run = RunPeriod::from("4");
        for mode in [1, 2, 3] {
            let err = SelectionCuts::new(&tables, &run, AnalysisMode(mode)).unwrap_err();
            assert!(matches!(err, ConfigError::MissingCherenkovCut(_)));
        }
        let err = SelectionCuts::new(&tables, &run, AnalysisMode(9)).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownAnalysisMode(_)));
    }
}

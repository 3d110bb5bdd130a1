//! Derivation of neutron capture candidate observables
//!
//! Candidates are turned into per-category value lists for a single primary
//! event. Nothing is filled here: the lists are handed to the accumulator once
//! every candidate of the event was processed successfully.

use crate::{
    error::DataError,
    event::Event,
    linalg::{planar_r2, unit_direction, Direction, X, Y, Z},
    observables::{Category, NeutronFeature, NnFeature},
};

/// Minimal tagging network output of a candidate to be considered
pub const TAG_THRESHOLD: f64 = 0.7;

/// Values of the candidate observables of one event, per category
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateValues {
    /// Kinematic feature values, indexed by category then feature
    kinematics: [[Vec<f64>; NeutronFeature::COUNT]; Category::COUNT],

    /// Network input values, indexed by category then feature
    network: [[Vec<f64>; NnFeature::COUNT]; Category::COUNT],
}
//
impl CandidateValues {
    /// Empty value lists
    pub fn new() -> Self {
        Self {
            kinematics: std::array::from_fn(|_| std::array::from_fn(|_| Vec::new())),
            network: std::array::from_fn(|_| std::array::from_fn(|_| Vec::new())),
        }
    }

    /// Kinematic feature values recorded for some category
    pub fn kinematics(&self, category: Category, feature: NeutronFeature) -> &[f64] {
        &self.kinematics[category.index()][feature.index()]
    }

    /// Network input values recorded for some category
    pub fn network(&self, category: Category, feature: NnFeature) -> &[f64] {
        &self.network[category.index()][feature.index()]
    }

    /// Number of candidates recorded in some category
    pub fn num_candidates(&self, category: Category) -> usize {
        self.network[category.index()][NnFeature::TagOut.index()].len()
    }

    /// Record a kinematic value in a candidate's category and in "all"
    fn push_kinematic(&mut self, category: Category, feature: NeutronFeature, value: f64) {
        for cat in [category, Category::All] {
            self.kinematics[cat.index()][feature.index()].push(value);
        }
    }

    /// Record a network input in a candidate's category and in "all"
    fn push_network(&mut self, category: Category, feature: NnFeature, value: f64) {
        for cat in [category, Category::All] {
            self.network[cat.index()][feature.index()].push(value);
        }
    }
}
//
impl Default for CandidateValues {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns the candidates of an event into candidate observables
#[derive(Debug, Clone)]
pub struct CandidateProcessor {
    /// Beam axis in detector coordinates
    beam_direction: Direction,

    /// Minimal tagging network output
    threshold: f64,
}
//
impl CandidateProcessor {
    /// Set up candidate processing for some beam axis
    pub fn new(beam_direction: Direction) -> Self {
        Self {
            beam_direction,
            threshold: TAG_THRESHOLD,
        }
    }

    /// Compute the observables of every retained candidate of an event
    pub fn process(&self, event: &Event) -> Result<CandidateValues, DataError> {
        let mut values = CandidateValues::new();
        for (index, cand) in event.candidates.iter().enumerate() {
            // Low-confidence and unlabeled candidates do not contribute, and
            // neither do NaN confidences
            let confident = cand.tag_out > self.threshold;
            if !confident {
                continue;
            }
            let Some(category) = Category::from_label(cand.label) else {
                continue;
            };

            let dir = unit_direction(&event.vertex, &cand.position)
                .ok_or(DataError::DegenerateDirection { index })?;
            let beam_cos = dir.dot(&self.beam_direction);
            let gamma_cos = dir.dot(&event.direction);

            for feature in NeutronFeature::ALL {
                use NeutronFeature as F;
                let value = match feature {
                    F::CaptureTime => cand.capture_time,
                    F::TravelDistance => cand.travel_distance,
                    F::BeamCos => beam_cos,
                    F::GammaCos => gamma_cos,
                    F::LongitudinalDistance => cand.travel_distance * beam_cos,
                    F::TransverseDistance => cand.travel_distance * gamma_cos,
                    F::X => cand.position[X],
                    F::Y => cand.position[Y],
                    F::Z => cand.position[Z],
                    F::R2 => planar_r2(&cand.position),
                };
                values.push_kinematic(category, feature, value);
            }
            for feature in NnFeature::ALL {
                values.push_network(category, feature, feature.value(cand));
            }
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::{Candidate, CandidateFit, NeutronMultiplicity},
        linalg::Position,
    };
    use approx::assert_relative_eq;

    fn candidate(tag_out: f64, label: i32, position: Position) -> Candidate {
        Candidate {
            tag_out,
            label,
            position,
            capture_time: 120.,
            travel_distance: 300.,
            fit: CandidateFit {
                n_hits: 7.,
                ..CandidateFit::default()
            },
        }
    }

    fn event(candidates: Vec<Candidate>) -> Event {
        Event {
            true_energy: 6.,
            reco_energy: 10.,
            dwall: 600.,
            effwall: 2500.,
            ovaq: 0.2,
            angle: 40.,
            vertex: Position::new(1., 2., 3.),
            true_vertex: Position::new(1., 2., 3.),
            direction: Direction::new(0., 0., 1.),
            interaction_mode: 51,
            multiplicity: NeutronMultiplicity::default(),
            candidates,
        }
    }

    #[test]
    fn threshold_and_labels_select_candidates() {
        let proc = CandidateProcessor::new(Direction::new(1., 0., 0.));
        let ev = event(vec![
            candidate(0.7, 3, Position::new(2., 2., 3.)),
            candidate(0.71, 3, Position::new(2., 2., 3.)),
            candidate(0.9, 2, Position::new(1., 3., 3.)),
            candidate(0.9, 1, Position::new(1., 3., 3.)),
            candidate(0.95, 0, Position::new(1., 2., 5.)),
            candidate(f64::NAN, 3, Position::new(2., 2., 3.)),
        ]);
        let values = proc.process(&ev).unwrap();
        assert_eq!(values.num_candidates(Category::Gd), 1);
        assert_eq!(values.num_candidates(Category::H), 1);
        assert_eq!(values.num_candidates(Category::Noise), 1);
        assert_eq!(values.num_candidates(Category::All), 3);
        assert_eq!(values.network(Category::All, NnFeature::NHits), [7.; 3]);
        assert_eq!(
            values.network(Category::All, NnFeature::TagOut),
            [0.71, 0.9, 0.95]
        );
    }

    #[test]
    fn kinematics_follow_geometry() {
        let proc = CandidateProcessor::new(Direction::new(1., 0., 0.));
        let ev = event(vec![candidate(0.9, 2, Position::new(4., 6., 3.))]);
        let values = proc.process(&ev).unwrap();
        let get = |f| values.kinematics(Category::H, f)[0];
        // Displacement (3, 4, 0) from the vertex
        assert_relative_eq!(get(NeutronFeature::BeamCos), 0.6);
        assert_relative_eq!(get(NeutronFeature::GammaCos), 0.);
        assert_relative_eq!(get(NeutronFeature::LongitudinalDistance), 180.);
        assert_relative_eq!(get(NeutronFeature::TransverseDistance), 0.);
        assert_eq!(get(NeutronFeature::R2), 52.);
        assert_eq!(get(NeutronFeature::CaptureTime), 120.);
        assert_eq!(get(NeutronFeature::TravelDistance), 300.);
        assert_eq!(
            values.kinematics(Category::All, NeutronFeature::X),
            values.kinematics(Category::H, NeutronFeature::X)
        );
        assert!(values.kinematics(Category::Gd, NeutronFeature::X).is_empty());
    }

    #[test]
    fn candidate_on_vertex_is_a_data_error() {
        let proc = CandidateProcessor::new(Direction::new(1., 0., 0.));
        let ev = event(vec![
            candidate(0.9, 2, Position::new(4., 6., 3.)),
            candidate(0.9, 3, Position::new(1., 2., 3.)),
        ]);
        assert_eq!(
            proc.process(&ev),
            Err(DataError::DegenerateDirection { index: 1 })
        );
    }

    #[test]
    fn rejected_candidates_on_vertex_are_harmless() {
        let proc = CandidateProcessor::new(Direction::new(1., 0., 0.));
        let ev = event(vec![candidate(0.5, 3, Position::new(1., 2., 3.))]);
        assert_eq!(proc.process(&ev), Ok(CandidateValues::new()));
    }
}

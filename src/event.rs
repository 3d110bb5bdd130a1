//! This module defines the properties of simulated detector events

use crate::{
    channel::Channel,
    config::Flavor,
    linalg::{planar_r2, Direction, Position, X, Y, Z},
};

use serde::Serialize;

/// Neutron multiplicities of an event at various stages of the tagging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeutronMultiplicity {
    /// Number of neutrons in the simulation truth
    pub truth: u32,

    /// Number of neutron captures passing the tagging pre-selection
    pub taggable: u32,

    /// Number of candidates selected by the tagging neural network
    pub tagged: u32,
}

/// One primary (prompt gamma) event
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// True neutrino energy (MeV)
    pub true_energy: f64,

    /// Reconstructed visible energy (MeV)
    pub reco_energy: f64,

    /// Distance from the vertex to the closest wall (cm)
    pub dwall: f64,

    /// Distance from the vertex to the wall, backwards along the track (cm)
    pub effwall: f64,

    /// Vertex and direction fit quality
    pub ovaq: f64,

    /// Cherenkov opening angle (degrees)
    pub angle: f64,

    /// Reconstructed vertex (m)
    pub vertex: Position,

    /// True vertex (m)
    pub true_vertex: Position,

    /// Reconstructed direction
    pub direction: Direction,

    /// NEUT interaction mode code
    pub interaction_mode: i32,

    /// Neutron multiplicities
    pub multiplicity: NeutronMultiplicity,

    /// Neutron capture candidates found after the prompt event
    pub candidates: Vec<Candidate>,
}

/// Quantities which the neutron tagging network bases its decision on
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CandidateFit {
    pub n_hits: f64,
    pub n_res_hits: f64,
    /// Hit time RMS (ns)
    pub trms: f64,
    /// Distance of the capture vertex to the closest wall (cm)
    pub dwall: f64,
    /// Distance of the capture vertex to the wall along the mean hit direction (cm)
    pub dwall_mean_dir: f64,
    /// Isotropy parameters β₁..β₅
    pub beta: [f64; 5],
    pub opening_angle_mean: f64,
    pub opening_angle_skew: f64,
    pub opening_angle_stdev: f64,
    pub mean_dir_angle_mean: f64,
    pub mean_dir_angle_rms: f64,
    pub burst_ratio: f64,
    pub fit_goodness: f64,
    pub dark_likelihood: f64,
}

/// One neutron capture candidate attached to a primary event
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Output of the tagging neural network
    pub tag_out: f64,

    /// Simulation truth label (0 = noise, 2 = capture on H, 3 = capture on Gd)
    pub label: i32,

    /// Fitted capture vertex (m)
    pub position: Position,

    /// Capture time after the prompt event (μs)
    pub capture_time: f64,

    /// Distance between the prompt vertex and the capture vertex (cm)
    pub travel_distance: f64,

    /// Tagging network inputs
    pub fit: CandidateFit,
}

/// Flat record of a selected event, as written to the selected-event table
/// and fed to the primary histograms
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedEvent {
    pub enu: f64,
    pub erec: f64,
    pub dwall: f64,
    pub effwall: f64,
    pub ovaq: f64,
    pub angle: f64,
    pub pos_x: f64,
    pub pos_y: f64,
    pub pos_z: f64,
    pub pos_r2: f64,
    pub posvx: f64,
    pub posvy: f64,
    pub posvz: f64,
    pub bdir_x: f64,
    pub bdir_y: f64,
    pub bdir_z: f64,
    /// Cosine of the angle between the reconstructed direction and the beam
    pub cosb: f64,
    pub ntrue: u32,
    pub ntaggable: u32,
    pub ntagged: u32,
    pub channel: Channel,
    pub flavor: Flavor,
    /// Oscillation probability at the true neutrino energy
    pub posc: f64,
}
//
impl SelectedEvent {
    /// Derive the flat record of an event that passed the selection
    pub fn new(
        event: &Event,
        beam_direction: &Direction,
        channel: Channel,
        flavor: Flavor,
        posc: f64,
    ) -> Self {
        let dir = &event.direction;
        Self {
            enu: event.true_energy,
            erec: event.reco_energy,
            dwall: event.dwall,
            effwall: event.effwall,
            ovaq: event.ovaq,
            angle: event.angle,
            pos_x: event.vertex[X],
            pos_y: event.vertex[Y],
            pos_z: event.vertex[Z],
            pos_r2: planar_r2(&event.vertex),
            posvx: event.true_vertex[X],
            posvy: event.true_vertex[Y],
            posvz: event.true_vertex[Z],
            bdir_x: dir[X],
            bdir_y: dir[Y],
            bdir_z: dir[Z],
            cosb: dir.dot(beam_direction),
            ntrue: event.multiplicity.truth,
            ntaggable: event.multiplicity.taggable,
            ntagged: event.multiplicity.tagged,
            channel,
            flavor,
            posc,
        }
    }
}

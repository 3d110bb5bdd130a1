//! Contribution of one selected event to the analysis results

use crate::{candidate::CandidateValues, channel::Channel, event::SelectedEvent};

/// Everything that a selected event adds to the histograms
///
/// Building one of these is the last fallible step of event processing, so
/// integrating it into the accumulator can never leave an event half-filled.
///
#[derive(Debug, Clone, PartialEq)]
pub struct EventContribution {
    /// Flat record of the selected event
    selected: SelectedEvent,

    /// Weight of the event in each analyzed run period
    weights: Vec<f64>,

    /// Candidate observables of the event
    candidates: CandidateValues,
}
//
impl EventContribution {
    /// Bundle the derived quantities of a selected event
    pub fn new(selected: SelectedEvent, weights: Vec<f64>, candidates: CandidateValues) -> Self {
        Self {
            selected,
            weights,
            candidates,
        }
    }

    /// Flat record of the selected event
    pub fn selected(&self) -> &SelectedEvent {
        &self.selected
    }

    /// Interaction channel bucket of the event
    pub fn channel(&self) -> Channel {
        self.selected.channel
    }

    /// Weight of the event in each analyzed run period
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Candidate observables of the event
    pub fn candidates(&self) -> &CandidateValues {
        &self.candidates
    }

    /// Give up the flat record, once histograms have been filled
    pub fn into_selected(self) -> SelectedEvent {
        self.selected
    }
}
